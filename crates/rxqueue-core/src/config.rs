//! Client configuration.
//!
//! Loaded from a JSON document; every key is optional.
//!
//! ```json
//! {
//!   "apiBase": "http://localhost:3000",
//!   "portalBase": "https://hospital.example",
//!   "role": "pharmacy",
//!   "hospitalId": "h-1",
//!   "adminPasswordSha256": "<64 hex chars>",
//!   "qr": { "size": 300, "quietZone": true, "darkColor": "#000000", "lightColor": "#FFFFFF" }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::admin::AdminGate;
use crate::models::is_hex_color;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for the pharmacy dashboard and admin pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardConfig {
    /// Prefix for backend API paths; empty means same origin
    pub api_base: String,
    /// Origin serving `patient-view.html`
    pub portal_base: String,
    /// Role announced when joining the real-time channel
    pub role: String,
    /// Hospital room to join
    pub hospital_id: Option<String>,
    /// SHA-256 hex digest of the admin password
    pub admin_password_sha256: Option<String>,
    /// Patient portal QR rendering
    pub qr: QrOptions,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            portal_base: "http://localhost:3000".into(),
            role: "pharmacy".into(),
            hospital_id: None,
            admin_password_sha256: None,
            qr: QrOptions::default(),
        }
    }
}

/// QR code rendering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QrOptions {
    /// Minimum width and height in px
    pub size: u32,
    /// Draw the standard quiet zone around the code
    pub quiet_zone: bool,
    pub dark_color: String,
    pub light_color: String,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            size: 300,
            quiet_zone: true,
            dark_color: "#000000".into(),
            light_color: "#FFFFFF".into(),
        }
    }
}

impl DashboardConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loading dashboard config");
        Self::from_json_str(&contents)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.role.trim().is_empty() {
            return Err(ConfigError::Invalid("role must not be empty".into()));
        }
        if self.qr.size == 0 {
            return Err(ConfigError::Invalid("qr.size must be positive".into()));
        }
        for color in [&self.qr.dark_color, &self.qr.light_color] {
            if !is_hex_color(color) {
                return Err(ConfigError::Invalid(format!("invalid QR color: {}", color)));
            }
        }
        if let Some(digest) = &self.admin_password_sha256 {
            AdminGate::from_digest(digest)?;
        }
        Ok(())
    }

    /// Join the API base with an endpoint path.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    /// Admin gate for the configured digest, if any.
    pub fn admin_gate(&self) -> ConfigResult<Option<AdminGate>> {
        self.admin_password_sha256
            .as_deref()
            .map(AdminGate::from_digest)
            .transpose()
    }
}
