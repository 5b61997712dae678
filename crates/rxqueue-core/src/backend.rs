//! Collaborator interfaces: the hospital backend and the real-time channel.
//!
//! The crate ships no transport. Hosts implement these traits over whatever
//! HTTP client and socket library they already use; the paths below are the
//! endpoints those implementations talk to.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{OutboundMessage, PrescriptionRecord, PrescriptionTemplate};

/// Bulk fetch of the pharmacy-relevant prescription set.
pub const PRESCRIPTIONS_PATH: &str = "/api/prescriptions";

/// Template read/write endpoint.
pub const TEMPLATE_PATH: &str = "/api/prescription-template";

/// Per-patient fetch endpoint.
pub fn patient_path(id: i64) -> String {
    format!("/api/patients/{}", id)
}

/// PDF generation endpoint. Generating a PDF also issues the patient's
/// public token.
pub fn prescription_pdf_path(id: i64) -> String {
    format!("/api/prescription-pdf/{}", id)
}

/// Backend and channel errors.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Session expired or not authenticated")]
    Unauthorized,

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BackendError {
    /// Map a non-success HTTP status code to an error.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => BackendError::Unauthorized,
            other => BackendError::Status(other),
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Prescription and patient endpoints used by the pharmacy dashboard.
pub trait PharmacyBackend {
    /// Fetch the full relevant prescription set.
    fn fetch_prescriptions(&self) -> BackendResult<Vec<PrescriptionRecord>>;

    /// Fetch one patient record by ID.
    fn fetch_patient(&self, id: i64) -> BackendResult<PrescriptionRecord>;

    /// Generate (or regenerate) the prescription PDF for a patient.
    fn fetch_prescription_pdf(&self, id: i64) -> BackendResult<Vec<u8>>;
}

/// Template endpoints used by the settings page.
pub trait TemplateBackend {
    /// Fetch the stored template. `None` when the hospital has none yet.
    fn fetch_template(&self) -> BackendResult<Option<PrescriptionTemplate>>;

    /// Store a template.
    fn save_template(&self, template: &PrescriptionTemplate) -> BackendResult<SaveResponse>;
}

/// Outbound half of the real-time channel.
pub trait RealtimeChannel {
    /// Send a message to the backend.
    fn emit(&self, message: &OutboundMessage) -> BackendResult<()>;
}

/// Backend reply to a template save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(patient_path(12), "/api/patients/12");
        assert_eq!(prescription_pdf_path(12), "/api/prescription-pdf/12");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(BackendError::from_status(401), BackendError::Unauthorized));
        assert!(matches!(BackendError::from_status(500), BackendError::Status(500)));
    }

    #[test]
    fn test_save_response_parse() {
        let ok: SaveResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(ok.success);

        let failed: SaveResponse =
            serde_json::from_str(r#"{"success": false, "error": "Missing hospital"}"#).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("Missing hospital"));
    }
}
