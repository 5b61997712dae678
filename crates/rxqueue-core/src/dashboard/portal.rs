//! Patient portal link and QR code.

use qrcode::render::svg;
use qrcode::QrCode;
use serde::Serialize;

use super::{DashboardError, DashboardResult};
use crate::config::{DashboardConfig, QrOptions};
use crate::models::PrescriptionRecord;

/// Build the patient-facing portal URL for a public token.
pub fn portal_url(portal_base: &str, public_token: &str) -> String {
    format!(
        "{}/patient-view.html?token={}",
        portal_base.trim_end_matches('/'),
        public_token
    )
}

/// Render a URL as an SVG QR code.
pub fn render_qr_svg(url: &str, options: &QrOptions) -> Result<String, String> {
    let code = QrCode::new(url.as_bytes()).map_err(|e| format!("QR generation failed: {e}"))?;

    let svg_string = code
        .render::<svg::Color>()
        .min_dimensions(options.size, options.size)
        .dark_color(svg::Color(&options.dark_color))
        .light_color(svg::Color(&options.light_color))
        .quiet_zone(options.quiet_zone)
        .build();

    Ok(svg_string)
}

/// QR modal content for one patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalQr {
    pub patient_name: String,
    /// `#<token>`
    pub token_label: String,
    pub url: String,
    pub svg: String,
}

/// QR modal content for a record that already has a portal token.
pub fn build_portal_qr(
    record: &PrescriptionRecord,
    config: &DashboardConfig,
) -> DashboardResult<PortalQr> {
    let token = record
        .public_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(DashboardError::TokenUnavailable(record.id))?;
    let url = portal_url(&config.portal_base, token);
    let svg = render_qr_svg(&url, &config.qr).map_err(DashboardError::QrCode)?;

    Ok(PortalQr {
        patient_name: record.name.clone(),
        token_label: format!("#{}", record.token),
        url,
        svg,
    })
}
