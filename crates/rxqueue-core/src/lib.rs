//! Rx-Queue Core Library
//!
//! Client-side core of the hospital queue pharmacy pages.
//!
//! # Architecture
//!
//! ```text
//!            Backend API                       Real-time channel
//!   (snapshot, patient, PDF, template)   (queue-updated, prescription-updated)
//!                  │                                   │
//!                  ▼                                   ▼
//!          ┌──────────────────────────────────────────────────┐
//!          │                   Reconciler                     │
//!          │  load_all · gated upsert · direct upsert         │
//!          │  optimistic transition ◄── row button (prepare,  │
//!          │                            deliver) ──► move-patient
//!          └───────────────────────┬──────────────────────────┘
//!                                  │
//!                  ┌───────────────┴───────────────┐
//!                  ▼                               ▼
//!         filter_by_name_substring           compute_stats
//!                  │                               │
//!                  └──────────► DashboardView ◄────┘
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (PrescriptionRecord, channel messages, template)
//! - [`reconciler`]: Ordered, ID-unique view model and its merge rules
//! - [`dashboard`]: Pharmacy dashboard controller, row view, portal QR
//! - [`template`]: Letterhead template editor and live preview
//! - [`admin`]: Admin page password gate
//! - [`backend`]: Backend and channel collaborator traits
//! - [`config`]: JSON client configuration

pub mod admin;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod reconciler;
pub mod template;

// Re-export commonly used types
pub use admin::{AdminGate, GateOutcome};
pub use backend::{BackendError, PharmacyBackend, RealtimeChannel, TemplateBackend};
pub use config::DashboardConfig;
pub use dashboard::{DashboardAction, DashboardView, PharmacyDashboard};
pub use models::{
    InboundMessage, OutboundMessage, PharmacyState, PrescriptionRecord, PrescriptionTemplate,
};
pub use reconciler::{PharmacyStats, ReconcileOutcome, Reconciler};
pub use template::{TemplateEditor, TemplatePreview};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RxQueueError {
    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for RxQueueError {
    fn from(e: serde_json::Error) -> Self {
        RxQueueError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for RxQueueError {
    fn from(e: config::ConfigError) -> Self {
        RxQueueError::ConfigError(e.to_string())
    }
}

impl From<dashboard::DashboardError> for RxQueueError {
    fn from(e: dashboard::DashboardError) -> Self {
        use dashboard::DashboardError;
        match e {
            DashboardError::PatientNotFound(_) | DashboardError::TokenUnavailable(_) => {
                RxQueueError::NotFound(e.to_string())
            }
            DashboardError::InvalidTransition { .. }
            | DashboardError::UnknownAction(_)
            | DashboardError::InvalidInput(_) => RxQueueError::InvalidInput(e.to_string()),
            _ => RxQueueError::BackendError(e.to_string()),
        }
    }
}

impl From<template::TemplateError> for RxQueueError {
    fn from(e: template::TemplateError) -> Self {
        match e {
            template::TemplateError::InvalidColor(_) => RxQueueError::InvalidInput(e.to_string()),
            _ => RxQueueError::BackendError(e.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for RxQueueError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        RxQueueError::BackendError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Create a pharmacy view from an optional JSON configuration document.
#[uniffi::export]
pub fn open_pharmacy_view(config_json: Option<String>) -> Result<Arc<RxQueueCore>, RxQueueError> {
    let config = match config_json {
        Some(json) => DashboardConfig::from_json_str(&json)?,
        None => DashboardConfig::default(),
    };
    let admin_gate = config.admin_gate()?;

    Ok(Arc::new(RxQueueCore {
        state: Arc::new(Mutex::new(ViewState::default())),
        config,
        admin_gate,
    }))
}

/// Compute the live preview for a template JSON document.
#[uniffi::export]
pub fn render_template_preview(
    template_json: String,
) -> Result<FfiTemplatePreview, RxQueueError> {
    let template: PrescriptionTemplate = serde_json::from_str(&template_json)?;
    Ok(TemplatePreview::render(&template).into())
}

/// Normalize a template JSON document into the backend save payload.
#[uniffi::export]
pub fn template_save_payload(template_json: String) -> Result<String, RxQueueError> {
    let template: PrescriptionTemplate = serde_json::from_str(&template_json)?;
    Ok(serde_json::to_string(&template)?)
}

// =========================================================================
// Main API Object
// =========================================================================

#[derive(Default)]
struct ViewState {
    reconciler: Reconciler,
    search_term: String,
}

/// Pharmacy view model for hosts that own the network layer.
///
/// The host performs every fetch and socket operation and feeds raw JSON
/// bodies in; the core reconciles them and hands back rows, stats and the
/// outbound messages to send.
#[derive(uniffi::Object)]
pub struct RxQueueCore {
    state: Arc<Mutex<ViewState>>,
    config: DashboardConfig,
    admin_gate: Option<AdminGate>,
}

#[uniffi::export]
impl RxQueueCore {
    // =========================================================================
    // Channel Operations
    // =========================================================================

    /// The `join` envelope to send once the channel connects.
    pub fn join_message(&self) -> Result<String, RxQueueError> {
        let join = OutboundMessage::Join(models::JoinRequest {
            role: self.config.role.clone(),
            hospital_id: self.config.hospital_id.clone(),
        });
        Ok(join.to_json()?)
    }

    /// Apply a raw channel envelope. Malformed messages are dropped.
    pub fn handle_message(&self, json: String) -> Result<FfiUpdateOutcome, RxQueueError> {
        let message = match InboundMessage::from_json(&json) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed channel message");
                return Ok(FfiUpdateOutcome::Unchanged);
            }
        };

        let mut state = self.state.lock()?;
        let outcome = match message {
            InboundMessage::QueueUpdated(update) => {
                state.reconciler.apply_relevance_gated_upsert(update.patient)
            }
            InboundMessage::PrescriptionUpdated(record) => {
                state.reconciler.apply_direct_upsert(record)
            }
        };
        Ok(outcome.into())
    }

    // =========================================================================
    // Snapshot Operations
    // =========================================================================

    /// Replace the collection with a bulk-fetch body. Returns the record count.
    /// Malformed rows are skipped.
    pub fn load_snapshot(&self, json: String) -> Result<u32, RxQueueError> {
        let records = PrescriptionRecord::parse_snapshot(&json)?;
        let mut state = self.state.lock()?;
        state.reconciler.load_all(records);
        Ok(state.reconciler.len() as u32)
    }

    /// Overwrite one record with a per-patient fetch body, if still listed.
    pub fn refresh_patient(&self, json: String) -> Result<bool, RxQueueError> {
        let record: PrescriptionRecord = serde_json::from_str(&json)?;
        let mut state = self.state.lock()?;
        let outcome = state.reconciler.replace_if_present(record);
        Ok(outcome.is_mutation())
    }

    // =========================================================================
    // Row Actions
    // =========================================================================

    /// Apply a `prepare`/`deliver` click optimistically and return the
    /// `move-patient` envelope the host must send.
    pub fn request_transition(&self, action: String, id: i64) -> Result<String, RxQueueError> {
        let target = match DashboardAction::from_name(&action, id)? {
            DashboardAction::Prepare(_) => PharmacyState::Prepared,
            DashboardAction::Deliver(_) => PharmacyState::Delivered,
            other => {
                return Err(RxQueueError::InvalidInput(format!(
                    "{:?} is not a state transition",
                    other
                )))
            }
        };

        let mut state = self.state.lock()?;
        let request = dashboard::transition_request(&state.reconciler, id, target)?;
        state.reconciler.apply_optimistic_transition(
            id,
            request.pharmacy_state,
            request.status.as_deref(),
        );
        Ok(OutboundMessage::MovePatient(request).to_json()?)
    }

    /// QR modal content, or `None` when the patient has no portal token yet
    /// (the host should generate the PDF, then call `refresh_patient`).
    pub fn portal_qr(&self, id: i64) -> Result<Option<FfiPortalQr>, RxQueueError> {
        let state = self.state.lock()?;
        let record = state
            .reconciler
            .get(id)
            .ok_or_else(|| RxQueueError::NotFound(format!("patient {}", id)))?;
        if !record.has_public_token() {
            return Ok(None);
        }
        let qr = dashboard::build_portal_qr(record, &self.config)?;
        Ok(Some(qr.into()))
    }

    // =========================================================================
    // View Operations
    // =========================================================================

    /// Update the live search term.
    pub fn set_search_term(&self, term: String) -> Result<(), RxQueueError> {
        let mut state = self.state.lock()?;
        state.search_term = term;
        Ok(())
    }

    /// Rows matching the current search term.
    pub fn rows(&self) -> Result<Vec<FfiPrescriptionRow>, RxQueueError> {
        let state = self.state.lock()?;
        let view = DashboardView::build(&state.reconciler, &state.search_term);
        Ok(view.rows.into_iter().map(|r| r.into()).collect())
    }

    /// Counts over the full collection.
    pub fn stats(&self) -> Result<FfiStats, RxQueueError> {
        let state = self.state.lock()?;
        Ok(state.reconciler.compute_stats().into())
    }

    // =========================================================================
    // Endpoint Operations
    // =========================================================================

    /// URL of the bulk prescription fetch.
    pub fn prescriptions_url(&self) -> String {
        self.config.api_url(backend::PRESCRIPTIONS_PATH)
    }

    /// URL of the per-patient fetch; its body goes to `refresh_patient`.
    pub fn patient_url(&self, id: i64) -> String {
        self.config.api_url(&backend::patient_path(id))
    }

    /// URL that generates the prescription PDF and issues the portal token.
    pub fn prescription_pdf_url(&self, id: i64) -> String {
        self.config.api_url(&backend::prescription_pdf_path(id))
    }

    /// URL of the template read/write endpoint.
    pub fn template_url(&self) -> String {
        self.config.api_url(backend::TEMPLATE_PATH)
    }

    // =========================================================================
    // Admin Operations
    // =========================================================================

    /// Check the admin page password.
    pub fn check_admin_password(&self, input: String) -> Result<bool, RxQueueError> {
        let gate = self
            .admin_gate
            .as_ref()
            .ok_or_else(|| RxQueueError::ConfigError("no admin password configured".into()))?;
        Ok(gate.check(&input) == GateOutcome::Unlocked)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe reconcile result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiUpdateOutcome {
    /// Re-render rows and stats
    Changed,
    /// Nothing to do
    Unchanged,
    /// Fetch a fresh snapshot and call `load_snapshot`
    ResyncRequired,
}

impl From<ReconcileOutcome> for FfiUpdateOutcome {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::ResyncRequired => FfiUpdateOutcome::ResyncRequired,
            o if o.is_mutation() => FfiUpdateOutcome::Changed,
            _ => FfiUpdateOutcome::Unchanged,
        }
    }
}

/// FFI-safe table row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionRow {
    pub id: i64,
    pub token_label: String,
    pub name: String,
    pub demographics: String,
    pub prescription: String,
    pub state: String,
    pub state_label: String,
    pub action: String,
    pub action_label: String,
    pub has_public_token: bool,
}

impl From<dashboard::PrescriptionRow> for FfiPrescriptionRow {
    fn from(row: dashboard::PrescriptionRow) -> Self {
        let action = match row.action {
            dashboard::RowAction::Prepare => "prepare",
            dashboard::RowAction::Deliver => "deliver",
            dashboard::RowAction::Completed => "completed",
        };
        Self {
            id: row.id,
            token_label: row.token_label,
            name: row.name,
            demographics: row.demographics,
            prescription: row.prescription,
            state: row.badge.to_string(),
            state_label: row.state_label,
            action: action.to_string(),
            action_label: row.action.label().to_string(),
            has_public_token: row.has_public_token,
        }
    }
}

/// FFI-safe stats.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStats {
    pub pending_count: u32,
    pub prepared_count: u32,
    pub delivered_count: u32,
}

impl From<PharmacyStats> for FfiStats {
    fn from(stats: PharmacyStats) -> Self {
        Self {
            pending_count: stats.pending_count as u32,
            prepared_count: stats.prepared_count as u32,
            delivered_count: stats.delivered_count as u32,
        }
    }
}

/// FFI-safe QR modal content.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPortalQr {
    pub patient_name: String,
    pub token_label: String,
    pub url: String,
    pub svg: String,
}

impl From<dashboard::PortalQr> for FfiPortalQr {
    fn from(qr: dashboard::PortalQr) -> Self {
        Self {
            patient_name: qr.patient_name,
            token_label: qr.token_label,
            url: qr.url,
            svg: qr.svg,
        }
    }
}

/// FFI-safe template preview.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTemplatePreview {
    pub hospital_name: String,
    pub address: String,
    pub contact_line: String,
    pub header_text: String,
    pub footer_text: String,
    pub show_header: bool,
    pub font_size_px: u32,
    pub primary_color: String,
    pub secondary_color: String,
    pub show_watermark: bool,
    pub watermark_text: String,
}

impl From<TemplatePreview> for FfiTemplatePreview {
    fn from(preview: TemplatePreview) -> Self {
        Self {
            hospital_name: preview.hospital_name,
            address: preview.address,
            contact_line: preview.contact_line,
            header_text: preview.header_text,
            footer_text: preview.footer_text,
            show_header: preview.show_header,
            font_size_px: preview.font_size_px,
            primary_color: preview.primary_color,
            secondary_color: preview.secondary_color,
            show_watermark: preview.show_watermark,
            watermark_text: preview.watermark_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> String {
        r#"[
            {"id": 1, "token": 4, "name": "Ravi Kumar", "age": 41, "gender": "M",
             "prescription": "Paracetamol", "status": "pharmacy"},
            {"id": 2, "token": 5, "name": "anita", "age": 29, "gender": "F",
             "prescription": "Cetirizine", "status": "pharmacy", "pharmacyState": "prepared",
             "publicToken": "tok-2"}
        ]"#
        .to_string()
    }

    #[test]
    fn test_snapshot_and_rows() {
        let core = open_pharmacy_view(None).unwrap();
        assert_eq!(core.load_snapshot(snapshot()).unwrap(), 2);

        core.set_search_term("ANI".into()).unwrap();
        let rows = core.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "anita");
        assert_eq!(rows[0].action, "deliver");

        let stats = core.stats().unwrap();
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.prepared_count, 1);
    }

    #[test]
    fn test_transition_returns_envelope() {
        let core = open_pharmacy_view(None).unwrap();
        core.load_snapshot(snapshot()).unwrap();

        let json = core.request_transition("deliver".into(), 2).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event"], "move-patient");
        assert_eq!(value["data"]["status"], "completed");
        assert_eq!(core.stats().unwrap().delivered_count, 1);

        let err = core.request_transition("deliver".into(), 2);
        assert!(matches!(err, Err(RxQueueError::InvalidInput(_))));

        let err = core.request_transition("show-qr".into(), 1);
        assert!(matches!(err, Err(RxQueueError::InvalidInput(_))));
        let err = core.request_transition("prepare".into(), 99);
        assert!(matches!(err, Err(RxQueueError::NotFound(_))));
        assert_eq!(core.stats().unwrap().pending_count, 1);
    }

    #[test]
    fn test_snapshot_skips_bad_rows() {
        let core = open_pharmacy_view(None).unwrap();
        let body = r#"[
            {"id": 1, "name": "Ravi Kumar", "status": "pharmacy"},
            {"id": 2, "name": "anita", "pharmacyState": "misplaced"}
        ]"#;
        assert_eq!(core.load_snapshot(body.into()).unwrap(), 1);
        assert!(core.load_snapshot("{}".into()).is_err());
        assert_eq!(core.rows().unwrap().len(), 1);
    }

    #[test]
    fn test_null_queue_update_requests_resync() {
        let core = open_pharmacy_view(None).unwrap();
        core.load_snapshot(snapshot()).unwrap();

        let outcome = core
            .handle_message(r#"{"event":"queue-updated","data":{"patient":null}}"#.into())
            .unwrap();
        assert_eq!(outcome, FfiUpdateOutcome::ResyncRequired);

        let outcome = core.handle_message("not json".into()).unwrap();
        assert_eq!(outcome, FfiUpdateOutcome::Unchanged);
    }

    #[test]
    fn test_portal_qr() {
        let core = open_pharmacy_view(Some(r#"{"portalBase": "https://h.example"}"#.into()))
            .unwrap();
        core.load_snapshot(snapshot()).unwrap();

        assert!(core.portal_qr(1).unwrap().is_none());
        let qr = core.portal_qr(2).unwrap().unwrap();
        assert_eq!(qr.url, "https://h.example/patient-view.html?token=tok-2");
        assert!(matches!(core.portal_qr(99), Err(RxQueueError::NotFound(_))));
    }

    #[test]
    fn test_endpoint_urls() {
        let core = open_pharmacy_view(Some(r#"{"apiBase": "https://api.example/"}"#.into()))
            .unwrap();
        assert_eq!(core.prescriptions_url(), "https://api.example/api/prescriptions");
        assert_eq!(core.patient_url(12), "https://api.example/api/patients/12");
        assert_eq!(
            core.prescription_pdf_url(12),
            "https://api.example/api/prescription-pdf/12"
        );
        assert_eq!(
            core.template_url(),
            "https://api.example/api/prescription-template"
        );

        let same_origin = open_pharmacy_view(None).unwrap();
        assert_eq!(same_origin.prescriptions_url(), "/api/prescriptions");
    }

    #[test]
    fn test_admin_password() {
        let digest = AdminGate::from_password("letmein").digest_hex();
        let config = format!(r#"{{"adminPasswordSha256": "{}"}}"#, digest);
        let core = open_pharmacy_view(Some(config)).unwrap();

        assert!(core.check_admin_password("letmein".into()).unwrap());
        assert!(!core.check_admin_password("nope".into()).unwrap());

        let unconfigured = open_pharmacy_view(None).unwrap();
        assert!(unconfigured.check_admin_password("letmein".into()).is_err());
    }

    #[test]
    fn test_template_helpers() {
        let preview = render_template_preview(r#"{"hospitalName": "City Hospital"}"#.into())
            .unwrap();
        assert_eq!(preview.hospital_name, "City Hospital");
        assert_eq!(preview.font_size_px, 12);

        let payload = template_save_payload(r#"{"showWatermark": 1}"#.into()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["showWatermark"], 1);
        assert_eq!(value["doctorNamePosition"], "top-left");
    }
}
