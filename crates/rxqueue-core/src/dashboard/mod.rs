//! Pharmacy dashboard controller.
//!
//! Wires the [`Reconciler`] to the backend and real-time channel:
//!
//! ```text
//!   backend snapshot ──► refresh() ─────────┐
//!   queue-updated ─────► handle_message() ──┼──► Reconciler ──► view()
//!   prescription-updated ──────────────────┘        ▲
//!   row button ──► perform() ──► move-patient ───────┘ (optimistic)
//! ```
//!
//! Every mutating call leaves the dashboard ready for `view()`; there is no
//! observer mechanism, the caller re-renders after each call.

mod actions;
mod portal;
mod view;

pub use actions::*;
pub use portal::*;
pub use view::*;

use thiserror::Error;

use crate::backend::{BackendError, PharmacyBackend, RealtimeChannel};
use crate::config::DashboardConfig;
use crate::models::{
    InboundMessage, JoinRequest, OutboundMessage, PharmacyState, PrescriptionRecord,
    TransitionRequest, STATUS_COMPLETED,
};
use crate::reconciler::{PharmacyStats, ReconcileOutcome, Reconciler};

/// Dashboard errors.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Session expired, log in again")]
    SessionExpired,

    #[error("Patient not found: {0}")]
    PatientNotFound(i64),

    #[error("Cannot move prescription {id} from {from} to {to}")]
    InvalidTransition {
        id: i64,
        from: PharmacyState,
        to: PharmacyState,
    },

    #[error("No portal token available for patient {0}")]
    TokenUnavailable(i64),

    #[error("QR code error: {0}")]
    QrCode(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// Session-expiry is a distinct outcome for the presentation layer.
fn map_auth(e: BackendError) -> DashboardError {
    match e {
        BackendError::Unauthorized => DashboardError::SessionExpired,
        other => DashboardError::Backend(other),
    }
}

/// Pharmacy dashboard state and its collaborators.
pub struct PharmacyDashboard<B, C> {
    backend: B,
    channel: C,
    config: DashboardConfig,
    reconciler: Reconciler,
    search_term: String,
}

impl<B: PharmacyBackend, C: RealtimeChannel> PharmacyDashboard<B, C> {
    /// Create a dashboard with an empty collection.
    pub fn new(backend: B, channel: C, config: DashboardConfig) -> Self {
        Self {
            backend,
            channel,
            config,
            reconciler: Reconciler::new(),
            search_term: String::new(),
        }
    }

    /// Join the hospital room and load the initial snapshot.
    pub fn init(&mut self) -> DashboardResult<ReconcileOutcome> {
        let join = OutboundMessage::Join(JoinRequest {
            role: self.config.role.clone(),
            hospital_id: self.config.hospital_id.clone(),
        });
        self.channel.emit(&join)?;
        self.refresh()
    }

    /// Replace the collection with a fresh backend snapshot. On failure the
    /// previous collection is kept.
    pub fn refresh(&mut self) -> DashboardResult<ReconcileOutcome> {
        let records = self.backend.fetch_prescriptions().map_err(|e| {
            tracing::warn!(error = %e, "prescription fetch failed, keeping stale view");
            map_auth(e)
        })?;
        Ok(self.reconciler.load_all(records))
    }

    /// Apply a push message from the real-time channel.
    pub fn handle_message(&mut self, message: InboundMessage) -> DashboardResult<ReconcileOutcome> {
        match message {
            InboundMessage::QueueUpdated(update) => {
                match self.reconciler.apply_relevance_gated_upsert(update.patient) {
                    ReconcileOutcome::ResyncRequired => self.refresh(),
                    outcome => Ok(outcome),
                }
            }
            InboundMessage::PrescriptionUpdated(record) => {
                Ok(self.reconciler.apply_direct_upsert(record))
            }
        }
    }

    /// Parse and apply a raw channel envelope. Malformed or unknown messages
    /// are dropped.
    pub fn handle_raw_message(&mut self, json: &str) -> DashboardResult<ReconcileOutcome> {
        match InboundMessage::from_json(json) {
            Ok(message) => self.handle_message(message),
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed channel message");
                Ok(ReconcileOutcome::Ignored)
            }
        }
    }

    /// Update the live search term.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Read-only access to the reconciled collection.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Counts over the full collection.
    pub fn stats(&self) -> PharmacyStats {
        self.reconciler.compute_stats()
    }

    /// Filtered rows and stats for the current search term.
    pub fn view(&self) -> DashboardView {
        DashboardView::build(&self.reconciler, &self.search_term)
    }

    /// Handle a row button click.
    pub fn perform(&mut self, action: DashboardAction) -> DashboardResult<ActionOutcome> {
        match action {
            DashboardAction::Prepare(id) => self
                .transition(id, PharmacyState::Prepared)
                .map(ActionOutcome::Transitioned),
            DashboardAction::Deliver(id) => self
                .transition(id, PharmacyState::Delivered)
                .map(ActionOutcome::Transitioned),
            DashboardAction::ShowQr(id) => {
                let record = self
                    .reconciler
                    .get(id)
                    .ok_or(DashboardError::PatientNotFound(id))?;
                if record.has_public_token() {
                    self.portal_qr(record).map(ActionOutcome::ShowQr)
                } else {
                    Ok(ActionOutcome::ConfirmTokenGeneration(id))
                }
            }
            DashboardAction::DownloadPdf(id) => {
                self.download_pdf(id).map(ActionOutcome::Download)
            }
        }
    }

    /// Generate the PDF (which issues the portal token), refresh the patient
    /// and build its QR code.
    pub fn confirm_token_generation(&mut self, id: i64) -> DashboardResult<PortalQr> {
        if self.reconciler.get(id).is_none() {
            return Err(DashboardError::PatientNotFound(id));
        }

        self.backend.fetch_prescription_pdf(id).map_err(map_auth)?;
        let patient = match self.refresh_record(id) {
            Some(fresh) => fresh,
            None => self
                .reconciler
                .get(id)
                .cloned()
                .ok_or(DashboardError::PatientNotFound(id))?,
        };

        self.portal_qr(&patient)
    }

    /// Request a forward transition and apply it locally right away.
    fn transition(&mut self, id: i64, target: PharmacyState) -> DashboardResult<ReconcileOutcome> {
        let request = transition_request(&self.reconciler, id, target)?;
        self.channel.emit(&OutboundMessage::MovePatient(request.clone()))?;

        Ok(self.reconciler.apply_optimistic_transition(
            id,
            request.pharmacy_state,
            request.status.as_deref(),
        ))
    }

    fn download_pdf(&mut self, id: i64) -> DashboardResult<PdfDownload> {
        let bytes = self.backend.fetch_prescription_pdf(id).map_err(map_auth)?;
        tracing::info!(id, size = bytes.len(), "downloaded prescription pdf");

        // PDF generation may have issued a portal token
        self.refresh_record(id);
        Ok(PdfDownload::new(id, bytes))
    }

    /// Re-fetch one patient and overwrite the local copy if still listed.
    fn refresh_record(&mut self, id: i64) -> Option<PrescriptionRecord> {
        match self.backend.fetch_patient(id) {
            Ok(record) => {
                self.reconciler.replace_if_present(record.clone());
                Some(record)
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "patient refresh failed");
                None
            }
        }
    }

    fn portal_qr(&self, record: &PrescriptionRecord) -> DashboardResult<PortalQr> {
        build_portal_qr(record, &self.config)
    }
}

/// Build the `move-patient` request for a forward transition, checking that
/// `target` is the next state of the record's current one.
pub fn transition_request(
    reconciler: &Reconciler,
    id: i64,
    target: PharmacyState,
) -> DashboardResult<TransitionRequest> {
    let current = reconciler
        .get(id)
        .ok_or(DashboardError::PatientNotFound(id))?
        .effective_state();

    if current.next() != Some(target) {
        return Err(DashboardError::InvalidTransition {
            id,
            from: current,
            to: target,
        });
    }

    Ok(TransitionRequest {
        id,
        pharmacy_state: target,
        status: (target == PharmacyState::Delivered).then(|| STATUS_COMPLETED.to_string()),
    })
}
