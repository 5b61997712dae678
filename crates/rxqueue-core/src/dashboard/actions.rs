//! Row button actions.

use serde::Serialize;

use super::portal::PortalQr;
use super::{DashboardError, DashboardResult};
use crate::reconciler::ReconcileOutcome;

/// A click on one of a row's buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardAction {
    Prepare(i64),
    Deliver(i64),
    ShowQr(i64),
    DownloadPdf(i64),
}

impl DashboardAction {
    /// Parse the `data-action` / `data-id` pair carried by a row button.
    pub fn parse(action: &str, id: &str) -> DashboardResult<Self> {
        let id: i64 = id
            .trim()
            .parse()
            .map_err(|_| DashboardError::InvalidInput(format!("bad record id: {}", id)))?;
        Self::from_name(action, id)
    }

    /// Build an action from its `data-action` name and a record ID.
    pub fn from_name(action: &str, id: i64) -> DashboardResult<Self> {
        match action {
            "prepare" => Ok(DashboardAction::Prepare(id)),
            "deliver" => Ok(DashboardAction::Deliver(id)),
            "show-qr" => Ok(DashboardAction::ShowQr(id)),
            "download-pdf" => Ok(DashboardAction::DownloadPdf(id)),
            other => Err(DashboardError::UnknownAction(other.to_string())),
        }
    }

    /// Record the action targets.
    pub fn id(&self) -> i64 {
        match self {
            DashboardAction::Prepare(id)
            | DashboardAction::Deliver(id)
            | DashboardAction::ShowQr(id)
            | DashboardAction::DownloadPdf(id) => *id,
        }
    }
}

/// What the presentation layer should do after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Transition requested and applied optimistically; re-render
    Transitioned(ReconcileOutcome),
    /// Patient has no portal token yet; ask before generating one, then call
    /// `confirm_token_generation`
    ConfirmTokenGeneration(i64),
    /// Show the QR modal
    ShowQr(PortalQr),
    /// Save the PDF
    Download(PdfDownload),
}

/// A generated prescription PDF ready to save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfDownload {
    /// `prescription_<id>_<unix millis>.pdf`
    pub filename: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl PdfDownload {
    pub fn new(id: i64, bytes: Vec<u8>) -> Self {
        Self {
            filename: format!(
                "prescription_{}_{}.pdf",
                id,
                chrono::Utc::now().timestamp_millis()
            ),
            bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            DashboardAction::parse("prepare", "3").unwrap(),
            DashboardAction::Prepare(3)
        );
        assert_eq!(
            DashboardAction::parse("deliver", "3").unwrap(),
            DashboardAction::Deliver(3)
        );
        assert_eq!(
            DashboardAction::parse("show-qr", " 12 ").unwrap(),
            DashboardAction::ShowQr(12)
        );
        assert_eq!(
            DashboardAction::parse("download-pdf", "8").unwrap().id(),
            8
        );
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            DashboardAction::from_name("deliver", 7).unwrap(),
            DashboardAction::Deliver(7)
        );
        assert!(matches!(
            DashboardAction::from_name("Deliver", 7),
            Err(DashboardError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            DashboardAction::parse("archive", "3"),
            Err(DashboardError::UnknownAction(_))
        ));
        assert!(matches!(
            DashboardAction::parse("prepare", "abc"),
            Err(DashboardError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_pdf_filename() {
        let pdf = PdfDownload::new(42, vec![1, 2, 3]);
        assert!(pdf.filename.starts_with("prescription_42_"));
        assert!(pdf.filename.ends_with(".pdf"));
    }
}
