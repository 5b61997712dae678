//! Render snapshot handed to the presentation layer.

use serde::Serialize;

use crate::models::{PharmacyState, PrescriptionRecord};
use crate::reconciler::{PharmacyStats, Reconciler};

/// The control shown in a row's action column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowAction {
    /// "Mark Prepared" button
    Prepare,
    /// "Mark Delivered" button
    Deliver,
    /// Static "Completed" label
    Completed,
}

impl RowAction {
    /// Action available for a record in the given state.
    pub fn for_state(state: PharmacyState) -> Self {
        match state {
            PharmacyState::Pending => RowAction::Prepare,
            PharmacyState::Prepared => RowAction::Deliver,
            PharmacyState::Delivered => RowAction::Completed,
        }
    }

    /// Button or label text.
    pub fn label(&self) -> &'static str {
        match self {
            RowAction::Prepare => "Mark Prepared",
            RowAction::Deliver => "Mark Delivered",
            RowAction::Completed => "Completed",
        }
    }
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRow {
    pub id: i64,
    /// `#<token>`
    pub token_label: String,
    pub name: String,
    /// `<age> / <gender>`
    pub demographics: String,
    /// Prescription text, `-` when empty
    pub prescription: String,
    /// Badge style, also the effective state
    pub badge: PharmacyState,
    /// Upper-case badge text
    pub state_label: String,
    pub action: RowAction,
    pub has_public_token: bool,
}

impl From<&PrescriptionRecord> for PrescriptionRow {
    fn from(record: &PrescriptionRecord) -> Self {
        let state = record.effective_state();
        let prescription = if record.prescription.is_empty() {
            "-".to_string()
        } else {
            record.prescription.clone()
        };

        Self {
            id: record.id,
            token_label: format!("#{}", record.token),
            name: record.name.clone(),
            demographics: format!("{} / {}", record.age, record.gender),
            prescription,
            badge: state,
            state_label: state.as_str().to_uppercase(),
            action: RowAction::for_state(state),
            has_public_token: record.has_public_token(),
        }
    }
}

/// Everything needed to draw the dashboard once.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Rows matching the search term, in collection order
    pub rows: Vec<PrescriptionRow>,
    /// Counts over the full collection
    pub stats: PharmacyStats,
    /// Show the "no prescriptions" placeholder
    pub show_empty_state: bool,
}

impl DashboardView {
    /// Project the collection through a search term.
    pub fn build(reconciler: &Reconciler, search_term: &str) -> Self {
        let rows: Vec<PrescriptionRow> = reconciler
            .filter_by_name_substring(search_term)
            .into_iter()
            .map(PrescriptionRow::from)
            .collect();

        Self {
            show_empty_state: rows.is_empty(),
            rows,
            stats: reconciler.compute_stats(),
        }
    }
}
