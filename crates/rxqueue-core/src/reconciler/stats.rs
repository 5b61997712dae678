//! Aggregate counters shown above the pharmacy table.

use serde::{Deserialize, Serialize};

use crate::models::{PharmacyState, PrescriptionRecord};

/// Per-state record counts over the full (unfiltered) collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyStats {
    /// Records with no pharmacy state or `pending`
    pub pending_count: usize,
    /// Records in `prepared`
    pub prepared_count: usize,
    /// Records in `delivered`
    pub delivered_count: usize,
}

impl PharmacyStats {
    /// Count records by effective pharmacy state.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a PrescriptionRecord>,
    {
        records
            .into_iter()
            .fold(Self::default(), |mut stats, record| {
                match record.effective_state() {
                    PharmacyState::Pending => stats.pending_count += 1,
                    PharmacyState::Prepared => stats.prepared_count += 1,
                    PharmacyState::Delivered => stats.delivered_count += 1,
                }
                stats
            })
    }

    /// Total number of records counted.
    pub fn total(&self) -> usize {
        self.pending_count + self.prepared_count + self.delivered_count
    }
}
