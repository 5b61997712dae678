//! View-model reconciler for the pharmacy dashboard.
//!
//! Keeps the locally cached prescription list consistent across three kinds
//! of input:
//!
//! 1. Bulk snapshots from the backend (replace everything)
//! 2. Optimistic local transitions (applied before the server confirms)
//! 3. Real-time push events (relevance-gated or direct upserts)
//!
//! Inputs are applied in arrival order; the last write for an ID wins. There
//! is no version counter, so an optimistic transition whose confirming event
//! is lost stays in place until the next bulk load.

mod stats;

pub use stats::*;

use std::collections::HashMap;

use crate::models::{PharmacyState, PrescriptionRecord};

/// What a reconcile operation did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Collection replaced by a snapshot of this many records
    Loaded(usize),
    /// New record appended
    Inserted,
    /// Existing record overwritten
    Replaced,
    /// Existing record dropped because it is no longer relevant
    Removed,
    /// Irrelevant record for an unknown ID, nothing changed
    Ignored,
    /// Optimistic transition applied
    Transitioned,
    /// Optimistic transition for an ID not in the collection
    UnknownId,
    /// Caller must fetch a fresh snapshot and call `load_all`
    ResyncRequired,
}

impl ReconcileOutcome {
    /// Whether the collection changed and the view must be re-rendered.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            ReconcileOutcome::Loaded(_)
                | ReconcileOutcome::Inserted
                | ReconcileOutcome::Replaced
                | ReconcileOutcome::Removed
                | ReconcileOutcome::Transitioned
        )
    }
}

/// Ordered, ID-unique collection of prescription records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciler {
    records: Vec<PrescriptionRecord>,
}

impl Reconciler {
    /// Create an empty reconciler.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[PrescriptionRecord] {
        &self.records
    }

    /// Look up a record by ID.
    pub fn get(&self, id: i64) -> Option<&PrescriptionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Replace the whole collection with a backend snapshot.
    ///
    /// Order is preserved. A duplicated ID keeps its first position and takes
    /// the content of its last occurrence.
    pub fn load_all(&mut self, records: Vec<PrescriptionRecord>) -> ReconcileOutcome {
        let mut loaded: Vec<PrescriptionRecord> = Vec::with_capacity(records.len());
        let mut index: HashMap<i64, usize> = HashMap::with_capacity(records.len());
        for record in records {
            match index.get(&record.id) {
                Some(&idx) => {
                    tracing::warn!(id = record.id, "duplicate id in snapshot, keeping latest");
                    loaded[idx] = record;
                }
                None => {
                    index.insert(record.id, loaded.len());
                    loaded.push(record);
                }
            }
        }

        self.records = loaded;
        tracing::info!(count = self.records.len(), "loaded prescription snapshot");
        ReconcileOutcome::Loaded(self.records.len())
    }

    /// Set a record's pharmacy state (and optionally status) ahead of server
    /// confirmation. Unknown IDs are a no-op.
    pub fn apply_optimistic_transition(
        &mut self,
        id: i64,
        next_state: PharmacyState,
        next_status: Option<&str>,
    ) -> ReconcileOutcome {
        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            tracing::warn!(id, state = %next_state, "optimistic transition for unknown id");
            return ReconcileOutcome::UnknownId;
        };

        record.pharmacy_state = Some(next_state);
        if let Some(status) = next_status {
            record.status = status.to_string();
        }
        tracing::info!(id, state = %next_state, "applied optimistic transition");
        ReconcileOutcome::Transitioned
    }

    /// Handle a `queue-updated` push.
    ///
    /// `None` asks for a full resync. Otherwise relevant records are
    /// upserted (appended when new) and irrelevant ones are removed if
    /// present, ignored if not.
    pub fn apply_relevance_gated_upsert(
        &mut self,
        record: Option<PrescriptionRecord>,
    ) -> ReconcileOutcome {
        let Some(record) = record else {
            tracing::debug!("queue update without record, resync required");
            return ReconcileOutcome::ResyncRequired;
        };

        let relevant = record.is_relevant();
        let outcome = match (self.position(record.id), relevant) {
            (Some(idx), true) => {
                self.records[idx] = record;
                ReconcileOutcome::Replaced
            }
            (Some(idx), false) => {
                self.records.remove(idx);
                ReconcileOutcome::Removed
            }
            (None, true) => {
                self.records.push(record);
                ReconcileOutcome::Inserted
            }
            (None, false) => ReconcileOutcome::Ignored,
        };

        tracing::debug!(?outcome, relevant, "applied queue update");
        outcome
    }

    /// Handle a `prescription-updated` push: unconditional upsert by ID.
    pub fn apply_direct_upsert(&mut self, record: PrescriptionRecord) -> ReconcileOutcome {
        let outcome = match self.position(record.id) {
            Some(idx) => {
                self.records[idx] = record;
                ReconcileOutcome::Replaced
            }
            None => {
                self.records.push(record);
                ReconcileOutcome::Inserted
            }
        };

        tracing::debug!(?outcome, "applied prescription update");
        outcome
    }

    /// Overwrite a record refreshed by a per-record fetch. Records that left
    /// the collection meanwhile are not re-added.
    pub fn replace_if_present(&mut self, record: PrescriptionRecord) -> ReconcileOutcome {
        match self.position(record.id) {
            Some(idx) => {
                self.records[idx] = record;
                ReconcileOutcome::Replaced
            }
            None => ReconcileOutcome::Ignored,
        }
    }

    /// Records whose name contains `term`, ignoring case. An empty term
    /// matches everything.
    pub fn filter_by_name_substring(&self, term: &str) -> Vec<&PrescriptionRecord> {
        let needle = term.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Counts over the full collection.
    pub fn compute_stats(&self) -> PharmacyStats {
        PharmacyStats::from_records(&self.records)
    }
}
