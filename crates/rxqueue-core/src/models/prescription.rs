//! Prescription queue records.

use serde::{Deserialize, Deserializer, Serialize};

/// Three-stage pharmacy sub-status, tracked independently of the patient's
/// overall `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PharmacyState {
    /// Awaiting preparation
    Pending,
    /// Prepared, awaiting delivery
    Prepared,
    /// Handed over to the patient
    Delivered,
}

impl PharmacyState {
    /// Wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            PharmacyState::Pending => "pending",
            PharmacyState::Prepared => "prepared",
            PharmacyState::Delivered => "delivered",
        }
    }

    /// The single legal forward transition from this state, if any.
    pub fn next(&self) -> Option<PharmacyState> {
        match self {
            PharmacyState::Pending => Some(PharmacyState::Prepared),
            PharmacyState::Prepared => Some(PharmacyState::Delivered),
            PharmacyState::Delivered => None,
        }
    }
}

impl std::fmt::Display for PharmacyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PharmacyState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PharmacyState::Pending),
            "prepared" => Ok(PharmacyState::Prepared),
            "delivered" => Ok(PharmacyState::Delivered),
            other => Err(format!("unknown pharmacy state: {}", other)),
        }
    }
}

/// Patient lifecycle status the pharmacy view treats specially.
pub const STATUS_PHARMACY: &str = "pharmacy";

/// Patient lifecycle status set when a prescription is delivered.
pub const STATUS_COMPLETED: &str = "completed";

/// A patient's pharmacy-relevant queue entry, as served by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRecord {
    /// Backend-assigned ID, unique within the collection
    pub id: i64,
    /// Queue token shown to staff (number or string on the wire)
    #[serde(default, deserialize_with = "display_text")]
    pub token: String,
    /// Patient name
    #[serde(default, deserialize_with = "display_text")]
    pub name: String,
    /// Patient age (display only)
    #[serde(default, deserialize_with = "display_text")]
    pub age: String,
    /// Patient gender (display only)
    #[serde(default, deserialize_with = "display_text")]
    pub gender: String,
    /// Free-text prescription, empty when none was written
    #[serde(default, deserialize_with = "display_text")]
    pub prescription: String,
    /// Overall patient lifecycle status (values owned by the backend)
    #[serde(default, deserialize_with = "display_text")]
    pub status: String,
    /// Pharmacy sub-status; `None` means never touched by the pharmacy
    #[serde(
        default,
        deserialize_with = "optional_state",
        skip_serializing_if = "Option::is_none"
    )]
    pub pharmacy_state: Option<PharmacyState>,
    /// Patient portal token, created by the first PDF generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_token: Option<String>,
}

impl PrescriptionRecord {
    /// Create a bare record with the given ID and name.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            token: String::new(),
            name: name.into(),
            age: String::new(),
            gender: String::new(),
            prescription: String::new(),
            status: String::new(),
            pharmacy_state: None,
            public_token: None,
        }
    }

    /// Whether this record belongs in the pharmacy view at all.
    ///
    /// A record is relevant when it carries prescription text, is queued at
    /// the pharmacy, or has ever been given a pharmacy state (including an
    /// explicit `pending`).
    pub fn is_relevant(&self) -> bool {
        !self.prescription.is_empty()
            || self.status == STATUS_PHARMACY
            || self.pharmacy_state.is_some()
    }

    /// Pharmacy state with absence read as `Pending`.
    pub fn effective_state(&self) -> PharmacyState {
        self.pharmacy_state.unwrap_or(PharmacyState::Pending)
    }

    /// Check if a patient portal token has been issued.
    pub fn has_public_token(&self) -> bool {
        self.public_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Parse a bulk-fetch body. Rows that fail to parse are skipped with a
    /// warning; only a body that is not a JSON array is an error.
    pub fn parse_snapshot(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        let rows: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let total = rows.len();

        let records: Vec<Self> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<Self>(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed snapshot row");
                    None
                }
            })
            .collect();

        if records.len() < total {
            tracing::warn!(skipped = total - records.len(), total, "snapshot had malformed rows");
        }
        Ok(records)
    }
}

/// Accept strings, numbers or null for display-only fields.
fn display_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Null and empty string both mean "no pharmacy state".
fn optional_state<'de, D>(deserializer: D) -> Result<Option<PharmacyState>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_record() {
        let json = r#"{
            "id": 7,
            "token": 12,
            "name": "Ravi Kumar",
            "age": 41,
            "gender": "M",
            "prescription": "Paracetamol 500mg BD",
            "status": "pharmacy",
            "pharmacyState": "prepared",
            "publicToken": "abc123",
            "doctorId": 3
        }"#;

        let record: PrescriptionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.token, "12");
        assert_eq!(record.age, "41");
        assert_eq!(record.pharmacy_state, Some(PharmacyState::Prepared));
        assert!(record.has_public_token());
    }

    #[test]
    fn test_null_and_missing_fields() {
        let json = r#"{"id": 3, "name": "Anita", "prescription": null, "pharmacyState": null}"#;
        let record: PrescriptionRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.prescription, "");
        assert_eq!(record.pharmacy_state, None);
        assert_eq!(record.effective_state(), PharmacyState::Pending);
        assert!(!record.is_relevant());
    }

    #[test]
    fn test_empty_pharmacy_state_is_absent() {
        let json = r#"{"id": 3, "name": "Anita", "pharmacyState": ""}"#;
        let record: PrescriptionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.pharmacy_state, None);
    }

    #[test]
    fn test_unknown_pharmacy_state_rejected() {
        let json = r#"{"id": 3, "name": "Anita", "pharmacyState": "lost"}"#;
        assert!(serde_json::from_str::<PrescriptionRecord>(json).is_err());
    }

    #[test]
    fn test_snapshot_skips_malformed_rows() {
        let json = r#"[
            {"id": 1, "name": "Ravi Kumar", "status": "pharmacy"},
            {"id": 2, "name": "Anita", "pharmacyState": "lost"},
            {"name": "No Id"},
            {"id": 4, "name": "Meera", "pharmacyState": "prepared"}
        ]"#;
        let records = PrescriptionRecord::parse_snapshot(json).unwrap();

        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(records[1].pharmacy_state, Some(PharmacyState::Prepared));
    }

    #[test]
    fn test_snapshot_must_be_array() {
        assert!(PrescriptionRecord::parse_snapshot(r#"{"id": 1}"#).is_err());
        assert!(PrescriptionRecord::parse_snapshot("[]").unwrap().is_empty());
    }

    #[test]
    fn test_relevance() {
        let mut record = PrescriptionRecord::new(1, "Ravi");
        assert!(!record.is_relevant());

        record.status = "pharmacy".into();
        assert!(record.is_relevant());

        record.status = "waiting".into();
        record.pharmacy_state = Some(PharmacyState::Pending);
        assert!(record.is_relevant());

        record.pharmacy_state = None;
        record.prescription = "Amoxicillin".into();
        assert!(record.is_relevant());
    }

    #[test]
    fn test_forward_transitions() {
        assert_eq!(PharmacyState::Pending.next(), Some(PharmacyState::Prepared));
        assert_eq!(PharmacyState::Prepared.next(), Some(PharmacyState::Delivered));
        assert_eq!(PharmacyState::Delivered.next(), None);
    }

    #[test]
    fn test_serialize_camel_case() {
        let mut record = PrescriptionRecord::new(9, "Anita");
        record.pharmacy_state = Some(PharmacyState::Delivered);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["pharmacyState"], "delivered");
        assert!(json.get("publicToken").is_none());
    }
}
