//! Real-time channel message contract.
//!
//! Messages travel as a JSON envelope `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};

use super::prescription::{PharmacyState, PrescriptionRecord};

/// Messages pushed by the backend over the real-time channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum InboundMessage {
    /// Something in the queue changed; a missing patient means "resync"
    QueueUpdated(QueueUpdate),
    /// A specific prescription changed
    PrescriptionUpdated(PrescriptionRecord),
}

impl InboundMessage {
    /// Parse a message envelope.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Payload of a `queue-updated` message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueueUpdate {
    /// The changed patient, if the backend attached one
    #[serde(default)]
    pub patient: Option<PrescriptionRecord>,
}

/// Messages sent to the backend over the real-time channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundMessage {
    /// Subscribe to the hospital's room for a role
    Join(JoinRequest),
    /// Request a pharmacy state transition
    MovePatient(TransitionRequest),
}

impl OutboundMessage {
    /// Serialize to the envelope format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Room subscription sent once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub role: String,
    pub hospital_id: Option<String>,
}

/// State-transition request for one prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    /// Record ID
    pub id: i64,
    /// Target pharmacy state
    pub pharmacy_state: PharmacyState,
    /// Target patient status, only sent on the terminal transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_queue_updated_with_patient() {
        let json = r#"{"event":"queue-updated","data":{"patient":{"id":5,"name":"Anita","status":"pharmacy"}}}"#;
        let msg = InboundMessage::from_json(json).unwrap();

        match msg {
            InboundMessage::QueueUpdated(update) => {
                let patient = update.patient.unwrap();
                assert_eq!(patient.id, 5);
                assert_eq!(patient.status, "pharmacy");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_queue_updated_resync() {
        let json = r#"{"event":"queue-updated","data":{"patient":null}}"#;
        let msg = InboundMessage::from_json(json).unwrap();
        assert_eq!(msg, InboundMessage::QueueUpdated(QueueUpdate { patient: None }));

        let json = r#"{"event":"queue-updated","data":{}}"#;
        let msg = InboundMessage::from_json(json).unwrap();
        assert_eq!(msg, InboundMessage::QueueUpdated(QueueUpdate::default()));
    }

    #[test]
    fn test_parse_prescription_updated() {
        let json = r#"{"event":"prescription-updated","data":{"id":2,"name":"Ravi","pharmacyState":"pending"}}"#;
        let msg = InboundMessage::from_json(json).unwrap();

        match msg {
            InboundMessage::PrescriptionUpdated(record) => {
                assert_eq!(record.pharmacy_state, Some(PharmacyState::Pending));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_rejected() {
        let json = r#"{"event":"patient-called","data":{}}"#;
        assert!(InboundMessage::from_json(json).is_err());
    }

    #[test]
    fn test_move_patient_envelope() {
        let msg = OutboundMessage::MovePatient(TransitionRequest {
            id: 4,
            pharmacy_state: PharmacyState::Delivered,
            status: Some("completed".into()),
        });
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

        assert_eq!(value["event"], "move-patient");
        assert_eq!(value["data"]["id"], 4);
        assert_eq!(value["data"]["pharmacyState"], "delivered");
        assert_eq!(value["data"]["status"], "completed");
    }

    #[test]
    fn test_prepare_request_omits_status() {
        let msg = OutboundMessage::MovePatient(TransitionRequest {
            id: 4,
            pharmacy_state: PharmacyState::Prepared,
            status: None,
        });
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert!(value["data"].get("status").is_none());
    }
}
