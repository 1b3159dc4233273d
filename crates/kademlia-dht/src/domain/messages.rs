//! Logical shapes of the four Kademlia RPCs.
//!
//! Transport encoding is the adapter's business; these types only fix which
//! fields travel in each direction. Every response echoes the request's
//! `request_id`, and a mismatch is treated as a failed call.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entities::{Contact, NodeId};
use super::record::Record;

/// Fresh correlation id for an outbound request.
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Liveness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingRequest {
    /// Who is asking.
    pub sender: Contact,
    /// Correlation id.
    pub request_id: String,
}

/// Answer to [`PingRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    /// Who answered.
    pub sender: Contact,
    /// Echo of the request's correlation id.
    pub request_id: String,
}

/// Ask a peer for the contacts it knows closest to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindNodeRequest {
    /// Who is asking.
    pub sender: Contact,
    /// Correlation id.
    pub request_id: String,
    /// Identifier being looked up.
    pub target: NodeId,
}

/// Answer to [`FindNodeRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindNodeResponse {
    /// Who answered.
    pub sender: Contact,
    /// Echo of the request's correlation id.
    pub request_id: String,
    /// Up to K contacts, closest first.
    pub closest: Vec<Contact>,
}

/// Ask a peer for the record under `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindValueRequest {
    /// Who is asking.
    pub sender: Contact,
    /// Correlation id.
    pub request_id: String,
    /// Store key; the lookup target is its derived identifier.
    pub key: String,
}

/// Either the record, or contacts closer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindValueResult {
    /// The peer holds the record.
    Record(Record),
    /// The peer does not; these contacts are closer to the key.
    ClosestContacts(Vec<Contact>),
}

/// Answer to [`FindValueRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindValueResponse {
    /// Who answered.
    pub sender: Contact,
    /// Echo of the request's correlation id.
    pub request_id: String,
    /// Record or closer contacts.
    pub result: FindValueResult,
}

/// Ask a peer to hold a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRequest {
    /// Who is asking.
    pub sender: Contact,
    /// Correlation id.
    pub request_id: String,
    /// Store key.
    pub key: String,
    /// Record to hold.
    pub record: Record,
}

/// Answer to [`StoreRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreResponse {
    /// Who answered.
    pub sender: Contact,
    /// Echo of the request's correlation id.
    pub request_id: String,
    /// False when the peer already held a record under the key.
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeAddress, RecordType, Timestamp};

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(new_request_id(), new_request_id());
    }

    #[test]
    fn test_node_id_travels_as_hex() {
        let sender = Contact::new(NodeAddress::new("127.0.0.1", 53), Timestamp::new(0));
        let request = FindNodeRequest {
            sender: sender.clone(),
            request_id: "r1".into(),
            target: sender.id,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["target"], serde_json::json!(sender.id.to_hex()));
    }

    #[test]
    fn test_find_value_result_variants() {
        let record = Record::new("structx.io", RecordType::A, b"10.0.0.1".to_vec(), 60);
        let json = serde_json::to_string(&FindValueResult::Record(record.clone())).unwrap();
        let back: FindValueResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FindValueResult::Record(record));
    }
}
