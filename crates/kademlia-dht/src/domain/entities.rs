//! Core Domain Entities for the DHT
//!
//! Identifiers, peer addresses and the contacts held by k-buckets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use super::errors::DhtError;

/// Identifier length in bytes (SHA-1 digest).
pub const ID_LENGTH: usize = 20;

/// Identifier length in bits. One k-bucket exists per bit.
pub const ID_BITS: usize = ID_LENGTH * 8;

/// 160-bit identifier for a node or a lookup key.
///
/// Derived once from a canonical string (`host:port` for a node, the record
/// key for a value) and never mutated. Identifiers are only compared through
/// XOR distance; there is no meaningful ordering between two ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct NodeId([u8; ID_LENGTH]);

impl NodeId {
    /// Create a NodeId from raw bytes.
    pub fn new(bytes: [u8; ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive an identifier by hashing `s` with SHA-1.
    ///
    /// Deterministic: the same input always yields the same identifier.
    pub fn derive(s: &str) -> Self {
        let digest = Sha1::digest(s.as_bytes());
        let mut bytes = [0u8; ID_LENGTH];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Get the underlying bytes for XOR distance calculation.
    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }

    /// Lowercase hex form used on the wire.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for NodeId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 hex chars are enough to tell ids apart in logs
        write!(f, "NodeId({}..)", &self.to_hex()[..8])
    }
}

impl FromStr for NodeId {
    type Err = DhtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = hex::decode(s)
            .map_err(|e| DhtError::InvalidArgument(format!("node id {s:?} is not hex: {e}")))?;
        let bytes: [u8; ID_LENGTH] = decoded.try_into().map_err(|v: Vec<u8>| {
            DhtError::InvalidArgument(format!(
                "node id has {} bytes, expected {ID_LENGTH}",
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for NodeId {
    type Error = DhtError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Reachable address of a peer: a host (IP literal or domain name) and port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddress {
    /// IP address or domain name.
    pub host: String,
    /// Port number.
    pub port: u16,
}

impl NodeAddress {
    /// Create a new address from host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Identifier of the node listening on this address.
    pub fn node_id(&self) -> NodeId {
        NodeId::derive(&self.to_string())
    }
}

impl fmt::Display for NodeAddress {
    /// Canonical `host:port`; IPv6 literals are bracketed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for NodeAddress {
    type Err = DhtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| DhtError::InvalidArgument(format!("address {s:?} has no port")))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| DhtError::InvalidArgument(format!("address {s:?}: bad port: {e}")))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(DhtError::InvalidArgument(format!("address {s:?} has no host")));
        }
        Ok(Self::new(host, port))
    }
}

/// A remembered peer, held exclusively by the k-bucket containing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Identifier, the hash of `address`.
    pub id: NodeId,
    /// Where to reach the peer.
    pub address: NodeAddress,
    /// When the peer last proved liveness or was freshly discovered.
    pub last_seen: Timestamp,
}

impl Contact {
    /// Create a contact whose id is derived from its address.
    pub fn new(address: NodeAddress, last_seen: Timestamp) -> Self {
        Self {
            id: address.node_id(),
            address,
            last_seen,
        }
    }

    /// Whether the advertised id matches the hash of the advertised address.
    pub fn is_consistent(&self) -> bool {
        self.id == self.address.node_id()
    }
}

/// Unix timestamp in seconds
///
/// Timestamps are clamped to a reasonable maximum so a peer-supplied value
/// cannot corrupt the oldest-contact comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Maximum reasonable timestamp (year 9999).
    pub const MAX_REASONABLE: u64 = 253_402_300_799;

    /// Create a new timestamp, clamping to MAX_REASONABLE.
    pub fn new(secs: u64) -> Self {
        Self(secs.min(Self::MAX_REASONABLE))
    }

    /// Get the underlying seconds value.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Add seconds to timestamp (saturating at MAX_REASONABLE).
    pub fn add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs).min(Self::MAX_REASONABLE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        assert_eq!(NodeId::derive("127.0.0.1:53"), NodeId::derive("127.0.0.1:53"));
        assert_ne!(NodeId::derive("127.0.0.1:53"), NodeId::derive("127.0.0.2:53"));
    }

    #[test]
    fn test_derive_matches_sha1() {
        // sha1("abc")
        assert_eq!(
            NodeId::derive("abc").to_hex(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_node_id_hex_parse() {
        let id = NodeId::derive("structx.io");
        let parsed: NodeId = id.to_hex().parse().unwrap();
        assert_eq!(parsed, id);

        assert!(matches!(
            "abcd".parse::<NodeId>(),
            Err(DhtError::InvalidArgument(_))
        ));
        assert!(matches!(
            "zz".repeat(20).parse::<NodeId>(),
            Err(DhtError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_address_display_and_parse() {
        let addr = NodeAddress::new("127.0.0.1", 53);
        assert_eq!(addr.to_string(), "127.0.0.1:53");
        assert_eq!("127.0.0.1:53".parse::<NodeAddress>().unwrap(), addr);

        let v6 = NodeAddress::new("::1", 53);
        assert_eq!(v6.to_string(), "[::1]:53");
        assert_eq!("[::1]:53".parse::<NodeAddress>().unwrap(), v6);

        assert!("localhost".parse::<NodeAddress>().is_err());
        assert!(":53".parse::<NodeAddress>().is_err());
        assert!("host:99999".parse::<NodeAddress>().is_err());
    }

    #[test]
    fn test_contact_id_is_hash_of_address() {
        let contact = Contact::new(NodeAddress::new("127.0.0.2", 53), Timestamp::new(1));
        assert_eq!(contact.id, NodeId::derive("127.0.0.2:53"));
        assert!(contact.is_consistent());

        let forged = Contact {
            id: NodeId::derive("elsewhere:53"),
            ..contact
        };
        assert!(!forged.is_consistent());
    }

    #[test]
    fn test_timestamp_clamps() {
        assert_eq!(Timestamp::new(u64::MAX).as_secs(), Timestamp::MAX_REASONABLE);
        assert_eq!(Timestamp::new(100).add_secs(50).as_secs(), 150);
    }
}
