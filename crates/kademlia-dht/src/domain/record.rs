//! DNS records held by the key/value store collaborator.
//!
//! The DHT never inspects record contents; it only moves them between the
//! store and the network.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of resource record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(into = "String", from = "String")]
pub enum RecordType {
    /// IPv4 address record.
    A,
    /// Canonical name record.
    Cname,
    /// Decentralized identifier record.
    Did,
    /// Anything the resolver does not know.
    #[default]
    Unspecified,
}

impl RecordType {
    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Cname => "CNAME",
            Self::Did => "DID",
            Self::Unspecified => "UNSPECIFIED",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = std::convert::Infallible;

    /// Case-insensitive; unknown names map to `Unspecified`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "a" => Self::A,
            "cname" => Self::Cname,
            "did" => Self::Did,
            _ => Self::Unspecified,
        })
    }
}

impl From<String> for RecordType {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<RecordType> for String {
    fn from(rt: RecordType) -> Self {
        rt.as_str().to_string()
    }
}

/// A resource record as stored and replicated by the DHT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Domain the record answers for.
    pub domain: String,
    /// Record kind.
    pub record_type: RecordType,
    /// Raw value (IP address, CNAME target, DID document).
    pub value: Vec<u8>,
    /// Time to live in seconds.
    pub ttl: i64,
}

impl Record {
    /// Create a new record.
    pub fn new(
        domain: impl Into<String>,
        record_type: RecordType,
        value: impl Into<Vec<u8>>,
        ttl: i64,
    ) -> Self {
        Self {
            domain: domain.into(),
            record_type,
            value: value.into(),
            ttl,
        }
    }

    /// Canonical store key, `<domain>:<TYPE>`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.domain, self.record_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_parse_is_case_insensitive() {
        assert_eq!("a".parse::<RecordType>().unwrap(), RecordType::A);
        assert_eq!("CName".parse::<RecordType>().unwrap(), RecordType::Cname);
        assert_eq!("did".parse::<RecordType>().unwrap(), RecordType::Did);
        assert_eq!("MX".parse::<RecordType>().unwrap(), RecordType::Unspecified);
    }

    #[test]
    fn test_record_key() {
        let record = Record::new("structx.io", RecordType::A, b"10.0.0.1".to_vec(), 300);
        assert_eq!(record.key(), "structx.io:A");
    }

    #[test]
    fn test_record_type_serializes_as_name() {
        let json = serde_json::to_string(&RecordType::Cname).unwrap();
        assert_eq!(json, "\"CNAME\"");
        let back: RecordType = serde_json::from_str("\"cname\"").unwrap();
        assert_eq!(back, RecordType::Cname);
    }
}
