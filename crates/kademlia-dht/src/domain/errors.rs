//! Domain Errors for the DHT
//!
//! Peer-level failures (`RpcError`) are absorbed inside lookup rounds.
//! Store-level and invariant-level failures propagate as `DhtError`.

use thiserror::Error;

use super::entities::{NodeAddress, NodeId};

/// Coarse classification exposed to the layer above the DHT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The value does not exist locally or anywhere in the network.
    NotFound,
    /// The caller supplied something malformed or conflicting.
    InvalidArgument,
    /// Anything else: connectivity, invariants, backend failures.
    Internal,
}

/// Errors returned by DHT engine operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DhtError {
    /// Key absent from the local store, or from the whole network after a lookup.
    #[error("key not found: {0}")]
    NotFound(String),

    /// The store enforces uniqueness and the key is occupied.
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    /// Malformed identifier, address or request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A computed bucket index fell outside the table. Indicates identifier
    /// derivation or table sizing corruption.
    #[error("bucket index {index} out of range for node {node_id} (table has {buckets} buckets)")]
    BucketIndexOutOfRange {
        /// Offending index
        index: usize,
        /// Identifier that produced it
        node_id: NodeId,
        /// Table length
        buckets: usize,
    },

    /// Every peer queried during the lookup failed to answer.
    #[error("lookup for {target} failed: all {attempted} queried peers were unreachable")]
    LookupFailed {
        /// Lookup target
        target: NodeId,
        /// Number of peers queried
        attempted: usize,
    },

    /// The bootstrap peer did not answer the initial ping.
    #[error("bootstrap via {address} failed: {source}")]
    Bootstrap {
        /// Peer we tried to join through
        address: NodeAddress,
        /// Why the ping failed
        #[source]
        source: RpcError,
    },

    /// The caller's cancellation signal fired.
    #[error("operation cancelled")]
    Cancelled,

    /// The local store failed for a reason other than not-found/already-exists.
    #[error("store backend error: {0}")]
    Store(String),
}

impl DhtError {
    /// Three-way classification for the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) | Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::BucketIndexOutOfRange { .. }
            | Self::LookupFailed { .. }
            | Self::Bootstrap { .. }
            | Self::Cancelled
            | Self::Store(_) => ErrorKind::Internal,
        }
    }

    /// Whether this is the expected "absent" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Failure of a single outbound RPC to a single peer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// No answer within the per-RPC deadline.
    #[error("rpc timed out")]
    Timeout,

    /// Dial or transport failure.
    #[error("peer unreachable: {0}")]
    Unreachable(String),

    /// Response did not echo the request's correlation id.
    #[error("request id mismatch: expected {expected}, got {actual}")]
    RequestIdMismatch {
        /// Id we sent
        expected: String,
        /// Id the peer echoed
        actual: String,
    },

    /// The peer answered with an error status.
    #[error("remote error: {0}")]
    Remote(String),

    /// The parent operation was cancelled while the call was in flight.
    #[error("rpc cancelled")]
    Cancelled,
}

/// Errors from the local key/value store collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No record under the key.
    #[error("key not found: {0}")]
    NotFound(String),

    /// A record already occupies the key.
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    /// Backend failure.
    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for DhtError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => Self::NotFound(key),
            StoreError::AlreadyExists(key) => Self::AlreadyExists(key),
            StoreError::Backend(reason) => Self::Store(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_three_way() {
        assert_eq!(DhtError::NotFound("k".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            DhtError::InvalidArgument("bad".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            DhtError::AlreadyExists("k".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(DhtError::Cancelled.kind(), ErrorKind::Internal);
        assert_eq!(
            DhtError::LookupFailed {
                target: NodeId::derive("t"),
                attempted: 3
            }
            .kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_store_error_conversion() {
        assert_eq!(
            DhtError::from(StoreError::NotFound("a".into())),
            DhtError::NotFound("a".into())
        );
        assert_eq!(
            DhtError::from(StoreError::AlreadyExists("a".into())),
            DhtError::AlreadyExists("a".into())
        );
        assert_eq!(
            DhtError::from(StoreError::Backend("disk".into())),
            DhtError::Store("disk".into())
        );
    }

    #[test]
    fn test_rpc_error_display() {
        assert_eq!(RpcError::Timeout.to_string(), "rpc timed out");
        assert_eq!(
            RpcError::RequestIdMismatch {
                expected: "a".into(),
                actual: "b".into()
            }
            .to_string(),
            "request id mismatch: expected a, got b"
        );
    }
}
