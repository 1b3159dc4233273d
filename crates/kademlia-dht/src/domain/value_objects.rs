//! Value Objects for the DHT

use std::fmt;

use primitive_types::U256;

use super::entities::ID_BITS;

/// XOR distance between two identifiers, as an unsigned big integer.
///
/// 160-bit distances are held in a `U256`, so ordering is numeric ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Distance(U256);

impl Distance {
    /// Build from the big-endian XOR bytes.
    pub fn from_big_endian(bytes: &[u8]) -> Self {
        Self(U256::from_big_endian(bytes))
    }

    /// Zero distance (an identifier compared with itself).
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// Whether both identifiers were equal.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Number of significant bits (0 for a zero distance).
    pub fn bit_len(&self) -> usize {
        self.0.bits()
    }

    /// Leading zero bits within the identifier width.
    pub fn leading_zeros(&self) -> usize {
        ID_BITS - self.bit_len()
    }

    /// The underlying integer.
    pub fn as_u256(&self) -> U256 {
        self.0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which k-bucket a remote identifier belongs to.
///
/// A node never stores a contact for itself, so the zero-distance case is a
/// distinct variant instead of a magic index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketIndex {
    /// Index into the routing table, `ID_BITS - 1 - leading_zeros(distance)`.
    Valid(usize),
    /// The remote identifier is our own; do not insert.
    SelfReference,
}

/// Configuration constants for Kademlia DHT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KademliaConfig {
    /// Replication factor: bucket capacity and lookup result size (default: 3)
    pub k: usize,
    /// Parallelism factor for lookup rounds (default: equal to k)
    pub alpha: usize,
    /// Hard cap on lookup rounds (default: k + 1)
    pub max_rounds: usize,
    /// Per-RPC deadline in milliseconds (default: 5000)
    pub rpc_timeout_ms: u64,
}

impl KademliaConfig {
    /// Replication factor used by the name-resolution network.
    pub const DEFAULT_K: usize = 3;

    /// Create a config suitable for testing (short RPC deadline)
    pub fn for_testing() -> Self {
        Self {
            rpc_timeout_ms: 200,
            ..Self::default()
        }
    }

    /// Per-RPC deadline.
    pub fn rpc_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.rpc_timeout_ms)
    }
}

impl Default for KademliaConfig {
    fn default() -> Self {
        Self {
            k: Self::DEFAULT_K,
            alpha: Self::DEFAULT_K,
            max_rounds: Self::DEFAULT_K + 1,
            rpc_timeout_ms: 5_000,
        }
    }
}
