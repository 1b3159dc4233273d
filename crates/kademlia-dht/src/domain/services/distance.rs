//! Kademlia distance calculations.

use crate::domain::{BucketIndex, Distance, NodeId, ID_BITS, ID_LENGTH};

/// Derive the identifier of a node address or lookup key.
///
/// One-way SHA-1 of `s`; the same input always yields the same identifier.
pub fn derive_id(s: &str) -> NodeId {
    NodeId::derive(s)
}

/// Calculate the XOR distance between two NodeIds
///
/// # Properties
/// - Symmetric: `xor_distance(a, b) == xor_distance(b, a)`
/// - Self is zero: `xor_distance(a, a) == Distance::zero()`
pub fn xor_distance(a: &NodeId, b: &NodeId) -> Distance {
    let mut xor = [0u8; ID_LENGTH];
    for (out, (x, y)) in xor.iter_mut().zip(a.as_bytes().iter().zip(b.as_bytes())) {
        *out = x ^ y;
    }
    Distance::from_big_endian(&xor)
}

/// Calculate the bucket index for a remote node relative to the local node.
///
/// `ID_BITS - 1 - leading_zeros(distance)`: peers differing in the top bit
/// land in bucket 159, peers differing only in the lowest bit in bucket 0.
/// Our own identifier has no bucket.
pub fn bucket_index(local: &NodeId, remote: &NodeId) -> BucketIndex {
    let distance = xor_distance(local, remote);
    if distance.is_zero() {
        return BucketIndex::SelfReference;
    }
    BucketIndex::Valid(ID_BITS - 1 - distance.leading_zeros())
}
