//! Contact sorting and selection.

use super::distance::xor_distance;
use crate::domain::{Contact, NodeId};

/// Sort contacts by XOR distance to a target (closest first).
///
/// The sort is stable, so equal distances (only possible for duplicate ids)
/// keep their input order.
pub fn sort_by_distance(contacts: &mut [Contact], target: &NodeId) {
    contacts.sort_by_cached_key(|c| xor_distance(&c.id, target));
}

/// Find the k closest contacts to a target from a list
///
/// # Arguments
/// * `contacts` - List of all candidate contacts
/// * `target` - Target NodeId to measure distance from
/// * `k` - Maximum number of contacts to return
///
/// # Returns
/// Up to k contacts sorted by distance (closest first)
pub fn find_k_closest(mut contacts: Vec<Contact>, target: &NodeId, k: usize) -> Vec<Contact> {
    sort_by_distance(&mut contacts, target);
    contacts.truncate(k);
    contacts
}
