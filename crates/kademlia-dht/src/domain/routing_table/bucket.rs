//! K-Bucket implementation for Kademlia routing.

use crate::domain::{Contact, NodeId, Timestamp};

/// A k-bucket storing up to k contacts for one distance range.
///
/// Contacts are kept in insertion order. The bucket is not sorted; the
/// eviction candidate is found by scanning for the oldest `last_seen`.
///
/// When the bucket is full a newcomer does not displace anyone on its own.
/// The oldest contact is challenged with a PING first and only replaced if it
/// fails to answer (see `RoutingTable::resolve_eviction`).
#[derive(Debug, Clone, Default)]
pub struct KBucket {
    /// Contacts in this bucket (max size = K)
    pub(crate) contacts: Vec<Contact>,
}

impl KBucket {
    /// Create a new empty k-bucket
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of contacts in this bucket
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Check if the bucket is empty
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Check if the bucket is full
    pub fn is_full(&self, k: usize) -> bool {
        self.contacts.len() >= k
    }

    /// Get all contacts in this bucket
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Contact with the oldest `last_seen`; the earliest inserted wins ties.
    pub fn oldest(&self) -> Option<&Contact> {
        self.contacts.iter().min_by_key(|c| c.last_seen)
    }

    /// Check if bucket contains a contact
    pub fn contains(&self, id: &NodeId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &NodeId) -> Option<usize> {
        self.contacts.iter().position(|c| &c.id == id)
    }

    /// Append a contact (caller checks capacity)
    pub(crate) fn push(&mut self, contact: Contact) {
        self.contacts.push(contact);
    }

    /// Refresh `last_seen` and address of a known contact.
    pub(crate) fn refresh(&mut self, contact: &Contact, now: Timestamp) -> bool {
        match self.contacts.iter_mut().find(|c| c.id == contact.id) {
            Some(existing) => {
                existing.address = contact.address.clone();
                existing.last_seen = now;
                true
            }
            None => false,
        }
    }

    /// Update a contact's last_seen timestamp
    pub(crate) fn touch(&mut self, id: &NodeId, now: Timestamp) -> bool {
        match self.contacts.iter_mut().find(|c| &c.id == id) {
            Some(existing) => {
                existing.last_seen = now;
                true
            }
            None => false,
        }
    }

    /// Put `replacement` in the slot held by `id`, returning the evicted contact.
    pub(crate) fn replace(&mut self, id: &NodeId, replacement: Contact) -> Option<Contact> {
        let pos = self.position(id)?;
        Some(std::mem::replace(&mut self.contacts[pos], replacement))
    }
}
