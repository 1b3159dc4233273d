//! Main RoutingTable implementation.

use parking_lot::RwLock;

use crate::domain::{
    bucket_index, xor_distance, BucketIndex, Contact, DhtError, NodeId, Timestamp,
};

use super::bucket::KBucket;
use super::config::NUM_BUCKETS;

/// What happened when a contact was offered to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The contact is ourselves; nothing stored.
    SelfReference,
    /// Appended to a bucket with spare room.
    Inserted {
        /// Bucket that received it
        index: usize,
    },
    /// Already known; `last_seen` and address refreshed.
    Refreshed {
        /// Bucket holding it
        index: usize,
    },
    /// Already known from a second-hand report; left untouched.
    Known {
        /// Bucket holding it
        index: usize,
    },
    /// Bucket at capacity. The caller must ping `oldest` and report back via
    /// [`RoutingTable::resolve_eviction`].
    BucketFull {
        /// Bucket that is full
        index: usize,
        /// Contact with the oldest `last_seen`
        oldest: Contact,
    },
}

/// Result of settling a full-bucket challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvictionOutcome {
    /// The oldest contact answered; it was refreshed and the newcomer dropped.
    OldestRetained,
    /// The oldest contact did not answer and was replaced.
    Replaced {
        /// The contact that was removed
        evicted: Contact,
    },
    /// The oldest contact had already left and there was room.
    Inserted,
    /// The bucket changed while the challenge was in flight and has no room.
    Dropped,
}

/// Snapshot statistics across all buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingTableStats {
    /// Contacts across all buckets
    pub total_contacts: usize,
    /// Buckets holding at least one contact
    pub buckets_used: usize,
}

/// The routing table of a DHT node.
///
/// Fixed length, created once, and mutated only through [`try_insert`] and
/// [`resolve_eviction`]. Each bucket is guarded by its own `RwLock`; scans
/// across buckets (closest contacts, stats) lock one bucket at a time and
/// are point-in-time snapshots, not a consistent whole.
///
/// [`try_insert`]: RoutingTable::try_insert
/// [`resolve_eviction`]: RoutingTable::resolve_eviction
#[derive(Debug)]
pub struct RoutingTable {
    /// Our own node ID (immutable after creation)
    local_id: NodeId,
    /// Bucket capacity
    k: usize,
    /// One bucket per possible leading-zero count of the XOR distance
    buckets: Vec<RwLock<KBucket>>,
}

impl RoutingTable {
    /// Create a new routing table
    pub fn new(local_id: NodeId, k: usize) -> Self {
        let buckets = (0..NUM_BUCKETS).map(|_| RwLock::new(KBucket::new())).collect();
        Self {
            local_id,
            k: k.max(1),
            buckets,
        }
    }

    /// Get our local node ID
    pub fn local_id(&self) -> &NodeId {
        &self.local_id
    }

    /// Bucket capacity
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Resolve the bucket for `id`. `Ok(None)` for our own id.
    ///
    /// # Errors
    ///
    /// `BucketIndexOutOfRange` if the computed index does not fit the table.
    pub fn bucket_for(&self, id: &NodeId) -> Result<Option<usize>, DhtError> {
        match bucket_index(&self.local_id, id) {
            BucketIndex::SelfReference => Ok(None),
            BucketIndex::Valid(index) if index < self.buckets.len() => Ok(Some(index)),
            BucketIndex::Valid(index) => Err(DhtError::BucketIndexOutOfRange {
                index,
                node_id: *id,
                buckets: self.buckets.len(),
            }),
        }
    }

    /// Offer a contact we heard from directly (it sent us a request or
    /// answered one of ours) to its bucket.
    ///
    /// The contact's `last_seen` is set to `now`, also when it is already
    /// known. The bucket lock is held for the decision only and released
    /// before returning, so a `BucketFull` challenge can be pinged without
    /// holding any table lock.
    pub fn try_insert(&self, contact: Contact, now: Timestamp) -> Result<InsertOutcome, DhtError> {
        self.offer(contact, now, true)
    }

    /// Offer a contact that a third party told us about.
    ///
    /// A report is not proof of liveness: a known contact keeps its
    /// `last_seen` and address (`Known`), so a dead peer that others keep
    /// listing still ages towards eviction. New contacts are handled as in
    /// [`try_insert`](Self::try_insert).
    pub fn try_insert_reported(
        &self,
        contact: Contact,
        now: Timestamp,
    ) -> Result<InsertOutcome, DhtError> {
        self.offer(contact, now, false)
    }

    fn offer(
        &self,
        mut contact: Contact,
        now: Timestamp,
        seen_directly: bool,
    ) -> Result<InsertOutcome, DhtError> {
        let Some(index) = self.bucket_for(&contact.id)? else {
            return Ok(InsertOutcome::SelfReference);
        };
        contact.last_seen = now;

        let mut bucket = self.buckets[index].write();

        if !seen_directly && bucket.contains(&contact.id) {
            return Ok(InsertOutcome::Known { index });
        }
        if bucket.refresh(&contact, now) {
            return Ok(InsertOutcome::Refreshed { index });
        }

        if !bucket.is_full(self.k) {
            bucket.push(contact);
            return Ok(InsertOutcome::Inserted { index });
        }

        match bucket.oldest().cloned() {
            Some(oldest) => Ok(InsertOutcome::BucketFull { index, oldest }),
            None => {
                bucket.push(contact);
                Ok(InsertOutcome::Inserted { index })
            }
        }
    }

    /// Settle a full-bucket challenge after pinging the oldest contact.
    ///
    /// Re-locks the bucket and re-checks membership, since other inserts may
    /// have run while the ping was in flight.
    pub fn resolve_eviction(
        &self,
        index: usize,
        oldest: &NodeId,
        oldest_alive: bool,
        mut candidate: Contact,
        now: Timestamp,
    ) -> EvictionOutcome {
        let Some(lock) = self.buckets.get(index) else {
            return EvictionOutcome::Dropped;
        };
        let mut bucket = lock.write();

        if oldest_alive {
            bucket.touch(oldest, now);
            return EvictionOutcome::OldestRetained;
        }

        candidate.last_seen = now;
        if bucket.contains(&candidate.id) {
            // Candidate got in by another path; still drop the dead contact
            return match bucket.contacts.iter().position(|c| &c.id == oldest) {
                Some(pos) => EvictionOutcome::Replaced {
                    evicted: bucket.contacts.remove(pos),
                },
                None => EvictionOutcome::Inserted,
            };
        }

        if let Some(evicted) = bucket.replace(oldest, candidate.clone()) {
            return EvictionOutcome::Replaced { evicted };
        }

        if !bucket.is_full(self.k) {
            bucket.push(candidate);
            return EvictionOutcome::Inserted;
        }

        EvictionOutcome::Dropped
    }

    /// Up to `limit` contacts sorted ascending by distance to `target`.
    ///
    /// Empty table yields an empty list.
    pub fn closest_contacts(&self, target: &NodeId, limit: usize) -> Vec<Contact> {
        let mut candidates: Vec<_> = self
            .buckets
            .iter()
            .flat_map(|lock| lock.read().contacts().to_vec())
            .map(|c| (xor_distance(&c.id, target), c))
            .collect();

        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        candidates
            .into_iter()
            .take(limit)
            .map(|(_, c)| c)
            .collect()
    }

    /// Look up a stored contact by id.
    pub fn get(&self, id: &NodeId) -> Option<Contact> {
        let index = self.bucket_for(id).ok().flatten()?;
        let bucket = self.buckets[index].read();
        bucket.contacts().iter().find(|c| &c.id == id).cloned()
    }

    /// Check if a contact is stored.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Snapshot of one bucket's contacts.
    pub fn bucket_contacts(&self, index: usize) -> Option<Vec<Contact>> {
        self.buckets.get(index).map(|lock| lock.read().contacts().to_vec())
    }

    /// Get total contact count across all buckets
    pub fn total_contacts(&self) -> usize {
        self.buckets.iter().map(|lock| lock.read().len()).sum()
    }

    /// Get routing table statistics
    pub fn stats(&self) -> RoutingTableStats {
        let mut stats = RoutingTableStats {
            total_contacts: 0,
            buckets_used: 0,
        };

        for lock in &self.buckets {
            let len = lock.read().len();
            if len > 0 {
                stats.total_contacts += len;
                stats.buckets_used += 1;
            }
        }

        stats
    }

    #[cfg(test)]
    pub(crate) fn bucket_lock(&self, index: usize) -> &RwLock<KBucket> {
        &self.buckets[index]
    }
}
