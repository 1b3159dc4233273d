//! Iterative node lookup.
//!
//! A lookup runs at most `max_rounds` rounds. Each round queries up to
//! `alpha` not-yet-queried peers from the K closest discovered so far, waits
//! for every call to finish, then merges what came back.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::{find_k_closest, Contact, DhtError, NodeId};

use super::core::DhtEngine;

/// Per-lookup bookkeeping.
///
/// `discovered` is written by the concurrent calls of a round and has its
/// own lock, distinct from the routing table's bucket locks. `queried` is
/// only touched between rounds.
pub(crate) struct Lookup {
    local_id: NodeId,
    target: NodeId,
    k: usize,
    discovered: Mutex<HashMap<NodeId, Contact>>,
    queried: HashSet<NodeId>,
}

impl Lookup {
    /// Start a lookup seeded with the local table's closest contacts.
    pub(crate) fn new(local_id: NodeId, target: NodeId, k: usize, seeds: Vec<Contact>) -> Self {
        let lookup = Self {
            local_id,
            target,
            k,
            discovered: Mutex::new(HashMap::new()),
            queried: HashSet::new(),
        };
        lookup.merge(seeds);
        lookup
    }

    /// Add contacts not seen before (our own id excluded); returns how many
    /// were new.
    pub(crate) fn merge(&self, contacts: impl IntoIterator<Item = Contact>) -> usize {
        let mut discovered = self.discovered.lock();
        let mut added = 0;
        for contact in contacts {
            if contact.id == self.local_id {
                continue;
            }
            if let std::collections::hash_map::Entry::Vacant(slot) = discovered.entry(contact.id) {
                slot.insert(contact);
                added += 1;
            }
        }
        added
    }

    /// Pick the next peers to query and mark them queried.
    ///
    /// Candidates are every discovered contact not queried yet, closest
    /// first and capped at K, of which at most `alpha` are taken. Farther
    /// contacts stay eligible once the closest ones have all been asked.
    pub(crate) fn next_batch(&mut self, alpha: usize) -> Vec<Contact> {
        let pending: Vec<Contact> = self
            .discovered
            .lock()
            .values()
            .filter(|c| !self.queried.contains(&c.id))
            .cloned()
            .collect();
        let batch = find_k_closest(pending, &self.target, self.k.min(alpha));
        self.queried.extend(batch.iter().map(|c| c.id));
        batch
    }

    /// The K closest discovered contacts, closest first.
    pub(crate) fn closest(&self) -> Vec<Contact> {
        let all: Vec<Contact> = self.discovered.lock().values().cloned().collect();
        find_k_closest(all, &self.target, self.k)
    }

    /// Number of peers queried so far.
    pub(crate) fn queried_count(&self) -> usize {
        self.queried.len()
    }
}

impl DhtEngine {
    /// Parallelism factor, never below one.
    pub(crate) fn alpha(&self) -> usize {
        self.config.alpha.max(1)
    }

    /// Add every contact a peer told us about, plus the peer itself.
    ///
    /// Only the responder has proven itself alive; the contacts it lists are
    /// inserted when new but do not refresh entries we already hold.
    pub(crate) async fn absorb(
        &self,
        lookup: &Lookup,
        responder: Contact,
        contacts: Vec<Contact>,
        cancel: &CancellationToken,
    ) {
        let learned = std::iter::once((responder, true))
            .chain(contacts.into_iter().map(|contact| (contact, false)));

        for (contact, answered) in learned {
            if contact.id == *self.local_id() {
                continue;
            }
            if !contact.is_consistent() {
                warn!(
                    peer = %contact.address,
                    id = %contact.id,
                    "Dropping contact whose id does not match its address"
                );
                continue;
            }
            let added = if answered {
                self.add_contact(contact.clone(), cancel).await
            } else {
                self.add_reported_contact(contact.clone(), cancel).await
            };
            if let Err(e) = added {
                debug!(peer = %contact.address, error = %e, "Could not add discovered contact");
            }
            lookup.merge(std::iter::once(contact));
        }
    }

    /// Find the K contacts closest to `target` anywhere in the network.
    ///
    /// Contacts learned along the way are inserted into the routing table.
    /// A peer that fails to answer contributes nothing to its round.
    ///
    /// # Errors
    ///
    /// - `LookupFailed` if every peer queried in some round failed
    /// - `Cancelled` if `cancel` fired or the engine was shut down
    pub async fn find_node(
        &self,
        target: &NodeId,
        cancel: &CancellationToken,
    ) -> Result<Vec<Contact>, DhtError> {
        let k = self.config.k;
        let mut lookup = Lookup::new(
            *self.local_id(),
            *target,
            k,
            self.routing_table.closest_contacts(target, k),
        );

        for round in 0..self.config.max_rounds {
            let batch = lookup.next_batch(self.alpha());
            if batch.is_empty() {
                break;
            }

            let results = join_all(batch.iter().map(|peer| {
                let lookup = &lookup;
                async move {
                    match self.find_node_rpc(&peer.address, target, cancel).await {
                        Ok((responder, contacts)) => {
                            self.absorb(lookup, responder, contacts, cancel).await;
                            true
                        }
                        Err(e) => {
                            debug!(
                                peer = %peer.address,
                                %target,
                                round,
                                error = %e,
                                "FIND_NODE failed"
                            );
                            false
                        }
                    }
                }
            }))
            .await;

            if cancel.is_cancelled() || self.shutdown.is_cancelled() {
                return Err(DhtError::Cancelled);
            }
            if !results.iter().any(|answered| *answered) {
                warn!(%target, round, attempted = batch.len(), "Every peer in lookup round failed");
                return Err(DhtError::LookupFailed {
                    target: *target,
                    attempted: batch.len(),
                });
            }
        }

        let closest = lookup.closest();
        debug!(
            %target,
            found = closest.len(),
            queried = lookup.queried_count(),
            "Node lookup completed"
        );
        Ok(closest)
    }
}
