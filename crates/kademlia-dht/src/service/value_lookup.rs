//! Iterative value lookup.

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{derive_id, DhtError, FindValueResult, Record, StoreError};

use super::core::DhtEngine;
use super::lookup::Lookup;

impl DhtEngine {
    /// Resolve the record stored under `key`.
    ///
    /// The local store is consulted first and a hit returns without any
    /// network traffic. Otherwise rounds of FIND_VALUE run towards
    /// `derive_id(key)` exactly like [`find_node`](Self::find_node); the
    /// first record returned by any peer ends the lookup.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no peer returned the record within the round cap
    /// - `Store` (or `AlreadyExists`) for local store failures other than
    ///   not-found
    /// - `LookupFailed` if every peer queried in some round failed
    /// - `Cancelled` if `cancel` fired or the engine was shut down
    pub async fn find_value(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<Record, DhtError> {
        match self.store.get(key) {
            Ok(record) => return Ok(record),
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let target = derive_id(key);
        let k = self.config.k;
        let mut lookup = Lookup::new(
            *self.local_id(),
            target,
            k,
            self.routing_table.closest_contacts(&target, k),
        );

        for round in 0..self.config.max_rounds {
            let batch = lookup.next_batch(self.alpha());
            if batch.is_empty() {
                break;
            }

            let results = join_all(batch.iter().map(|peer| {
                let lookup = &lookup;
                async move {
                    match self.find_value_rpc(&peer.address, key, cancel).await {
                        Ok((_, FindValueResult::Record(record))) => Some(Some(record)),
                        Ok((responder, FindValueResult::ClosestContacts(contacts))) => {
                            self.absorb(lookup, responder, contacts, cancel).await;
                            Some(None)
                        }
                        Err(e) => {
                            debug!(
                                peer = %peer.address,
                                key,
                                round,
                                error = %e,
                                "FIND_VALUE failed"
                            );
                            None
                        }
                    }
                }
            }))
            .await;

            if cancel.is_cancelled() || self.shutdown.is_cancelled() {
                return Err(DhtError::Cancelled);
            }
            if results.iter().all(Option::is_none) {
                warn!(key, round, attempted = batch.len(), "Every peer in lookup round failed");
                return Err(DhtError::LookupFailed {
                    target,
                    attempted: batch.len(),
                });
            }
            if let Some(record) = results.into_iter().flatten().flatten().next() {
                info!(key, round, "Value found in network");
                return Ok(record);
            }
        }

        debug!(key, queried = lookup.queried_count(), "Value lookup exhausted");
        Err(DhtError::NotFound(key.to_string()))
    }
}
