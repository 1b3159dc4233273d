//! Contact insertion with liveness-checked eviction.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::{Contact, DhtError, EvictionOutcome, InsertOutcome, RpcError};

use super::core::DhtEngine;

impl DhtEngine {
    /// Add a contact we heard from directly to the routing table.
    ///
    /// Self-insertion is a silent no-op and a known contact is refreshed.
    /// When the target bucket is full the oldest member is pinged: if it
    /// fails to answer (timeout, transport error or a mismatched request id)
    /// the newcomer replaces it; if it answers, its `last_seen` advances and
    /// the newcomer is dropped.
    ///
    /// No table lock is held while the liveness ping is in flight, so the
    /// pinged peer may call back into this node.
    ///
    /// # Errors
    ///
    /// - `BucketIndexOutOfRange` if the contact's id maps outside the table
    /// - `Cancelled` if the liveness ping was cancelled; the bucket is left
    ///   unchanged
    pub async fn add_contact(
        &self,
        contact: Contact,
        cancel: &CancellationToken,
    ) -> Result<(), DhtError> {
        let outcome = self.routing_table.try_insert(contact.clone(), self.now())?;
        self.settle_insert(outcome, contact, cancel).await
    }

    /// Add a contact listed by another peer.
    ///
    /// Same as [`add_contact`](Self::add_contact) for a newcomer, but a
    /// contact already in the table keeps its `last_seen`.
    pub(crate) async fn add_reported_contact(
        &self,
        contact: Contact,
        cancel: &CancellationToken,
    ) -> Result<(), DhtError> {
        let outcome = self.routing_table.try_insert_reported(contact.clone(), self.now())?;
        self.settle_insert(outcome, contact, cancel).await
    }

    async fn settle_insert(
        &self,
        outcome: InsertOutcome,
        contact: Contact,
        cancel: &CancellationToken,
    ) -> Result<(), DhtError> {
        let (index, oldest) = match outcome {
            InsertOutcome::SelfReference
            | InsertOutcome::Refreshed { .. }
            | InsertOutcome::Known { .. } => return Ok(()),
            InsertOutcome::Inserted { index } => {
                debug!(peer = %contact.address, bucket = index, "Contact inserted");
                return Ok(());
            }
            InsertOutcome::BucketFull { index, oldest } => (index, oldest),
        };

        let alive = match self.ping_peer(&oldest.address, cancel).await {
            Ok(_) => true,
            Err(RpcError::Cancelled) => return Err(DhtError::Cancelled),
            Err(e) => {
                debug!(peer = %oldest.address, error = %e, "Oldest contact failed liveness ping");
                false
            }
        };

        match self
            .routing_table
            .resolve_eviction(index, &oldest.id, alive, contact.clone(), self.now())
        {
            EvictionOutcome::OldestRetained => {
                debug!(
                    bucket = index,
                    kept = %oldest.address,
                    dropped = %contact.address,
                    "Bucket full, oldest contact still alive"
                );
            }
            EvictionOutcome::Replaced { evicted } => {
                debug!(
                    bucket = index,
                    evicted = %evicted.address,
                    inserted = %contact.address,
                    "Evicted unresponsive contact"
                );
            }
            EvictionOutcome::Inserted => {
                debug!(
                    bucket = index,
                    peer = %contact.address,
                    "Contact inserted after eviction check"
                );
            }
            EvictionOutcome::Dropped => {
                debug!(
                    bucket = index,
                    peer = %contact.address,
                    "Bucket changed during eviction check, contact dropped"
                );
            }
        }

        Ok(())
    }
}
