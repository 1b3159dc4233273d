//! Replicating a record to the nodes closest to its key.

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::{derive_id, DhtError, Record};

use super::core::DhtEngine;

impl DhtEngine {
    /// Store `record` locally under [`Record::key`], then send STORE to the
    /// K closest nodes to the key's identifier.
    ///
    /// Returns how many peers accepted the record. A peer that fails or
    /// already holds the key does not count.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the key is already stored locally
    /// - any error of the node lookup towards the key
    pub async fn store_value(
        &self,
        record: Record,
        cancel: &CancellationToken,
    ) -> Result<usize, DhtError> {
        let key = record.key();
        self.set_value(&key, record.clone())?;

        let peers = self.find_node(&derive_id(&key), cancel).await?;
        let acks = join_all(peers.iter().map(|peer| {
            let key = key.as_str();
            let record = &record;
            async move {
                match self.store_rpc(&peer.address, key, record, cancel).await {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        debug!(peer = %peer.address, key, error = %e, "STORE failed");
                        false
                    }
                }
            }
        }))
        .await;

        let replicas = acks.into_iter().filter(|accepted| *accepted).count();
        info!(key = %key, replicas, "Record published");
        Ok(replicas)
    }
}
