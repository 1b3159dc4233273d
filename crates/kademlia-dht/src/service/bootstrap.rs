//! Joining an existing network.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::{Contact, DhtError, NodeAddress, RpcError};

use super::core::DhtEngine;

impl DhtEngine {
    /// Join the network through one known peer.
    ///
    /// Pings `peer`, inserts it on success, then looks up our own id to
    /// fill the routing table with our nearest neighbours. Returns the
    /// contacts that lookup found.
    ///
    /// # Errors
    ///
    /// - `Bootstrap` if the ping fails; the routing table is untouched
    /// - `Cancelled` if `cancel` fired
    /// - any error of the follow-up [`find_node`](Self::find_node)
    pub async fn bootstrap(
        &self,
        peer: &NodeAddress,
        cancel: &CancellationToken,
    ) -> Result<Vec<Contact>, DhtError> {
        match self.ping_peer(peer, cancel).await {
            Ok(_) => {}
            Err(RpcError::Cancelled) => return Err(DhtError::Cancelled),
            Err(source) => {
                warn!(peer = %peer, error = %source, "Bootstrap peer did not answer");
                return Err(DhtError::Bootstrap {
                    address: peer.clone(),
                    source,
                });
            }
        }

        self.add_contact(Contact::new(peer.clone(), self.now()), cancel)
            .await?;

        let neighbours = self.find_node(self.local_id(), cancel).await?;
        info!(
            peer = %peer,
            neighbours = neighbours.len(),
            contacts = self.routing_table.total_contacts(),
            "Bootstrap complete"
        );
        Ok(neighbours)
    }

    /// Bootstrap through the first configured peer that answers.
    ///
    /// An empty list means this node starts a new network and succeeds
    /// with no neighbours.
    ///
    /// # Errors
    ///
    /// The last peer's error when none of them could be joined through.
    pub async fn join(
        &self,
        peers: &[NodeAddress],
        cancel: &CancellationToken,
    ) -> Result<Vec<Contact>, DhtError> {
        let mut last_error = None;
        for peer in peers {
            match self.bootstrap(peer, cancel).await {
                Ok(neighbours) => return Ok(neighbours),
                Err(DhtError::Cancelled) => return Err(DhtError::Cancelled),
                Err(e) => last_error = Some(e),
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => {
                info!(
                    node = %self.address(),
                    "No bootstrap peers configured, starting new network"
                );
                Ok(Vec::new())
            }
        }
    }

    /// [`join`](Self::join) through the bootstrap nodes the engine was
    /// configured with.
    ///
    /// # Errors
    ///
    /// As for [`join`](Self::join).
    pub async fn join_configured(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Contact>, DhtError> {
        self.join(&self.bootstrap_nodes, cancel).await
    }
}
