//! Inbound RPC handling.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{
    derive_id, Contact, DhtError, FindNodeRequest, FindNodeResponse, FindValueRequest,
    FindValueResponse, FindValueResult, PingRequest, PingResponse, StoreError, StoreRequest,
    StoreResponse,
};
use crate::ports::KademliaRpcHandler;

use super::core::DhtEngine;

impl DhtEngine {
    /// Validate the sender of an inbound request and remember it.
    ///
    /// Eviction pings triggered here are bound to the engine's shutdown
    /// token, since no caller is waiting on them.
    async fn observe_sender(&self, sender: &Contact) -> Result<(), DhtError> {
        if !sender.is_consistent() {
            warn!(
                peer = %sender.address,
                id = %sender.id,
                "Rejecting request whose sender id does not match its address"
            );
            return Err(DhtError::InvalidArgument(format!(
                "sender id {} is not the hash of {}",
                sender.id, sender.address
            )));
        }
        let shutdown = self.shutdown.clone();
        self.add_contact(sender.clone(), &shutdown).await
    }
}

#[async_trait]
impl KademliaRpcHandler for DhtEngine {
    async fn handle_ping(&self, request: PingRequest) -> Result<PingResponse, DhtError> {
        self.observe_sender(&request.sender).await?;
        Ok(PingResponse {
            sender: self.sender(),
            request_id: request.request_id,
        })
    }

    async fn handle_find_node(
        &self,
        request: FindNodeRequest,
    ) -> Result<FindNodeResponse, DhtError> {
        self.observe_sender(&request.sender).await?;
        Ok(FindNodeResponse {
            sender: self.sender(),
            request_id: request.request_id,
            closest: self.closest_contacts(&request.target),
        })
    }

    async fn handle_find_value(
        &self,
        request: FindValueRequest,
    ) -> Result<FindValueResponse, DhtError> {
        self.observe_sender(&request.sender).await?;
        let result = match self.store.get(&request.key) {
            Ok(record) => FindValueResult::Record(record),
            Err(StoreError::NotFound(_)) => {
                FindValueResult::ClosestContacts(self.closest_contacts(&derive_id(&request.key)))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(FindValueResponse {
            sender: self.sender(),
            request_id: request.request_id,
            result,
        })
    }

    async fn handle_store(&self, request: StoreRequest) -> Result<StoreResponse, DhtError> {
        self.observe_sender(&request.sender).await?;
        if request.key != request.record.key() {
            return Err(DhtError::InvalidArgument(format!(
                "store key {} does not match record {}",
                request.key,
                request.record.key()
            )));
        }
        let success = match self.store.set(&request.key, request.record) {
            Ok(()) => true,
            Err(StoreError::AlreadyExists(_)) => {
                debug!(key = %request.key, "STORE for a key we already hold");
                false
            }
            Err(e) => return Err(e.into()),
        };
        Ok(StoreResponse {
            sender: self.sender(),
            request_id: request.request_id,
            success,
        })
    }
}
