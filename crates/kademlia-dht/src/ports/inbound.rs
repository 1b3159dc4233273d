//! # Driving Ports (Inbound API)
//!
//! Server side of the four Kademlia RPCs. A transport adapter decodes an
//! incoming request, hands it to this trait and encodes the answer.

use async_trait::async_trait;

use crate::domain::{
    DhtError, FindNodeRequest, FindNodeResponse, FindValueRequest, FindValueResponse,
    PingRequest, PingResponse, StoreRequest, StoreResponse,
};

/// Handles RPCs addressed to this node.
///
/// Every handler first checks that the sender's identifier is the hash of
/// its advertised address, then records the sender in the routing table.
/// Responses echo the request's `request_id`.
///
/// # Errors
///
/// `DhtError::InvalidArgument` when the sender is inconsistent. Store
/// failures surface as their `DhtError` counterparts.
#[async_trait]
pub trait KademliaRpcHandler: Send + Sync {
    /// Answer a liveness check.
    async fn handle_ping(&self, request: PingRequest) -> Result<PingResponse, DhtError>;

    /// Return up to K locally known contacts closest to the target.
    async fn handle_find_node(&self, request: FindNodeRequest)
        -> Result<FindNodeResponse, DhtError>;

    /// Return the local record, or the closest contacts to the key.
    async fn handle_find_value(
        &self,
        request: FindValueRequest,
    ) -> Result<FindValueResponse, DhtError>;

    /// Hold a record on behalf of a peer.
    async fn handle_store(&self, request: StoreRequest) -> Result<StoreResponse, DhtError>;
}
