//! Loopback transport connecting engines that live in one process.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::domain::{
    FindNodeRequest, FindNodeResponse, FindValueRequest, FindValueResponse, NodeAddress,
    PingRequest, PingResponse, RpcError, StoreRequest, StoreResponse,
};
use crate::ports::{KademliaRpcHandler, RpcClient};

/// In-process network of DHT nodes.
///
/// Each registered address maps to the handler answering for it. Handlers
/// are held weakly so the network never keeps an engine alive. Requests and
/// responses pass through the JSON codec on the way, the same encoding a
/// socket transport would put on the wire.
///
/// An address is unreachable when nothing is registered for it, its engine
/// has been dropped, or it was switched off with
/// [`set_reachable`](Self::set_reachable).
#[derive(Default)]
pub struct InMemoryNetwork {
    nodes: RwLock<HashMap<NodeAddress, Weak<dyn KademliaRpcHandler>>>,
    unreachable: RwLock<HashSet<NodeAddress>>,
}

impl InMemoryNetwork {
    /// Create an empty network.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route requests for `address` to `handler`.
    pub fn register<H>(&self, address: &NodeAddress, handler: &Arc<H>)
    where
        H: KademliaRpcHandler + 'static,
    {
        let handler: Arc<dyn KademliaRpcHandler> = handler.clone();
        self.nodes
            .write()
            .insert(address.clone(), Arc::downgrade(&handler));
    }

    /// Stop routing requests for `address`.
    pub fn unregister(&self, address: &NodeAddress) {
        self.nodes.write().remove(address);
    }

    /// Simulate a partition: while unreachable, every call to `address` fails.
    pub fn set_reachable(&self, address: &NodeAddress, reachable: bool) {
        let mut unreachable = self.unreachable.write();
        if reachable {
            unreachable.remove(address);
        } else {
            unreachable.insert(address.clone());
        }
    }

    /// Number of registered addresses.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    fn handler(&self, address: &NodeAddress) -> Result<Arc<dyn KademliaRpcHandler>, RpcError> {
        if self.unreachable.read().contains(address) {
            return Err(RpcError::Unreachable(address.to_string()));
        }
        self.nodes
            .read()
            .get(address)
            .and_then(Weak::upgrade)
            .ok_or_else(|| RpcError::Unreachable(address.to_string()))
    }
}

impl std::fmt::Debug for InMemoryNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryNetwork")
            .field("nodes", &self.nodes.read().len())
            .field("unreachable", &self.unreachable.read().len())
            .finish()
    }
}

/// Encode and decode a message as it would travel over a socket.
fn over_wire<T: Serialize + DeserializeOwned>(message: T) -> Result<T, RpcError> {
    let bytes = serde_json::to_vec(&message).map_err(|e| RpcError::Remote(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| RpcError::Remote(e.to_string()))
}

#[async_trait]
impl RpcClient for InMemoryNetwork {
    async fn ping(
        &self,
        target: &NodeAddress,
        request: PingRequest,
    ) -> Result<PingResponse, RpcError> {
        trace!(peer = %target, "PING");
        let handler = self.handler(target)?;
        let response = handler
            .handle_ping(over_wire(request)?)
            .await
            .map_err(|e| RpcError::Remote(e.to_string()))?;
        over_wire(response)
    }

    async fn find_node(
        &self,
        target: &NodeAddress,
        request: FindNodeRequest,
    ) -> Result<FindNodeResponse, RpcError> {
        trace!(peer = %target, target_id = %request.target, "FIND_NODE");
        let handler = self.handler(target)?;
        let response = handler
            .handle_find_node(over_wire(request)?)
            .await
            .map_err(|e| RpcError::Remote(e.to_string()))?;
        over_wire(response)
    }

    async fn find_value(
        &self,
        target: &NodeAddress,
        request: FindValueRequest,
    ) -> Result<FindValueResponse, RpcError> {
        trace!(peer = %target, key = %request.key, "FIND_VALUE");
        let handler = self.handler(target)?;
        let response = handler
            .handle_find_value(over_wire(request)?)
            .await
            .map_err(|e| RpcError::Remote(e.to_string()))?;
        over_wire(response)
    }

    async fn store(
        &self,
        target: &NodeAddress,
        request: StoreRequest,
    ) -> Result<StoreResponse, RpcError> {
        trace!(peer = %target, key = %request.key, "STORE");
        let handler = self.handler(target)?;
        let response = handler
            .handle_store(over_wire(request)?)
            .await
            .map_err(|e| RpcError::Remote(e.to_string()))?;
        over_wire(response)
    }
}
