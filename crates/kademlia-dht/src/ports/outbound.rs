//! # Driven Ports (Outbound SPI)
//!
//! These are the interfaces the DHT engine **requires** the host application
//! to implement: a transport for the four RPCs, a key/value store for
//! records, a clock and a configuration source.

use async_trait::async_trait;

use crate::domain::{
    FindNodeRequest, FindNodeResponse, FindValueRequest, FindValueResponse, KademliaConfig,
    NodeAddress, PingRequest, PingResponse, Record, RpcError, StoreError, StoreRequest,
    StoreResponse, Timestamp,
};

/// Client side of the peer-to-peer RPC transport.
///
/// One call per request, answered by one response. Implementations own
/// encoding, dialing and connection reuse; the engine owns deadlines,
/// cancellation and the request-id check.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: a lookup round issues its calls
/// concurrently from a single shared client.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Liveness check.
    async fn ping(&self, target: &NodeAddress, request: PingRequest)
        -> Result<PingResponse, RpcError>;

    /// Ask `target` for the contacts it knows closest to `request.target`.
    async fn find_node(
        &self,
        target: &NodeAddress,
        request: FindNodeRequest,
    ) -> Result<FindNodeResponse, RpcError>;

    /// Ask `target` for the record under `request.key`.
    async fn find_value(
        &self,
        target: &NodeAddress,
        request: FindValueRequest,
    ) -> Result<FindValueResponse, RpcError>;

    /// Ask `target` to hold a record.
    async fn store(
        &self,
        target: &NodeAddress,
        request: StoreRequest,
    ) -> Result<StoreResponse, RpcError>;
}

/// Local key/value store holding DNS records.
///
/// The DHT consults it before going to the network and writes into it when a
/// peer asks us to STORE.
pub trait RecordStore: Send + Sync {
    /// Fetch the record under `key`.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` when absent; anything else is a backend failure.
    fn get(&self, key: &str) -> Result<Record, StoreError>;

    /// Insert a record under `key`.
    ///
    /// # Errors
    ///
    /// `StoreError::AlreadyExists` when the key is occupied.
    fn set(&self, key: &str, record: Record) -> Result<(), StoreError>;
}

/// Abstract interface for time (enables deterministic testing).
pub trait TimeSource: Send + Sync {
    /// Get the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Abstract interface for configuration loading.
///
/// Allows different configuration sources (file, static values, etc.)
pub trait ConfigProvider: Send + Sync {
    /// Address this node listens on; its identifier is derived from it.
    fn get_local_address(&self) -> NodeAddress;

    /// Well-known peers used to join the network.
    fn get_bootstrap_nodes(&self) -> Vec<NodeAddress>;

    /// Kademlia parameters (k, alpha, round cap, RPC deadline).
    fn get_kademlia_config(&self) -> KademliaConfig;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test-only TimeSource returning a fixed timestamp for deterministic assertions.
    struct FixedTimeSource(u64);

    impl TimeSource for FixedTimeSource {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0)
        }
    }

    #[test]
    fn test_fixed_time_source_returns_configured_value() {
        let source = FixedTimeSource(1000);
        assert_eq!(source.now().as_secs(), 1000);
    }

    #[test]
    fn test_ports_are_object_safe() {
        fn assert_object_safe(_: Option<&dyn RpcClient>, _: Option<&dyn RecordStore>) {}
        assert_object_safe(None, None);
    }
}
