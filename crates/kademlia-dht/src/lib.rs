//! # Kademlia DHT for Name Resolution
//!
//! This crate implements the Kademlia Distributed Hash Table that a
//! decentralized name-resolution service uses to find peers and to locate
//! DNS records held by other nodes.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** Pure Kademlia logic (SHA-1 identifiers, XOR distance,
//!   k-buckets, routing table, message shapes)
//! - **Ports Layer:** Trait definitions for the RPC transport, record store,
//!   clock and configuration
//! - **Service Layer:** `DhtEngine`, wiring domain to ports (iterative
//!   lookups, bootstrap, publishing, inbound RPC handling)
//! - **Adapters Layer:** In-memory store and network, system clock, config
//!   providers, JSON record import
//!
//! ## Example
//!
//! ```rust
//! use kademlia_dht::{derive_id, Contact, NodeAddress, RoutingTable, Timestamp};
//!
//! let local = NodeAddress::new("127.0.0.1", 53);
//! let table = RoutingTable::new(local.node_id(), 3);
//!
//! let peer = Contact::new(NodeAddress::new("127.0.0.2", 53), Timestamp::new(1000));
//! table.try_insert(peer, Timestamp::new(1000)).unwrap();
//!
//! let closest = table.closest_contacts(&derive_id("127.0.0.1:53"), 3);
//! assert_eq!(closest.len(), 1);
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Test utilities (ControllableTimeSource, ScriptedRpcClient).
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// =============================================================================
// RE-EXPORTS
// =============================================================================

// Domain entities
pub use domain::{
    BucketIndex, Contact, DhtError, Distance, ErrorKind, KBucket, KademliaConfig, NodeAddress,
    NodeId, Record, RecordType, RoutingTable, RoutingTableStats, RpcError, StoreError, Timestamp,
    ID_BITS, ID_LENGTH,
};

// Domain services
pub use domain::{bucket_index, derive_id, find_k_closest, sort_by_distance, xor_distance};

// RPC messages
pub use domain::{
    FindNodeRequest, FindNodeResponse, FindValueRequest, FindValueResponse, FindValueResult,
    PingRequest, PingResponse, StoreRequest, StoreResponse,
};

// Ports
pub use ports::{ConfigProvider, KademliaRpcHandler, RecordStore, RpcClient, TimeSource};

// Service
pub use service::DhtEngine;

// Adapters
pub use adapters::{
    import_records, InMemoryNetwork, InMemoryRecordStore, RecordImportError, StaticConfigProvider,
    SystemTimeSource,
};

#[cfg(feature = "toml-config")]
pub use adapters::{ConfigError, TomlConfigProvider};

// Cancellation tokens accepted by every network operation
pub use tokio_util::sync::CancellationToken;
