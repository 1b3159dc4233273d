//! # DHT Engine
//!
//! High-level service wiring the domain `RoutingTable` to the outbound ports
//! (RPC client, record store, clock) and implementing the inbound
//! `KademliaRpcHandler` port.
//!
//! Every outbound RPC is bound to a cancellation token and the configured
//! deadline. Peer-level failures are absorbed and logged inside lookup
//! rounds; store-level and invariant-level errors propagate.

// Semantic submodules
mod bootstrap;
mod contacts;
mod core;
mod handler;
mod lookup;
mod publish;
mod rpc;
mod value_lookup;

// Re-export public API
pub use self::core::DhtEngine;
