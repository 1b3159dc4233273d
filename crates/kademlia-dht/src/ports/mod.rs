//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! This module defines the port interfaces (traits) for the DHT engine.
//!
//! ## Architecture
//!
//! - **Driving Ports (Inbound):** RPCs this node answers for its peers
//! - **Driven Ports (Outbound):** SPIs the engine requires from adapters

pub mod inbound;
pub mod outbound;

pub use inbound::KademliaRpcHandler;
pub use outbound::{ConfigProvider, RecordStore, RpcClient, TimeSource};
