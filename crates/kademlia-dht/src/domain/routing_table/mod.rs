//! Routing Table Implementation
//!
//! A fixed array of k-buckets indexed by the magnitude of the XOR distance
//! from the local identifier. Each bucket carries its own lock; there is no
//! table-wide lock.

// Semantic submodules
mod bucket;
mod config;
mod table;

// Re-export public API
pub use bucket::KBucket;
pub use config::NUM_BUCKETS;
pub use table::{EvictionOutcome, InsertOutcome, RoutingTable, RoutingTableStats};
