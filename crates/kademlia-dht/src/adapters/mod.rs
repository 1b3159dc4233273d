//! # Adapters
//!
//! Concrete implementations of the outbound ports.
//!
//! ## Adapters Provided
//!
//! - `InMemoryRecordStore` - Record store kept in process memory
//! - `InMemoryNetwork` - Loopback RPC transport between engines in one process
//! - `SystemTimeSource` - Production time source using system clock
//! - `StaticConfigProvider` - Hardcoded configuration
//! - `TomlConfigProvider` - Config file loading (requires "toml-config" feature)
//! - `import_records` - Seed the local store from a JSON file

// Semantic submodules
/// Configuration providers
pub mod config;
/// In-memory record store
pub mod memory_store;
/// In-process network
pub mod network;
/// JSON record import
pub mod records;
/// Time source adapters
pub mod time;

// Re-export public API
pub use config::StaticConfigProvider;
pub use memory_store::InMemoryRecordStore;
pub use network::InMemoryNetwork;
pub use records::{import_records, RecordImportError};
pub use time::SystemTimeSource;

#[cfg(feature = "toml-config")]
pub use config::{ConfigError, TomlConfigProvider};

#[cfg(test)]
mod tests;
