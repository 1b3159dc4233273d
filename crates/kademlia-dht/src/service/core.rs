use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::{
    Contact, DhtError, KademliaConfig, NodeAddress, NodeId, Record, RoutingTable,
    RoutingTableStats, Timestamp,
};
use crate::ports::{ConfigProvider, RecordStore, RpcClient, TimeSource};

/// The DHT engine of one node.
///
/// Owns the routing table and wires it to the RPC client, the local record
/// store and the clock. All operations take `&self`; the engine is meant to
/// be shared behind an `Arc` between inbound RPC handling and outbound
/// lookups.
///
/// # Example
///
/// ```rust,ignore
/// use kademlia_dht::{DhtEngine, InMemoryNetwork, InMemoryRecordStore, SystemTimeSource};
///
/// let network = Arc::new(InMemoryNetwork::new());
/// let engine = Arc::new(DhtEngine::new(
///     NodeAddress::new("127.0.0.1", 53),
///     KademliaConfig::default(),
///     network.clone(),
///     Arc::new(InMemoryRecordStore::new()),
///     Box::new(SystemTimeSource),
/// ));
/// network.register(engine.address(), &engine);
/// ```
pub struct DhtEngine {
    /// Who we are; `last_seen` is stamped per message
    pub(crate) self_contact: Contact,
    /// Kademlia parameters
    pub(crate) config: KademliaConfig,
    /// Per-bucket locked routing table (domain layer)
    pub(crate) routing_table: RoutingTable,
    /// Outbound transport
    pub(crate) rpc: Arc<dyn RpcClient>,
    /// Local key/value store
    pub(crate) store: Arc<dyn RecordStore>,
    /// Time source for operations requiring timestamps
    pub(crate) time_source: Box<dyn TimeSource>,
    /// Cancelled on shutdown; bounds every RPC the engine issues
    pub(crate) shutdown: CancellationToken,
    /// Peers to join through, from configuration
    pub(crate) bootstrap_nodes: Vec<NodeAddress>,
}

impl DhtEngine {
    /// Create a new DHT engine listening on `address`.
    ///
    /// # Arguments
    ///
    /// * `address` - Our own address; the node id is its hash
    /// * `config` - Kademlia configuration
    /// * `rpc` - Client used for every outbound call
    /// * `store` - Local record store
    /// * `time_source` - Provider for current time
    pub fn new(
        address: NodeAddress,
        config: KademliaConfig,
        rpc: Arc<dyn RpcClient>,
        store: Arc<dyn RecordStore>,
        time_source: Box<dyn TimeSource>,
    ) -> Self {
        let self_contact = Contact::new(address, time_source.now());
        let routing_table = RoutingTable::new(self_contact.id, config.k);
        info!(
            node = %self_contact.address,
            id = %self_contact.id,
            k = config.k,
            "DHT engine created"
        );
        Self {
            self_contact,
            config,
            routing_table,
            rpc,
            store,
            time_source,
            shutdown: CancellationToken::new(),
            bootstrap_nodes: Vec::new(),
        }
    }

    /// Create an engine from a configuration source.
    ///
    /// The provider's bootstrap nodes are kept for
    /// [`join_configured`](Self::join_configured).
    pub fn from_config(
        provider: &dyn ConfigProvider,
        rpc: Arc<dyn RpcClient>,
        store: Arc<dyn RecordStore>,
        time_source: Box<dyn TimeSource>,
    ) -> Self {
        Self {
            bootstrap_nodes: provider.get_bootstrap_nodes(),
            ..Self::new(
                provider.get_local_address(),
                provider.get_kademlia_config(),
                rpc,
                store,
                time_source,
            )
        }
    }

    /// Get the current timestamp from the time source.
    pub(crate) fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    /// Our contact as sent in outbound messages.
    pub(crate) fn sender(&self) -> Contact {
        Contact {
            last_seen: self.now(),
            ..self.self_contact.clone()
        }
    }

    /// Our node id.
    pub fn local_id(&self) -> &NodeId {
        &self.self_contact.id
    }

    /// Our listening address.
    pub fn address(&self) -> &NodeAddress {
        &self.self_contact.address
    }

    /// Configured bootstrap peers, in the order they are tried.
    pub fn bootstrap_nodes(&self) -> &[NodeAddress] {
        &self.bootstrap_nodes
    }

    /// Kademlia parameters in effect.
    pub fn config(&self) -> &KademliaConfig {
        &self.config
    }

    /// Get the underlying routing table (for advanced operations).
    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    /// Up to K known contacts closest to `target`, closest first.
    pub fn closest_contacts(&self, target: &NodeId) -> Vec<Contact> {
        self.routing_table.closest_contacts(target, self.config.k)
    }

    /// Get current routing table statistics.
    pub fn stats(&self) -> RoutingTableStats {
        self.routing_table.stats()
    }

    /// Read a record from the local store only.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent; backend failures as `Store`.
    pub fn get_value(&self, key: &str) -> Result<Record, DhtError> {
        Ok(self.store.get(key)?)
    }

    /// Write a record into the local store only.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when the key is occupied.
    pub fn set_value(&self, key: &str, record: Record) -> Result<(), DhtError> {
        Ok(self.store.set(key, record)?)
    }

    /// Cancel every RPC the engine has in flight and refuse new ones.
    pub fn shutdown(&self) {
        info!(node = %self.self_contact.address, "DHT engine shutting down");
        self.shutdown.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) was called.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl std::fmt::Debug for DhtEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DhtEngine")
            .field("address", &self.self_contact.address)
            .field("id", &self.self_contact.id)
            .field("config", &self.config)
            .field("bootstrap_nodes", &self.bootstrap_nodes)
            .finish_non_exhaustive()
    }
}
