//! Centralized Testing Utilities
//!
//! Test helpers and mocks used across the crate and by downstream tests.
//! Available with the `test-utils` feature flag.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{
    bucket_index, BucketIndex, Contact, FindNodeRequest, FindNodeResponse, FindValueRequest,
    FindValueResponse, FindValueResult, NodeAddress, NodeId, PingRequest, PingResponse, Record,
    RpcError, StoreRequest, StoreResponse, Timestamp,
};
use crate::ports::{RpcClient, TimeSource};

/// Thread-safe TimeSource for tests requiring time advancement.
///
/// Clones share the same clock, so a test can keep one handle and give
/// another to the engine.
///
/// # Example
///
/// ```rust,ignore
/// use kademlia_dht::testing::ControllableTimeSource;
/// use kademlia_dht::TimeSource;
///
/// let time = ControllableTimeSource::new(1000);
/// let engine_clock = time.clone();
/// time.advance(5);
/// assert_eq!(engine_clock.now().as_secs(), 1005);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ControllableTimeSource {
    time: Arc<AtomicU64>,
}

impl ControllableTimeSource {
    /// Create a clock reading `initial` seconds.
    pub fn new(initial: u64) -> Self {
        Self {
            time: Arc::new(AtomicU64::new(initial)),
        }
    }

    /// Advances the clock by the specified seconds.
    pub fn advance(&self, secs: u64) {
        self.time.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, secs: u64) {
        self.time.store(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ControllableTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.time.load(Ordering::SeqCst))
    }
}

/// Find `count` addresses on port 53 whose ids fall into one bucket of a
/// table owned by `local`. Returns that bucket's index and the addresses.
pub fn addresses_in_same_bucket(
    local: &NodeId,
    count: usize,
) -> Option<(usize, Vec<NodeAddress>)> {
    let mut by_bucket: HashMap<usize, Vec<NodeAddress>> = HashMap::new();
    for i in 0..65_536u32 {
        let address = NodeAddress::new(format!("10.{}.{}.1", i / 256, i % 256), 53);
        if let BucketIndex::Valid(index) = bucket_index(local, &address.node_id()) {
            let found = by_bucket.entry(index).or_default();
            found.push(address);
            if found.len() == count {
                return Some((index, found.clone()));
            }
        }
    }
    None
}

/// How a scripted peer reacts to any RPC.
#[derive(Debug, Clone)]
pub enum PeerScript {
    /// Answer normally. FIND_NODE returns `contacts`; FIND_VALUE returns
    /// `record` when set, else `contacts`; STORE succeeds.
    Respond {
        /// Contacts handed out by FIND_NODE / FIND_VALUE
        contacts: Vec<Contact>,
        /// Record handed out by FIND_VALUE
        record: Option<Record>,
    },
    /// Fail every call with this error.
    Fail(RpcError),
    /// Answer, but echo the wrong request id.
    WrongRequestId,
    /// Never answer.
    Hang,
}

impl PeerScript {
    /// A live peer that knows nobody.
    pub fn alive() -> Self {
        Self::Respond {
            contacts: Vec::new(),
            record: None,
        }
    }

    /// A live peer that hands out `contacts`.
    pub fn knows(contacts: Vec<Contact>) -> Self {
        Self::Respond {
            contacts,
            record: None,
        }
    }

    /// A live peer holding `record`.
    pub fn holds(record: Record) -> Self {
        Self::Respond {
            contacts: Vec::new(),
            record: Some(record),
        }
    }
}

/// Which RPC a [`ScriptedRpcClient`] saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcKind {
    /// PING
    Ping,
    /// FIND_NODE
    FindNode,
    /// FIND_VALUE
    FindValue,
    /// STORE
    Store,
}

/// `RpcClient` whose peers follow per-address scripts.
///
/// Addresses without a script are unreachable. Every call is recorded.
#[derive(Debug, Default)]
pub struct ScriptedRpcClient {
    scripts: Mutex<HashMap<NodeAddress, PeerScript>>,
    calls: Mutex<Vec<(RpcKind, NodeAddress)>>,
}

impl ScriptedRpcClient {
    /// Create a client where every peer is unreachable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how `address` behaves from now on.
    pub fn script(&self, address: NodeAddress, script: PeerScript) {
        self.scripts.lock().insert(address, script);
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<(RpcKind, NodeAddress)> {
        self.calls.lock().clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of calls of one kind made to `address`.
    pub fn calls_to(&self, kind: RpcKind, address: &NodeAddress) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(k, a)| *k == kind && a == address)
            .count()
    }

    /// Record the call and resolve the script, answering with `request_id`
    /// or a wrong one.
    async fn dispatch(
        &self,
        kind: RpcKind,
        target: &NodeAddress,
        request_id: String,
    ) -> Result<(PeerScript, Contact, String), RpcError> {
        self.calls.lock().push((kind, target.clone()));
        let script = self.scripts.lock().get(target).cloned();
        let responder = Contact::new(target.clone(), Timestamp::new(0));
        match script {
            None => Err(RpcError::Unreachable(target.to_string())),
            Some(PeerScript::Fail(e)) => Err(e),
            Some(PeerScript::Hang) => std::future::pending().await,
            Some(PeerScript::WrongRequestId) => {
                Ok((PeerScript::alive(), responder, format!("not-{request_id}")))
            }
            Some(script @ PeerScript::Respond { .. }) => Ok((script, responder, request_id)),
        }
    }
}

#[async_trait]
impl RpcClient for ScriptedRpcClient {
    async fn ping(
        &self,
        target: &NodeAddress,
        request: PingRequest,
    ) -> Result<PingResponse, RpcError> {
        let (_, sender, request_id) = self
            .dispatch(RpcKind::Ping, target, request.request_id)
            .await?;
        Ok(PingResponse { sender, request_id })
    }

    async fn find_node(
        &self,
        target: &NodeAddress,
        request: FindNodeRequest,
    ) -> Result<FindNodeResponse, RpcError> {
        let (script, sender, request_id) = self
            .dispatch(RpcKind::FindNode, target, request.request_id)
            .await?;
        let closest = match script {
            PeerScript::Respond { contacts, .. } => contacts,
            _ => Vec::new(),
        };
        Ok(FindNodeResponse {
            sender,
            request_id,
            closest,
        })
    }

    async fn find_value(
        &self,
        target: &NodeAddress,
        request: FindValueRequest,
    ) -> Result<FindValueResponse, RpcError> {
        let (script, sender, request_id) = self
            .dispatch(RpcKind::FindValue, target, request.request_id)
            .await?;
        let result = match script {
            PeerScript::Respond {
                record: Some(record),
                ..
            } => FindValueResult::Record(record),
            PeerScript::Respond { contacts, .. } => FindValueResult::ClosestContacts(contacts),
            _ => FindValueResult::ClosestContacts(Vec::new()),
        };
        Ok(FindValueResponse {
            sender,
            request_id,
            result,
        })
    }

    async fn store(
        &self,
        target: &NodeAddress,
        request: StoreRequest,
    ) -> Result<StoreResponse, RpcError> {
        let (_, sender, request_id) = self
            .dispatch(RpcKind::Store, target, request.request_id)
            .await?;
        Ok(StoreResponse {
            sender,
            request_id,
            success: true,
        })
    }
}
