//! Tests for Adapters

use std::io::Write;
use std::sync::Arc;

use super::*;
use crate::domain::{
    Contact, DhtError, KademliaConfig, NodeAddress, PingRequest, Record, RecordType, RpcError,
    StoreError, Timestamp,
};
use crate::ports::{ConfigProvider, RecordStore, RpcClient, TimeSource};
use crate::service::DhtEngine;

fn addr(host: &str) -> NodeAddress {
    NodeAddress::new(host, 53)
}

fn make_engine(network: &Arc<InMemoryNetwork>, host: &str) -> Arc<DhtEngine> {
    let engine = Arc::new(DhtEngine::new(
        addr(host),
        KademliaConfig::for_testing(),
        network.clone(),
        Arc::new(InMemoryRecordStore::new()),
        Box::new(SystemTimeSource::new()),
    ));
    network.register(&addr(host), &engine);
    engine
}

fn ping_from(host: &str) -> PingRequest {
    PingRequest {
        sender: Contact::new(addr(host), Timestamp::new(0)),
        request_id: "req-1".into(),
    }
}

// =============================================================================
// Time & Config
// =============================================================================

#[test]
fn test_system_time_source_returns_nonzero() {
    let source = SystemTimeSource::new();
    // After ~2024
    assert!(source.now().as_secs() > 1_700_000_000);
}

#[test]
fn test_static_config_provider_defaults() {
    let provider = StaticConfigProvider::new(addr("127.0.0.1"));
    assert_eq!(provider.get_local_address(), addr("127.0.0.1"));
    assert!(provider.get_bootstrap_nodes().is_empty());
    assert_eq!(provider.get_kademlia_config().k, 3);
}

#[test]
fn test_static_config_provider_builder() {
    let provider = StaticConfigProvider::new(addr("127.0.0.1"))
        .with_bootstrap_nodes(vec![addr("10.0.0.1"), addr("10.0.0.2")])
        .with_config(KademliaConfig::for_testing());
    assert_eq!(provider.get_bootstrap_nodes().len(), 2);
    assert_eq!(provider.get_kademlia_config().rpc_timeout_ms, 200);
}

#[cfg(feature = "toml-config")]
#[test]
fn test_toml_config_full() {
    let provider = TomlConfigProvider::parse(
        r#"
        [node]
        host = "10.1.1.1"
        port = 5353

        [bootstrap]
        nodes = ["10.0.0.1:53", "[::1]:53"]

        [kademlia]
        k = 5
        alpha = 2
        max_rounds = 7
        rpc_timeout_ms = 1500
        "#,
    )
    .unwrap();

    assert_eq!(provider.get_local_address(), NodeAddress::new("10.1.1.1", 5353));
    assert_eq!(
        provider.get_bootstrap_nodes(),
        vec![addr("10.0.0.1"), NodeAddress::new("::1", 53)]
    );
    let config = provider.get_kademlia_config();
    assert_eq!(config.k, 5);
    assert_eq!(config.alpha, 2);
    assert_eq!(config.max_rounds, 7);
    assert_eq!(config.rpc_timeout_ms, 1500);
}

#[cfg(feature = "toml-config")]
#[test]
fn test_toml_config_defaults() {
    let provider = TomlConfigProvider::parse("[kademlia]\nk = 4\n").unwrap();
    assert_eq!(provider.get_local_address(), addr("127.0.0.1"));
    assert!(provider.get_bootstrap_nodes().is_empty());
    let config = provider.get_kademlia_config();
    assert_eq!(config.alpha, 4);
    assert_eq!(config.max_rounds, 5);
    assert_eq!(config.rpc_timeout_ms, 5_000);

    let empty = TomlConfigProvider::parse("").unwrap();
    assert_eq!(empty.get_kademlia_config(), KademliaConfig::default());
}

#[cfg(feature = "toml-config")]
#[test]
fn test_toml_config_rejects_bad_values() {
    assert!(matches!(
        TomlConfigProvider::parse("[kademlia]\nk = 0\n"),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        TomlConfigProvider::parse("[bootstrap]\nnodes = [\"no-port\"]\n"),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        TomlConfigProvider::parse("[kademlia\n"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        TomlConfigProvider::load("/nonexistent/kademlia.toml"),
        Err(ConfigError::Io { .. })
    ));
}

// =============================================================================
// Record Store
// =============================================================================

#[test]
fn test_memory_store_get_and_set() {
    let store = InMemoryRecordStore::new();
    let record = Record::new("structx.io", RecordType::A, b"10.0.0.1".to_vec(), 300);

    assert_eq!(
        store.get("structx.io:A"),
        Err(StoreError::NotFound("structx.io:A".into()))
    );
    store.set("structx.io:A", record.clone()).unwrap();
    assert_eq!(store.get("structx.io:A").unwrap(), record);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_memory_store_rejects_duplicate_key() {
    let store = InMemoryRecordStore::new();
    let first = Record::new("structx.io", RecordType::A, b"10.0.0.1".to_vec(), 300);
    let second = Record::new("structx.io", RecordType::A, b"10.0.0.2".to_vec(), 300);

    store.set("k", first.clone()).unwrap();
    assert_eq!(
        store.set("k", second),
        Err(StoreError::AlreadyExists("k".into()))
    );
    assert_eq!(store.get("k").unwrap(), first);
}

// =============================================================================
// In-Memory Network
// =============================================================================

#[tokio::test]
async fn test_network_routes_to_registered_engine() {
    let network = Arc::new(InMemoryNetwork::new());
    let server = make_engine(&network, "127.0.0.2");

    let response = network
        .ping(&addr("127.0.0.2"), ping_from("127.0.0.1"))
        .await
        .unwrap();

    assert_eq!(response.request_id, "req-1");
    assert_eq!(response.sender.address, addr("127.0.0.2"));
    // The callee learned about the caller
    assert!(server.routing_table().contains(&addr("127.0.0.1").node_id()));
}

#[tokio::test]
async fn test_network_unknown_and_switched_off_addresses() {
    let network = Arc::new(InMemoryNetwork::new());
    let _server = make_engine(&network, "127.0.0.2");

    assert!(matches!(
        network.ping(&addr("127.0.0.9"), ping_from("127.0.0.1")).await,
        Err(RpcError::Unreachable(_))
    ));

    network.set_reachable(&addr("127.0.0.2"), false);
    assert!(matches!(
        network.ping(&addr("127.0.0.2"), ping_from("127.0.0.1")).await,
        Err(RpcError::Unreachable(_))
    ));

    network.set_reachable(&addr("127.0.0.2"), true);
    assert!(network
        .ping(&addr("127.0.0.2"), ping_from("127.0.0.1"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_network_does_not_keep_engines_alive() {
    let network = Arc::new(InMemoryNetwork::new());
    let server = make_engine(&network, "127.0.0.2");
    drop(server);

    assert!(matches!(
        network.ping(&addr("127.0.0.2"), ping_from("127.0.0.1")).await,
        Err(RpcError::Unreachable(_))
    ));
}

#[tokio::test]
async fn test_network_surfaces_handler_errors_as_remote() {
    let network = Arc::new(InMemoryNetwork::new());
    let _server = make_engine(&network, "127.0.0.2");
    let mut forged = ping_from("127.0.0.1");
    forged.sender.id = addr("10.9.9.9").node_id();

    assert!(matches!(
        network.ping(&addr("127.0.0.2"), forged).await,
        Err(RpcError::Remote(_))
    ));
}

// =============================================================================
// Record Import
// =============================================================================

fn write_records(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn test_import_records() {
    let network = Arc::new(InMemoryNetwork::new());
    let engine = make_engine(&network, "127.0.0.1");
    let file = write_records(
        r#"{"records": [
            {"domain": "structx.io", "record_type": "A", "value": "10.0.0.1", "ttl": 300},
            {"domain": "www.structx.io", "record_type": "cname", "value": "structx.io", "ttl": 60}
        ]}"#,
    );

    assert_eq!(import_records(file.path(), &engine).unwrap(), 2);

    let a = engine.get_value("structx.io:A").unwrap();
    assert_eq!(a.value, b"10.0.0.1".to_vec());
    assert_eq!(a.ttl, 300);
    let cname = engine.get_value("www.structx.io:CNAME").unwrap();
    assert_eq!(cname.record_type, RecordType::Cname);
}

#[test]
fn test_import_missing_file_imports_nothing() {
    let network = Arc::new(InMemoryNetwork::new());
    let engine = make_engine(&network, "127.0.0.1");
    let dir = tempfile::tempdir().unwrap();

    assert_eq!(
        import_records(dir.path().join("records.json"), &engine).unwrap(),
        0
    );
}

#[test]
fn test_import_rejects_malformed_and_duplicate() {
    let network = Arc::new(InMemoryNetwork::new());
    let engine = make_engine(&network, "127.0.0.1");

    let malformed = write_records("{\"records\": [");
    assert!(matches!(
        import_records(malformed.path(), &engine),
        Err(RecordImportError::Parse(_))
    ));

    let duplicate = write_records(
        r#"{"records": [
            {"domain": "structx.io", "record_type": "A", "value": "10.0.0.1", "ttl": 300},
            {"domain": "structx.io", "record_type": "A", "value": "10.0.0.2", "ttl": 300}
        ]}"#,
    );
    match import_records(duplicate.path(), &engine) {
        Err(RecordImportError::Store { key, source }) => {
            assert_eq!(key, "structx.io:A");
            assert!(matches!(source, DhtError::AlreadyExists(_)));
        }
        other => panic!("expected duplicate key error, got {other:?}"),
    }
}
