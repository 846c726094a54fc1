//! End-to-end scenarios for the listener control plane, driven through an
//! in-memory storage pair and synthetic block streams.

mod support;

use std::sync::Arc;

use chainlens_listener::{ErrorBus, Registry};
use chainlens_types::error::ListenerError;
use chainlens_types::models::{NetworkStatus, NetworkType, TxType};
use tokio::sync::watch;

use support::*;

struct Harness {
    shutdown_tx: watch::Sender<bool>,
    store: Arc<MemoryStore>,
    builder: Arc<StubPumpBuilder>,
    errors: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    registry: Arc<Registry>,
}

async fn harness() -> Harness {
    harness_with(MemoryStore::new(), StubPumpBuilder::new()).await
}

async fn harness_with(store: Arc<MemoryStore>, builder: Arc<StubPumpBuilder>) -> Harness {
    let (shutdown_tx, shutdown) = watch::channel(false);
    let (errors, sink) = error_collector();
    let errbus = ErrorBus::new(shutdown.clone(), sink);
    let registry = Registry::new(
        shutdown,
        errbus,
        store.clone(),
        Some(store.clone() as Arc<dyn chainlens_store::Selector>),
        builder.clone(),
    )
    .await
    .unwrap();
    Harness {
        shutdown_tx,
        store,
        builder,
        errors,
        registry,
    }
}

#[tokio::test]
async fn fresh_register_ingests_one_block() {
    let h = harness().await;
    let events = h.builder.arm("net-s1_c1");

    h.registry.register(&network_spec("net-s1", "c1")).await.unwrap();
    assert_eq!(h.builder.started_with("net-s1_c1"), Some(0));

    events.send(good_block(7, &["tx-aaa"])).await.unwrap();
    wait_until(|| !h.store.blocks().is_empty()).await;

    let blocks = h.store.blocks();
    assert_eq!(blocks.len(), 1);
    let blk = &blocks[0];
    assert_eq!(blk.network, "net-s1_c1");
    assert_eq!(blk.block_number, 8);
    assert_eq!(
        blk.block_hash,
        "c92add9f96e6c75a12f0073035cbab86771ace7180349e4e6944a354787fa561"
    );
    assert_eq!(blk.created_at, TS);
    assert_eq!(blk.tx_count, 1);

    let txs = h.store.transactions();
    assert_eq!(txs.len(), 1);
    let tx = &txs[0];
    assert_eq!(tx.id, "tx-aaa");
    assert_eq!(tx.creator, "Org1MSP");
    assert_eq!(tx.tx_type, Some(TxType::EndorserTransaction));
    assert_eq!(tx.chaincode_id, "cc_v1");
    assert_eq!(tx.method, "PutValue");
    assert_eq!(tx.args, vec!["k".to_string(), "v".to_string()]);
    assert_eq!(
        std::str::from_utf8(&tx.payload).unwrap(),
        r#"[{"namespace":"ns1","reads":[{"key":"k","version":"0:0"}],"writes":[{"key":"k","value":"v","isDelete":false}]}]"#
    );

    let nets = h.store.networks();
    assert_eq!(nets.len(), 1);
    assert_eq!(nets[0].id, "net-s1_c1");
    assert_eq!(nets[0].network_type, NetworkType::Fabric);
    assert_eq!(nets[0].status, NetworkStatus::Registered);
}

#[tokio::test]
async fn restart_resumes_from_the_stored_checkpoint() {
    let store = MemoryStore::new();
    store.seed_network(stored_network("net-1", "c1", NetworkStatus::Registered));
    store.seed_block(chainlens_types::models::Block {
        block_hash: "seeded".into(),
        network: "net-1".into(),
        block_number: 5,
        ..Default::default()
    });

    let h = harness_with(store, StubPumpBuilder::new()).await;
    assert_eq!(h.builder.started_with("net-1"), Some(5));
    assert_eq!(h.registry.check_point("net-1").await, Some(5));
}

#[tokio::test]
async fn deregistered_networks_are_not_pre_registered() {
    let store = MemoryStore::new();
    store.seed_network(stored_network("net-old", "c1", NetworkStatus::Deregistered));
    let h = harness_with(store, StubPumpBuilder::new()).await;
    assert!(h.builder.started_with("net-old").is_none());
    assert!(!h.registry.is_registered("net-old").await);
}

#[tokio::test]
async fn pre_register_failure_does_not_stop_other_networks() {
    let store = MemoryStore::new();
    store.seed_network(stored_network("net-a", "c1", NetworkStatus::Registered));
    store.seed_network(stored_network("net-b", "c1", NetworkStatus::Registered));
    let builder = StubPumpBuilder::new();
    builder.fail("net-a");

    let h = harness_with(store, builder).await;
    assert!(!h.registry.is_registered("net-a").await);
    assert!(h.registry.is_registered("net-b").await);
    wait_until(|| !h.errors.lock().unwrap().is_empty()).await;
}

#[tokio::test]
async fn deregister_flips_status_and_keeps_history() {
    let h = harness().await;
    let events = h.builder.arm("net-x_chan");
    h.registry.register(&network_spec("net-x", "chan")).await.unwrap();

    events.send(good_block(0, &["tx-1"])).await.unwrap();
    events.send(good_block(1, &["tx-2"])).await.unwrap();
    wait_until(|| h.store.blocks().len() == 2).await;

    h.registry.deregister("net-x_chan").await.unwrap();

    let nets = h.store.networks();
    assert_eq!(nets.len(), 1);
    assert_eq!(nets[0].status, NetworkStatus::Deregistered);
    assert_eq!(h.store.blocks().len(), 2);
    assert!(!h.registry.is_registered("net-x_chan").await);
    assert_eq!(h.registry.check_point("net-x_chan").await, None);

    // Idempotent: absent or already-deregistered networks are a no-op.
    h.registry.deregister("net-x_chan").await.unwrap();
    h.registry.deregister("never-registered").await.unwrap();
}

#[tokio::test]
async fn delete_removes_all_rows() {
    let h = harness().await;
    let events = h.builder.arm("net-x_chan");
    h.registry.register(&network_spec("net-x", "chan")).await.unwrap();

    events.send(good_block(0, &["tx-1"])).await.unwrap();
    events.send(good_block(1, &["tx-2"])).await.unwrap();
    wait_until(|| h.store.blocks().len() == 2).await;

    h.registry.delete("net-x_chan").await.unwrap();

    assert!(h.store.networks().is_empty());
    assert!(h.store.blocks().is_empty());
    assert!(h.store.transactions().is_empty());
    assert!(!h.registry.is_registered("net-x_chan").await);
}

#[tokio::test]
async fn delete_without_a_pump_still_cascades() {
    let h = harness().await;
    h.store.seed_network(stored_network("net-orphan", "c1", NetworkStatus::Deregistered));
    h.store.seed_block(chainlens_types::models::Block {
        block_hash: "orphan-block".into(),
        network: "net-orphan".into(),
        block_number: 3,
        ..Default::default()
    });

    h.registry.delete("net-orphan").await.unwrap();
    assert!(h.store.networks().is_empty());
    assert!(h.store.blocks().is_empty());
}

#[tokio::test]
async fn duplicate_register_is_rejected() {
    let h = harness().await;
    h.registry.register(&network_spec("net-y", "chan-a")).await.unwrap();

    let err = h.registry.register(&network_spec("net-y", "chan-a")).await.unwrap_err();
    assert!(matches!(err, ListenerError::AlreadyExists(ref id) if id == "net-y_chan-a"));

    let nets = h.store.networks();
    assert_eq!(nets.len(), 1);
    assert_eq!(nets[0].status, NetworkStatus::Registered);
}

#[tokio::test]
async fn register_without_profile_is_unknown_type() {
    let h = harness().await;
    let spec = chainlens_types::profile::NetworkSpec {
        id: "net-u".into(),
        platform: "bestchains".into(),
        fab_profile: None,
    };
    let err = h.registry.register(&spec).await.unwrap_err();
    assert!(matches!(err, ListenerError::UnknownNetworkType(_)));
    assert!(h.store.networks().is_empty());
}

#[tokio::test]
async fn failed_upstream_connect_retains_nothing() {
    let h = harness().await;
    h.builder.fail("net-f_c1");
    let err = h.registry.register(&network_spec("net-f", "c1")).await.unwrap_err();
    assert!(matches!(err, ListenerError::Fabric(_)));
    assert!(h.store.networks().is_empty());
    assert!(!h.registry.is_registered("net-f_c1").await);
}

#[tokio::test]
async fn a_bad_block_is_skipped_and_the_stream_continues() {
    let h = harness().await;
    let events = h.builder.arm("net-a_c1");
    h.registry.register(&network_spec("net-a", "c1")).await.unwrap();

    events.send(bad_block(0)).await.unwrap();
    wait_until(|| !h.errors.lock().unwrap().is_empty()).await;
    assert!(h.errors.lock().unwrap()[0].contains("invalid fabric transaction"));

    // The gap is left behind and the next block lands.
    events.send(good_block(1, &["tx-after-bad"])).await.unwrap();
    wait_until(|| h.store.blocks().len() == 1).await;
    assert_eq!(h.store.blocks()[0].block_number, 2);
}

#[tokio::test]
async fn a_poisoned_network_does_not_affect_its_peers() {
    let h = harness().await;
    let events_a = h.builder.arm("net-a_c1");
    let events_b = h.builder.arm("net-b_c1");
    h.registry.register(&network_spec("net-a", "c1")).await.unwrap();
    h.registry.register(&network_spec("net-b", "c1")).await.unwrap();

    events_a.send(bad_block(0)).await.unwrap();
    events_b.send(good_block(0, &["tx-b"])).await.unwrap();

    wait_until(|| h.store.blocks().iter().any(|b| b.network == "net-b_c1")).await;
    assert!(h.registry.is_registered("net-a_c1").await);
    assert!(h.registry.is_registered("net-b_c1").await);
}

#[tokio::test]
async fn replaying_a_block_reports_a_conflict_without_duplicates() {
    let h = harness().await;
    let events = h.builder.arm("net-r_c1");
    h.registry.register(&network_spec("net-r", "c1")).await.unwrap();

    events.send(good_block(4, &["tx-once"])).await.unwrap();
    wait_until(|| h.store.blocks().len() == 1).await;

    events.send(good_block(4, &["tx-once"])).await.unwrap();
    wait_until(|| h.errors.lock().unwrap().iter().any(|e| e.contains("duplicate key"))).await;
    assert_eq!(h.store.blocks().len(), 1);
    assert_eq!(h.store.transactions().len(), 1);
    assert!(h.registry.is_registered("net-r_c1").await);
}

#[tokio::test]
async fn parent_shutdown_stops_every_pump() {
    let h = harness().await;
    let events = h.builder.arm("net-s_c1");
    h.registry.register(&network_spec("net-s", "c1")).await.unwrap();

    h.shutdown_tx.send(true).unwrap();
    settle().await;

    // The pump has exited; nothing consumes the stream any more.
    let _ = events.send(good_block(0, &["tx-late"])).await;
    settle().await;
    assert!(h.store.blocks().is_empty());
}

#[tokio::test]
async fn closing_a_pump_ends_consumption_but_not_the_registry() {
    let h = harness().await;
    let events_a = h.builder.arm("net-a_c1");
    let events_b = h.builder.arm("net-b_c1");
    h.registry.register(&network_spec("net-a", "c1")).await.unwrap();
    h.registry.register(&network_spec("net-b", "c1")).await.unwrap();

    h.registry.deregister("net-a_c1").await.unwrap();
    settle().await;
    let _ = events_a.send(good_block(0, &["tx-a"])).await;
    events_b.send(good_block(0, &["tx-b"])).await.unwrap();

    wait_until(|| h.store.blocks().iter().any(|b| b.network == "net-b_c1")).await;
    assert!(!h.store.blocks().iter().any(|b| b.network == "net-a_c1"));
}
