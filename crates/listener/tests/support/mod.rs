//! Shared doubles for the listener tests: an in-memory injector/selector
//! pair with the same conflict semantics as the Postgres pair, a pump
//! builder that feeds pumps from synthetic streams, and block fixtures.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chainlens_fabric::protos::{common, common::header_type, msp, peer, rwset};
use chainlens_listener::{BlockEventPump, ErrorBus, FabricEventPump, PumpBuilder};
use chainlens_store::{Injector, Selector};
use chainlens_types::error::{FabricError, ListenerError, StoreError};
use chainlens_types::models::{Block, Network, NetworkStatus, Transaction};
use chainlens_types::profile::{FabProfile, NetworkSpec, NodeEndpoint, Pem, User};
use prost::Message;
use tokio::sync::{mpsc, watch};

pub const TS: i64 = 1_700_000_000;

#[derive(Default)]
struct State {
    networks: Vec<Network>,
    blocks: Vec<Block>,
    transactions: Vec<Transaction>,
}

/// In-memory storage pair with primary-key conflict semantics.
#[derive(Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_network(&self, network: Network) {
        self.state.lock().unwrap().networks.push(network);
    }

    pub fn seed_block(&self, block: Block) {
        self.state.lock().unwrap().blocks.push(block);
    }

    pub fn networks(&self) -> Vec<Network> {
        self.state.lock().unwrap().networks.clone()
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.state.lock().unwrap().blocks.clone()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().transactions.clone()
    }
}

#[async_trait]
impl Injector for MemoryStore {
    async fn inject_networks(&self, networks: &[Network]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        for net in networks {
            match state.networks.iter_mut().find(|n| n.id == net.id) {
                // Upsert updates status only, as the Postgres pair does.
                Some(existing) => existing.status = net.status,
                None => state.networks.push(net.clone()),
            }
        }
        Ok(())
    }

    async fn inject_blocks(&self, blocks: &[Block]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        for blk in blocks {
            if state.blocks.iter().any(|b| b.block_hash == blk.block_hash) {
                return Err(StoreError::Conflict(format!(
                    "blocks pkey {}",
                    blk.block_hash
                )));
            }
            state.blocks.push(blk.clone());
        }
        Ok(())
    }

    async fn inject_transactions(&self, transactions: &[Transaction]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        for tx in transactions {
            if state.transactions.iter().any(|t| t.id == tx.id) {
                return Err(StoreError::Conflict(format!("transactions pkey {}", tx.id)));
            }
            state.transactions.push(tx.clone());
        }
        Ok(())
    }

    async fn delete_network(&self, nid: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.networks.retain(|n| n.id != nid);
        state.blocks.retain(|b| b.network != nid);
        state.transactions.retain(|t| t.network != nid);
        Ok(())
    }
}

#[async_trait]
impl Selector for MemoryStore {
    async fn networks(&self, _fields: &[&str]) -> Result<Vec<Network>, StoreError> {
        Ok(self.state.lock().unwrap().networks.clone())
    }

    async fn network(&self, nid: &str) -> Result<Network, StoreError> {
        self.state
            .lock()
            .unwrap()
            .networks
            .iter()
            .find(|n| n.id == nid)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn network_start_at(&self, nid: &str) -> Result<u64, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .blocks
            .iter()
            .filter(|b| b.network == nid)
            .map(|b| b.block_number)
            .max()
            .unwrap_or(0))
    }
}

/// Pump builder that substitutes synthetic event streams for the gateway.
#[derive(Default)]
pub struct StubPumpBuilder {
    streams: Mutex<HashMap<String, mpsc::Receiver<common::Block>>>,
    idle_senders: Mutex<Vec<mpsc::Sender<common::Block>>>,
    fail_connect: Mutex<HashSet<String>>,
    /// `(network id, start block)` per successful build, in order.
    pub started: Mutex<Vec<(String, u64)>>,
}

impl StubPumpBuilder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Arms the stream for a network id and returns its sender.
    pub fn arm(&self, nid: &str) -> mpsc::Sender<common::Block> {
        let (tx, rx) = mpsc::channel(16);
        self.streams.lock().unwrap().insert(nid.to_string(), rx);
        tx
    }

    /// Makes the next build for this network id fail like a refused
    /// upstream connect.
    pub fn fail(&self, nid: &str) {
        self.fail_connect.lock().unwrap().insert(nid.to_string());
    }

    pub fn started_with(&self, nid: &str) -> Option<u64> {
        self.started
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == nid)
            .map(|(_, start)| *start)
    }
}

#[async_trait]
impl PumpBuilder for StubPumpBuilder {
    async fn build(
        &self,
        shutdown: watch::Receiver<bool>,
        errbus: ErrorBus,
        injector: Arc<dyn Injector>,
        nid: &str,
        _profile: &FabProfile,
        start_block: u64,
    ) -> Result<Box<dyn BlockEventPump>, ListenerError> {
        if self.fail_connect.lock().unwrap().remove(nid) {
            return Err(FabricError::Gateway("connection refused".into()).into());
        }
        let events = self.streams.lock().unwrap().remove(nid).unwrap_or_else(|| {
            // Unarmed pumps idle on an open channel instead of observing
            // an immediately closed stream.
            let (tx, rx) = mpsc::channel(1);
            self.idle_senders.lock().unwrap().push(tx);
            rx
        });
        self.started
            .lock()
            .unwrap()
            .push((nid.to_string(), start_block));
        Ok(Box::new(FabricEventPump::with_stream(
            shutdown,
            errbus,
            injector,
            nid,
            start_block,
            events,
        )))
    }
}

/// Collects errors delivered to the bus sink.
pub fn error_collector() -> (
    Arc<Mutex<Vec<String>>>,
    impl FnMut(ListenerError) + Send + 'static,
) {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = seen.clone();
    (seen, move |err: ListenerError| {
        sink_seen.lock().unwrap().push(err.to_string())
    })
}

pub fn fab_profile(channel: &str) -> FabProfile {
    FabProfile {
        organization: "Org1MSP".into(),
        user: User {
            name: "admin".into(),
            key: Pem { pem: "KEY".into() },
            cert: Pem { pem: "CERT".into() },
        },
        endpoint: NodeEndpoint {
            url: "grpc://127.0.0.1:7051".into(),
            ..Default::default()
        },
        channel: channel.into(),
    }
}

pub fn network_spec(id: &str, channel: &str) -> NetworkSpec {
    NetworkSpec {
        id: id.into(),
        platform: "bestchains".into(),
        fab_profile: Some(fab_profile(channel)),
    }
}

/// A stored network row as `register` would have written it.
pub fn stored_network(nid: &str, channel: &str, status: NetworkStatus) -> Network {
    Network {
        id: nid.into(),
        network_type: chainlens_types::models::NetworkType::Fabric,
        platform: "bestchains".into(),
        profile: serde_json::to_vec(&fab_profile(channel)).unwrap(),
        status,
    }
}

fn endorser_entry(tx_id: &str) -> Vec<u8> {
    let invocation = peer::ChaincodeInvocationSpec {
        chaincode_spec: Some(peer::ChaincodeSpec {
            chaincode_id: Some(peer::ChaincodeId {
                path: String::new(),
                name: "cc".into(),
                version: "v1".into(),
            }),
            input: Some(peer::ChaincodeInput {
                args: vec![b"PutValue".to_vec(), b"k".to_vec(), b"v".to_vec()],
            }),
            ..Default::default()
        }),
    };
    let kv = rwset::KvRwSet {
        reads: vec![rwset::KvRead {
            key: "k".into(),
            version: Some(rwset::Version { block_num: 0, tx_num: 0 }),
        }],
        writes: vec![rwset::KvWrite {
            key: "k".into(),
            is_delete: false,
            value: b"v".to_vec(),
        }],
    };
    let results = rwset::TxReadWriteSet {
        data_model: 0,
        ns_rwset: vec![rwset::NsReadWriteSet {
            namespace: "ns1".into(),
            rwset: kv.encode_to_vec(),
        }],
    }
    .encode_to_vec();

    let proposal_response = peer::ProposalResponsePayload {
        proposal_hash: vec![9; 32],
        extension: peer::ChaincodeAction {
            results,
            chaincode_id: Some(peer::ChaincodeId {
                path: String::new(),
                name: "cc".into(),
                version: "v1".into(),
            }),
            ..Default::default()
        }
        .encode_to_vec(),
    };
    let cc_payload = peer::ChaincodeActionPayload {
        chaincode_proposal_payload: peer::ChaincodeProposalPayload {
            input: invocation.encode_to_vec(),
        }
        .encode_to_vec(),
        action: Some(peer::ChaincodeEndorsedAction {
            proposal_response_payload: proposal_response.encode_to_vec(),
            endorsements: Vec::new(),
        }),
    };
    let transaction = peer::Transaction {
        actions: vec![peer::TransactionAction {
            header: Vec::new(),
            payload: cc_payload.encode_to_vec(),
        }],
    };

    let payload = common::Payload {
        header: Some(common::Header {
            channel_header: common::ChannelHeader {
                r#type: header_type::ENDORSER_TRANSACTION,
                timestamp: Some(::prost_types::Timestamp { seconds: TS, nanos: 0 }),
                channel_id: "c1".into(),
                tx_id: tx_id.into(),
                ..Default::default()
            }
            .encode_to_vec(),
            signature_header: common::SignatureHeader {
                creator: msp::SerializedIdentity {
                    mspid: "Org1MSP".into(),
                    id_bytes: b"CERT".to_vec(),
                }
                .encode_to_vec(),
                nonce: vec![7; 24],
            }
            .encode_to_vec(),
        }),
        data: transaction.encode_to_vec(),
    };

    peer::ProcessedTransaction {
        transaction_envelope: Some(common::Envelope {
            payload: payload.encode_to_vec(),
            signature: vec![1, 2, 3],
        }),
        validation_code: 0,
    }
    .encode_to_vec()
}

/// A well-formed block with one endorser transaction per tx id.
pub fn good_block(number: u64, tx_ids: &[&str]) -> common::Block {
    common::Block {
        header: Some(common::BlockHeader {
            number,
            previous_hash: vec![0x01; 32],
            data_hash: vec![0x02; 32],
        }),
        data: Some(common::BlockData {
            data: tx_ids.iter().map(|id| endorser_entry(id)).collect(),
        }),
        metadata: None,
    }
}

/// A block whose single data entry cannot be decoded.
pub fn bad_block(number: u64) -> common::Block {
    common::Block {
        header: Some(common::BlockHeader {
            number,
            previous_hash: vec![0x03; 32],
            data_hash: vec![0x04; 32],
        }),
        data: Some(common::BlockData {
            data: vec![vec![0xff, 0xff, 0xff, 0xff]],
        }),
        metadata: None,
    }
}

/// Polls until the condition holds or two seconds pass.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}

/// A short pause for work that must *not* happen.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
