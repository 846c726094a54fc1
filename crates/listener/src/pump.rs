//! Per-network event pump: one task per registered network consuming its
//! block stream in upstream order, running decode then inject for each
//! block. Errors along that path are reported and skipped; only channel
//! close or cancellation ends the loop.

use std::sync::Arc;

use async_trait::async_trait;
use chainlens_fabric::protos::common;
use chainlens_fabric::{decoder, FabricClient};
use chainlens_store::Injector;
use chainlens_types::error::ListenerError;
use chainlens_types::profile::FabProfile;
use tokio::sync::{mpsc, watch};

use crate::errbus::ErrorBus;

/// A running per-network pump handle.
pub trait BlockEventPump: Send + Sync {
    /// The resumption checkpoint this pump opened its stream at.
    fn check_point(&self) -> u64;
    /// Cancels this pump's scope only. Idempotent.
    fn close(&self);
}

/// Builds pumps for the registry. The production builder connects to the
/// Fabric gateway; tests substitute synthetic streams here.
#[async_trait]
pub trait PumpBuilder: Send + Sync {
    async fn build(
        &self,
        shutdown: watch::Receiver<bool>,
        errbus: ErrorBus,
        injector: Arc<dyn Injector>,
        nid: &str,
        profile: &FabProfile,
        start_block: u64,
    ) -> Result<Box<dyn BlockEventPump>, ListenerError>;
}

/// The production [`PumpBuilder`]: gateway connection from the profile,
/// block events from the peer's deliver stream.
pub struct GatewayPumpBuilder;

#[async_trait]
impl PumpBuilder for GatewayPumpBuilder {
    async fn build(
        &self,
        shutdown: watch::Receiver<bool>,
        errbus: ErrorBus,
        injector: Arc<dyn Injector>,
        nid: &str,
        profile: &FabProfile,
        start_block: u64,
    ) -> Result<Box<dyn BlockEventPump>, ListenerError> {
        let pump =
            FabricEventPump::connect(shutdown, errbus, injector, nid, profile, start_block).await?;
        Ok(Box::new(pump))
    }
}

/// The Fabric pump. Holds the child cancellation handle; the consuming
/// task owns everything else.
pub struct FabricEventPump {
    nid: String,
    start_block: u64,
    cancel: watch::Sender<bool>,
}

impl FabricEventPump {
    /// Connects the gateway client and opens the stream at `start_block`,
    /// then spawns the consumer task. Connect and stream-open errors
    /// surface to the caller; nothing is retried here.
    pub async fn connect(
        shutdown: watch::Receiver<bool>,
        errbus: ErrorBus,
        injector: Arc<dyn Injector>,
        nid: &str,
        profile: &FabProfile,
        start_block: u64,
    ) -> Result<Self, ListenerError> {
        let (cancel, child) = watch::channel(false);
        let client = FabricClient::connect(profile).await?;
        let events = client.block_events(child, start_block).await?;
        Ok(Self::start(shutdown, errbus, injector, nid, start_block, events, cancel))
    }

    /// Spawns a pump over an already-open event channel. The stream task
    /// feeding `events` should watch a subscription of the returned pump's
    /// cancel handle if it needs to observe `close`.
    pub fn with_stream(
        shutdown: watch::Receiver<bool>,
        errbus: ErrorBus,
        injector: Arc<dyn Injector>,
        nid: &str,
        start_block: u64,
        events: mpsc::Receiver<common::Block>,
    ) -> Self {
        let (cancel, _) = watch::channel(false);
        Self::start(shutdown, errbus, injector, nid, start_block, events, cancel)
    }

    fn start(
        mut shutdown: watch::Receiver<bool>,
        errbus: ErrorBus,
        injector: Arc<dyn Injector>,
        nid: &str,
        start_block: u64,
        mut events: mpsc::Receiver<common::Block>,
        cancel: watch::Sender<bool>,
    ) -> Self {
        let pump = Self {
            nid: nid.to_string(),
            start_block,
            cancel,
        };

        let nid = pump.nid.clone();
        let propagate = pump.cancel.clone();
        let mut child = pump.cancel.subscribe();
        tokio::spawn(async move {
            tracing::info!(network = %nid, start_block, "start block event listening");
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        // Parent cancellation also releases the upstream
                        // stream task, which watches the child handle.
                        if changed.is_err() || *shutdown.borrow() {
                            let _ = propagate.send(true);
                            break;
                        }
                    }
                    changed = child.changed() => {
                        if changed.is_err() || *child.borrow() {
                            break;
                        }
                    }
                    maybe = events.recv() => match maybe {
                        None => break,
                        Some(block) => {
                            if let Err(err) = handle_block(&nid, injector.as_ref(), &block).await {
                                errbus.send(err).await;
                            }
                        }
                    }
                }
            }
            tracing::info!(network = %nid, "stop block event listening");
        });

        pump
    }
}

impl BlockEventPump for FabricEventPump {
    fn check_point(&self) -> u64 {
        self.start_block
    }

    fn close(&self) {
        let _ = self.cancel.send(true);
    }
}

async fn handle_block(
    nid: &str,
    injector: &dyn Injector,
    block: &common::Block,
) -> Result<(), ListenerError> {
    if let Some(header) = &block.header {
        tracing::debug!(network = %nid, number = header.number + 1, "received new block");
    }
    let (blk, txs) = decoder::decode_block_message(nid, block)?;
    injector.inject_blocks(&[blk]).await?;
    injector.inject_transactions(&txs).await?;

    let metrics = chainlens_telemetry::ingest_metrics();
    metrics.inc_blocks_ingested(nid);
    metrics.add_transactions_ingested(nid, txs.len() as u64);
    Ok(())
}
