//! Abstract metrics sink for the ingestion path, decoupling core logic
//! from the Prometheus backend.

use once_cell::sync::OnceCell;

/// The globally installed sink. Until one is installed every call lands on
/// a no-op sink, so library code never checks for initialization.
pub static SINK: OnceCell<&'static dyn IngestMetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns the configured ingest metrics sink, or a no-op.
pub fn ingest_metrics() -> &'static dyn IngestMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Counters along the decode/inject hot path and the error bus.
pub trait IngestMetricsSink: Send + Sync {
    /// One block persisted for this network.
    fn inc_blocks_ingested(&self, network: &str);
    /// Transactions persisted alongside a block.
    fn add_transactions_ingested(&self, network: &str, count: u64);
    /// One error delivered to the bus sink, labelled by stable code.
    fn inc_errors(&self, code: &str);
    /// One error dropped because the bus drain was gone.
    fn inc_bus_dropped(&self);
}

/// A no-op sink for tests or runs with telemetry disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

impl IngestMetricsSink for NopSink {
    fn inc_blocks_ingested(&self, _network: &str) {}
    fn add_transactions_ingested(&self, _network: &str, _count: u64) {}
    fn inc_errors(&self, _code: &str) {}
    fn inc_bus_dropped(&self) {}
}
