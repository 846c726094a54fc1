//! Prometheus implementation of the ingest metrics sink.

use once_cell::sync::OnceCell;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

use crate::sinks::{IngestMetricsSink, SINK};

static BLOCKS_INGESTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static TRANSACTIONS_INGESTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static ERRORS_DROPPED_TOTAL: OnceCell<IntCounter> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

static PROMETHEUS_SINK: PrometheusSink = PrometheusSink;

/// Registers the collectors with the default registry and installs the
/// sink. Calling this more than once is a no-op.
pub fn install() -> Result<(), anyhow::Error> {
    BLOCKS_INGESTED_TOTAL.get_or_try_init(|| {
        register_int_counter_vec!(
            "chainlens_blocks_ingested_total",
            "Blocks decoded and persisted, by network",
            &["network"]
        )
    })?;
    TRANSACTIONS_INGESTED_TOTAL.get_or_try_init(|| {
        register_int_counter_vec!(
            "chainlens_transactions_ingested_total",
            "Transactions persisted, by network",
            &["network"]
        )
    })?;
    ERRORS_TOTAL.get_or_try_init(|| {
        register_int_counter_vec!(
            "chainlens_errors_total",
            "Errors delivered to the error bus sink, by stable code",
            &["code"]
        )
    })?;
    ERRORS_DROPPED_TOTAL.get_or_try_init(|| {
        register_int_counter!(
            "chainlens_errors_dropped_total",
            "Errors dropped because the error bus drain had exited"
        )
    })?;
    let _ = SINK.set(&PROMETHEUS_SINK);
    Ok(())
}

impl IngestMetricsSink for PrometheusSink {
    fn inc_blocks_ingested(&self, network: &str) {
        if let Some(counter) = BLOCKS_INGESTED_TOTAL.get() {
            counter.with_label_values(&[network]).inc();
        }
    }

    fn add_transactions_ingested(&self, network: &str, count: u64) {
        if let Some(counter) = TRANSACTIONS_INGESTED_TOTAL.get() {
            counter.with_label_values(&[network]).inc_by(count);
        }
    }

    fn inc_errors(&self, code: &str) {
        if let Some(counter) = ERRORS_TOTAL.get() {
            counter.with_label_values(&[code]).inc();
        }
    }

    fn inc_bus_dropped(&self) {
        if let Some(counter) = ERRORS_DROPPED_TOTAL.get() {
            counter.inc();
        }
    }
}
