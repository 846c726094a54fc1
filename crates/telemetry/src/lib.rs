#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # chainlens Telemetry
//!
//! Observability infrastructure for the ingestion core: structured logging
//! initialization, a Prometheus metrics endpoint, and an abstract sink
//! that decouples metric instrumentation from the backend.

/// A lightweight HTTP server exposing `/metrics` and `/healthz`.
pub mod http;
/// The initialization routine for global structured logging.
pub mod init;
/// The concrete Prometheus implementation of the ingest sink.
pub mod prometheus;
/// The abstract `IngestMetricsSink` contract.
pub mod sinks;

pub use sinks::ingest_metrics;
