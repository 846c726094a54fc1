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

//! # chainlens Listener
//!
//! The ingestion control plane: a registry of per-network event pumps, the
//! shared error bus, and the HTTP admin adapter. Each pump owns one
//! upstream event channel and one task; per-network isolation is a design
//! property, not an optimization.

/// The shared, bounded, FIFO error sink.
pub mod errbus;
/// The axum admin surface.
pub mod handler;
/// Per-network block stream consumers.
pub mod pump;
/// The network-id to pump lifecycle manager.
pub mod registry;

pub use errbus::ErrorBus;
pub use handler::router;
pub use pump::{BlockEventPump, FabricEventPump, GatewayPumpBuilder, PumpBuilder};
pub use registry::Registry;
