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

//! # chainlens Store
//!
//! The storage boundary of the ingestion core. Implementations come as a
//! pair chosen once at startup: the Postgres-backed [`PgInjector`] /
//! [`PgSelector`], or the log-only [`LogInjector`] for development, which
//! ships with no selector.
//!
//! The injector is deliberately write-only and per-record: at-least-once
//! delivery relies on primary-key dedup here rather than on transactions
//! spanning a block's records.

use async_trait::async_trait;
use chainlens_types::error::StoreError;
use chainlens_types::models::{Block, Network, Transaction};

/// The log-only development injector.
pub mod log;
/// The Postgres-backed injector/selector pair.
pub mod pg;

pub use log::LogInjector;
pub use pg::{connect, PgInjector, PgSelector};

/// Write side of the storage boundary.
#[async_trait]
pub trait Injector: Send + Sync {
    /// Upserts networks on primary key `id`, updating `status` on conflict.
    async fn inject_networks(&self, networks: &[Network]) -> Result<(), StoreError>;
    /// Inserts blocks; a duplicate `blockHash` surfaces as
    /// [`StoreError::Conflict`].
    async fn inject_blocks(&self, blocks: &[Block]) -> Result<(), StoreError>;
    /// Inserts transactions keyed by tx id.
    async fn inject_transactions(&self, transactions: &[Transaction]) -> Result<(), StoreError>;
    /// Removes the network row, then its blocks, then its transactions.
    /// Not atomic; each step surfaces its own error.
    async fn delete_network(&self, nid: &str) -> Result<(), StoreError>;
}

/// Read side of the storage boundary.
#[async_trait]
pub trait Selector: Send + Sync {
    /// All networks, optionally projected to the named columns.
    async fn networks(&self, fields: &[&str]) -> Result<Vec<Network>, StoreError>;
    /// A single network by id, or [`StoreError::NotFound`].
    async fn network(&self, nid: &str) -> Result<Network, StoreError>;
    /// The maximum stored block number for this network, or 0 if none:
    /// the resumption checkpoint.
    async fn network_start_at(&self, nid: &str) -> Result<u64, StoreError>;
}
