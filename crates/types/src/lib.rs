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

//! # chainlens Types
//!
//! Domain records shared by every chainlens component: registered networks,
//! normalized blocks and transactions, connection profiles, and the error
//! taxonomy. The types here carry no I/O so the decoder stays a pure
//! function of its input and the storage layer stays swappable.

/// Core error types and the stable `ErrorCode` contract.
pub mod error;
/// Network, block, and transaction records plus the read/write-set shapes.
pub mod models;
/// Connection profiles as carried in the admin register body.
pub mod profile;

pub use models::{
    Block, FabRWSet, KvRead, KvWrite, Network, NetworkStatus, NetworkType, Transaction, TxType,
};
pub use profile::{FabProfile, NetworkSpec};
