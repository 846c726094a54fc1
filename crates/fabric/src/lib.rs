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

//! # chainlens Fabric
//!
//! The Fabric protocol layer: a hand-written subset of the Fabric protobuf
//! messages, canonical block header hashing, the decode pipeline from raw
//! block bytes to normalized records, and the gateway client that streams
//! committed blocks for one network.

/// Raw block bytes to normalized block and transaction records.
pub mod decoder;
/// The peer connection, deliver seek signing, and the block-event stream.
pub mod gateway;
/// Canonical ASN.1/SHA-256 block header hashing.
pub mod hash;
/// Hand-written prost messages for the Fabric wire format.
pub mod protos;
/// Unmarshal helpers for the nested envelope layers.
pub mod protoutil;

pub use decoder::{decode_block, decode_block_message};
pub use gateway::FabricClient;
