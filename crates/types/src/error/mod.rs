//! Core error types for the chainlens ingestion core.
//!
//! The taxonomy follows the failure policy of the listener: recoverable
//! errors are reported and never tear down a pump, while `Fatal` variants
//! abort construction at startup.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors surfaced by the storage boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A generic error from the underlying database backend.
    #[error("storage backend error: {0}")]
    Backend(String),
    /// A duplicate primary key on insert. The record is effectively already
    /// ingested; the stream proceeds.
    #[error("duplicate key: {0}")]
    Conflict(String),
    /// The requested row was not found.
    #[error("not found")]
    NotFound,
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "STORE_BACKEND_ERROR",
            Self::Conflict(_) => "STORE_CONFLICT",
            Self::NotFound => "STORE_NOT_FOUND",
        }
    }
}

/// Errors from the Fabric protocol layer: profile handling, the gateway
/// connection, and the block decode pipeline.
#[derive(Debug, Error)]
pub enum FabricError {
    /// The network profile is malformed or missing a required field.
    #[error("invalid network profile: {0}")]
    InvalidProfile(String),
    /// A block or one of its transactions failed to decode. The block is
    /// skipped as a unit.
    #[error("invalid fabric transaction: {0}")]
    InvalidTransaction(String),
    /// The upstream gateway connection or stream failed.
    #[error("fabric gateway error: {0}")]
    Gateway(String),
}

impl ErrorCode for FabricError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidProfile(_) => "FABRIC_INVALID_PROFILE",
            Self::InvalidTransaction(_) => "FABRIC_INVALID_TRANSACTION",
            Self::Gateway(_) => "FABRIC_GATEWAY_ERROR",
        }
    }
}

/// Errors from the registry control plane and its collaborators.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// A network with this id is already registered in this listener.
    #[error("network {0} already exists in this listener")]
    AlreadyExists(String),
    /// The profile does not name a supported network type.
    #[error("unknown network type for {0}")]
    UnknownNetworkType(String),
    /// A configuration value is unusable as given.
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Fabric(#[from] FabricError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for ListenerError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyExists(_) => "LISTENER_ALREADY_EXISTS",
            Self::UnknownNetworkType(_) => "LISTENER_UNKNOWN_NETWORK_TYPE",
            Self::Config(_) => "LISTENER_CONFIG_ERROR",
            Self::Fabric(e) => e.code(),
            Self::Store(e) => e.code(),
        }
    }
}
