//! Normalized records produced by the decode pipeline and persisted by the
//! injector. Field layouts mirror the `networks` / `blocks` / `transactions`
//! tables; see the crate-level docs for the hashing and numbering rules.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a registered network.
///
/// Transitions only `Registered` -> `Deregistered`; deletion removes the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkStatus {
    Registered,
    Deregistered,
}

impl NetworkStatus {
    /// The stable text stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkStatus::Registered => "Registered",
            NetworkStatus::Deregistered => "Deregistered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Registered" => Some(NetworkStatus::Registered),
            "Deregistered" => Some(NetworkStatus::Deregistered),
            _ => None,
        }
    }
}

impl std::fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform family of a registered network. Only Fabric is wired today; a
/// network whose profile carries no platform-specific section is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkType {
    Fabric,
    Unknown,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Fabric => "Fabric",
            NetworkType::Unknown => "Unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Fabric" => NetworkType::Fabric,
            _ => NetworkType::Unknown,
        }
    }
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered blockchain network. For Fabric the effective id is
/// `{base-id}_{channel-id}` so one peer can be watched on several channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Network {
    pub id: String,
    #[serde(rename = "type")]
    pub network_type: NetworkType,
    pub platform: String,
    /// Opaque JSON-encoded, type-specific connection profile.
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "base64_bytes"
    )]
    pub profile: Vec<u8>,
    pub status: NetworkStatus,
}

fn base64_bytes<S: serde::Serializer>(v: &[u8], s: S) -> Result<S::Ok, S::Error> {
    use base64::Engine as _;
    s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(v))
}

/// One observed block. `block_number` is stored 1-based: the on-wire number
/// N persists as N + 1 so 0 stays free as a storage sentinel. `block_hash`
/// is the lowercase hex SHA-256 of the ASN.1 DER header encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub block_hash: String,
    pub network: String,
    pub block_number: u64,
    pub pre_block_hash: String,
    pub data_hash: String,
    /// Unix seconds from the first transaction's channel header; 0 when the
    /// block carries no transactions.
    pub created_at: i64,
    /// Serialized byte length of the full block message.
    pub block_size: i64,
    pub tx_count: i64,
}

/// Classified transaction kind from the channel header. Header types outside
/// this set leave the record's type blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxType {
    Config,
    ConfigUpdate,
    EndorserTransaction,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Config => "Config",
            TxType::ConfigUpdate => "ConfigUpdate",
            TxType::EndorserTransaction => "EndorserTransaction",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Config" => Some(TxType::Config),
            "ConfigUpdate" => Some(TxType::ConfigUpdate),
            "EndorserTransaction" => Some(TxType::EndorserTransaction),
            _ => None,
        }
    }
}

impl std::fmt::Display for TxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transaction envelope, keyed by the channel-header tx id. The
/// chaincode fields are populated only for endorser transactions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transaction {
    pub id: String,
    pub network: String,
    pub block_number: u64,
    pub created_at: i64,
    /// MSP id of the submitting organization.
    pub creator: String,

    pub tx_type: Option<TxType>,
    /// JSON-encoded payload; shape depends on `tx_type`.
    pub payload: Vec<u8>,

    // EndorserTransaction only
    pub chaincode_id: String,
    pub method: String,
    pub args: Vec<String>,

    pub validation_code: i32,
}

/// Per-namespace read/write set embedded in an endorser transaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabRWSet {
    pub namespace: String,
    pub reads: Vec<KvRead>,
    pub writes: Vec<KvWrite>,
}

/// A key read with its committed version, rendered `{block}:{tx}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvRead {
    pub key: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KvWrite {
    pub key: String,
    pub value: String,
    pub is_delete: bool,
}
