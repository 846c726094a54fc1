//! Hand-written subset of the Hyperledger Fabric protobuf messages the
//! decode pipeline touches. Field numbers are the wire contract and must
//! match the upstream `.proto` definitions exactly; unknown fields are
//! skipped by prost on decode, so omitted fields are safe.
//!
//! The config messages additionally derive `serde::Serialize` because the
//! decoder JSON-encodes them into transaction payloads; `bytes` fields
//! render as base64 strings there.

/// Messages from `common/common.proto` and `common/configtx.proto`.
pub mod common;
/// Messages from `msp/identities.proto`.
pub mod msp;
/// Messages from `peer/*.proto` plus the deliver seek messages.
pub mod peer;
/// Messages from `ledger/rwset/*.proto`.
pub mod rwset;

pub(crate) mod b64 {
    use base64::Engine as _;
    use serde::Serializer;

    pub fn bytes<S: Serializer>(v: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(v))
    }

    pub fn byte_map<S: Serializer>(
        v: &std::collections::HashMap<String, Vec<u8>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = s.serialize_map(Some(v.len()))?;
        for (k, bytes) in v {
            map.serialize_entry(k, &base64::engine::general_purpose::STANDARD.encode(bytes))?;
        }
        map.end()
    }
}
