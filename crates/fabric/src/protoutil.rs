//! Unmarshal helpers for the nested Fabric envelope layers, and the
//! extraction of a normalized [`Transaction`] from one block data entry.
//!
//! Every decode failure below the block level is an `InvalidTransaction`:
//! the caller skips the whole block and the stream continues.

use chainlens_types::error::FabricError;
use chainlens_types::models::{FabRWSet, KvRead, KvWrite, Transaction, TxType};
use prost::Message;

use crate::protos::{common, common::header_type, msp, peer, rwset};

fn decode<T: Message + Default>(what: &'static str, bytes: &[u8]) -> Result<T, FabricError> {
    T::decode(bytes).map_err(|e| FabricError::InvalidTransaction(format!("unmarshal {what}: {e}")))
}

pub fn unmarshal_block(bytes: &[u8]) -> Result<common::Block, FabricError> {
    decode("Block", bytes)
}

pub fn unmarshal_envelope(bytes: &[u8]) -> Result<common::Envelope, FabricError> {
    decode("Envelope", bytes)
}

pub fn unmarshal_payload(bytes: &[u8]) -> Result<common::Payload, FabricError> {
    decode("Payload", bytes)
}

pub fn unmarshal_channel_header(bytes: &[u8]) -> Result<common::ChannelHeader, FabricError> {
    decode("ChannelHeader", bytes)
}

pub fn unmarshal_signature_header(bytes: &[u8]) -> Result<common::SignatureHeader, FabricError> {
    decode("SignatureHeader", bytes)
}

pub fn unmarshal_serialized_identity(bytes: &[u8]) -> Result<msp::SerializedIdentity, FabricError> {
    decode("SerializedIdentity", bytes)
}

pub fn unmarshal_processed_transaction(
    bytes: &[u8],
) -> Result<peer::ProcessedTransaction, FabricError> {
    decode("ProcessedTransaction", bytes)
}

pub fn unmarshal_transaction(bytes: &[u8]) -> Result<peer::Transaction, FabricError> {
    decode("Transaction", bytes)
}

pub fn unmarshal_chaincode_action_payload(
    bytes: &[u8],
) -> Result<peer::ChaincodeActionPayload, FabricError> {
    decode("ChaincodeActionPayload", bytes)
}

pub fn unmarshal_chaincode_proposal_payload(
    bytes: &[u8],
) -> Result<peer::ChaincodeProposalPayload, FabricError> {
    decode("ChaincodeProposalPayload", bytes)
}

pub fn unmarshal_chaincode_invocation_spec(
    bytes: &[u8],
) -> Result<peer::ChaincodeInvocationSpec, FabricError> {
    decode("ChaincodeInvocationSpec", bytes)
}

pub fn unmarshal_proposal_response_payload(
    bytes: &[u8],
) -> Result<peer::ProposalResponsePayload, FabricError> {
    decode("ProposalResponsePayload", bytes)
}

pub fn unmarshal_chaincode_action(bytes: &[u8]) -> Result<peer::ChaincodeAction, FabricError> {
    decode("ChaincodeAction", bytes)
}

pub fn unmarshal_rwset(bytes: &[u8]) -> Result<rwset::TxReadWriteSet, FabricError> {
    decode("TxReadWriteSet", bytes)
}

pub fn unmarshal_kv_rwset(bytes: &[u8]) -> Result<rwset::KvRwSet, FabricError> {
    decode("KVRWSet", bytes)
}

/// Decodes `ConfigEnvelope` bytes and returns the embedded config.
pub fn unmarshal_config(bytes: &[u8]) -> Result<Option<common::Config>, FabricError> {
    Ok(decode::<common::ConfigEnvelope>("ConfigEnvelope", bytes)?.config)
}

/// Decodes `ConfigUpdateEnvelope` bytes down to the embedded `ConfigUpdate`.
pub fn unmarshal_config_update(bytes: &[u8]) -> Result<common::ConfigUpdate, FabricError> {
    let envelope = decode::<common::ConfigUpdateEnvelope>("ConfigUpdateEnvelope", bytes)?;
    decode("ConfigUpdate", &envelope.config_update)
}

/// Extracts one normalized transaction from a block data entry.
///
/// The entry is a `ProcessedTransaction` wrapping the envelope; a stream
/// that delivers bare envelopes instead is accepted too and simply yields
/// validation code 0.
pub fn transaction_from_envelope(tx_data: &[u8]) -> Result<Transaction, FabricError> {
    let (envelope, validation_code) = match unmarshal_processed_transaction(tx_data) {
        Ok(processed) => {
            let code = processed.validation_code;
            match processed.transaction_envelope {
                Some(envelope) => (envelope, code),
                None => (unmarshal_envelope(tx_data)?, code),
            }
        }
        Err(_) => (unmarshal_envelope(tx_data)?, 0),
    };

    let payload = unmarshal_payload(&envelope.payload)?;
    let header = payload
        .header
        .as_ref()
        .ok_or_else(|| FabricError::InvalidTransaction("payload missing header".into()))?;

    let sig_header = unmarshal_signature_header(&header.signature_header)?;
    let creator = unmarshal_serialized_identity(&sig_header.creator)?;
    let channel_header = unmarshal_channel_header(&header.channel_header)?;

    let mut tx = Transaction {
        id: channel_header.tx_id,
        created_at: channel_header.timestamp.map(|t| t.seconds).unwrap_or(0),
        creator: creator.mspid,
        validation_code,
        ..Default::default()
    };

    match channel_header.r#type {
        header_type::CONFIG => {
            tx.tx_type = Some(TxType::Config);
            let config = unmarshal_config(&payload.data)?;
            tx.payload = to_json(&config)?;
        }
        header_type::CONFIG_UPDATE => {
            tx.tx_type = Some(TxType::ConfigUpdate);
            let update = unmarshal_config_update(&payload.data)?;
            tx.payload = to_json(&update)?;
        }
        header_type::ENDORSER_TRANSACTION => {
            tx.tx_type = Some(TxType::EndorserTransaction);
            let (invocation, action) = tx_details_from_payload(&payload)?;

            let chaincode_id = action.chaincode_id.as_ref().ok_or_else(|| {
                FabricError::InvalidTransaction("chaincode action missing chaincode id".into())
            })?;
            tx.chaincode_id = format!("{}_{}", chaincode_id.name, chaincode_id.version);

            let args = invocation
                .chaincode_spec
                .as_ref()
                .and_then(|spec| spec.input.as_ref())
                .map(|input| input.args.as_slice())
                .unwrap_or(&[]);
            if let Some((method, rest)) = args.split_first() {
                tx.method = String::from_utf8_lossy(method).into_owned();
                tx.args = rest
                    .iter()
                    .map(|arg| String::from_utf8_lossy(arg).into_owned())
                    .collect();
            }

            tx.payload = to_json(&flatten_rwset(&action.results)?)?;
        }
        _ => {
            // Other header types still produce a record, with blank type
            // and empty payload.
        }
    }

    Ok(tx)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, FabricError> {
    serde_json::to_vec(value)
        .map_err(|e| FabricError::InvalidTransaction(format!("encode payload: {e}")))
}

/// Walks `Transaction -> Actions[0] -> ChaincodeActionPayload` down to the
/// invocation spec and the endorsed chaincode action.
pub fn tx_details_from_payload(
    payload: &common::Payload,
) -> Result<(peer::ChaincodeInvocationSpec, peer::ChaincodeAction), FabricError> {
    let tx = unmarshal_transaction(&payload.data)?;
    let first_action = tx.actions.first().ok_or_else(|| {
        FabricError::InvalidTransaction("at least one transaction action required".into())
    })?;

    let cc_payload = unmarshal_chaincode_action_payload(&first_action.payload)?;
    let endorsed = cc_payload.action.as_ref().ok_or_else(|| {
        FabricError::InvalidTransaction("no payload in chaincode action".into())
    })?;
    if endorsed.proposal_response_payload.is_empty() {
        return Err(FabricError::InvalidTransaction(
            "no payload in chaincode action".into(),
        ));
    }

    let proposal = unmarshal_chaincode_proposal_payload(&cc_payload.chaincode_proposal_payload)?;
    let invocation = unmarshal_chaincode_invocation_spec(&proposal.input)?;

    let response = unmarshal_proposal_response_payload(&endorsed.proposal_response_payload)?;
    if response.extension.is_empty() {
        return Err(FabricError::InvalidTransaction(
            "response payload is missing extension".into(),
        ));
    }
    let action = unmarshal_chaincode_action(&response.extension)?;

    Ok((invocation, action))
}

/// Flattens the per-namespace read/write sets into the stored shape.
/// Legacy composite keys embed NUL separators; those are stripped.
fn flatten_rwset(results: &[u8]) -> Result<Vec<FabRWSet>, FabricError> {
    let tx_rwset = unmarshal_rwset(results)?;
    let mut out = Vec::with_capacity(tx_rwset.ns_rwset.len());
    for ns in &tx_rwset.ns_rwset {
        let kv = unmarshal_kv_rwset(&ns.rwset)?;
        out.push(FabRWSet {
            namespace: ns.namespace.clone(),
            reads: kv
                .reads
                .iter()
                .map(|r| KvRead {
                    key: strip_nul(&r.key),
                    version: r
                        .version
                        .as_ref()
                        .map(|v| format!("{}:{}", v.block_num, v.tx_num))
                        .unwrap_or_default(),
                })
                .collect(),
            writes: kv
                .writes
                .iter()
                .map(|w| KvWrite {
                    key: strip_nul(&w.key),
                    value: String::from_utf8_lossy(&w.value).into_owned(),
                    is_delete: w.is_delete,
                })
                .collect(),
        });
    }
    Ok(out)
}

fn strip_nul(key: &str) -> String {
    key.replace('\u{0000}', "")
}
