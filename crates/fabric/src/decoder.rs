//! Raw block bytes to normalized records. Pure: all I/O and retry policy
//! live with the event pump, which makes the decode path testable from
//! fixtures alone.

use chainlens_types::error::FabricError;
use chainlens_types::models::{Block, Transaction};
use prost::Message;

use crate::hash;
use crate::protos::common;
use crate::protoutil;

/// Decodes one serialized `common.Block` into a block record plus its
/// transactions.
pub fn decode_block(network: &str, raw: &[u8]) -> Result<(Block, Vec<Transaction>), FabricError> {
    let block = protoutil::unmarshal_block(raw)?;
    decode_block_message(network, &block)
}

/// As [`decode_block`], for a block the gateway client already decoded.
///
/// Any transaction that fails to decode fails the whole block; the caller
/// reports the error and skips the block as a unit, which keeps `txCount`
/// consistent with the stored transactions.
pub fn decode_block_message(
    network: &str,
    block: &common::Block,
) -> Result<(Block, Vec<Transaction>), FabricError> {
    let header = block
        .header
        .as_ref()
        .ok_or_else(|| FabricError::InvalidTransaction("block missing header".into()))?;

    let mut blk = Block {
        network: network.to_string(),
        // The store reserves 0 as a sentinel, so the on-wire number is
        // shifted up by one.
        block_number: header.number + 1,
        block_hash: hash::block_hash_hex(header),
        pre_block_hash: hex::encode(&header.previous_hash),
        data_hash: hex::encode(&header.data_hash),
        block_size: block.encoded_len() as i64,
        ..Default::default()
    };

    let entries = block.data.as_ref().map(|d| d.data.as_slice()).unwrap_or(&[]);
    let mut txs = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut tx = protoutil::transaction_from_envelope(entry)?;
        tx.network = network.to_string();
        tx.block_number = blk.block_number;
        if blk.created_at == 0 {
            blk.created_at = tx.created_at;
        }
        txs.push(tx);
    }
    blk.tx_count = txs.len() as i64;

    Ok((blk, txs))
}
