//! Canonical block header hashing.
//!
//! The ledger identifies a block by the SHA-256 of the ASN.1 DER encoding of
//! `SEQUENCE { INTEGER number, OCTET STRING previous_hash, OCTET STRING
//! data_hash }`, field order preserved. The encoding below must stay
//! bit-exact with the upstream ledger; the tests pin known digests.

use sha2::{Digest, Sha256};

use crate::protos::common::BlockHeader;

/// SHA-256 over the DER-encoded header.
pub fn block_hash(header: &BlockHeader) -> [u8; 32] {
    Sha256::digest(header_bytes(header)).into()
}

/// Lowercase hex form of [`block_hash`], the `blockHash` primary key.
pub fn block_hash_hex(header: &BlockHeader) -> String {
    hex::encode(block_hash(header))
}

fn header_bytes(header: &BlockHeader) -> Vec<u8> {
    let mut content = Vec::with_capacity(8 + header.previous_hash.len() + header.data_hash.len());
    der_integer(&mut content, header.number);
    der_octet_string(&mut content, &header.previous_hash);
    der_octet_string(&mut content, &header.data_hash);

    let mut out = Vec::with_capacity(content.len() + 4);
    out.push(0x30); // SEQUENCE
    der_length(&mut out, content.len());
    out.extend_from_slice(&content);
    out
}

/// DER INTEGER from an unsigned value: minimal big-endian bytes, with a
/// leading zero octet whenever the high bit would flip the sign.
fn der_integer(out: &mut Vec<u8>, value: u64) {
    let body = minimal_be_bytes(value);

    out.push(0x02);
    if body.first().is_some_and(|b| b & 0x80 != 0) {
        der_length(out, body.len() + 1);
        out.push(0x00);
    } else {
        der_length(out, body.len());
    }
    out.extend_from_slice(&body);
}

fn der_octet_string(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(0x04);
    der_length(out, bytes.len());
    out.extend_from_slice(bytes);
}

fn der_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let body = minimal_be_bytes(len as u64);
    out.push(0x80 | body.len() as u8);
    out.extend_from_slice(&body);
}

/// Big-endian bytes with leading zeros dropped; 0 encodes as one zero
/// octet.
fn minimal_be_bytes(value: u64) -> Vec<u8> {
    let body: Vec<u8> = value
        .to_be_bytes()
        .iter()
        .copied()
        .skip_while(|b| *b == 0)
        .collect();
    if body.is_empty() {
        vec![0]
    } else {
        body
    }
}
