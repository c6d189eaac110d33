//! Hash helpers shared by key derivation, addresses and signing

use bitcoin::hashes::{hash160, Hash};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Length of the base58check checksum
const CHECKSUM_LEN: usize = 4;

/// Single SHA-256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice, as used for checksums, txids and sighashes
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// Base58 encode `payload` followed by the first four bytes of its double SHA-256
pub fn base58check_encode(payload: &[u8]) -> String {
    let checksum = sha256d(payload);

    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum[..CHECKSUM_LEN]);

    bs58::encode(data).into_string()
}

/// Decode a base58check string and return the payload without its checksum
pub fn base58check_decode(encoded: &str) -> Result<Vec<u8>> {
    let mut data = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| Error::Encoding(format!("Invalid base58: {}", e)))?;

    if data.len() < CHECKSUM_LEN {
        return Err(Error::Encoding("Base58check payload too short".to_string()));
    }

    let split = data.len() - CHECKSUM_LEN;
    let expected = sha256d(&data[..split]);
    if data[split..] != expected[..CHECKSUM_LEN] {
        return Err(Error::Encoding("Base58check checksum mismatch".to_string()));
    }

    data.truncate(split);
    Ok(data)
}
