//! Signature hash computation
//!
//! Two digest algorithms, both with SIGHASH_ALL semantics:
//!
//! * the legacy algorithm, which serializes a copy of the transaction with
//!   every input script blanked except the one being signed;
//! * the BIP143 algorithm required for witness outputs, which also commits
//!   to the amount being spent.
//!
//! See <https://github.com/bitcoin/bips/blob/master/bip-0143.mediawiki>

use crate::crypto::hash::sha256d;
use crate::error::{Error, Result};
use super::script::Script;
use super::types::{write_var_bytes, Transaction};

/// Sign all inputs and all outputs
pub const SIGHASH_ALL: u32 = 0x01;

fn check_index(tx: &Transaction, input_index: usize) -> Result<()> {
    if input_index >= tx.inputs.len() {
        return Err(Error::InvalidInput(format!(
            "Input index {} out of range (transaction has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }
    Ok(())
}

/// Legacy (pre-segwit) signature hash of `input_index` with `subscript`
/// standing in for that input's script
pub fn legacy_signature_hash(tx: &Transaction, input_index: usize, subscript: &[u8]) -> Result<[u8; 32]> {
    check_index(tx, input_index)?;

    let mut copy = tx.clone();
    for (index, input) in copy.inputs.iter_mut().enumerate() {
        input.witness.clear();
        input.signature_script = if index == input_index {
            Script::from(subscript.to_vec())
        } else {
            Script::new()
        };
    }

    let mut preimage = copy.serialize_no_witness();
    preimage.extend_from_slice(&SIGHASH_ALL.to_le_bytes());

    Ok(sha256d(&preimage))
}

/// Double SHA-256 of every outpoint
fn hash_prevouts(tx: &Transaction) -> [u8; 32] {
    let mut buf = Vec::with_capacity(36 * tx.inputs.len());
    for input in &tx.inputs {
        buf.extend_from_slice(input.previous_output.hash.as_bytes());
        buf.extend_from_slice(&input.previous_output.index.to_le_bytes());
    }
    sha256d(&buf)
}

/// Double SHA-256 of every input sequence number
fn hash_sequence(tx: &Transaction) -> [u8; 32] {
    let mut buf = Vec::with_capacity(4 * tx.inputs.len());
    for input in &tx.inputs {
        buf.extend_from_slice(&input.sequence.to_le_bytes());
    }
    sha256d(&buf)
}

/// Double SHA-256 of every serialized output
fn hash_outputs(tx: &Transaction) -> [u8; 32] {
    let mut buf = Vec::with_capacity(34 * tx.outputs.len());
    for output in &tx.outputs {
        output.write_to(&mut buf);
    }
    sha256d(&buf)
}

/// BIP143 preimage for `input_index` spending an output worth `amount`
pub fn segwit_preimage(tx: &Transaction, input_index: usize, script_code: &[u8], amount: i64) -> Result<Vec<u8>> {
    check_index(tx, input_index)?;
    if amount < 0 {
        return Err(Error::NegativeAmount(amount));
    }

    let input = &tx.inputs[input_index];
    let mut preimage = Vec::with_capacity(160 + script_code.len());

    preimage.extend_from_slice(&tx.version.to_le_bytes());
    preimage.extend_from_slice(&hash_prevouts(tx));
    preimage.extend_from_slice(&hash_sequence(tx));
    preimage.extend_from_slice(input.previous_output.hash.as_bytes());
    preimage.extend_from_slice(&input.previous_output.index.to_le_bytes());
    write_var_bytes(&mut preimage, script_code);
    preimage.extend_from_slice(&amount.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.to_le_bytes());
    preimage.extend_from_slice(&hash_outputs(tx));
    preimage.extend_from_slice(&tx.lock_time.to_le_bytes());
    preimage.extend_from_slice(&SIGHASH_ALL.to_le_bytes());

    Ok(preimage)
}

/// BIP143 signature hash for `input_index` spending an output worth `amount`
pub fn segwit_signature_hash(tx: &Transaction, input_index: usize, script_code: &[u8], amount: i64) -> Result<[u8; 32]> {
    Ok(sha256d(&segwit_preimage(tx, input_index, script_code, amount)?))
}
