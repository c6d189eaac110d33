//! Transaction input signing

use secp256k1::{ecdsa::Signature, Message, Secp256k1};

use crate::account::address::{redeem_script, HASH_LEN};
use crate::crypto::keys::{KeyPair, PrivateKey, PublicKey};
use crate::error::{Error, Result};
use super::script::{Script, ScriptBuilder, OP_CHECKSIG, OP_DUP, OP_EQUALVERIFY, OP_HASH160};
use super::sighash::{legacy_signature_hash, segwit_signature_hash, SIGHASH_ALL};
use super::types::Transaction;

/// How the output referenced by an input is spent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendKind {
    /// Legacy sighash over the `OP_0 <pubkey_hash>` subscript, with signature
    /// and public key pushed into the scriptSig.
    ///
    /// Segwit outputs commit to the BIP143 digest instead, so nodes reject
    /// this spend for P2WPKH and P2SH-P2WPKH outputs.
    Legacy,
    /// Native P2WPKH output worth `amount` satoshis
    P2wpkh { amount: i64 },
    /// P2SH output wrapping a P2WPKH witness program, worth `amount` satoshis
    P2shP2wpkh { amount: i64 },
}

/// Signs inputs of a transaction
pub trait TransactionSigner {
    /// Sign one input, writing its unlocking script and witness
    fn sign_input(&self, tx: &mut Transaction, input_index: usize, spend: SpendKind) -> Result<Script>;

    /// Sign every input; `spends[i]` describes the output spent by input `i`
    fn sign_all(&self, tx: &mut Transaction, spends: &[SpendKind]) -> Result<()> {
        if spends.len() != tx.inputs.len() {
            return Err(Error::InvalidInput(format!(
                "Expected {} spend descriptions, got {}",
                tx.inputs.len(),
                spends.len()
            )));
        }
        for (input_index, spend) in spends.iter().enumerate() {
            self.sign_input(tx, input_index, *spend)?;
        }
        Ok(())
    }
}

impl TransactionSigner for KeyPair {
    fn sign_input(&self, tx: &mut Transaction, input_index: usize, spend: SpendKind) -> Result<Script> {
        sign_input(tx, input_index, &self.public_key().pubkey_hash(), self.private_key(), spend)
    }
}

impl TransactionSigner for PrivateKey {
    fn sign_input(&self, tx: &mut Transaction, input_index: usize, spend: SpendKind) -> Result<Script> {
        sign_input(tx, input_index, &self.public_key().pubkey_hash(), self, spend)
    }
}

/// BIP143 script code of a P2WPKH spend: the P2PKH script of the key hash
pub fn p2wpkh_script_code(pubkey_hash: &[u8]) -> Result<Script> {
    if pubkey_hash.len() != HASH_LEN {
        return Err(Error::Signing(format!("Expected a {} byte public key hash", HASH_LEN)));
    }
    ScriptBuilder::new()
        .add_op(OP_DUP)
        .add_op(OP_HASH160)
        .add_data(pubkey_hash)
        .add_op(OP_EQUALVERIFY)
        .add_op(OP_CHECKSIG)
        .script()
        .map_err(|e| Error::Signing(e.to_string()))
}

/// Digest signed for `input_index` under `spend`
pub fn signature_hash(tx: &Transaction, input_index: usize, pubkey_hash: &[u8], spend: SpendKind) -> Result<[u8; 32]> {
    match spend {
        SpendKind::Legacy => {
            let subscript = redeem_script(pubkey_hash).map_err(|e| Error::Signing(e.to_string()))?;
            legacy_signature_hash(tx, input_index, subscript.as_bytes())
        }
        SpendKind::P2wpkh { amount } | SpendKind::P2shP2wpkh { amount } => {
            let script_code = p2wpkh_script_code(pubkey_hash)?;
            segwit_signature_hash(tx, input_index, script_code.as_bytes(), amount)
        }
    }
}

fn sign_digest(private_key: &PrivateKey, digest: &[u8; 32]) -> Result<Vec<u8>> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest).map_err(|e| Error::Signing(e.to_string()))?;

    let signature = secp.sign_ecdsa(&message, private_key.as_secret_key());

    let mut encoded = signature.serialize_der().to_vec();
    encoded.push(SIGHASH_ALL as u8);
    Ok(encoded)
}

/// Sign input `input_index` of `tx` and attach the unlocking data
///
/// Returns the scriptSig written to the input. Witness spends also get
/// their witness stack set to `[signature, compressed public key]`. No other
/// part of the transaction is touched.
pub fn sign_input(
    tx: &mut Transaction,
    input_index: usize,
    pubkey_hash: &[u8],
    private_key: &PrivateKey,
    spend: SpendKind,
) -> Result<Script> {
    if input_index >= tx.inputs.len() {
        return Err(Error::Signing(format!(
            "Input index {} out of range (transaction has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }

    let public_key = private_key.public_key();
    if public_key.pubkey_hash().as_slice() != pubkey_hash {
        return Err(Error::Signing("Public key hash does not belong to the signing key".to_string()));
    }

    let digest = signature_hash(tx, input_index, pubkey_hash, spend)?;
    let signature = sign_digest(private_key, &digest)?;
    let public_key = public_key.serialize_compressed();

    let (signature_script, witness) = match spend {
        SpendKind::Legacy => {
            let script = ScriptBuilder::new()
                .add_data(&signature)
                .add_data(&public_key)
                .script()
                .map_err(|e| Error::Signing(e.to_string()))?;
            (script, Vec::new())
        }
        SpendKind::P2wpkh { .. } => (Script::new(), vec![signature, public_key.to_vec()]),
        SpendKind::P2shP2wpkh { .. } => {
            let redeem = redeem_script(pubkey_hash).map_err(|e| Error::Signing(e.to_string()))?;
            let script = ScriptBuilder::new()
                .add_data(redeem.as_bytes())
                .script()
                .map_err(|e| Error::Signing(e.to_string()))?;
            (script, vec![signature, public_key.to_vec()])
        }
    };

    let input = &mut tx.inputs[input_index];
    input.signature_script = signature_script.clone();
    input.witness = witness;

    tracing::debug!(input_index, spend = ?spend, "signed transaction input");

    Ok(signature_script)
}

/// Check the signature attached to `input_index` against `public_key`
///
/// Returns `Ok(false)` when the signature does not match the current
/// contents of the transaction.
pub fn verify_input(tx: &Transaction, input_index: usize, public_key: &PublicKey, spend: SpendKind) -> Result<bool> {
    let input = tx
        .inputs
        .get(input_index)
        .ok_or_else(|| Error::InvalidInput(format!("Input index {} out of range", input_index)))?;

    let items = match spend {
        SpendKind::Legacy => input.signature_script.push_data()?,
        SpendKind::P2wpkh { .. } | SpendKind::P2shP2wpkh { .. } => input.witness.clone(),
    };

    let (signature, pushed_key) = match items.as_slice() {
        [signature, pushed_key] => (signature, pushed_key),
        _ => return Err(Error::InvalidInput("Input is not signed".to_string())),
    };

    if pushed_key.as_slice() != public_key.serialize_compressed().as_slice() {
        return Ok(false);
    }

    let (hash_type, der) = signature
        .split_last()
        .ok_or_else(|| Error::InvalidInput("Empty signature".to_string()))?;
    if u32::from(*hash_type) != SIGHASH_ALL {
        return Err(Error::InvalidInput(format!("Unsupported sighash type {:#04x}", hash_type)));
    }

    let signature = Signature::from_der(der).map_err(|e| Error::InvalidInput(format!("Invalid signature: {}", e)))?;
    let digest = signature_hash(tx, input_index, &public_key.pubkey_hash(), spend)?;
    let message = Message::from_digest_slice(&digest).map_err(|e| Error::Signing(e.to_string()))?;

    let secp = Secp256k1::verification_only();
    Ok(secp.verify_ecdsa(&message, &signature, public_key.as_secp()).is_ok())
}
