//! Transaction types and wire encoding

use std::fmt;
use std::str::FromStr;

use crate::crypto::hash::sha256d;
use crate::error::{Error, Result};
use super::script::Script;

/// Default transaction version
pub const TX_VERSION: i32 = 1;

/// Sequence number of a final input
pub const MAX_TX_IN_SEQUENCE_NUM: u32 = 0xffff_ffff;

const SEGWIT_MARKER: u8 = 0x00;
const SEGWIT_FLAG: u8 = 0x01;

/// Append a Bitcoin compact size integer
pub fn write_varint(buf: &mut Vec<u8>, value: u64) {
    if value < 0xfd {
        buf.push(value as u8);
    } else if value <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

/// Append a length-prefixed byte string
pub fn write_var_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// A transaction hash in internal byte order
///
/// The textual form is the byte-reversed hex string shown by block
/// explorers and node RPCs.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Wrap bytes that are already in internal order
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Bytes in internal order
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for TxHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| Error::MalformedHash(format!("{}: {}", s, e)))?;
        if bytes.len() != 32 {
            return Err(Error::MalformedHash(format!(
                "Expected 32 bytes, got {} bytes",
                bytes.len()
            )));
        }

        let mut hash = [0u8; 32];
        for (dst, src) in hash.iter_mut().zip(bytes.iter().rev()) {
            *dst = *src;
        }
        Ok(Self(hash))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.write_str(&hex::encode(reversed))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}

/// Reference to an output of a previous transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub hash: TxHash,
    pub index: u32,
}

impl OutPoint {
    pub fn new(hash: TxHash, index: u32) -> Self {
        Self { hash, index }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.hash.as_bytes());
        buf.extend_from_slice(&self.index.to_le_bytes());
    }
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    /// The output being spent
    pub previous_output: OutPoint,
    /// Unlocking script, empty until signed
    pub signature_script: Script,
    /// Segregated witness stack, empty for legacy spends
    pub witness: Vec<Vec<u8>>,
    pub sequence: u32,
}

impl TxIn {
    /// Unsigned input spending `previous_output`
    pub fn new(previous_output: OutPoint) -> Self {
        Self {
            previous_output,
            signature_script: Script::new(),
            witness: Vec::new(),
            sequence: MAX_TX_IN_SEQUENCE_NUM,
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        self.previous_output.write_to(buf);
        write_var_bytes(buf, self.signature_script.as_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
    }

    fn write_witness_to(&self, buf: &mut Vec<u8>) {
        write_varint(buf, self.witness.len() as u64);
        for item in &self.witness {
            write_var_bytes(buf, item);
        }
    }
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    /// Amount in satoshis
    pub value: i64,
    /// Locking script
    pub pk_script: Script,
}

impl TxOut {
    pub fn new(value: i64, pk_script: Script) -> Self {
        Self { value, pk_script }
    }

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_le_bytes());
        write_var_bytes(buf, self.pk_script.as_bytes());
    }
}

/// A Bitcoin transaction
///
/// Inputs and outputs keep the order they were added in; that order is part
/// of every hash computed over the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    /// Empty transaction with the given version
    pub fn new(version: i32) -> Self {
        Self {
            version,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    /// Append an unsigned input spending output `output_index` of the
    /// transaction whose display-order hash is `prior_tx_hash`
    pub fn add_input(&mut self, prior_tx_hash: &str, output_index: u32) -> Result<()> {
        let hash: TxHash = prior_tx_hash.parse()?;
        self.inputs.push(TxIn::new(OutPoint::new(hash, output_index)));
        Ok(())
    }

    /// Append an output paying `amount` satoshis to `locking_script`
    pub fn add_output(&mut self, amount: i64, locking_script: Script) -> Result<()> {
        if amount < 0 {
            return Err(Error::NegativeAmount(amount));
        }
        self.outputs.push(TxOut::new(amount, locking_script));
        Ok(())
    }

    /// Whether any input carries witness data
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }

    /// Wire encoding without witness data
    pub fn serialize_no_witness(&self) -> Vec<u8> {
        self.encode(false)
    }

    /// Wire encoding, using the segwit layout when any input has a witness
    pub fn serialize(&self) -> Vec<u8> {
        self.encode(self.has_witness())
    }

    fn encode(&self, with_witness: bool) -> Vec<u8> {
        let mut buf = Vec::with_capacity(10 + 41 * self.inputs.len() + 34 * self.outputs.len());

        buf.extend_from_slice(&self.version.to_le_bytes());
        if with_witness {
            buf.push(SEGWIT_MARKER);
            buf.push(SEGWIT_FLAG);
        }

        write_varint(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            input.write_to(&mut buf);
        }

        write_varint(&mut buf, self.outputs.len() as u64);
        for output in &self.outputs {
            output.write_to(&mut buf);
        }

        if with_witness {
            for input in &self.inputs {
                input.write_witness_to(&mut buf);
            }
        }

        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf
    }

    /// Transaction id: double SHA-256 of the witness-free encoding
    pub fn txid(&self) -> TxHash {
        TxHash::from_bytes(sha256d(&self.serialize_no_witness()))
    }

    /// Witness transaction id
    pub fn wtxid(&self) -> TxHash {
        TxHash::from_bytes(sha256d(&self.serialize()))
    }

    /// Hex of the full wire encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new(TX_VERSION)
    }
}

/// Create an empty transaction
pub fn new_transaction(version: i32) -> Transaction {
    Transaction::new(version)
}

/// Append an unsigned input to `tx`
pub fn add_input(tx: &mut Transaction, prior_tx_hash: &str, output_index: u32) -> Result<()> {
    tx.add_input(prior_tx_hash, output_index)
}

/// Append an output to `tx`
pub fn add_output(tx: &mut Transaction, amount: i64, locking_script: Script) -> Result<()> {
    tx.add_output(amount, locking_script)
}
