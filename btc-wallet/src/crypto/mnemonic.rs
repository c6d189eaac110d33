//! Mnemonic phrase generation and seed derivation (BIP39)

use std::fmt;

use bip39::Mnemonic;
use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Word counts accepted by BIP39
pub const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Length of a BIP39 seed in bytes
pub const SEED_LEN: usize = 64;

/// Supported mnemonic strengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MnemonicStrength {
    /// 12 words (128 bits)
    Words12,
    /// 15 words (160 bits)
    Words15,
    /// 18 words (192 bits)
    Words18,
    /// 21 words (224 bits)
    Words21,
    /// 24 words (256 bits)
    Words24,
}

impl MnemonicStrength {
    /// Get entropy length in bytes
    fn entropy_bytes(&self) -> usize {
        match self {
            Self::Words12 => 16,
            Self::Words15 => 20,
            Self::Words18 => 24,
            Self::Words21 => 28,
            Self::Words24 => 32,
        }
    }
}

/// A 512-bit BIP39 seed, wiped from memory when dropped
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: [u8; SEED_LEN],
}

impl Seed {
    /// Get the raw seed bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Seed {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}

/// Generate a new random mnemonic phrase with the specified strength
pub fn generate_mnemonic(strength: MnemonicStrength) -> Result<String> {
    let mut entropy = vec![0u8; strength.entropy_bytes()];
    OsRng.fill_bytes(&mut entropy);

    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| Error::InvalidMnemonic(e.to_string()));
    entropy.zeroize();

    Ok(mnemonic?.to_string())
}

/// Parse a phrase, checking word count, wordlist membership and checksum
fn parse_mnemonic(phrase: &str) -> Result<Mnemonic> {
    let word_count = phrase.split_whitespace().count();
    if !VALID_WORD_COUNTS.contains(&word_count) {
        return Err(Error::InvalidMnemonic(format!("Unsupported word count: {}", word_count)));
    }

    Mnemonic::parse_normalized(phrase).map_err(|e| Error::InvalidMnemonic(e.to_string()))
}

/// Check whether a mnemonic phrase has a valid word count and checksum
pub fn validate_mnemonic(phrase: &str) -> bool {
    parse_mnemonic(phrase).is_ok()
}

/// Derive the 64-byte seed from a mnemonic phrase and passphrase
///
/// PBKDF2-HMAC-SHA512 with 2048 rounds, the phrase as password and
/// `"mnemonic" + passphrase` as salt.
pub fn derive_seed(phrase: &str, passphrase: &str) -> Result<Seed> {
    let mnemonic = parse_mnemonic(phrase)?;

    Ok(Seed {
        bytes: mnemonic.to_seed_normalized(passphrase),
    })
}
