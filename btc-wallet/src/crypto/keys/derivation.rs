//! Key material accessor
//!
//! Usable secp256k1 key pairs pulled out of extended key nodes.

use std::fmt;

use secp256k1::{PublicKey as Secp256k1PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroizing;

use crate::crypto::hash::{base58check_encode, hash160};
use crate::error::{Error, Result};
use crate::network::{params, Network};
use super::extended::ExtendedKey;

/// A secp256k1 private key
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    inner: SecretKey,
}

impl PrivateKey {
    /// Create a private key from 32 raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let inner = SecretKey::from_slice(bytes)
            .map_err(|e| Error::InvalidInput(format!("Invalid private key: {}", e)))?;
        Ok(Self { inner })
    }

    pub(crate) fn from_secret_key(inner: SecretKey) -> Self {
        Self { inner }
    }

    pub(crate) fn as_secret_key(&self) -> &SecretKey {
        &self.inner
    }

    /// Get the raw private key bytes
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.inner.secret_bytes())
    }

    /// Hex rendering of the raw private key
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.secret_bytes().as_slice()))
    }

    /// Wallet import format for a compressed public key
    pub fn to_wif(&self, network: Network) -> Zeroizing<String> {
        let mut payload = Zeroizing::new(Vec::with_capacity(34));
        payload.push(params(network).private_key_id);
        payload.extend_from_slice(self.secret_bytes().as_slice());
        payload.push(0x01);

        Zeroizing::new(base58check_encode(&payload))
    }

    /// Derive the matching public key
    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::new();
        PublicKey::from_secp(Secp256k1PublicKey::from_secret_key(&secp, &self.inner))
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.inner.non_secure_erase();
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A secp256k1 public key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    inner: Secp256k1PublicKey,
}

impl PublicKey {
    /// Parse a compressed (33 bytes) or uncompressed (65 bytes) public key
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let inner = Secp256k1PublicKey::from_slice(bytes)
            .map_err(|e| Error::InvalidInput(format!("Invalid public key: {}", e)))?;
        Ok(Self { inner })
    }

    pub(crate) fn from_secp(inner: Secp256k1PublicKey) -> Self {
        Self { inner }
    }

    pub(crate) fn as_secp(&self) -> &Secp256k1PublicKey {
        &self.inner
    }

    /// SEC1 compressed encoding
    pub fn serialize_compressed(&self) -> [u8; 33] {
        self.inner.serialize()
    }

    /// SEC1 uncompressed encoding
    pub fn serialize_uncompressed(&self) -> [u8; 65] {
        self.inner.serialize_uncompressed()
    }

    /// HASH160 of the compressed encoding
    pub fn pubkey_hash(&self) -> [u8; 20] {
        hash160(&self.serialize_compressed())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.serialize_compressed()))
    }
}

/// A private key together with its public key
#[derive(Debug, Clone)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Create a key pair from a private key
    pub fn new(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self { private_key, public_key }
    }

    /// Get the private key
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Get the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

/// Extract the private key of an extended key node
pub fn private_key(extended: &ExtendedKey) -> Result<PrivateKey> {
    extended.private_key()
}

/// Extract the public key of an extended key node
pub fn public_key(extended: &ExtendedKey) -> PublicKey {
    extended.public_key()
}

/// Extract both halves of a private extended key node
pub fn key_pair(extended: &ExtendedKey) -> Result<KeyPair> {
    Ok(KeyPair::new(extended.private_key()?))
}
