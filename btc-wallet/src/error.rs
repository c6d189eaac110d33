//! Error types for the btc-wallet library

use thiserror::Error;

/// Custom error type for btc-wallet operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bad word count, unknown word or failed checksum
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Seed outside the accepted length range or unusable as a master key
    #[error("Seed derivation error: {0}")]
    SeedDerivation(String),

    #[error("Hardened derivation requires a private key")]
    HardenedDerivationRequiresPrivateKey,

    /// Derived scalar is zero or not below the curve order; the caller
    /// decides whether to move on to the next index
    #[error("Invalid child key at index {0}")]
    InvalidChildKey(u32),

    #[error("Private key requested from a public-only extended key")]
    PublicOnlyKey,

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Malformed hash: {0}")]
    MalformedHash(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid hash length: {0}")]
    InvalidHashLength(String),

    #[error("Negative amount: {0}")]
    NegativeAmount(i64),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for btc-wallet operations
pub type Result<T> = std::result::Result<T, Error>;
