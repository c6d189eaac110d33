//! Key derivation and management
//!
//! This module provides the BIP32 key tree and the accessors that turn its
//! nodes into usable secp256k1 keys.

pub mod extended;
mod derivation;

pub use derivation::*;
pub use extended::{derive_child, master_from_seed, parse_derivation_path, ExtendedKey, HARDENED_OFFSET};
