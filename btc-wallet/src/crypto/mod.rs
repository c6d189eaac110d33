//! Cryptographic primitives and operations
//!
//! This module provides functionality for mnemonic handling, seed and key
//! derivation, and the hashes shared by addresses and signing.

pub mod mnemonic;
pub mod hash;
pub mod keys;

pub use mnemonic::*;
pub use keys::*;
