//! Transaction functionality
//!
//! This module provides functionality for assembling Bitcoin transactions,
//! computing their signature hashes and signing their inputs. Broadcasting
//! is left to the caller.

pub mod script;
pub mod types;
pub mod sighash;
pub mod builder;
pub mod signer;

pub use script::{Script, ScriptBuilder};
pub use types::*;
pub use builder::*;
pub use signer::*;
