//! Account management functionality
//!
//! This module turns keys into addresses and walks the HD tree on behalf of
//! a wallet.

pub mod address;
mod wallet;

pub use address::*;
pub use wallet::*;
