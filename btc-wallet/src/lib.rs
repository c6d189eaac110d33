//! BTC Wallet Core - mnemonic to signed Bitcoin transaction
//!
//! This library derives a BIP32 key tree from a BIP39 mnemonic, builds
//! P2PKH, P2SH-wrapped segwit and native segwit addresses from its keys, and
//! assembles and signs transactions spending from them.

pub mod error;
pub mod network;
pub mod crypto;
pub mod account;
pub mod transaction;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use network::{params, Network, NetworkParams};
pub use crypto::keys::{ExtendedKey, KeyPair, PrivateKey, PublicKey};
pub use account::{Address, AddressKind, HdWallet};
pub use transaction::{SpendKind, Transaction, TransactionSigner};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
