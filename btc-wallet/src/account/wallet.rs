//! HD wallet orchestration

use serde::Serialize;

use crate::crypto::keys::{ExtendedKey, KeyPair};
use crate::crypto::mnemonic::derive_seed;
use crate::error::Result;
use crate::network::Network;
use super::address::{p2pkh_address, p2sh_address, p2wpkh_address, redeem_script, Address};

/// A wallet rooted at the master node derived from a mnemonic
#[derive(Debug, Clone)]
pub struct HdWallet {
    master: ExtendedKey,
}

impl HdWallet {
    /// Create a wallet from a mnemonic phrase and passphrase
    pub fn from_mnemonic(phrase: &str, passphrase: &str, network: Network) -> Result<Self> {
        let seed = derive_seed(phrase, passphrase)?;
        Self::from_seed(seed.as_bytes(), network)
    }

    /// Create a wallet from a raw seed
    pub fn from_seed(seed: &[u8], network: Network) -> Result<Self> {
        let master = ExtendedKey::master_from_seed(seed, network)?;
        tracing::debug!(network = %network, "created master key");
        Ok(Self { master })
    }

    /// Get the master node
    pub fn master(&self) -> &ExtendedKey {
        &self.master
    }

    /// Get the wallet's network
    pub fn network(&self) -> Network {
        self.master.network()
    }

    /// Direct child of the master node
    pub fn child(&self, index: u32) -> Result<ExtendedKey> {
        self.master.derive_child(index)
    }

    /// Node at a BIP32 path from the master
    pub fn derive_path(&self, path: &str) -> Result<ExtendedKey> {
        self.master.derive_path(path)
    }

    /// Key pair of the node at `path`
    pub fn key_pair(&self, path: &str) -> Result<KeyPair> {
        Ok(KeyPair::new(self.derive_path(path)?.private_key()?))
    }
}

/// The three address forms of one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressSet {
    pub p2pkh: Address,
    pub p2sh: Address,
    pub p2wpkh: Address,
}

/// P2SH address wrapping the P2WPKH witness program of the node's key
pub fn create_p2sh_address(extended: &ExtendedKey, network: Network) -> Result<Address> {
    let script = redeem_script(&extended.public_key().pubkey_hash())?;
    p2sh_address(script.as_bytes(), network)
}

/// Native P2WPKH address of the node's key
pub fn create_p2wpkh_address(extended: &ExtendedKey, network: Network) -> Result<Address> {
    p2wpkh_address(&extended.public_key().pubkey_hash(), network)
}

/// Legacy P2PKH address of the node's key
pub fn create_p2pkh_address(extended: &ExtendedKey, network: Network) -> Result<Address> {
    p2pkh_address(&extended.public_key().pubkey_hash(), network)
}

/// Every address form of the node's key
pub fn addresses(extended: &ExtendedKey, network: Network) -> Result<AddressSet> {
    Ok(AddressSet {
        p2pkh: create_p2pkh_address(extended, network)?,
        p2sh: create_p2sh_address(extended, network)?,
        p2wpkh: create_p2wpkh_address(extended, network)?,
    })
}
