//! Network parameter sets
//!
//! Every encoding that depends on the chain (address versions, bech32 prefix,
//! extended key versions, WIF) reads its constants from a [`NetworkParams`]
//! resolved from the [`Network`] the caller passes in. Nothing here is global
//! mutable state.

use bitcoin_bech32::constants::Network as Bech32Network;

pub use bitcoin::Network;

/// Constants fixing the address and HD key encodings of one network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    /// Human readable name
    pub name: &'static str,
    /// Version byte of P2PKH addresses
    pub pubkey_hash_addr_id: u8,
    /// Version byte of P2SH addresses
    pub script_hash_addr_id: u8,
    /// Version byte of WIF encoded private keys
    pub private_key_id: u8,
    /// Bech32 human readable part of segwit addresses
    pub bech32_hrp: &'static str,
    /// Network tag used by the bech32 codec
    pub bech32_network: Bech32Network,
    /// Version prefix of serialized extended private keys
    pub hd_private_key_id: [u8; 4],
    /// Version prefix of serialized extended public keys
    pub hd_public_key_id: [u8; 4],
}

/// Bitcoin main network
pub const MAINNET_PARAMS: NetworkParams = NetworkParams {
    name: "mainnet",
    pubkey_hash_addr_id: 0x00,
    script_hash_addr_id: 0x05,
    private_key_id: 0x80,
    bech32_hrp: "bc",
    bech32_network: Bech32Network::Bitcoin,
    hd_private_key_id: [0x04, 0x88, 0xad, 0xe4], // xprv
    hd_public_key_id: [0x04, 0x88, 0xb2, 0x1e],  // xpub
};

/// Bitcoin test network (version 3), also used for signet
pub const TESTNET_PARAMS: NetworkParams = NetworkParams {
    name: "testnet3",
    pubkey_hash_addr_id: 0x6f,
    script_hash_addr_id: 0xc4,
    private_key_id: 0xef,
    bech32_hrp: "tb",
    bech32_network: Bech32Network::Testnet,
    hd_private_key_id: [0x04, 0x35, 0x83, 0x94], // tprv
    hd_public_key_id: [0x04, 0x35, 0x87, 0xcf],  // tpub
};

/// Bitcoin regression test network
pub const REGTEST_PARAMS: NetworkParams = NetworkParams {
    name: "regtest",
    pubkey_hash_addr_id: 0x6f,
    script_hash_addr_id: 0xc4,
    private_key_id: 0xef,
    bech32_hrp: "bcrt",
    bech32_network: Bech32Network::Regtest,
    hd_private_key_id: [0x04, 0x35, 0x83, 0x94],
    hd_public_key_id: [0x04, 0x35, 0x87, 0xcf],
};

/// Resolve the constant parameter set of a network
pub fn params(network: Network) -> &'static NetworkParams {
    match network {
        Network::Bitcoin => &MAINNET_PARAMS,
        Network::Regtest => &REGTEST_PARAMS,
        _ => &TESTNET_PARAMS,
    }
}

/// Networks recognised when decoding strings that carry their own version
pub(crate) const KNOWN_NETWORKS: [Network; 3] = [Network::Bitcoin, Network::Testnet, Network::Regtest];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_lookup() {
        assert_eq!(params(Network::Bitcoin).bech32_hrp, "bc");
        assert_eq!(params(Network::Testnet).bech32_hrp, "tb");
        assert_eq!(params(Network::Signet).bech32_hrp, "tb");
        assert_eq!(params(Network::Regtest).bech32_hrp, "bcrt");
    }

    #[test]
    fn test_regtest_shares_testnet_versions() {
        let test = params(Network::Testnet);
        let reg = params(Network::Regtest);
        assert_eq!(test.script_hash_addr_id, reg.script_hash_addr_id);
        assert_eq!(test.hd_private_key_id, reg.hd_private_key_id);
        assert_ne!(test.bech32_hrp, reg.bech32_hrp);
    }
}
