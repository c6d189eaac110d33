//! Address management
//!
//! Addresses are pure functions of a 20-byte hash and a network. P2PKH and
//! P2SH use base58check, P2WPKH uses a bech32 witness v0 program.

use std::fmt;
use std::str::FromStr;

use bitcoin_bech32::{u5, WitnessProgram};
use serde::{Serialize, Serializer};

use crate::crypto::hash::{base58check_decode, base58check_encode, hash160};
use crate::crypto::keys::PublicKey;
use crate::error::{Error, Result};
use crate::network::{params, Network, KNOWN_NETWORKS};
use crate::transaction::script::{
    Script, ScriptBuilder, OP_0, OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160,
};

/// Length of a public key hash or script hash
pub const HASH_LEN: usize = 20;

/// Address type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    /// Pay to public key hash
    P2pkh,
    /// Pay to script hash
    P2sh,
    /// Pay to witness public key hash (native segwit v0)
    P2wpkh,
}

/// A Bitcoin address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    kind: AddressKind,
    hash: [u8; HASH_LEN],
    network: Network,
    encoded: String,
}

/// HASH160 of a compressed public key
pub fn pubkey_hash(public_key: &PublicKey) -> [u8; HASH_LEN] {
    public_key.pubkey_hash()
}

/// Validate a hash used as address payload
fn checked_hash(hash: &[u8]) -> Result<[u8; HASH_LEN]> {
    if hash.is_empty() {
        return Err(Error::InvalidHashLength("Hash is empty".to_string()));
    }
    if hash.iter().all(|byte| *byte == 0) {
        return Err(Error::InvalidHashLength("Hash is all zeros".to_string()));
    }
    if hash.len() != HASH_LEN {
        return Err(Error::Encoding(format!(
            "Expected a {} byte hash, got {} bytes",
            HASH_LEN,
            hash.len()
        )));
    }

    let mut checked = [0u8; HASH_LEN];
    checked.copy_from_slice(hash);
    Ok(checked)
}

fn encode_base58(version: u8, hash: &[u8; HASH_LEN]) -> String {
    let mut payload = Vec::with_capacity(1 + HASH_LEN);
    payload.push(version);
    payload.extend_from_slice(hash);
    base58check_encode(&payload)
}

fn encode_witness_v0(hash: &[u8; HASH_LEN], network: Network) -> Result<String> {
    let version = u5::try_from_u8(0).map_err(|e| Error::Encoding(e.to_string()))?;
    let program = WitnessProgram::new(version, hash.to_vec(), params(network).bech32_network)
        .map_err(|e| Error::Encoding(format!("Invalid witness program: {}", e)))?;
    Ok(program.to_address())
}

/// Native segwit address for a public key hash
pub fn p2wpkh_address(pubkey_hash: &[u8], network: Network) -> Result<Address> {
    let hash = checked_hash(pubkey_hash)?;
    let encoded = encode_witness_v0(&hash, network)?;

    Ok(Address {
        kind: AddressKind::P2wpkh,
        hash,
        network,
        encoded,
    })
}

/// Legacy address for a public key hash
pub fn p2pkh_address(pubkey_hash: &[u8], network: Network) -> Result<Address> {
    let hash = checked_hash(pubkey_hash)?;

    Ok(Address {
        kind: AddressKind::P2pkh,
        hash,
        network,
        encoded: encode_base58(params(network).pubkey_hash_addr_id, &hash),
    })
}

/// The witness program `OP_0 <pubkey_hash>` used as a P2SH redeem script
pub fn redeem_script(pubkey_hash: &[u8]) -> Result<Script> {
    let hash = checked_hash(pubkey_hash)?;
    ScriptBuilder::new().add_op(OP_0).add_data(&hash).script()
}

/// Script hash address committing to `redeem_script`
pub fn p2sh_address(redeem_script: &[u8], network: Network) -> Result<Address> {
    if redeem_script.is_empty() {
        return Err(Error::Encoding("Redeem script is empty".to_string()));
    }

    let hash = hash160(redeem_script);

    Ok(Address {
        kind: AddressKind::P2sh,
        hash,
        network,
        encoded: encode_base58(params(network).script_hash_addr_id, &hash),
    })
}

impl Address {
    /// Decode an address string, recognising its network from the prefix
    ///
    /// Base58 addresses with testnet version bytes decode as testnet, since
    /// regtest shares them.
    pub fn decode(address: &str) -> Result<Self> {
        if let Ok(program) = WitnessProgram::from_address(address) {
            return Self::from_witness_program(&program);
        }

        let payload = base58check_decode(address)?;
        if payload.len() != 1 + HASH_LEN {
            return Err(Error::Encoding(format!("Invalid address payload length: {}", payload.len())));
        }

        let version = payload[0];
        let hash = checked_hash(&payload[1..])?;

        for network in KNOWN_NETWORKS {
            let network_params = params(network);
            if version == network_params.pubkey_hash_addr_id {
                return p2pkh_address(&hash, network);
            }
            if version == network_params.script_hash_addr_id {
                return Ok(Self {
                    kind: AddressKind::P2sh,
                    hash,
                    network,
                    encoded: encode_base58(version, &hash),
                });
            }
        }

        Err(Error::Encoding(format!("Unknown address version: {:#04x}", version)))
    }

    /// Decode an address string and require it to belong to `network`
    pub fn decode_for_network(address: &str, network: Network) -> Result<Self> {
        let decoded = Self::decode(address)?;
        let expected = params(network);
        let actual = params(decoded.network);

        let matches = match decoded.kind {
            AddressKind::P2wpkh => expected.bech32_hrp == actual.bech32_hrp,
            AddressKind::P2pkh => expected.pubkey_hash_addr_id == actual.pubkey_hash_addr_id,
            AddressKind::P2sh => expected.script_hash_addr_id == actual.script_hash_addr_id,
        };
        if !matches {
            return Err(Error::InvalidInput(format!(
                "Address {} does not belong to {}",
                address, expected.name
            )));
        }

        Ok(Self { network, ..decoded })
    }

    fn from_witness_program(program: &WitnessProgram) -> Result<Self> {
        if program.version().to_u8() != 0 || program.program().len() != HASH_LEN {
            return Err(Error::Encoding("Only version 0 key hash witness programs are supported".to_string()));
        }

        let network = KNOWN_NETWORKS
            .into_iter()
            .find(|network| params(*network).bech32_network == program.network())
            .ok_or_else(|| Error::Encoding("Unknown bech32 network".to_string()))?;

        p2wpkh_address(program.program(), network)
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    /// The public key hash or script hash carried by this address
    pub fn hash(&self) -> &[u8; HASH_LEN] {
        &self.hash
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// Locking script paying to this address
    pub fn script_pubkey(&self) -> Script {
        let mut script = Vec::with_capacity(25);
        match self.kind {
            AddressKind::P2pkh => {
                script.extend_from_slice(&[OP_DUP, OP_HASH160, HASH_LEN as u8]);
                script.extend_from_slice(&self.hash);
                script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
            }
            AddressKind::P2sh => {
                script.extend_from_slice(&[OP_HASH160, HASH_LEN as u8]);
                script.extend_from_slice(&self.hash);
                script.push(OP_EQUAL);
            }
            AddressKind::P2wpkh => {
                script.extend_from_slice(&[OP_0, HASH_LEN as u8]);
                script.extend_from_slice(&self.hash);
            }
        }
        Script::from(script)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // HASH160 of the compressed generator point (private key 1)
    const GENERATOR_HASH: &str = "751e76e8199196d454941c45d1b3a323f1433bd6";

    fn generator_hash() -> Vec<u8> {
        hex::decode(GENERATOR_HASH).unwrap()
    }

    #[test]
    fn test_p2wpkh_vectors() {
        let hash = generator_hash();
        assert_eq!(
            p2wpkh_address(&hash, Network::Bitcoin).unwrap().as_str(),
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        );
        assert_eq!(
            p2wpkh_address(&hash, Network::Testnet).unwrap().as_str(),
            "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx"
        );
        assert!(p2wpkh_address(&hash, Network::Regtest).unwrap().as_str().starts_with("bcrt1q"));
    }

    #[test]
    fn test_p2pkh_vector() {
        let address = p2pkh_address(&generator_hash(), Network::Bitcoin).unwrap();
        assert_eq!(address.as_str(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
    }

    #[test]
    fn test_redeem_script_shape() {
        let script = redeem_script(&generator_hash()).unwrap();
        assert_eq!(hex::encode(script.as_bytes()), format!("0014{}", GENERATOR_HASH));
    }

    #[test]
    fn test_p2sh_commits_to_redeem_script() {
        let script = redeem_script(&generator_hash()).unwrap();
        let address = p2sh_address(script.as_bytes(), Network::Bitcoin).unwrap();

        assert!(address.as_str().starts_with('3'));
        assert_eq!(address.hash(), &hash160(script.as_bytes()));
        assert!(p2sh_address(script.as_bytes(), Network::Testnet).unwrap().as_str().starts_with('2'));
    }

    #[test]
    fn test_network_changes_only_prefix() {
        let hash = generator_hash();
        let main = p2wpkh_address(&hash, Network::Bitcoin).unwrap();
        let test = p2wpkh_address(&hash, Network::Testnet).unwrap();

        assert_ne!(main.as_str(), test.as_str());
        assert_eq!(main.hash(), test.hash());
        assert_eq!(main.script_pubkey(), test.script_pubkey());
    }

    #[test]
    fn test_decode_round_trip() {
        let hash = generator_hash();
        let script = redeem_script(&hash).unwrap();
        let addresses = [
            p2wpkh_address(&hash, Network::Bitcoin).unwrap(),
            p2wpkh_address(&hash, Network::Testnet).unwrap(),
            p2wpkh_address(&hash, Network::Regtest).unwrap(),
            p2pkh_address(&hash, Network::Bitcoin).unwrap(),
            p2pkh_address(&hash, Network::Testnet).unwrap(),
            p2sh_address(script.as_bytes(), Network::Bitcoin).unwrap(),
            p2sh_address(script.as_bytes(), Network::Testnet).unwrap(),
        ];

        for address in addresses {
            let decoded: Address = address.as_str().parse().unwrap();
            assert_eq!(decoded.hash(), address.hash());
            assert_eq!(decoded.kind(), address.kind());
            assert_eq!(decoded.as_str(), address.as_str());
        }
    }

    #[test]
    fn test_decode_for_network() {
        let address = p2wpkh_address(&generator_hash(), Network::Testnet).unwrap();

        assert!(Address::decode_for_network(address.as_str(), Network::Testnet).is_ok());
        assert!(matches!(
            Address::decode_for_network(address.as_str(), Network::Bitcoin),
            Err(Error::InvalidInput(_))
        ));

        let legacy = p2pkh_address(&generator_hash(), Network::Testnet).unwrap();
        let regtest = Address::decode_for_network(legacy.as_str(), Network::Regtest).unwrap();
        assert_eq!(regtest.network(), Network::Regtest);
    }

    #[test]
    fn test_rejects_bad_hashes() {
        assert!(matches!(p2wpkh_address(&[], Network::Bitcoin), Err(Error::InvalidHashLength(_))));
        assert!(matches!(p2wpkh_address(&[0u8; 20], Network::Bitcoin), Err(Error::InvalidHashLength(_))));
        assert!(matches!(p2wpkh_address(&[1u8; 19], Network::Bitcoin), Err(Error::Encoding(_))));
        assert!(matches!(redeem_script(&[0u8; 20]), Err(Error::InvalidHashLength(_))));
        assert!(matches!(p2sh_address(&[], Network::Bitcoin), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!("".parse::<Address>().is_err());
        assert!("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5".parse::<Address>().is_err());
        assert!("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMJ".parse::<Address>().is_err());
    }

    #[test]
    fn test_script_pubkeys() {
        let hash = generator_hash();
        assert_eq!(
            hex::encode(p2pkh_address(&hash, Network::Bitcoin).unwrap().script_pubkey().as_bytes()),
            format!("76a914{}88ac", GENERATOR_HASH)
        );
        assert_eq!(
            hex::encode(p2wpkh_address(&hash, Network::Bitcoin).unwrap().script_pubkey().as_bytes()),
            format!("0014{}", GENERATOR_HASH)
        );
        let p2sh = p2sh_address(redeem_script(&hash).unwrap().as_bytes(), Network::Bitcoin).unwrap();
        let script = p2sh.script_pubkey();
        assert_eq!(script.as_bytes()[0], OP_HASH160);
        assert_eq!(script.as_bytes()[22], OP_EQUAL);
    }

    #[test]
    fn test_serializes_as_string() {
        let address = p2wpkh_address(&generator_hash(), Network::Bitcoin).unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4\"");
    }
}
