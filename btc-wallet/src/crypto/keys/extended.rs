//! BIP32 hierarchical deterministic key tree

use std::fmt;
use std::str::FromStr;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use secp256k1::{PublicKey as Secp256k1PublicKey, Scalar, Secp256k1, SecretKey};
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::hash::{base58check_decode, base58check_encode, hash160};
use crate::error::{Error, Result};
use crate::network::{params, Network, KNOWN_NETWORKS};
use super::derivation::{PrivateKey, PublicKey};

/// First index of the hardened range (2^31)
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Shortest seed accepted for a master key
pub const MIN_SEED_LEN: usize = 16;

/// Longest seed accepted for a master key
pub const MAX_SEED_LEN: usize = 64;

/// Length of a serialized extended key without checksum
pub const SERIALIZED_LEN: usize = 78;

const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

#[derive(Clone, PartialEq, Eq)]
enum KeyMaterial {
    Private(SecretKey),
    Public(Secp256k1PublicKey),
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        if let KeyMaterial::Private(secret_key) = self {
            secret_key.non_secure_erase();
        }
    }
}

/// A node of the HD key tree
///
/// Nodes are plain values: deriving a child never touches the parent, and a
/// node can be shared freely across threads.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    key: KeyMaterial,
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_index: u32,
    network: Network,
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<Zeroizing<[u8; 64]>> {
    let mut hmac = <Hmac<Sha512> as KeyInit>::new_from_slice(key)
        .map_err(|_| Error::KeyDerivation("HMAC error".to_string()))?;

    hmac.update(data);
    let result = hmac.finalize().into_bytes();

    let mut output = Zeroizing::new([0u8; 64]);
    output.copy_from_slice(&result);
    Ok(output)
}

fn split_halves(output: &[u8; 64]) -> (Zeroizing<[u8; 32]>, [u8; 32]) {
    let mut left = Zeroizing::new([0u8; 32]);
    let mut right = [0u8; 32];

    left.copy_from_slice(&output[0..32]);
    right.copy_from_slice(&output[32..64]);

    (left, right)
}

/// Whether an index falls in the hardened range
pub fn is_hardened(index: u32) -> bool {
    index >= HARDENED_OFFSET
}

impl ExtendedKey {
    /// Derive the master node from a seed
    pub fn master_from_seed(seed: &[u8], network: Network) -> Result<Self> {
        if seed.len() < MIN_SEED_LEN || seed.len() > MAX_SEED_LEN {
            return Err(Error::SeedDerivation(format!(
                "Seed length must be between {} and {} bytes, got {}",
                MIN_SEED_LEN,
                MAX_SEED_LEN,
                seed.len()
            )));
        }

        let output = hmac_sha512(MASTER_HMAC_KEY, seed)?;
        let (secret_key, chain_code) = split_halves(&output);

        let secret_key = SecretKey::from_slice(secret_key.as_slice())
            .map_err(|e| Error::SeedDerivation(format!("Unusable master key: {}", e)))?;

        Ok(Self {
            key: KeyMaterial::Private(secret_key),
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_index: 0,
            network,
        })
    }

    /// Derive the child node at `index`
    ///
    /// Indices at or above [`HARDENED_OFFSET`] use the parent private key and
    /// fail on public-only nodes. An out-of-range derived key is reported as
    /// [`Error::InvalidChildKey`]; skipping to the next index is up to the caller.
    pub fn derive_child(&self, index: u32) -> Result<Self> {
        let secp = Secp256k1::new();
        let parent_public_key = self.secp_public_key(&secp);

        let depth = self
            .depth
            .checked_add(1)
            .ok_or_else(|| Error::KeyDerivation("Maximum derivation depth reached".to_string()))?;

        let mut data = Zeroizing::new(Vec::with_capacity(37));
        if is_hardened(index) {
            match &self.key {
                KeyMaterial::Private(secret_key) => {
                    data.push(0);
                    let mut secret_bytes = secret_key.secret_bytes();
                    data.extend_from_slice(&secret_bytes);
                    secret_bytes.zeroize();
                }
                KeyMaterial::Public(_) => return Err(Error::HardenedDerivationRequiresPrivateKey),
            }
        } else {
            data.extend_from_slice(&parent_public_key.serialize());
        }
        data.extend_from_slice(&index.to_be_bytes());

        let output = hmac_sha512(&self.chain_code, &data)?;
        let (tweak, chain_code) = split_halves(&output);

        let tweak = Scalar::from_be_bytes(*tweak).map_err(|_| Error::InvalidChildKey(index))?;

        let key = match &self.key {
            KeyMaterial::Private(secret_key) => KeyMaterial::Private(
                secret_key
                    .add_tweak(&tweak)
                    .map_err(|_| Error::InvalidChildKey(index))?,
            ),
            KeyMaterial::Public(public_key) => KeyMaterial::Public(
                public_key
                    .add_exp_tweak(&secp, &tweak)
                    .map_err(|_| Error::InvalidChildKey(index))?,
            ),
        };

        tracing::debug!(depth, index, hardened = is_hardened(index), "derived child key");

        Ok(Self {
            key,
            chain_code,
            depth,
            parent_fingerprint: fingerprint_of(&parent_public_key),
            child_index: index,
            network: self.network,
        })
    }

    /// Derive along a BIP32 path such as `m/84'/0'/0'/0/0`, relative to this node
    pub fn derive_path(&self, path: &str) -> Result<Self> {
        parse_derivation_path(path)?
            .into_iter()
            .try_fold(self.clone(), |node, index| node.derive_child(index))
    }

    /// Public-only copy of this node
    pub fn neuter(&self) -> Self {
        let secp = Secp256k1::new();
        Self {
            key: KeyMaterial::Public(self.secp_public_key(&secp)),
            chain_code: self.chain_code,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_index: self.child_index,
            network: self.network,
        }
    }

    /// Whether this node carries private key material
    pub fn is_private(&self) -> bool {
        matches!(self.key, KeyMaterial::Private(_))
    }

    /// Get the private key, if this node has one
    pub fn private_key(&self) -> Result<PrivateKey> {
        match &self.key {
            KeyMaterial::Private(secret_key) => Ok(PrivateKey::from_secret_key(*secret_key)),
            KeyMaterial::Public(_) => Err(Error::PublicOnlyKey),
        }
    }

    /// Get the public key
    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::new();
        PublicKey::from_secp(self.secp_public_key(&secp))
    }

    fn secp_public_key<C: secp256k1::Signing>(&self, secp: &Secp256k1<C>) -> Secp256k1PublicKey {
        match &self.key {
            KeyMaterial::Private(secret_key) => Secp256k1PublicKey::from_secret_key(secp, secret_key),
            KeyMaterial::Public(public_key) => *public_key,
        }
    }

    /// First four bytes of HASH160 of this node's public key
    pub fn fingerprint(&self) -> [u8; 4] {
        fingerprint_of(self.public_key().as_secp())
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn child_index(&self) -> u32 {
        self.child_index
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// The 78-byte serialization: version, depth, parent fingerprint,
    /// child index, chain code and key material
    pub fn serialize(&self) -> Zeroizing<[u8; SERIALIZED_LEN]> {
        let network_params = params(self.network);
        let mut data = Zeroizing::new([0u8; SERIALIZED_LEN]);

        let version = if self.is_private() {
            network_params.hd_private_key_id
        } else {
            network_params.hd_public_key_id
        };

        data[0..4].copy_from_slice(&version);
        data[4] = self.depth;
        data[5..9].copy_from_slice(&self.parent_fingerprint);
        data[9..13].copy_from_slice(&self.child_index.to_be_bytes());
        data[13..45].copy_from_slice(&self.chain_code);
        match &self.key {
            KeyMaterial::Private(secret_key) => {
                data[45] = 0;
                let mut secret_bytes = secret_key.secret_bytes();
                data[46..78].copy_from_slice(&secret_bytes);
                secret_bytes.zeroize();
            }
            KeyMaterial::Public(public_key) => data[45..78].copy_from_slice(&public_key.serialize()),
        }

        data
    }
}

fn fingerprint_of(public_key: &Secp256k1PublicKey) -> [u8; 4] {
    let hash = hash160(&public_key.serialize());
    let mut fingerprint = [0u8; 4];
    fingerprint.copy_from_slice(&hash[0..4]);
    fingerprint
}

/// Parse a BIP32 derivation path into child indices
///
/// Accepts `m`, `m/0/1` and hardened markers `'`, `h` or `H`.
pub fn parse_derivation_path(path: &str) -> Result<Vec<u32>> {
    let mut components = path.trim().split('/');
    if components.next() != Some("m") {
        return Err(Error::KeyDerivation(format!("Invalid derivation path: {}", path)));
    }

    let mut result = Vec::new();
    for component in components {
        if component.is_empty() {
            continue;
        }

        let (digits, hardened) = match component.strip_suffix(&['\'', 'h', 'H'][..]) {
            Some(digits) => (digits, true),
            None => (component, false),
        };

        let index = digits
            .parse::<u32>()
            .ok()
            .filter(|index| !is_hardened(*index))
            .ok_or_else(|| Error::KeyDerivation(format!("Invalid derivation path component: {}", component)))?;

        result.push(if hardened { index + HARDENED_OFFSET } else { index });
    }

    Ok(result)
}

impl fmt::Display for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58check_encode(self.serialize().as_slice()))
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("private", &self.is_private())
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_index", &self.child_index)
            .field("network", &self.network)
            .finish()
    }
}

impl FromStr for ExtendedKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let data = Zeroizing::new(
            base58check_decode(s).map_err(|e| Error::KeyDerivation(format!("Invalid extended key: {}", e)))?,
        );

        if data.len() != SERIALIZED_LEN {
            return Err(Error::KeyDerivation(format!(
                "Invalid extended key length: {}",
                data.len()
            )));
        }

        let version = &data[0..4];
        let (network, private) = KNOWN_NETWORKS
            .iter()
            .find_map(|network| {
                let network_params = params(*network);
                if version == network_params.hd_private_key_id {
                    Some((*network, true))
                } else if version == network_params.hd_public_key_id {
                    Some((*network, false))
                } else {
                    None
                }
            })
            .ok_or_else(|| Error::KeyDerivation(format!("Unknown extended key version: {}", hex::encode(version))))?;

        let depth = data[4];
        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&data[5..9]);
        let mut index_bytes = [0u8; 4];
        index_bytes.copy_from_slice(&data[9..13]);
        let child_index = u32::from_be_bytes(index_bytes);

        if depth == 0 && (parent_fingerprint != [0u8; 4] || child_index != 0) {
            return Err(Error::KeyDerivation("Master key with non-zero parent fingerprint or index".to_string()));
        }

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);

        let key = if private {
            if data[45] != 0 {
                return Err(Error::KeyDerivation("Invalid private key prefix".to_string()));
            }
            KeyMaterial::Private(
                SecretKey::from_slice(&data[46..78])
                    .map_err(|e| Error::KeyDerivation(format!("Invalid private key: {}", e)))?,
            )
        } else {
            KeyMaterial::Public(
                Secp256k1PublicKey::from_slice(&data[45..78])
                    .map_err(|e| Error::KeyDerivation(format!("Invalid public key: {}", e)))?,
            )
        };

        Ok(Self {
            key,
            chain_code,
            depth,
            parent_fingerprint,
            child_index,
            network,
        })
    }
}

/// Derive the master node from a seed
pub fn master_from_seed(seed: &[u8], network: Network) -> Result<ExtendedKey> {
    ExtendedKey::master_from_seed(seed, network)
}

/// Derive the child node at `index`
pub fn derive_child(parent: &ExtendedKey, index: u32) -> Result<ExtendedKey> {
    parent.derive_child(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTOR1_SEED: &str = "000102030405060708090a0b0c0d0e0f";

    fn vector1_master() -> ExtendedKey {
        let seed = hex::decode(VECTOR1_SEED).unwrap();
        ExtendedKey::master_from_seed(&seed, Network::Bitcoin).unwrap()
    }

    #[test]
    fn test_vector1_master() {
        let master = vector1_master();
        assert_eq!(
            master.to_string(),
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
        );
        assert_eq!(
            master.neuter().to_string(),
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8"
        );
        assert_eq!(hex::encode(master.fingerprint()), "3442193e");
        assert_eq!(master.depth(), 0);
    }

    #[test]
    fn test_vector1_chain() {
        let master = vector1_master();

        let child = master.derive_child(HARDENED_OFFSET).unwrap();
        assert_eq!(
            child.to_string(),
            "xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7"
        );
        assert_eq!(child.parent_fingerprint(), master.fingerprint());
        assert_eq!(child.depth(), 1);

        let grandchild = child.derive_child(1).unwrap();
        assert_eq!(
            grandchild.to_string(),
            "xprv9wTYmMFdV23N2TdNG573QoEsfRrWKQgWeibmLntzniatZvR9BmLnvSxqu53Kw1UmYPxLgboyZQaXwTCg8MSY3H2EU4pWcQDnRnrVA1xe8fs"
        );
        assert_eq!(
            grandchild.neuter().to_string(),
            "xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ"
        );

        assert_eq!(master.derive_path("m/0'/1").unwrap(), grandchild);
        assert_eq!(master.derive_path("m/0h/1").unwrap(), grandchild);
    }

    #[test]
    fn test_public_derivation_matches_private() {
        let parent = vector1_master().derive_child(HARDENED_OFFSET).unwrap();

        let from_private = parent.derive_child(1).unwrap().neuter();
        let from_public = parent.neuter().derive_child(1).unwrap();

        assert_eq!(from_private, from_public);
        assert!(!from_public.is_private());
    }

    #[test]
    fn test_hardened_differs_from_normal() {
        let master = vector1_master();
        let normal = master.derive_child(0).unwrap();
        let hardened = master.derive_child(HARDENED_OFFSET).unwrap();

        assert_ne!(normal.public_key(), hardened.public_key());
        assert_ne!(normal.chain_code(), hardened.chain_code());
    }

    #[test]
    fn test_public_only_restrictions() {
        let public = vector1_master().neuter();

        assert_eq!(public.derive_child(HARDENED_OFFSET).unwrap_err(), Error::HardenedDerivationRequiresPrivateKey);
        assert_eq!(public.private_key().unwrap_err(), Error::PublicOnlyKey);
        assert_eq!(public.public_key(), vector1_master().public_key());
    }

    #[test]
    fn test_derivation_leaves_parent_untouched() {
        let master = vector1_master();
        let before = master.clone();
        let _ = master.derive_child(7).unwrap();
        assert_eq!(master, before);
    }

    #[test]
    fn test_seed_length_bounds() {
        for len in [0usize, 15, 65] {
            let seed = vec![1u8; len];
            assert!(matches!(
                ExtendedKey::master_from_seed(&seed, Network::Bitcoin),
                Err(Error::SeedDerivation(_))
            ));
        }
        assert!(ExtendedKey::master_from_seed(&[1u8; 16], Network::Bitcoin).is_ok());
        assert!(ExtendedKey::master_from_seed(&[1u8; 64], Network::Bitcoin).is_ok());
    }

    #[test]
    fn test_parse_round_trip() {
        let grandchild = vector1_master().derive_path("m/0'/1").unwrap();

        let parsed: ExtendedKey = grandchild.to_string().parse().unwrap();
        assert_eq!(parsed, grandchild);

        let parsed_public: ExtendedKey = grandchild.neuter().to_string().parse().unwrap();
        assert_eq!(parsed_public, grandchild.neuter());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let encoded = vector1_master().to_string();
        let mut corrupted = encoded.clone();
        let last = if encoded.ends_with('i') { "j" } else { "i" };
        corrupted.replace_range(encoded.len() - 1.., last);

        assert!(matches!(corrupted.parse::<ExtendedKey>(), Err(Error::KeyDerivation(_))));
        assert!("not-a-key".parse::<ExtendedKey>().is_err());
    }

    #[test]
    fn test_testnet_version_prefix() {
        let seed = hex::decode(VECTOR1_SEED).unwrap();
        let master = ExtendedKey::master_from_seed(&seed, Network::Testnet).unwrap();

        assert!(master.to_string().starts_with("tprv"));
        assert!(master.neuter().to_string().starts_with("tpub"));
        assert_eq!(master.public_key(), vector1_master().public_key());

        let parsed: ExtendedKey = master.to_string().parse().unwrap();
        assert_eq!(parsed.network(), Network::Testnet);
    }

    #[test]
    fn test_parse_derivation_path() {
        assert_eq!(parse_derivation_path("m").unwrap(), Vec::<u32>::new());
        assert_eq!(
            parse_derivation_path("m/44'/0'/0'/0/5").unwrap(),
            vec![44 + HARDENED_OFFSET, HARDENED_OFFSET, HARDENED_OFFSET, 0, 5]
        );
        assert!(parse_derivation_path("44'/0'").is_err());
        assert!(parse_derivation_path("m/abc").is_err());
        assert!(parse_derivation_path("m/2147483648").is_err());
    }

    #[test]
    fn test_extended_key_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExtendedKey>();
    }
}
