//! Runtime configuration loaded from the environment

use anyhow::{anyhow, bail, Context, Result};
use btc_wallet::Network;
use zeroize::Zeroizing;

pub const DEFAULT_CHILD_INDEX: u32 = 1;

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub mnemonic: Option<Zeroizing<String>>,
    pub passphrase: Zeroizing<String>,
    pub network: Network,
    pub child_index: u32,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            mnemonic: None,
            passphrase: Zeroizing::new(String::new()),
            network: Network::Testnet,
            child_index: DEFAULT_CHILD_INDEX,
        }
    }
}

impl CliConfig {
    /// Create configuration from environment variables
    ///
    /// Call after `dotenv::dotenv()` so that a local `.env` file is honored.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.mnemonic = lookup("MNEMONIC")
            .map(|phrase| phrase.trim().to_string())
            .filter(|phrase| !phrase.is_empty())
            .map(Zeroizing::new);

        if let Some(passphrase) = lookup("MNEMONIC_PASSPHRASE") {
            config.passphrase = Zeroizing::new(passphrase);
        }

        if let Some(network) = lookup("BTC_NETWORK") {
            config.network = parse_network(&network)?;
        }

        if let Some(index) = lookup("CHILD_INDEX") {
            config.child_index = index
                .trim()
                .parse()
                .with_context(|| format!("CHILD_INDEX must be a u32, got {:?}", index))?;
        }

        Ok(config)
    }

    /// The configured mnemonic, or an error naming the missing variable
    pub fn require_mnemonic(&self) -> Result<&str> {
        self.mnemonic
            .as_deref()
            .map(String::as_str)
            .ok_or_else(|| anyhow!("MNEMONIC is not set (export it or add it to .env)"))
    }
}

/// Parse a network name as accepted by `BTC_NETWORK` and `--network`
pub fn parse_network(name: &str) -> Result<Network> {
    match name.trim().to_ascii_lowercase().as_str() {
        "mainnet" | "main" | "bitcoin" => Ok(Network::Bitcoin),
        "testnet" | "testnet3" | "test" => Ok(Network::Testnet),
        "regtest" => Ok(Network::Regtest),
        other => bail!("Unknown network {:?} (expected mainnet, testnet or regtest)", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CliConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.mnemonic.is_none());
        assert_eq!(config.passphrase.as_str(), "");
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.child_index, DEFAULT_CHILD_INDEX);
        assert!(config.require_mnemonic().is_err());
    }

    #[test]
    fn test_all_variables() {
        let config = CliConfig::from_lookup(lookup(&[
            ("MNEMONIC", "  abandon about  "),
            ("MNEMONIC_PASSPHRASE", "TREZOR"),
            ("BTC_NETWORK", "Regtest"),
            ("CHILD_INDEX", "7"),
        ]))
        .unwrap();

        assert_eq!(config.require_mnemonic().unwrap(), "abandon about");
        assert_eq!(config.passphrase.as_str(), "TREZOR");
        assert_eq!(config.network, Network::Regtest);
        assert_eq!(config.child_index, 7);
    }

    #[test]
    fn test_blank_mnemonic_is_missing() {
        let config = CliConfig::from_lookup(lookup(&[("MNEMONIC", "   ")])).unwrap();
        assert!(config.mnemonic.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(CliConfig::from_lookup(lookup(&[("BTC_NETWORK", "signet")])).is_err());
        assert!(CliConfig::from_lookup(lookup(&[("CHILD_INDEX", "-1")])).is_err());
    }

    #[test]
    fn test_parse_network_aliases() {
        assert_eq!(parse_network("mainnet").unwrap(), Network::Bitcoin);
        assert_eq!(parse_network("bitcoin").unwrap(), Network::Bitcoin);
        assert_eq!(parse_network("testnet3").unwrap(), Network::Testnet);
        assert_eq!(parse_network(" regtest ").unwrap(), Network::Regtest);
    }
}
