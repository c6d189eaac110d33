//! BTC Wallet CLI
//!
//! Derives keys and addresses from a BIP39 mnemonic and signs a transaction
//! spending one of them. Configuration comes from the environment (`.env`
//! supported) and can be overridden with flags.

mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use btc_wallet::account::{addresses, AddressSet, HdWallet};
use btc_wallet::crypto::keys::{key_pair, HARDENED_OFFSET};
use btc_wallet::crypto::mnemonic::{generate_mnemonic, MnemonicStrength};
use btc_wallet::transaction::{build_transaction, verify_input, SpendKind, TransactionSigner};
use btc_wallet::{ExtendedKey, Network};

use crate::config::{parse_network, CliConfig};

#[derive(Parser)]
#[command(name = "btc-wallet")]
#[command(about = "BIP39/BIP32 key derivation, segwit addresses and transaction signing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Network override (mainnet, testnet or regtest)
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the master node and one of its children (default)
    Show {
        /// Child index override
        #[arg(short, long)]
        index: Option<u32>,
    },
    /// Show the node at a derivation path or child index
    Derive {
        /// Derivation path such as m/84'/1'/0'/0/0
        #[arg(short, long, conflicts_with_all = ["index", "hardened"])]
        path: Option<String>,
        /// Child index of the master node
        #[arg(short, long)]
        index: Option<u32>,
        /// Derive the hardened child
        #[arg(long)]
        hardened: bool,
    },
    /// Build and sign a transaction spending an output held by the child key
    Spend {
        /// Hash of the transaction holding the output, in display order
        #[arg(long)]
        prev_txid: String,
        /// Index of the output within that transaction
        #[arg(long, default_value_t = 0)]
        vout: u32,
        /// Satoshis paid to each of the child's P2SH and P2WPKH addresses
        #[arg(long)]
        amount: i64,
        /// Value of the spent output in satoshis (segwit spends)
        #[arg(long)]
        prev_amount: Option<i64>,
        /// How the spent output is locked
        #[arg(long, value_enum, default_value_t = SpendArg::P2wpkh)]
        spend_kind: SpendArg,
        /// Child index override
        #[arg(short, long)]
        index: Option<u32>,
    },
    /// Generate a new mnemonic phrase
    Generate {
        /// Number of words (12, 15, 18, 21 or 24)
        #[arg(short, long, default_value_t = 12)]
        words: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SpendArg {
    Legacy,
    P2wpkh,
    P2shP2wpkh,
}

#[derive(Serialize)]
struct NodeReport {
    path: String,
    extended_private_key: String,
    extended_public_key: String,
    private_key_wif: String,
    private_key_hex: String,
    public_key: String,
    addresses: AddressSet,
}

#[derive(Serialize)]
struct ShowReport {
    network: String,
    master: NodeReport,
    child: NodeReport,
}

#[derive(Serialize)]
struct SpendReport {
    network: String,
    spend_kind: String,
    txid: String,
    wtxid: String,
    verified: bool,
    hex: String,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = CliConfig::from_env().context("Failed to load configuration")?;
    if let Some(network) = &cli.network {
        config.network = parse_network(network)?;
    }

    match cli.command.unwrap_or(Commands::Show { index: None }) {
        Commands::Show { index } => handle_show(&config, index, cli.json),
        Commands::Derive { path, index, hardened } => handle_derive(&config, path, index, hardened, cli.json),
        Commands::Spend {
            prev_txid,
            vout,
            amount,
            prev_amount,
            spend_kind,
            index,
        } => handle_spend(&config, &prev_txid, vout, amount, prev_amount, spend_kind, index, cli.json),
        Commands::Generate { words } => handle_generate(words, cli.json),
    }
}

fn open_wallet(config: &CliConfig) -> Result<HdWallet> {
    HdWallet::from_mnemonic(config.require_mnemonic()?, &config.passphrase, config.network)
        .context("Failed to derive master key from mnemonic")
}

fn node_report(path: String, node: &ExtendedKey, network: Network) -> Result<NodeReport> {
    let keys = key_pair(node)?;
    Ok(NodeReport {
        path,
        extended_private_key: node.to_string(),
        extended_public_key: node.neuter().to_string(),
        private_key_wif: keys.private_key().to_wif(network).to_string(),
        private_key_hex: keys.private_key().to_hex().to_string(),
        public_key: keys.public_key().to_string(),
        addresses: addresses(node, network)?,
    })
}

fn log_node(label: &str, report: &NodeReport) {
    info!("{} ({})", label, report.path);
    info!("  extended private key: {}", report.extended_private_key);
    info!("  extended public key:  {}", report.extended_public_key);
    info!("  private key (WIF):    {}", report.private_key_wif);
    info!("  private key (hex):    {}", report.private_key_hex);
    info!("  public key:           {}", report.public_key);
    info!("  P2PKH address:        {}", report.addresses.p2pkh);
    info!("  P2SH-P2WPKH address:  {}", report.addresses.p2sh);
    info!("  P2WPKH address:       {}", report.addresses.p2wpkh);
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_show(config: &CliConfig, index: Option<u32>, json: bool) -> Result<()> {
    let wallet = open_wallet(config)?;
    let index = index.unwrap_or(config.child_index);

    let child = wallet
        .child(index)
        .with_context(|| format!("Failed to derive child {}", index))?;

    let report = ShowReport {
        network: config.network.to_string(),
        master: node_report("m".to_string(), wallet.master(), config.network)?,
        child: node_report(format_index(index), &child, config.network)?,
    };

    if json {
        return print_json(&report);
    }

    info!("Network: {}", report.network);
    log_node("Master", &report.master);
    log_node("Child", &report.child);
    Ok(())
}

fn handle_derive(
    config: &CliConfig,
    path: Option<String>,
    index: Option<u32>,
    hardened: bool,
    json: bool,
) -> Result<()> {
    let wallet = open_wallet(config)?;

    let (path, node) = match path {
        Some(path) => {
            let node = wallet
                .derive_path(&path)
                .with_context(|| format!("Failed to derive {}", path))?;
            (path, node)
        }
        None => {
            let mut index = index.unwrap_or(config.child_index);
            if hardened {
                if index >= HARDENED_OFFSET {
                    bail!("Index {} is already in the hardened range", index);
                }
                index += HARDENED_OFFSET;
            }
            let node = wallet
                .child(index)
                .with_context(|| format!("Failed to derive child {}", index))?;
            (format_index(index), node)
        }
    };

    let report = node_report(path, &node, config.network)?;
    if json {
        return print_json(&report);
    }

    log_node("Node", &report);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_spend(
    config: &CliConfig,
    prev_txid: &str,
    vout: u32,
    amount: i64,
    prev_amount: Option<i64>,
    spend_kind: SpendArg,
    index: Option<u32>,
    json: bool,
) -> Result<()> {
    let wallet = open_wallet(config)?;
    let index = index.unwrap_or(config.child_index);
    let child = wallet
        .child(index)
        .with_context(|| format!("Failed to derive child {}", index))?;

    let spend = spend_kind_for(spend_kind, prev_amount)?;
    let keys = key_pair(&child)?;
    let recipients = addresses(&child, config.network)?;

    let mut tx = build_transaction(prev_txid, vout, amount, &[&recipients.p2sh, &recipients.p2wpkh])
        .context("Failed to assemble transaction")?;
    keys.sign_input(&mut tx, 0, spend).context("Failed to sign input 0")?;
    let verified = verify_input(&tx, 0, keys.public_key(), spend)?;

    let report = SpendReport {
        network: config.network.to_string(),
        spend_kind: format!("{:?}", spend_kind),
        txid: tx.txid().to_string(),
        wtxid: tx.wtxid().to_string(),
        verified,
        hex: tx.to_hex(),
    };

    if json {
        return print_json(&report);
    }

    info!("Signed input 0 of {} with child {}", report.txid, format_index(index));
    info!("  spend kind: {}", report.spend_kind);
    info!("  wtxid:      {}", report.wtxid);
    info!("  verified:   {}", report.verified);
    info!("  raw:        {}", report.hex);
    Ok(())
}

fn handle_generate(words: usize, json: bool) -> Result<()> {
    let strength = match words {
        12 => MnemonicStrength::Words12,
        15 => MnemonicStrength::Words15,
        18 => MnemonicStrength::Words18,
        21 => MnemonicStrength::Words21,
        24 => MnemonicStrength::Words24,
        other => bail!("Unsupported word count {} (expected 12, 15, 18, 21 or 24)", other),
    };

    let phrase = zeroize::Zeroizing::new(generate_mnemonic(strength)?);
    if json {
        return print_json(&serde_json::json!({ "mnemonic": phrase.as_str() }));
    }

    info!("Mnemonic: {}", phrase.as_str());
    Ok(())
}

fn spend_kind_for(arg: SpendArg, prev_amount: Option<i64>) -> Result<SpendKind> {
    let segwit_amount = || prev_amount.context("--prev-amount is required for segwit spends");
    Ok(match arg {
        SpendArg::Legacy => SpendKind::Legacy,
        SpendArg::P2wpkh => SpendKind::P2wpkh { amount: segwit_amount()? },
        SpendArg::P2shP2wpkh => SpendKind::P2shP2wpkh { amount: segwit_amount()? },
    })
}

fn format_index(index: u32) -> String {
    if index >= HARDENED_OFFSET {
        format!("m/{}'", index - HARDENED_OFFSET)
    } else {
        format!("m/{}", index)
    }
}
