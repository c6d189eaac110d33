//! Tests for key derivation and addresses against published vectors

use btc_wallet::account::*;
use btc_wallet::crypto::keys::*;
use btc_wallet::crypto::mnemonic::*;
use btc_wallet::{Error, Network};

const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn abandon_master(network: Network) -> ExtendedKey {
    let seed = derive_seed(ABANDON_ABOUT, "").unwrap();
    master_from_seed(seed.as_bytes(), network).unwrap()
}

#[test]
fn test_abandon_master_key() {
    let master = abandon_master(Network::Bitcoin);
    assert_eq!(
        master.to_string(),
        "xprv9s21ZrQH143K3GJpoapnV8SFfukcVBSfeCficPSGfubmSFDxo1kuHnLisriDvSnRRuL2Qrg5ggqHKNVpxR86QEC8w35uxmGoggxtQTPvfUu"
    );
}

#[test]
fn test_normal_child_index_one() {
    let master = abandon_master(Network::Testnet);

    let child = derive_child(&master, 1).unwrap();
    assert_eq!(
        derive_child(&abandon_master(Network::Bitcoin), 1).unwrap().to_string(),
        "xprv9ukW2UsmeQP9PQFT4K5ZcUPAXZy7hZPqMAX94Q2rTNA5qRznspNy8q87j3hc5eWWS7hS7sGVpEiGbMHLqxubZFqAASWSBuyVDqE9jxqjD9E"
    );
    assert_eq!(child.depth(), 1);
    assert_eq!(child.child_index(), 1);
    assert_eq!(child.parent_fingerprint(), master.fingerprint());
    assert!(child.to_string().starts_with("tprv"));

    // Normal derivation is reachable from the public half alone
    let public_child = derive_child(&master.neuter(), 1).unwrap();
    assert_eq!(public_child, child.neuter());
    assert_eq!(public_key(&public_child), public_key(&child));
    assert_eq!(private_key(&public_child).unwrap_err(), Error::PublicOnlyKey);
}

#[test]
fn test_bip44_legacy_address() {
    let node = abandon_master(Network::Bitcoin).derive_path("m/44'/0'/0'/0/0").unwrap();
    let address = create_p2pkh_address(&node, Network::Bitcoin).unwrap();
    assert_eq!(address.as_str(), "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
}

#[test]
fn test_bip49_nested_segwit_address() {
    let node = abandon_master(Network::Testnet).derive_path("m/49'/1'/0'/0/0").unwrap();

    let key_pair = key_pair(&node).unwrap();
    assert_eq!(
        key_pair.private_key().to_wif(Network::Testnet).as_str(),
        "cULrpoZGXiuC19Uhvykx7NugygA3k86b3hmdCeyvHYQZSxojGyXJ"
    );
    assert_eq!(
        key_pair.public_key().to_string(),
        "03a1af804ac108a8a51782198c2d034b28bf90c8803f5a53f76276fa69a4eae77f"
    );

    let script = redeem_script(&pubkey_hash(key_pair.public_key())).unwrap();
    assert_eq!(hex::encode(script.as_bytes()), "001438971f73930f6c141d977ac4fd4a727c854935b3");

    let address = create_p2sh_address(&node, Network::Testnet).unwrap();
    assert_eq!(address.as_str(), "2Mww8dCYPUpKHofjgcXcBCEGmniw9CoaiD2");
    assert_eq!(p2sh_address(script.as_bytes(), Network::Testnet).unwrap(), address);
}

#[test]
fn test_bip84_native_segwit_address() {
    let node = abandon_master(Network::Bitcoin).derive_path("m/84'/0'/0'/0/0").unwrap();
    assert_eq!(
        node.public_key().to_string(),
        "0330d54fd0dd420a6e5f8d3624f5f3482cae350f79d5f0753bf5beef9c2d91af3c"
    );

    let address = create_p2wpkh_address(&node, Network::Bitcoin).unwrap();
    assert_eq!(address.as_str(), "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");

    let decoded: Address = address.as_str().parse().unwrap();
    assert_eq!(decoded.hash(), &node.public_key().pubkey_hash());
}

#[test]
fn test_hd_wallet_matches_free_functions() {
    let wallet = HdWallet::from_mnemonic(ABANDON_ABOUT, "", Network::Bitcoin).unwrap();
    assert_eq!(wallet.master(), &abandon_master(Network::Bitcoin));
    assert_eq!(
        wallet.key_pair("m/84'/0'/0'/0/0").unwrap().public_key(),
        &abandon_master(Network::Bitcoin).derive_path("m/84'/0'/0'/0/0").unwrap().public_key()
    );
}

#[test]
fn test_sibling_derivation_across_threads() {
    let master = abandon_master(Network::Bitcoin);

    let handles: Vec<_> = (0..4u32)
        .map(|index| {
            let parent = master.clone();
            std::thread::spawn(move || parent.derive_child(index).unwrap())
        })
        .collect();

    for (index, handle) in handles.into_iter().enumerate() {
        let child = handle.join().unwrap();
        assert_eq!(child, master.derive_child(index as u32).unwrap());
    }
}
