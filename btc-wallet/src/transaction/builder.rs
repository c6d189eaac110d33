//! Assembly of unsigned transactions paying to wallet addresses

use crate::account::address::Address;
use crate::error::Result;
use super::types::{Transaction, TX_VERSION};

/// Append one output of `value` satoshis per address, in the given order
pub fn add_address_outputs(tx: &mut Transaction, value: i64, addresses: &[&Address]) -> Result<()> {
    for address in addresses {
        tx.add_output(value, address.script_pubkey())?;
    }
    Ok(())
}

/// Unsigned transaction spending one outpoint into `recipients`, each paid `value`
pub fn build_transaction(
    prior_tx_hash: &str,
    output_index: u32,
    value: i64,
    recipients: &[&Address],
) -> Result<Transaction> {
    let mut tx = Transaction::new(TX_VERSION);
    tx.add_input(prior_tx_hash, output_index)?;
    add_address_outputs(&mut tx, value, recipients)?;

    tracing::debug!(
        inputs = tx.inputs.len(),
        outputs = tx.outputs.len(),
        "assembled unsigned transaction"
    );

    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::address::{p2sh_address, p2wpkh_address, redeem_script};
    use crate::error::Error;
    use crate::network::Network;

    const PREV_HASH: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

    #[test]
    fn test_outputs_follow_recipient_order() {
        let hash = [0x42u8; 20];
        let p2sh = p2sh_address(redeem_script(&hash).unwrap().as_bytes(), Network::Testnet).unwrap();
        let p2wpkh = p2wpkh_address(&hash, Network::Testnet).unwrap();

        let tx = build_transaction(PREV_HASH, 0, 1_000, &[&p2sh, &p2wpkh]).unwrap();
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.outputs[0].pk_script, p2sh.script_pubkey());
        assert_eq!(tx.outputs[1].pk_script, p2wpkh.script_pubkey());
        assert!(tx.inputs[0].signature_script.is_empty());
    }

    #[test]
    fn test_build_errors() {
        let p2wpkh = p2wpkh_address(&[0x42u8; 20], Network::Testnet).unwrap();
        assert!(matches!(build_transaction("00", 0, 1, &[&p2wpkh]), Err(Error::MalformedHash(_))));
        assert!(matches!(build_transaction(PREV_HASH, 0, -1, &[&p2wpkh]), Err(Error::NegativeAmount(-1))));
    }
}
