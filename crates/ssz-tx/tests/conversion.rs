//! Conversion between legacy encodings and SSZ transactions and receipts.

use alloy_consensus::{Eip658Value, TxEnvelope};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, B256, U256};
use ssz_tx::{
    compute_sig_hash, compute_ssz_sig_hash, compute_tx_hash,
    constants::tx_type::{FEE_MARKET_TX_TYPE, LEGACY_TX_TYPE, SSZ_TX_TYPE},
    from_legacy,
    legacy::{receipt_from_legacy, receipt_to_legacy},
    test_utils::{
        basic_payload, eip1559_tx, eip2930_tx, eip4844_tx, legacy_tx, sample_receipt, sign_native,
        signer_address, TEST_CHAIN_ID, TEST_SIGNER,
    },
    to_legacy, validate_transaction, K256Recover, SszObject, SignedTransaction,
    TransactionError,
};

#[test]
fn test_fee_market_conversion() {
    let envelope = eip1559_tx(5);
    let TxEnvelope::Eip1559(signed) = &envelope else { panic!("expected an EIP-1559 envelope") };
    let converted = from_legacy(&envelope.encoded_2718(), TEST_CHAIN_ID).unwrap();

    assert_eq!(converted.tx_type(), Some(FEE_MARKET_TX_TYPE));
    assert_eq!(converted.payload.nonce, 5);
    assert_eq!(converted.payload.access_list, Some(vec![]));
    assert_eq!(converted.payload.max_priority_fee_per_gas, Some(U256::from(1)));
    assert_eq!(converted.payload.max_fee_per_blob_gas, None);
    assert_eq!(converted.signature.from, signer_address(&TEST_SIGNER));
    assert_eq!(converted.sig_hash, signed.signature_hash());
    assert_eq!(compute_sig_hash(&converted.tx, TEST_CHAIN_ID).unwrap(), converted.sig_hash);
    assert_eq!(compute_tx_hash(&converted.tx, TEST_CHAIN_ID).unwrap(), *envelope.tx_hash());
}

#[test]
fn test_every_legacy_type_round_trips() {
    for envelope in [legacy_tx(Some(TEST_CHAIN_ID)), legacy_tx(None), eip2930_tx(), eip1559_tx(0), eip4844_tx()] {
        let encoded = envelope.encoded_2718();
        let converted = from_legacy(&encoded, TEST_CHAIN_ID).unwrap();

        // the SSZ form survives its own codec
        let bytes = converted.tx.ssz_bytes().unwrap();
        let decoded = SignedTransaction::from_ssz_bytes(&bytes).unwrap();
        assert_eq!(decoded, converted.tx);

        assert_eq!(to_legacy(&decoded, TEST_CHAIN_ID).unwrap().encoded_2718(), encoded);
        assert_eq!(
            validate_transaction(&K256Recover, &decoded, TEST_CHAIN_ID).unwrap(),
            signer_address(&TEST_SIGNER)
        );
    }
}

#[test]
fn test_replay_protection_tag() {
    let protected = from_legacy(&legacy_tx(Some(TEST_CHAIN_ID)).encoded_2718(), TEST_CHAIN_ID).unwrap();
    assert_eq!(protected.tx_type(), Some(LEGACY_TX_TYPE));
    let unprotected = from_legacy(&legacy_tx(None).encoded_2718(), TEST_CHAIN_ID).unwrap();
    assert_eq!(unprotected.tx_type(), None);
    assert_ne!(protected.sig_hash, unprotected.sig_hash);
}

#[test]
fn test_native_transaction_hashes() {
    let tx = sign_native(basic_payload(0), TEST_CHAIN_ID);
    assert_eq!(tx.tx_type(), Some(SSZ_TX_TYPE));
    assert_eq!(
        compute_sig_hash(&tx, TEST_CHAIN_ID).unwrap(),
        compute_ssz_sig_hash(&tx.payload, TEST_CHAIN_ID).unwrap()
    );
    assert_eq!(compute_tx_hash(&tx, TEST_CHAIN_ID).unwrap(), tx.hash_tree_root().unwrap());
    assert_eq!(validate_transaction(&K256Recover, &tx, TEST_CHAIN_ID).unwrap(), tx.signature.from);

    // the signature domain binds the chain
    assert!(matches!(
        validate_transaction(&K256Recover, &tx, TEST_CHAIN_ID + 1),
        Err(TransactionError::SignatureMismatch { .. })
    ));
}

#[test]
fn test_sender_mismatch() {
    let mut tx = from_legacy(&eip2930_tx().encoded_2718(), TEST_CHAIN_ID).unwrap().tx;
    tx.signature.from = Address::repeat_byte(0x99);
    assert!(matches!(
        validate_transaction(&K256Recover, &tx, TEST_CHAIN_ID),
        Err(TransactionError::SignatureMismatch { claimed, .. }) if claimed == Address::repeat_byte(0x99)
    ));
}

#[test]
fn test_receipt_round_trip() {
    let tx = from_legacy(&eip1559_tx(5).encoded_2718(), TEST_CHAIN_ID).unwrap().tx;
    for status in [Eip658Value::Eip658(true), Eip658Value::Eip658(false), Eip658Value::PostState(B256::repeat_byte(3))] {
        let encoded = sample_receipt(status, 100_000).encoded_2718();
        let receipt = receipt_from_legacy(&encoded, &tx, 79_000).unwrap();
        assert_eq!(receipt.gas_used, 21_000);

        let bytes = receipt.ssz_bytes().unwrap();
        let decoded = ssz_tx::Receipt::from_ssz_bytes(&bytes).unwrap();
        assert_eq!(decoded, receipt);
        assert_eq!(receipt_to_legacy(&decoded, tx.tx_type(), 79_000).unwrap().encoded_2718(), encoded);
    }
}
