//! Conversion between EIP-2718 receipt envelopes and SSZ receipts.

use alloy_consensus::{
    Eip658Value, Receipt as ConsensusReceipt, ReceiptEnvelope, ReceiptWithBloom, TxReceipt,
};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::Log as PrimitiveLog;
use tracing::debug;

use crate::{
    check_receipt_supported,
    constants::tx_type::{
        ACCESS_LIST_TX_TYPE, BLOB_TX_TYPE, FEE_MARKET_TX_TYPE, LEGACY_TX_TYPE, SSZ_TX_TYPE,
    },
    Log, Receipt, SignedTransaction, TransactionError,
};

impl From<&PrimitiveLog> for Log {
    fn from(log: &PrimitiveLog) -> Self {
        Self { address: log.address, topics: log.topics().to_vec(), data: log.data.data.clone() }
    }
}

impl From<&Log> for PrimitiveLog {
    fn from(log: &Log) -> Self {
        Self::new_unchecked(log.address, log.topics.clone(), log.data.clone())
    }
}

/// Decodes an EIP-2718 encoded receipt and converts it.
///
/// `companion` is the transaction the receipt belongs to and `cumulative_gas_before` the
/// cumulative gas used by the transactions before it in the block.
pub fn receipt_from_legacy(
    encoded: &[u8],
    companion: &SignedTransaction,
    cumulative_gas_before: u64,
) -> Result<Receipt, TransactionError> {
    let mut buf = encoded;
    let envelope = ReceiptEnvelope::decode_2718(&mut buf)?;
    if !buf.is_empty() {
        return Err(TransactionError::TrailingLegacyBytes(buf.len()));
    }
    receipt_from_envelope(&envelope, companion, cumulative_gas_before)
}

/// Converts a decoded receipt envelope.
pub fn receipt_from_envelope(
    envelope: &ReceiptEnvelope,
    companion: &SignedTransaction,
    cumulative_gas_before: u64,
) -> Result<Receipt, TransactionError> {
    check_receipt_type(envelope, companion)?;
    let cumulative = envelope.cumulative_gas_used();
    let gas_used = cumulative
        .checked_sub(cumulative_gas_before)
        .ok_or(TransactionError::GasAccounting { cumulative, before: cumulative_gas_before })?;
    let (root, status) = match envelope.status_or_post_state() {
        Eip658Value::Eip658(success) => (None, Some(success)),
        Eip658Value::PostState(root) => (Some(root), None),
    };
    let contract_address = companion
        .payload
        .is_create()
        .then(|| companion.signature.from.create(companion.payload.nonce));

    let receipt = Receipt {
        root,
        gas_used,
        contract_address,
        logs_bloom: envelope.bloom(),
        logs: envelope.logs().iter().map(Log::from).collect(),
        status,
    };
    check_receipt_supported(&receipt)?;
    debug!(target: "ssz_tx::legacy", gas_used, logs = receipt.logs.len(), ?contract_address, "Converted legacy receipt");
    Ok(receipt)
}

/// Checks that `envelope` has the receipt type of `companion`, so the receipt converts back
/// into the same envelope.
fn check_receipt_type(
    envelope: &ReceiptEnvelope,
    companion: &SignedTransaction,
) -> Result<(), TransactionError> {
    let receipt_type = u8::from(envelope.tx_type());
    if matches!(envelope, ReceiptEnvelope::Eip7702(_)) {
        return Err(TransactionError::UnsupportedLegacyType(receipt_type));
    }
    let tx_type = match companion.tx_type() {
        None => LEGACY_TX_TYPE,
        Some(SSZ_TX_TYPE) => return Err(TransactionError::NoLegacyRepresentation),
        Some(tx_type) => tx_type,
    };
    if receipt_type != tx_type {
        return Err(TransactionError::ReceiptTypeMismatch { receipt_type, tx_type });
    }
    Ok(())
}

/// Rebuilds the EIP-2718 envelope of `receipt` for a transaction with type tag `tx_type`.
pub fn receipt_to_legacy(
    receipt: &Receipt,
    tx_type: Option<u8>,
    cumulative_gas_before: u64,
) -> Result<ReceiptEnvelope, TransactionError> {
    check_receipt_supported(receipt)?;
    let status = match (receipt.root, receipt.status) {
        (Some(root), _) => Eip658Value::PostState(root),
        (None, status) => Eip658Value::Eip658(status.unwrap_or_default()),
    };
    let cumulative_gas_used = cumulative_gas_before
        .checked_add(receipt.gas_used)
        .ok_or(TransactionError::GasOverflow { gas_used: receipt.gas_used, before: cumulative_gas_before })?;
    let inner = ReceiptWithBloom::new(
        ConsensusReceipt {
            status,
            cumulative_gas_used,
            logs: receipt.logs.iter().map(PrimitiveLog::from).collect(),
        },
        receipt.logs_bloom,
    );
    Ok(match tx_type {
        None | Some(LEGACY_TX_TYPE) => ReceiptEnvelope::Legacy(inner),
        Some(ACCESS_LIST_TX_TYPE) => ReceiptEnvelope::Eip2930(inner),
        Some(FEE_MARKET_TX_TYPE) => ReceiptEnvelope::Eip1559(inner),
        Some(BLOB_TX_TYPE) => ReceiptEnvelope::Eip4844(inner),
        Some(other) => return Err(TransactionError::UnsupportedLegacyType(other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        from_legacy,
        test_utils::{
            basic_payload, eip1559_tx, eip4844_tx, legacy_tx, sample_receipt, sign_native,
            typed_receipt, TEST_CHAIN_ID,
        },
    };
    use alloy_consensus::TxType;
    use alloy_eips::eip2718::Encodable2718;
    use rstest::rstest;

    #[test]
    fn test_receipt_conversion() {
        let tx = from_legacy(&eip1559_tx(5).encoded_2718(), TEST_CHAIN_ID).unwrap().tx;
        let envelope = sample_receipt(Eip658Value::Eip658(true), 50_000);
        let encoded = envelope.encoded_2718();

        let receipt = receipt_from_legacy(&encoded, &tx, 29_000).unwrap();
        assert_eq!(receipt.gas_used, 21_000);
        assert_eq!(receipt.status, Some(true));
        assert_eq!(receipt.root, None);
        assert_eq!(receipt.contract_address, None);
        assert_eq!(receipt.logs.len(), 1);

        let rebuilt = receipt_to_legacy(&receipt, tx.tx_type(), 29_000).unwrap();
        assert_eq!(rebuilt.encoded_2718(), encoded);
    }

    #[test]
    fn test_receipt_gas_accounting() {
        let tx = from_legacy(&eip1559_tx(5).encoded_2718(), TEST_CHAIN_ID).unwrap().tx;
        let envelope = sample_receipt(Eip658Value::Eip658(true), 50_000);
        assert!(matches!(
            receipt_from_envelope(&envelope, &tx, 60_000),
            Err(TransactionError::GasAccounting { cumulative: 50_000, before: 60_000 })
        ));
    }

    #[test]
    fn test_pre_byzantium_creation() {
        let mut tx = from_legacy(&legacy_tx(None).encoded_2718(), TEST_CHAIN_ID).unwrap().tx;
        tx.payload.to = None;
        let envelope =
            typed_receipt(TxType::Legacy, Eip658Value::PostState(alloy_primitives::B256::repeat_byte(7)), 21_000);
        let receipt = receipt_from_envelope(&envelope, &tx, 0).unwrap();
        assert_eq!(receipt.root, Some(alloy_primitives::B256::repeat_byte(7)));
        assert_eq!(receipt.status, None);
        assert_eq!(
            receipt.contract_address,
            Some(tx.signature.from.create(tx.payload.nonce))
        );
    }

    #[test]
    fn test_receipt_gas_overflow() {
        let tx = from_legacy(&eip1559_tx(5).encoded_2718(), TEST_CHAIN_ID).unwrap().tx;
        let receipt = receipt_from_envelope(&sample_receipt(Eip658Value::Eip658(true), 21_000), &tx, 0).unwrap();
        assert!(matches!(
            receipt_to_legacy(&receipt, tx.tx_type(), u64::MAX),
            Err(TransactionError::GasOverflow { gas_used: 21_000, before: u64::MAX })
        ));
    }

    #[rstest]
    #[case::fee_market_receipt_for_legacy_tx(TxType::Eip1559, false, 0x02, 0x00)]
    #[case::legacy_receipt_for_blob_tx(TxType::Legacy, true, 0x00, 0x03)]
    #[case::blob_receipt_for_legacy_tx(TxType::Eip4844, false, 0x03, 0x00)]
    fn test_receipt_type_must_match_transaction(
        #[case] receipt_type: TxType,
        #[case] blob_companion: bool,
        #[case] expected_receipt_type: u8,
        #[case] expected_tx_type: u8,
    ) {
        let encoded = if blob_companion {
            eip4844_tx().encoded_2718()
        } else {
            legacy_tx(Some(TEST_CHAIN_ID)).encoded_2718()
        };
        let tx = from_legacy(&encoded, TEST_CHAIN_ID).unwrap().tx;
        let envelope = typed_receipt(receipt_type, Eip658Value::Eip658(true), 21_000);

        let err = receipt_from_legacy(&envelope.encoded_2718(), &tx, 0).unwrap_err();
        assert!(
            matches!(
                err,
                TransactionError::ReceiptTypeMismatch { receipt_type, tx_type }
                    if receipt_type == expected_receipt_type && tx_type == expected_tx_type
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_receipt_without_legacy_counterpart() {
        let tx = from_legacy(&eip1559_tx(5).encoded_2718(), TEST_CHAIN_ID).unwrap().tx;
        let set_code = typed_receipt(TxType::Eip7702, Eip658Value::Eip658(true), 21_000);
        assert!(matches!(
            receipt_from_envelope(&set_code, &tx, 0),
            Err(TransactionError::UnsupportedLegacyType(0x04))
        ));

        let native = sign_native(basic_payload(1), TEST_CHAIN_ID);
        let envelope = typed_receipt(TxType::Legacy, Eip658Value::Eip658(true), 21_000);
        assert!(matches!(
            receipt_from_envelope(&envelope, &native, 0),
            Err(TransactionError::NoLegacyRepresentation)
        ));
    }
}
