use alloy_consensus::{
    Eip658Value, Receipt as ConsensusReceipt, ReceiptEnvelope, SignableTransaction, Signed,
    TxEip1559, TxEip2930, TxEip4844, TxEip4844Variant, TxEnvelope, TxLegacy, TxType,
};
use alloy_eips::eip2930::{AccessList, AccessListItem};
use alloy_primitives::{
    address, b256, bytes, Address, Bytes, ChainId, Log, Signature, TxKind, B256, U256,
};

use super::{sign_prehash, TEST_CHAIN_ID, TEST_SIGNER};
use crate::TransactionPayload;

/// Recipient of the test fixtures.
pub const RECIPIENT: Address = address!("0x3535353535353535353535353535353535353535");

/// Signs `tx` with [`TEST_SIGNER`].
pub fn sign_tx<T: SignableTransaction<Signature>>(tx: T) -> Signed<T> {
    let signature = sign_prehash(&TEST_SIGNER, &tx.signature_hash());
    tx.into_signed(signature)
}

/// A legacy transfer, replay protected when `chain_id` is set.
pub fn legacy_tx(chain_id: Option<ChainId>) -> TxEnvelope {
    sign_tx(TxLegacy {
        chain_id,
        nonce: 9,
        gas_price: 20_000_000_000,
        gas_limit: 21_000,
        to: TxKind::Call(RECIPIENT),
        value: U256::from(1_000_000_000_000_000_000u128),
        input: Bytes::new(),
    })
    .into()
}

/// An EIP-2930 call with one access list entry.
pub fn eip2930_tx() -> TxEnvelope {
    sign_tx(TxEip2930 {
        chain_id: TEST_CHAIN_ID,
        nonce: 1,
        gas_price: 15_000_000_000,
        gas_limit: 60_000,
        to: TxKind::Call(RECIPIENT),
        value: U256::ZERO,
        access_list: AccessList(vec![AccessListItem {
            address: RECIPIENT,
            storage_keys: vec![B256::with_last_byte(1)],
        }]),
        input: bytes!("a9059cbb"),
    })
    .into()
}

/// An EIP-1559 transfer with an empty access list.
pub fn eip1559_tx(nonce: u64) -> TxEnvelope {
    sign_tx(TxEip1559 {
        chain_id: TEST_CHAIN_ID,
        nonce,
        gas_limit: 21_000,
        max_fee_per_gas: 30_000_000_000,
        max_priority_fee_per_gas: 1,
        to: TxKind::Call(RECIPIENT),
        value: U256::from(100),
        access_list: AccessList::default(),
        input: Bytes::new(),
    })
    .into()
}

/// An EIP-4844 transaction referencing one blob.
pub fn eip4844_tx() -> TxEnvelope {
    let tx = TxEip4844 {
        chain_id: TEST_CHAIN_ID,
        nonce: 2,
        gas_limit: 50_000,
        max_fee_per_gas: 40_000_000_000,
        max_priority_fee_per_gas: 2_000_000_000,
        to: RECIPIENT,
        value: U256::ZERO,
        access_list: AccessList::default(),
        blob_versioned_hashes: vec![b256!(
            "0x01b0a4cdd5f55589f5c5b4d46c76704bb6ce95c0a8c09f77f197a57808dded28"
        )],
        max_fee_per_blob_gas: 1,
        input: Bytes::new(),
    };
    let variant: TxEip4844Variant = TxEip4844Variant::TxEip4844(tx);
    sign_tx(variant).into()
}

/// A payload that only uses the basic fields.
pub fn basic_payload(nonce: u64) -> TransactionPayload {
    TransactionPayload {
        nonce,
        max_fee_per_gas: U256::from(30_000_000_000u64),
        gas: 21_000,
        to: Some(RECIPIENT),
        value: U256::from(100),
        ..Default::default()
    }
}

/// An EIP-1559 receipt with one log.
pub fn sample_receipt(status: Eip658Value, cumulative_gas_used: u64) -> ReceiptEnvelope {
    typed_receipt(TxType::Eip1559, status, cumulative_gas_used)
}

/// A receipt envelope of `tx_type` with one log.
pub fn typed_receipt(tx_type: TxType, status: Eip658Value, cumulative_gas_used: u64) -> ReceiptEnvelope {
    let log = Log::new_unchecked(
        RECIPIENT,
        vec![b256!("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")],
        bytes!("00000000000000000000000000000000000000000000000000000000000003e8"),
    );
    let receipt = ConsensusReceipt { status, cumulative_gas_used, logs: vec![log] }.with_bloom();
    match tx_type {
        TxType::Legacy => ReceiptEnvelope::Legacy(receipt),
        TxType::Eip2930 => ReceiptEnvelope::Eip2930(receipt),
        TxType::Eip1559 => ReceiptEnvelope::Eip1559(receipt),
        TxType::Eip4844 => ReceiptEnvelope::Eip4844(receipt),
        TxType::Eip7702 => ReceiptEnvelope::Eip7702(receipt),
    }
}
