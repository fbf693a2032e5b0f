//! Conversion between EIP-2718 transaction envelopes and SSZ transactions.

use alloy_consensus::{
    transaction::RlpEcdsaEncodableTx,
    SignableTransaction, Signed, TxEip1559, TxEip2930, TxEip4844, TxEip4844Variant, TxEnvelope,
    TxLegacy,
};
use alloy_eips::{
    eip2718::Decodable2718,
    eip2930::{AccessList, AccessListItem},
};
use alloy_primitives::{ChainId, Signature, TxKind, B256, U256};
use tracing::{debug, trace};

use crate::{
    check_transaction_supported,
    constants::tx_type::{
        ACCESS_LIST_TX_TYPE, BLOB_TX_TYPE, FEE_MARKET_TX_TYPE, LEGACY_TX_TYPE, SSZ_TX_TYPE,
    },
    pack_signature, recover_sender, validate_signature, AccessTuple, EcdsaRecover, K256Recover,
    SignedTransaction, TransactionError, TransactionPayload, TransactionSignature,
};

/// A transaction converted from its legacy encoding, with the hashes of that encoding.
#[derive(Clone, Debug, PartialEq, Eq, derive_more::Deref)]
pub struct ConvertedTransaction {
    /// The SSZ transaction.
    #[deref]
    pub tx: SignedTransaction,
    /// Hash the legacy transaction was signed over.
    pub sig_hash: B256,
    /// Hash of the legacy encoding.
    pub tx_hash: B256,
}

impl From<&AccessListItem> for AccessTuple {
    fn from(item: &AccessListItem) -> Self {
        Self { address: item.address, storage_keys: item.storage_keys.clone() }
    }
}

impl From<&AccessTuple> for AccessListItem {
    fn from(tuple: &AccessTuple) -> Self {
        Self { address: tuple.address, storage_keys: tuple.storage_keys.clone() }
    }
}

fn access_tuples(list: &AccessList) -> Vec<AccessTuple> {
    list.iter().map(AccessTuple::from).collect()
}

/// Decodes an EIP-2718 encoded transaction and converts it, recovering the sender with
/// [`K256Recover`].
pub fn from_legacy(encoded: &[u8], chain_id: ChainId) -> Result<ConvertedTransaction, TransactionError> {
    from_legacy_with(&K256Recover, encoded, chain_id)
}

/// Decodes an EIP-2718 encoded transaction and converts it, recovering the sender with
/// `recover`.
pub fn from_legacy_with<R: EcdsaRecover + ?Sized>(
    recover: &R,
    encoded: &[u8],
    chain_id: ChainId,
) -> Result<ConvertedTransaction, TransactionError> {
    let mut buf = encoded;
    let envelope = TxEnvelope::decode_2718(&mut buf)?;
    if !buf.is_empty() {
        return Err(TransactionError::TrailingLegacyBytes(buf.len()));
    }
    from_envelope(recover, &envelope, chain_id)
}

/// Converts a decoded transaction envelope.
pub fn from_envelope<R: EcdsaRecover + ?Sized>(
    recover: &R,
    envelope: &TxEnvelope,
    chain_id: ChainId,
) -> Result<ConvertedTransaction, TransactionError> {
    let converted = match envelope {
        TxEnvelope::Legacy(signed) => {
            let tx = signed.tx();
            if let Some(actual) = tx.chain_id {
                check_chain_id(chain_id, actual)?;
            }
            let payload = TransactionPayload {
                nonce: tx.nonce,
                max_fee_per_gas: U256::from(tx.gas_price),
                gas: tx.gas_limit,
                to: tx.to.to().copied(),
                value: tx.value,
                input: tx.input.clone(),
                ..Default::default()
            };
            convert(recover, signed, payload, tx.chain_id.map(|_| LEGACY_TX_TYPE))?
        }
        TxEnvelope::Eip2930(signed) => {
            let tx = signed.tx();
            check_chain_id(chain_id, tx.chain_id)?;
            let payload = TransactionPayload {
                nonce: tx.nonce,
                max_fee_per_gas: U256::from(tx.gas_price),
                gas: tx.gas_limit,
                to: tx.to.to().copied(),
                value: tx.value,
                input: tx.input.clone(),
                access_list: Some(access_tuples(&tx.access_list)),
                ..Default::default()
            };
            convert(recover, signed, payload, Some(ACCESS_LIST_TX_TYPE))?
        }
        TxEnvelope::Eip1559(signed) => {
            let tx = signed.tx();
            check_chain_id(chain_id, tx.chain_id)?;
            let payload = TransactionPayload {
                nonce: tx.nonce,
                max_fee_per_gas: U256::from(tx.max_fee_per_gas),
                gas: tx.gas_limit,
                to: tx.to.to().copied(),
                value: tx.value,
                input: tx.input.clone(),
                access_list: Some(access_tuples(&tx.access_list)),
                max_priority_fee_per_gas: Some(U256::from(tx.max_priority_fee_per_gas)),
                ..Default::default()
            };
            convert(recover, signed, payload, Some(FEE_MARKET_TX_TYPE))?
        }
        TxEnvelope::Eip4844(signed) => {
            let tx = signed.tx().tx();
            check_chain_id(chain_id, tx.chain_id)?;
            let payload = TransactionPayload {
                nonce: tx.nonce,
                max_fee_per_gas: U256::from(tx.max_fee_per_gas),
                gas: tx.gas_limit,
                to: Some(tx.to),
                value: tx.value,
                input: tx.input.clone(),
                access_list: Some(access_tuples(&tx.access_list)),
                max_priority_fee_per_gas: Some(U256::from(tx.max_priority_fee_per_gas)),
                max_fee_per_blob_gas: Some(U256::from(tx.max_fee_per_blob_gas)),
                blob_versioned_hashes: Some(tx.blob_versioned_hashes.clone()),
            };
            convert(recover, signed, payload, Some(BLOB_TX_TYPE))?
        }
        TxEnvelope::Eip7702(_) => {
            return Err(TransactionError::UnsupportedLegacyType(envelope.tx_type().into()));
        }
    };
    debug!(
        target: "ssz_tx::legacy",
        tx_hash = %converted.tx_hash,
        sender = %converted.tx.signature.from,
        tx_type = ?converted.tx.tx_type(),
        "Converted legacy transaction"
    );
    Ok(converted)
}

fn check_chain_id(expected: ChainId, actual: ChainId) -> Result<(), TransactionError> {
    if expected != actual {
        return Err(TransactionError::ChainIdMismatch { expected, actual });
    }
    Ok(())
}

fn convert<T, R>(
    recover: &R,
    signed: &Signed<T>,
    payload: TransactionPayload,
    tx_type: Option<u8>,
) -> Result<ConvertedTransaction, TransactionError>
where
    T: SignableTransaction<Signature> + RlpEcdsaEncodableTx,
    R: EcdsaRecover + ?Sized,
{
    let sig_hash = signed.signature_hash();
    let ecdsa_signature = pack_signature(signed.signature());
    let from = recover_sender(recover, &sig_hash, ecdsa_signature.as_slice())?;
    let tx = SignedTransaction {
        payload,
        signature: TransactionSignature { from, ecdsa_signature, tx_type },
    };
    check_transaction_supported(&tx)?;
    Ok(ConvertedTransaction { tx, sig_hash, tx_hash: *signed.hash() })
}

/// Rebuilds the EIP-2718 envelope of a transaction carrying a legacy type tag.
pub fn to_legacy(tx: &SignedTransaction, chain_id: ChainId) -> Result<TxEnvelope, TransactionError> {
    check_transaction_supported(tx)?;
    let payload = &tx.payload;
    let signature = validate_signature(tx.signature.ecdsa_signature.as_slice())?;
    let to = payload.to.map_or(TxKind::Create, TxKind::Call);
    let access_list = || {
        AccessList(payload.access_list.iter().flatten().map(AccessListItem::from).collect())
    };

    let envelope = match tx.tx_type() {
        None | Some(LEGACY_TX_TYPE) => {
            let legacy = TxLegacy {
                chain_id: tx.tx_type().map(|_| chain_id),
                nonce: payload.nonce,
                gas_price: fee(payload.max_fee_per_gas, "max_fee_per_gas")?,
                gas_limit: payload.gas,
                to,
                value: payload.value,
                input: payload.input.clone(),
            };
            TxEnvelope::Legacy(legacy.into_signed(signature))
        }
        Some(ACCESS_LIST_TX_TYPE) => {
            let eip2930 = TxEip2930 {
                chain_id,
                nonce: payload.nonce,
                gas_price: fee(payload.max_fee_per_gas, "max_fee_per_gas")?,
                gas_limit: payload.gas,
                to,
                value: payload.value,
                access_list: access_list(),
                input: payload.input.clone(),
            };
            TxEnvelope::Eip2930(eip2930.into_signed(signature))
        }
        Some(FEE_MARKET_TX_TYPE) => {
            let eip1559 = TxEip1559 {
                chain_id,
                nonce: payload.nonce,
                gas_limit: payload.gas,
                max_fee_per_gas: fee(payload.max_fee_per_gas, "max_fee_per_gas")?,
                max_priority_fee_per_gas: fee(
                    payload.max_priority_fee_per_gas.unwrap_or_default(),
                    "max_priority_fee_per_gas",
                )?,
                to,
                value: payload.value,
                access_list: access_list(),
                input: payload.input.clone(),
            };
            TxEnvelope::Eip1559(eip1559.into_signed(signature))
        }
        Some(BLOB_TX_TYPE) => {
            let eip4844 = TxEip4844 {
                chain_id,
                nonce: payload.nonce,
                gas_limit: payload.gas,
                max_fee_per_gas: fee(payload.max_fee_per_gas, "max_fee_per_gas")?,
                max_priority_fee_per_gas: fee(
                    payload.max_priority_fee_per_gas.unwrap_or_default(),
                    "max_priority_fee_per_gas",
                )?,
                to: payload.to.unwrap_or_default(),
                value: payload.value,
                access_list: access_list(),
                blob_versioned_hashes: payload.blob_versioned_hashes.clone().unwrap_or_default(),
                max_fee_per_blob_gas: fee(
                    payload.max_fee_per_blob_gas.unwrap_or_default(),
                    "max_fee_per_blob_gas",
                )?,
                input: payload.input.clone(),
            };
            TxEnvelope::Eip4844(TxEip4844Variant::TxEip4844(eip4844).into_signed(signature))
        }
        Some(SSZ_TX_TYPE) => return Err(TransactionError::NoLegacyRepresentation),
        Some(other) => return Err(TransactionError::UnsupportedLegacyType(other)),
    };
    trace!(target: "ssz_tx::legacy", tx_type = ?tx.tx_type(), "Rebuilt legacy envelope");
    Ok(envelope)
}

/// Signing hash and transaction hash of a legacy envelope.
pub fn legacy_hashes(envelope: &TxEnvelope) -> (B256, B256) {
    match envelope {
        TxEnvelope::Legacy(signed) => (signed.signature_hash(), *signed.hash()),
        TxEnvelope::Eip2930(signed) => (signed.signature_hash(), *signed.hash()),
        TxEnvelope::Eip1559(signed) => (signed.signature_hash(), *signed.hash()),
        TxEnvelope::Eip4844(signed) => (signed.signature_hash(), *signed.hash()),
        TxEnvelope::Eip7702(signed) => (signed.signature_hash(), *signed.hash()),
    }
}

fn fee(value: U256, name: &'static str) -> Result<u128, TransactionError> {
    u128::try_from(value).map_err(|_| TransactionError::FeeOutOfRange(name))
}

/// Returns `true` if `tx_type` is a tag [`to_legacy`] can rebuild.
pub const fn is_legacy_tag(tx_type: Option<u8>) -> bool {
    matches!(
        tx_type,
        None | Some(LEGACY_TX_TYPE | ACCESS_LIST_TX_TYPE | FEE_MARKET_TX_TYPE | BLOB_TX_TYPE)
    )
}
