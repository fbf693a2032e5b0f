//! Gossip framing and transaction classification.
//!
//! A message is a one byte [`ObjectKind`] followed by the SSZ encoding of the object, framed by
//! a [`FrameCodec`]. The uncompressed size announced by the frame is checked against the
//! configured ceiling before anything is decompressed.

use core::fmt::Debug;

use auto_impl::auto_impl;
use serde::Serialize;
use tracing::trace;

use crate::{
    check_pooled_transaction_supported, check_receipt_supported, check_transaction_supported,
    payload_slot,
    ssz::{ActiveFields, SszError},
    ChainConfig, FieldCombination, PooledTransaction, Receipt, SignedTransaction, SszObject,
    TransactionError,
};

bitflags::bitflags! {
    /// Fields of a transaction payload, one bit per slot.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PayloadFields: u32 {
        /// `nonce`.
        const NONCE = 1 << payload_slot::NONCE;
        /// `max_fee_per_gas`.
        const MAX_FEE_PER_GAS = 1 << payload_slot::MAX_FEE_PER_GAS;
        /// `gas`.
        const GAS = 1 << payload_slot::GAS;
        /// `to`.
        const TO = 1 << payload_slot::TO;
        /// `value`.
        const VALUE = 1 << payload_slot::VALUE;
        /// `input`.
        const INPUT = 1 << payload_slot::INPUT;
        /// `access_list`.
        const ACCESS_LIST = 1 << payload_slot::ACCESS_LIST;
        /// `max_priority_fee_per_gas`.
        const MAX_PRIORITY_FEE_PER_GAS = 1 << payload_slot::MAX_PRIORITY_FEE_PER_GAS;
        /// `max_fee_per_blob_gas`.
        const MAX_FEE_PER_BLOB_GAS = 1 << payload_slot::MAX_FEE_PER_BLOB_GAS;
        /// `blob_versioned_hashes`.
        const BLOB_VERSIONED_HASHES = 1 << payload_slot::BLOB_VERSIONED_HASHES;

        /// Fields every payload carries.
        const REQUIRED = Self::NONCE.bits()
            | Self::MAX_FEE_PER_GAS.bits()
            | Self::GAS.bits()
            | Self::VALUE.bits()
            | Self::INPUT.bits();
        /// Fields added by fee market transactions.
        const FEE_MARKET = Self::ACCESS_LIST.bits() | Self::MAX_PRIORITY_FEE_PER_GAS.bits();
        /// Fields added by blob transactions.
        const BLOB = Self::FEE_MARKET.bits()
            | Self::MAX_FEE_PER_BLOB_GAS.bits()
            | Self::BLOB_VERSIONED_HASHES.bits();
    }
}

impl PayloadFields {
    /// Converts an active-fields bitvector, returning `None` if a slot outside the payload's
    /// defined fields is active.
    pub fn from_active_fields(active: &ActiveFields) -> Option<Self> {
        active.iter().try_fold(Self::empty(), |fields, slot| {
            let bit = 1u32.checked_shl(u32::try_from(slot).ok()?)?;
            Some(fields | Self::from_bits(bit)?)
        })
    }
}

/// The class of a transaction, determined by its active payload fields alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum TxClass {
    /// Only the basic fields, with or without `to`.
    Basic = 0,
    /// Basic fields and an access list.
    AccessList = 1,
    /// Access list and priority fee.
    FeeMarket = 2,
    /// Fee market fields, a destination and blob fields.
    Blob = 3,
}

impl TxClass {
    /// Legacy type tag of transactions of this class.
    pub const fn legacy_tx_type(self) -> u8 {
        self as u8
    }
}

/// Classifies a payload by its active fields.
pub fn classify(active: &ActiveFields) -> Result<TxClass, TransactionError> {
    let fields = PayloadFields::from_active_fields(active).ok_or(FieldCombination::UnknownClass)?;
    if !fields.contains(PayloadFields::REQUIRED) {
        return Err(FieldCombination::UnknownClass.into());
    }
    let extra = fields - PayloadFields::REQUIRED - PayloadFields::TO;
    let class = if extra.is_empty() {
        TxClass::Basic
    } else if extra == PayloadFields::ACCESS_LIST {
        TxClass::AccessList
    } else if extra == PayloadFields::FEE_MARKET {
        TxClass::FeeMarket
    } else if extra == PayloadFields::BLOB && fields.contains(PayloadFields::TO) {
        TxClass::Blob
    } else {
        return Err(FieldCombination::UnknownClass.into());
    };
    Ok(class)
}

/// Errors raised while framing or unframing gossip messages.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WireError {
    /// The message has no kind byte.
    #[error("Empty message")]
    Empty,
    /// The kind byte is not known.
    #[error("Unknown object kind {0:#04x}")]
    UnknownObjectKind(u8),
    /// The uncompressed payload exceeds the configured ceiling.
    #[error("Uncompressed size {size} exceeds limit {limit}")]
    UncompressedTooLarge {
        /// Announced or actual uncompressed size.
        size: usize,
        /// Configured ceiling.
        limit: usize,
    },
    /// The frame codec failed.
    #[error("Compression error: {0}")]
    Compression(String),
    /// The payload is not a valid SSZ object.
    #[error(transparent)]
    Ssz(#[from] SszError),
    /// The object is not a supported transaction or receipt.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

/// Kind of object carried by a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectKind {
    /// A [`SignedTransaction`].
    Transaction = 0x01,
    /// A [`PooledTransaction`].
    PooledTransaction = 0x02,
    /// A [`Receipt`].
    Receipt = 0x03,
}

impl TryFrom<u8> for ObjectKind {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::Transaction),
            0x02 => Ok(Self::PooledTransaction),
            0x03 => Ok(Self::Receipt),
            other => Err(WireError::UnknownObjectKind(other)),
        }
    }
}

/// Compression applied to message payloads.
#[auto_impl(&, Box, Arc)]
pub trait FrameCodec: Debug + Send + Sync {
    /// Compresses `data` into a frame.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, WireError>;

    /// Returns the uncompressed size announced by `frame` without decompressing it.
    fn uncompressed_len(&self, frame: &[u8]) -> Result<usize, WireError>;

    /// Decompresses `frame`.
    fn decompress(&self, frame: &[u8]) -> Result<Vec<u8>, WireError>;
}

/// A [`FrameCodec`] that stores payloads uncompressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFrames;

impl FrameCodec for RawFrames {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, WireError> {
        Ok(data.to_vec())
    }

    fn uncompressed_len(&self, frame: &[u8]) -> Result<usize, WireError> {
        Ok(frame.len())
    }

    fn decompress(&self, frame: &[u8]) -> Result<Vec<u8>, WireError> {
        Ok(frame.to_vec())
    }
}

/// Frames an encoded object.
pub fn encode_message<C: FrameCodec + ?Sized>(
    codec: &C,
    kind: ObjectKind,
    payload: &[u8],
    limit: usize,
) -> Result<Vec<u8>, WireError> {
    if payload.len() > limit {
        return Err(WireError::UncompressedTooLarge { size: payload.len(), limit });
    }
    let frame = codec.compress(payload)?;
    let mut message = Vec::with_capacity(frame.len() + 1);
    message.push(kind as u8);
    message.extend_from_slice(&frame);
    Ok(message)
}

/// Unframes a message, returning its kind and the encoded object.
pub fn decode_message<C: FrameCodec + ?Sized>(
    codec: &C,
    message: &[u8],
    limit: usize,
) -> Result<(ObjectKind, Vec<u8>), WireError> {
    let (&kind, frame) = message.split_first().ok_or(WireError::Empty)?;
    let kind = ObjectKind::try_from(kind)?;
    let size = codec.uncompressed_len(frame)?;
    if size > limit {
        return Err(WireError::UncompressedTooLarge { size, limit });
    }
    let payload = codec.decompress(frame)?;
    if payload.len() != size {
        return Err(WireError::Compression(format!(
            "frame announced {size} bytes but decompressed to {}",
            payload.len()
        )));
    }
    trace!(target: "ssz_tx::network", ?kind, size, "Decoded message");
    Ok((kind, payload))
}

/// An object carried over the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireObject {
    /// A transaction.
    Transaction(SignedTransaction),
    /// A transaction with its blob sidecar.
    PooledTransaction(PooledTransaction),
    /// A receipt.
    Receipt(Receipt),
}

impl WireObject {
    /// Kind tag of the object.
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Transaction(_) => ObjectKind::Transaction,
            Self::PooledTransaction(_) => ObjectKind::PooledTransaction,
            Self::Receipt(_) => ObjectKind::Receipt,
        }
    }

    fn ssz_bytes(&self) -> Result<Vec<u8>, SszError> {
        match self {
            Self::Transaction(tx) => tx.ssz_bytes(),
            Self::PooledTransaction(pooled) => pooled.ssz_bytes(),
            Self::Receipt(receipt) => receipt.ssz_bytes(),
        }
    }

    fn check_supported(&self) -> Result<(), TransactionError> {
        match self {
            Self::Transaction(tx) => check_transaction_supported(tx),
            Self::PooledTransaction(pooled) => check_pooled_transaction_supported(pooled),
            Self::Receipt(receipt) => check_receipt_supported(receipt),
        }
    }
}

/// Encodes and frames `object`.
pub fn encode_object<C: FrameCodec + ?Sized>(
    codec: &C,
    object: &WireObject,
    config: &ChainConfig,
) -> Result<Vec<u8>, WireError> {
    object.check_supported()?;
    encode_message(codec, object.kind(), &object.ssz_bytes()?, config.max_uncompressed_message_size)
}

/// Unframes and decodes a message, rejecting unsupported field combinations.
pub fn decode_object<C: FrameCodec + ?Sized>(
    codec: &C,
    message: &[u8],
    config: &ChainConfig,
) -> Result<WireObject, WireError> {
    let (kind, payload) = decode_message(codec, message, config.max_uncompressed_message_size)?;
    let object = match kind {
        ObjectKind::Transaction => WireObject::Transaction(SignedTransaction::from_ssz_bytes(&payload)?),
        ObjectKind::PooledTransaction => {
            WireObject::PooledTransaction(PooledTransaction::from_ssz_bytes(&payload)?)
        }
        ObjectKind::Receipt => WireObject::Receipt(Receipt::from_ssz_bytes(&payload)?),
    };
    object.check_supported()?;
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ssz::StableValue, ssz::Value, TransactionPayload};
    use alloy_primitives::{Address, U256};

    #[test]
    fn test_classify() {
        let mut payload = TransactionPayload::default();
        assert_eq!(classify(&payload.active_fields()).unwrap(), TxClass::Basic);

        payload.access_list = Some(vec![]);
        assert_eq!(classify(&payload.active_fields()).unwrap(), TxClass::AccessList);

        payload.max_priority_fee_per_gas = Some(U256::from(1));
        assert_eq!(classify(&payload.active_fields()).unwrap(), TxClass::FeeMarket);

        payload.max_fee_per_blob_gas = Some(U256::from(1));
        payload.blob_versioned_hashes = Some(vec![]);
        assert!(classify(&payload.active_fields()).is_err());

        payload.to = Some(Address::ZERO);
        assert_eq!(classify(&payload.active_fields()).unwrap(), TxClass::Blob);
        assert_eq!(TxClass::Blob.legacy_tx_type(), crate::constants::tx_type::BLOB_TX_TYPE);

        payload.access_list = None;
        assert!(classify(&payload.active_fields()).is_err());
    }

    #[test]
    fn test_classify_rejects_reserved_slot() {
        let active = StableValue::new(32).with(20, Value::Bool(true)).active_fields();
        assert!(matches!(
            classify(&active),
            Err(TransactionError::UnsupportedFieldCombination(FieldCombination::UnknownClass))
        ));
    }

    #[test]
    fn test_ceiling_checked_before_decompressing() {
        let message = encode_message(&RawFrames, ObjectKind::Receipt, &[0u8; 16], 16).unwrap();
        assert_eq!(message[0], 0x03);
        assert!(matches!(
            decode_message(&RawFrames, &message, 15),
            Err(WireError::UncompressedTooLarge { size: 16, limit: 15 })
        ));
        assert!(matches!(decode_message(&RawFrames, &[0x09], 16), Err(WireError::UnknownObjectKind(9))));
        assert!(matches!(decode_message(&RawFrames, &[], 16), Err(WireError::Empty)));
    }
}
