//! SSZ transactions.

use alloy_primitives::{Address, Bytes, FixedBytes, B256, U256};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        capacity::{
            MAX_POOLED_TRANSACTION_FIELDS, MAX_TRANSACTION_PAYLOAD_FIELDS,
            MAX_TRANSACTION_SIGNATURE_FIELDS,
        },
        limits::{
            BYTES_PER_ADDRESS, BYTES_PER_BLOB, BYTES_PER_KZG, MAX_ACCESS_LIST_SIZE,
            MAX_ACCESS_LIST_STORAGE_KEYS, MAX_BLOB_COMMITMENTS_PER_BLOCK, MAX_CALLDATA_SIZE,
            SECP256K1_SIGNATURE_SIZE,
        },
        tx_type::{
            ACCESS_LIST_TX_TYPE, BLOB_TX_TYPE, FEE_MARKET_TX_TYPE, LEGACY_TX_TYPE, SSZ_TX_TYPE,
        },
    },
    object::{fixed_list, parse_fixed_list, stable_value},
    ssz::{field, Schema, SszError, StableValue, Value},
    FieldCombination, SszObject, TransactionError,
};

/// Slot indices of `TransactionPayload`.
pub mod payload_slot {
    /// `nonce`.
    pub const NONCE: usize = 0;
    /// `max_fee_per_gas`.
    pub const MAX_FEE_PER_GAS: usize = 1;
    /// `gas`.
    pub const GAS: usize = 2;
    /// `to`.
    pub const TO: usize = 3;
    /// `value`.
    pub const VALUE: usize = 4;
    /// `input`.
    pub const INPUT: usize = 5;
    /// `access_list`.
    pub const ACCESS_LIST: usize = 6;
    /// `max_priority_fee_per_gas`.
    pub const MAX_PRIORITY_FEE_PER_GAS: usize = 7;
    /// `max_fee_per_blob_gas`.
    pub const MAX_FEE_PER_BLOB_GAS: usize = 8;
    /// `blob_versioned_hashes`.
    pub const BLOB_VERSIONED_HASHES: usize = 9;
}

/// Slot indices of `TransactionSignature`.
pub mod signature_slot {
    /// `from`.
    pub const FROM: usize = 0;
    /// `ecdsa_signature`.
    pub const ECDSA_SIGNATURE: usize = 1;
    /// `type`.
    pub const TYPE: usize = 2;
}

/// Slot indices of `PooledTransaction`.
pub mod pooled_slot {
    /// `tx`.
    pub const TX: usize = 0;
    /// `blob_kzg_commitments`.
    pub const BLOB_KZG_COMMITMENTS: usize = 1;
    /// `blobs`.
    pub const BLOBS: usize = 2;
    /// `blob_kzg_proofs`.
    pub const BLOB_KZG_PROOFS: usize = 3;
}

/// `AccessTuple` schema.
pub static ACCESS_TUPLE_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::Container(vec![
        field("address", Schema::ByteVector(BYTES_PER_ADDRESS)),
        field("storage_keys", Schema::list(Schema::BYTES32, MAX_ACCESS_LIST_STORAGE_KEYS)),
    ])
});

/// `TransactionPayload` schema.
pub static TRANSACTION_PAYLOAD_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::stable_container(
        MAX_TRANSACTION_PAYLOAD_FIELDS,
        vec![
            field("nonce", Schema::UINT64),
            field("max_fee_per_gas", Schema::UINT256),
            field("gas", Schema::UINT64),
            field("to", Schema::optional(Schema::ByteVector(BYTES_PER_ADDRESS))),
            field("value", Schema::UINT256),
            field("input", Schema::ByteList(MAX_CALLDATA_SIZE)),
            field(
                "access_list",
                Schema::optional(Schema::list(ACCESS_TUPLE_SCHEMA.clone(), MAX_ACCESS_LIST_SIZE)),
            ),
            field("max_priority_fee_per_gas", Schema::optional(Schema::UINT256)),
            field("max_fee_per_blob_gas", Schema::optional(Schema::UINT256)),
            field(
                "blob_versioned_hashes",
                Schema::optional(Schema::list(Schema::BYTES32, MAX_BLOB_COMMITMENTS_PER_BLOCK)),
            ),
        ],
    )
});

/// `TransactionSignature` schema.
pub static TRANSACTION_SIGNATURE_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::stable_container(
        MAX_TRANSACTION_SIGNATURE_FIELDS,
        vec![
            field("from", Schema::ByteVector(BYTES_PER_ADDRESS)),
            field("ecdsa_signature", Schema::ByteVector(SECP256K1_SIGNATURE_SIZE)),
            field("type", Schema::optional(Schema::UINT8)),
        ],
    )
});

/// `SignedTransaction` schema.
pub static SIGNED_TRANSACTION_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::Container(vec![
        field("payload", TRANSACTION_PAYLOAD_SCHEMA.clone()),
        field("signature", TRANSACTION_SIGNATURE_SCHEMA.clone()),
    ])
});

/// `PooledTransaction` schema.
pub static POOLED_TRANSACTION_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    let commitments = || Schema::list(Schema::ByteVector(BYTES_PER_KZG), MAX_BLOB_COMMITMENTS_PER_BLOCK);
    Schema::stable_container(
        MAX_POOLED_TRANSACTION_FIELDS,
        vec![
            field("tx", SIGNED_TRANSACTION_SCHEMA.clone()),
            field("blob_kzg_commitments", Schema::optional(commitments())),
            field(
                "blobs",
                Schema::optional(Schema::list(
                    Schema::ByteVector(BYTES_PER_BLOB),
                    MAX_BLOB_COMMITMENTS_PER_BLOCK,
                )),
            ),
            field("blob_kzg_proofs", Schema::optional(commitments())),
        ],
    )
});

/// An entry of an access list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTuple {
    /// Accessed account.
    pub address: Address,
    /// Accessed storage slots.
    pub storage_keys: Vec<B256>,
}

impl SszObject for AccessTuple {
    fn schema() -> &'static Schema {
        &ACCESS_TUPLE_SCHEMA
    }

    fn to_value(&self) -> Value {
        Value::Container(vec![Value::address(self.address), fixed_list(&self.storage_keys)])
    }

    fn from_value(value: &Value) -> Result<Self, SszError> {
        let [address, storage_keys] = value.as_fields::<2>()?;
        Ok(Self { address: address.as_address()?, storage_keys: parse_fixed_list(storage_keys)? })
    }
}

/// The unsigned content of a transaction.
///
/// Which optional fields are active determines the transaction's class: an access list makes
/// it an access list transaction, a priority fee a fee market transaction and a blob fee a
/// blob transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    /// Sender nonce.
    pub nonce: u64,
    /// Maximum total fee per gas; the gas price for legacy and access list transactions.
    pub max_fee_per_gas: U256,
    /// Gas limit.
    pub gas: u64,
    /// Destination, or `None` for contract creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Transferred value.
    pub value: U256,
    /// Call data or init code.
    pub input: Bytes,
    /// EIP-2930 access list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessTuple>>,
    /// EIP-1559 priority fee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    /// EIP-4844 blob fee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_blob_gas: Option<U256>,
    /// EIP-4844 blob versioned hashes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_versioned_hashes: Option<Vec<B256>>,
}

impl TransactionPayload {
    /// Returns `true` for contract creations.
    pub const fn is_create(&self) -> bool {
        self.to.is_none()
    }

    /// Slots that are active in this payload.
    pub fn active_fields(&self) -> crate::ssz::ActiveFields {
        self.to_stable().active_fields()
    }

    fn to_stable(&self) -> StableValue {
        use payload_slot::*;

        StableValue::new(MAX_TRANSACTION_PAYLOAD_FIELDS)
            .with(NONCE, Value::uint(self.nonce))
            .with(MAX_FEE_PER_GAS, Value::Uint(self.max_fee_per_gas))
            .with(GAS, Value::uint(self.gas))
            .with_optional(TO, self.to.map(Value::address))
            .with(VALUE, Value::Uint(self.value))
            .with(INPUT, Value::Bytes(self.input.clone()))
            .with_optional(
                ACCESS_LIST,
                self.access_list
                    .as_ref()
                    .map(|list| Value::List(list.iter().map(SszObject::to_value).collect())),
            )
            .with_optional(MAX_PRIORITY_FEE_PER_GAS, self.max_priority_fee_per_gas.map(Value::Uint))
            .with_optional(MAX_FEE_PER_BLOB_GAS, self.max_fee_per_blob_gas.map(Value::Uint))
            .with_optional(BLOB_VERSIONED_HASHES, self.blob_versioned_hashes.as_deref().map(fixed_list))
    }
}

impl SszObject for TransactionPayload {
    fn schema() -> &'static Schema {
        &TRANSACTION_PAYLOAD_SCHEMA
    }

    fn to_value(&self) -> Value {
        self.to_stable().into()
    }

    fn from_value(value: &Value) -> Result<Self, SszError> {
        use payload_slot::*;

        let fields = stable_value(Self::schema(), value)?;
        let access_list = match fields.get(ACCESS_LIST) {
            Some(list) => Some(
                list.as_list()?.iter().map(AccessTuple::from_value).collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        Ok(Self {
            nonce: fields.required(NONCE, "nonce")?.as_u64()?,
            max_fee_per_gas: fields.required(MAX_FEE_PER_GAS, "max_fee_per_gas")?.as_uint()?,
            gas: fields.required(GAS, "gas")?.as_u64()?,
            to: fields.get(TO).map(Value::as_address).transpose()?,
            value: fields.required(VALUE, "value")?.as_uint()?,
            input: fields.required(INPUT, "input")?.as_bytes()?.clone(),
            access_list,
            max_priority_fee_per_gas: fields.get(MAX_PRIORITY_FEE_PER_GAS).map(Value::as_uint).transpose()?,
            max_fee_per_blob_gas: fields.get(MAX_FEE_PER_BLOB_GAS).map(Value::as_uint).transpose()?,
            blob_versioned_hashes: fields.get(BLOB_VERSIONED_HASHES).map(parse_fixed_list).transpose()?,
        })
    }
}

/// Signature and sender of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSignature {
    /// Sender, checked against the address recovered from `ecdsa_signature`.
    pub from: Address,
    /// Packed `r || s || y_parity` signature.
    pub ecdsa_signature: FixedBytes<SECP256K1_SIGNATURE_SIZE>,
    /// Legacy type tag, [`SSZ_TX_TYPE`] for native SSZ transactions, or `None` for
    /// pre-EIP-155 legacy transactions.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<u8>,
}

impl SszObject for TransactionSignature {
    fn schema() -> &'static Schema {
        &TRANSACTION_SIGNATURE_SCHEMA
    }

    fn to_value(&self) -> Value {
        use signature_slot::*;

        StableValue::new(MAX_TRANSACTION_SIGNATURE_FIELDS)
            .with(FROM, Value::address(self.from))
            .with(ECDSA_SIGNATURE, Value::fixed(self.ecdsa_signature))
            .with_optional(TYPE, self.tx_type.map(Value::uint))
            .into()
    }

    fn from_value(value: &Value) -> Result<Self, SszError> {
        use signature_slot::*;

        let fields = stable_value(Self::schema(), value)?;
        Ok(Self {
            from: fields.required(FROM, "from")?.as_address()?,
            ecdsa_signature: fields.required(ECDSA_SIGNATURE, "ecdsa_signature")?.as_fixed()?,
            tx_type: fields.get(TYPE).map(Value::as_u8).transpose()?,
        })
    }
}

/// A transaction payload together with its signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Unsigned content.
    pub payload: TransactionPayload,
    /// Signature and sender.
    pub signature: TransactionSignature,
}

impl SignedTransaction {
    /// Type tag carried in the signature.
    pub const fn tx_type(&self) -> Option<u8> {
        self.signature.tx_type
    }

    /// Returns `true` if the transaction is signed over its own SSZ payload root.
    pub fn is_native(&self) -> bool {
        self.signature.tx_type == Some(SSZ_TX_TYPE)
    }
}

impl SszObject for SignedTransaction {
    fn schema() -> &'static Schema {
        &SIGNED_TRANSACTION_SCHEMA
    }

    fn to_value(&self) -> Value {
        Value::Container(vec![self.payload.to_value(), self.signature.to_value()])
    }

    fn from_value(value: &Value) -> Result<Self, SszError> {
        let [payload, signature] = value.as_fields::<2>()?;
        Ok(Self {
            payload: TransactionPayload::from_value(payload)?,
            signature: TransactionSignature::from_value(signature)?,
        })
    }
}

/// A transaction as gossiped between pools, carrying the blob sidecar of blob transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PooledTransaction {
    /// The transaction.
    pub tx: SignedTransaction,
    /// KZG commitments of the blobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_kzg_commitments: Option<Vec<FixedBytes<BYTES_PER_KZG>>>,
    /// Blob contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blobs: Option<Vec<Bytes>>,
    /// KZG proofs of the blobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_kzg_proofs: Option<Vec<FixedBytes<BYTES_PER_KZG>>>,
}

impl From<SignedTransaction> for PooledTransaction {
    fn from(tx: SignedTransaction) -> Self {
        Self { tx, blob_kzg_commitments: None, blobs: None, blob_kzg_proofs: None }
    }
}

impl SszObject for PooledTransaction {
    fn schema() -> &'static Schema {
        &POOLED_TRANSACTION_SCHEMA
    }

    fn to_value(&self) -> Value {
        use pooled_slot::*;

        StableValue::new(MAX_POOLED_TRANSACTION_FIELDS)
            .with(TX, self.tx.to_value())
            .with_optional(BLOB_KZG_COMMITMENTS, self.blob_kzg_commitments.as_deref().map(fixed_list))
            .with_optional(
                BLOBS,
                self.blobs
                    .as_ref()
                    .map(|blobs| Value::List(blobs.iter().cloned().map(Value::Bytes).collect())),
            )
            .with_optional(BLOB_KZG_PROOFS, self.blob_kzg_proofs.as_deref().map(fixed_list))
            .into()
    }

    fn from_value(value: &Value) -> Result<Self, SszError> {
        use pooled_slot::*;

        let fields = stable_value(Self::schema(), value)?;
        let blobs = match fields.get(BLOBS) {
            Some(list) => Some(
                list.as_list()?
                    .iter()
                    .map(|blob| blob.as_bytes().cloned())
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        Ok(Self {
            tx: SignedTransaction::from_value(fields.required(TX, "tx")?)?,
            blob_kzg_commitments: fields.get(BLOB_KZG_COMMITMENTS).map(parse_fixed_list).transpose()?,
            blobs,
            blob_kzg_proofs: fields.get(BLOB_KZG_PROOFS).map(parse_fixed_list).transpose()?,
        })
    }
}

/// Checks that the active fields of `tx` describe a supported transaction and agree with its
/// type tag.
pub fn check_transaction_supported(tx: &SignedTransaction) -> Result<(), TransactionError> {
    let payload = &tx.payload;
    let has_blob_fee = payload.max_fee_per_blob_gas.is_some();
    let has_priority_fee = payload.max_priority_fee_per_gas.is_some();
    let has_access_list = payload.access_list.is_some();

    if has_blob_fee {
        if payload.blob_versioned_hashes.is_none() {
            return Err(FieldCombination::BlobFeeWithoutBlobHashes.into());
        }
        if !has_priority_fee {
            return Err(FieldCombination::BlobFeeWithoutPriorityFee.into());
        }
        if payload.to.is_none() {
            return Err(FieldCombination::BlobFeeWithoutDestination.into());
        }
    } else if payload.blob_versioned_hashes.is_some() {
        return Err(FieldCombination::BlobHashesWithoutBlobFee.into());
    }
    if has_priority_fee && !has_access_list {
        return Err(FieldCombination::PriorityFeeWithoutAccessList.into());
    }

    if tx.is_native() {
        return Ok(());
    }
    let expected = if has_blob_fee {
        Some(BLOB_TX_TYPE)
    } else if has_priority_fee {
        Some(FEE_MARKET_TX_TYPE)
    } else if has_access_list {
        Some(ACCESS_LIST_TX_TYPE)
    } else {
        None
    };
    match (tx.tx_type(), expected) {
        (None | Some(LEGACY_TX_TYPE), None) => Ok(()),
        (Some(tx_type), Some(expected)) if tx_type == expected => Ok(()),
        (Some(tx_type), _) => Err(FieldCombination::TypeTagMismatch { tx_type }.into()),
        (None, Some(_)) => Err(FieldCombination::UntaggedNotLegacy.into()),
    }
}

/// Checks `pooled.tx` and that the blob sidecar is present, with one entry per blob hash,
/// exactly when the transaction is a blob transaction.
pub fn check_pooled_transaction_supported(pooled: &PooledTransaction) -> Result<(), TransactionError> {
    check_transaction_supported(&pooled.tx)?;
    let sidecar_lengths = [
        pooled.blob_kzg_commitments.as_ref().map(Vec::len),
        pooled.blobs.as_ref().map(Vec::len),
        pooled.blob_kzg_proofs.as_ref().map(Vec::len),
    ];
    let consistent = match &pooled.tx.payload.blob_versioned_hashes {
        Some(hashes) => sidecar_lengths.iter().all(|length| *length == Some(hashes.len())),
        None => sidecar_lengths.iter().all(Option::is_none),
    };
    if !consistent {
        return Err(FieldCombination::BlobSidecar.into());
    }
    Ok(())
}
