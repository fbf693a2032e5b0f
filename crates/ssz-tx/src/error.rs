//! Errors for transaction and receipt handling.

use alloy_primitives::Address;

use crate::ssz::SszError;

/// Errors raised while validating, hashing or converting transactions and receipts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransactionError {
    /// The value is not a valid SSZ object.
    #[error(transparent)]
    Ssz(#[from] SszError),
    /// The set of active fields does not describe a supported transaction or receipt.
    #[error("Unsupported field combination: {0}")]
    UnsupportedFieldCombination(#[from] FieldCombination),
    /// The signature is malformed or does not recover.
    #[error("Invalid signature encoding: {0}")]
    InvalidSignatureEncoding(#[from] SignatureError),
    /// The recovered sender does not match the `from` field.
    #[error("Signature mismatch: signature recovers {recovered}, transaction claims {claimed}")]
    SignatureMismatch {
        /// Address recovered from the signature.
        recovered: Address,
        /// Address carried in the transaction.
        claimed: Address,
    },
    /// Native SSZ transactions have no legacy encoding.
    #[error("Transaction has no legacy representation")]
    NoLegacyRepresentation,
    /// The legacy transaction type is not supported.
    #[error("Unsupported legacy transaction type {0:#04x}")]
    UnsupportedLegacyType(u8),
    /// The legacy encoding could not be decoded.
    #[error("Failed to decode legacy encoding: {0}")]
    LegacyDecode(#[from] alloy_eips::eip2718::Eip2718Error),
    /// Bytes remain after the legacy encoding.
    #[error("{0} trailing bytes after legacy encoding")]
    TrailingLegacyBytes(usize),
    /// The transaction is bound to a different chain.
    #[error("Chain id mismatch: expected {expected}, got {actual}")]
    ChainIdMismatch {
        /// Chain id of the local configuration.
        expected: u64,
        /// Chain id carried by the transaction.
        actual: u64,
    },
    /// A fee does not fit in the legacy representation.
    #[error("Fee `{0}` does not fit in 128 bits")]
    FeeOutOfRange(&'static str),
    /// A receipt's cumulative gas is lower than the cumulative gas before it.
    #[error("Gas accounting error: cumulative gas {cumulative} is below previous {before}")]
    GasAccounting {
        /// Cumulative gas used including this transaction.
        cumulative: u64,
        /// Cumulative gas used before this transaction.
        before: u64,
    },
    /// Adding a receipt's gas to the cumulative gas before it overflows.
    #[error("Gas accounting error: gas used {gas_used} overflows cumulative gas {before}")]
    GasOverflow {
        /// Gas used by the transaction.
        gas_used: u64,
        /// Cumulative gas used before this transaction.
        before: u64,
    },
    /// A receipt envelope's type differs from the type of its transaction.
    #[error("Receipt type {receipt_type:#04x} does not match transaction type {tx_type:#04x}")]
    ReceiptTypeMismatch {
        /// Type of the receipt envelope.
        receipt_type: u8,
        /// Legacy type of the transaction.
        tx_type: u8,
    },
}

/// The field co-occurrence rule a transaction, pooled transaction or receipt violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldCombination {
    /// A blob fee is set without blob versioned hashes.
    #[error("blob fee requires blob versioned hashes")]
    BlobFeeWithoutBlobHashes,
    /// A blob fee is set without a priority fee.
    #[error("blob fee requires a priority fee")]
    BlobFeeWithoutPriorityFee,
    /// A blob fee is set on a contract creation.
    #[error("blob fee requires a destination address")]
    BlobFeeWithoutDestination,
    /// Blob versioned hashes are set without a blob fee.
    #[error("blob versioned hashes require a blob fee")]
    BlobHashesWithoutBlobFee,
    /// A priority fee is set without an access list.
    #[error("priority fee requires an access list")]
    PriorityFeeWithoutAccessList,
    /// The legacy type tag does not match the active fields.
    #[error("legacy type tag {tx_type:#04x} does not match the active fields")]
    TypeTagMismatch {
        /// Tag carried in the signature.
        tx_type: u8,
    },
    /// Pre-EIP-155 legacy transactions carry no chain id, so they cannot use a typed field.
    #[error("transaction without type tag must be a plain legacy transaction")]
    UntaggedNotLegacy,
    /// Blob sidecar lists are missing, unexpected or do not match the blob hashes.
    #[error("blob sidecar does not match the payload")]
    BlobSidecar,
    /// A receipt carries both or neither of `root` and `status`.
    #[error("receipt must carry exactly one of root and status")]
    ReceiptOutcome,
    /// No transaction class describes the active fields.
    #[error("active fields do not describe a known transaction class")]
    UnknownClass,
}

/// Ways a packed secp256k1 signature can be invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The packed signature is not 65 bytes long.
    #[error("expected 65 bytes, got {0}")]
    InvalidLength(usize),
    /// `r` is zero or not below the curve order.
    #[error("r is out of range")]
    InvalidR,
    /// `s` is zero or not below the curve order.
    #[error("s is out of range")]
    InvalidS,
    /// The recovery byte is neither 0 nor 1.
    #[error("invalid y parity {0}")]
    InvalidParity(u8),
    /// No public key recovers from the signature and digest.
    #[error("public key recovery failed")]
    RecoveryFailed,
}
