//! Constants for SSZ transactions and receipts.
//!
//! Capacities and list limits are part of every hash this crate produces. They are pinned
//! here at compile time and must never change for an existing network, otherwise every root
//! computed against the old value is invalidated.

/// Merkleization constants.
pub mod merkle {
    /// Size of a merkle leaf in bytes.
    pub const BYTES_PER_CHUNK: usize = 32;
    /// Number of bits that fit in one chunk.
    pub const BITS_PER_CHUNK: usize = BYTES_PER_CHUNK * 8;
    /// Size of an SSZ offset in bytes.
    pub const BYTES_PER_LENGTH_OFFSET: usize = 4;
    /// Deepest tree supported by the precomputed zero hashes.
    pub const MAX_TREE_DEPTH: usize = 64;
}

/// Field capacities of every stable container. Slots at or above the number of currently
/// defined fields are reserved for future fields.
pub mod capacity {
    /// Capacity of `TransactionPayload`.
    pub const MAX_TRANSACTION_PAYLOAD_FIELDS: usize = 32;
    /// Capacity of `TransactionSignature`.
    pub const MAX_TRANSACTION_SIGNATURE_FIELDS: usize = 16;
    /// Capacity of `PooledTransaction`.
    pub const MAX_POOLED_TRANSACTION_FIELDS: usize = 8;
    /// Capacity of `Receipt`.
    pub const MAX_RECEIPT_FIELDS: usize = 32;
}

/// List and vector limits.
pub mod limits {
    /// Maximum size of transaction input data.
    pub const MAX_CALLDATA_SIZE: usize = 1 << 24;
    /// Maximum number of entries in an access list.
    pub const MAX_ACCESS_LIST_SIZE: usize = 1 << 19;
    /// Maximum number of storage keys per access tuple.
    pub const MAX_ACCESS_LIST_STORAGE_KEYS: usize = 1 << 19;
    /// Maximum number of blobs (and blob hashes) referenced by one transaction.
    pub const MAX_BLOB_COMMITMENTS_PER_BLOCK: usize = 4096;
    /// Size of one blob.
    pub const BYTES_PER_BLOB: usize = 4096 * 32;
    /// Size of a KZG commitment or proof.
    pub const BYTES_PER_KZG: usize = 48;
    /// Maximum number of topics per log.
    pub const MAX_TOPICS_PER_LOG: usize = 4;
    /// Maximum size of log data.
    pub const MAX_LOG_DATA_SIZE: usize = 1 << 24;
    /// Maximum number of logs per receipt.
    pub const MAX_LOGS_PER_RECEIPT: usize = 1 << 21;
    /// Size of the logs bloom filter.
    pub const BYTES_PER_LOGS_BLOOM: usize = 256;
    /// Size of a packed secp256k1 signature: `r || s || y_parity`.
    pub const SECP256K1_SIGNATURE_SIZE: usize = 65;
    /// Size of an execution address.
    pub const BYTES_PER_ADDRESS: usize = 20;
}

/// Transaction type tags carried in `TransactionSignature::type_`.
pub mod tx_type {
    /// Legacy transaction with EIP-155 replay protection. Legacy transactions without replay
    /// protection carry no tag at all.
    pub const LEGACY_TX_TYPE: u8 = 0x00;
    /// EIP-2930 access list transaction.
    pub const ACCESS_LIST_TX_TYPE: u8 = 0x01;
    /// EIP-1559 fee market transaction.
    pub const FEE_MARKET_TX_TYPE: u8 = 0x02;
    /// EIP-4844 blob transaction.
    pub const BLOB_TX_TYPE: u8 = 0x03;
    /// Native SSZ transaction, signed over its own payload root.
    pub const SSZ_TX_TYPE: u8 = 0x04;
}

/// Signature domains.
pub mod domain {
    /// Domain type for SSZ transaction signatures.
    pub const DOMAIN_TRANSACTION_SSZ: [u8; 4] = [0x01, 0x00, 0x00, 0x83];
}

/// Wire limits.
pub mod wire {
    /// Default ceiling for the uncompressed size of one gossiped message.
    pub const DEFAULT_MAX_UNCOMPRESSED_MESSAGE_SIZE: usize = 10 * 1024 * 1024;
}

/// The secp256k1 curve order `n`, big-endian.
pub const SECP256K1_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];
