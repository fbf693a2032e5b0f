use alloy_primitives::hex::FromHexError;
use ssz_tx::{ssz::SszError, TransactionError};

/// Errors raised by `ssz-txe` commands.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Failed to read or write a file or stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid hex string
    #[error("Invalid hex string: {0}")]
    InvalidHex(#[from] FromHexError),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed SSZ object
    #[error("SSZ error: {0}")]
    Ssz(#[from] SszError),

    /// Transaction or receipt rejected
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
}

/// Result type for `ssz-txe` commands.
pub type Result<T> = std::result::Result<T, ToolError>;
