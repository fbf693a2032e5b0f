//! Conversion from and to the legacy EIP-2718 encodings.
//!
//! Converted transactions keep their legacy type tag, and their signing and transaction hashes
//! are computed by rebuilding the legacy envelope, so a transaction keeps the hashes it was
//! signed and indexed under before conversion.

mod receipt;
pub use receipt::*;

mod transaction;
pub use transaction::*;
