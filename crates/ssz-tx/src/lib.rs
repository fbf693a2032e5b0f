//! SSZ transactions and receipts for the execution layer.
//!
//! Transactions and receipts are modelled as stable containers: every field has a fixed slot
//! within a capacity pinned at compile time, so adding a field later never changes the
//! merkle root of objects that do not use it. Legacy EIP-2718 encodings convert losslessly
//! into this representation and keep the hashes they were signed and indexed under.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;
pub mod legacy;
pub mod ssz;

mod config;
pub use config::*;

mod error;
pub use error::*;

mod network;
pub use network::*;

mod object;
pub use object::SszObject;

mod receipt;
pub use receipt::*;

mod signing;
pub use signing::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod transaction;
pub use transaction::*;

pub use legacy::{from_legacy, from_legacy_with, to_legacy, ConvertedTransaction};
pub use ssz::Value;
