//! Test utilities for SSZ transactions and receipts.

mod envelopes;
mod keys;

pub use envelopes::*;
pub use keys::*;
