//! Commands of the `ssz-txe` tool.
//!
//! Every command writes a single JSON document to the writer it is given, so the commands can
//! be driven from tests as well as from the binary.

pub mod common;
pub use common::{Result, ToolError};

mod cmd;
pub use cmd::*;

pub mod from_legacy;
pub mod inspect;
pub mod receipt;
pub mod to_legacy;
