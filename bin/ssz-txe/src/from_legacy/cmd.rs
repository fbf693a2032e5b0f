use std::io::Write;

use alloy_primitives::{Bytes, B256};
use clap::Parser;
use serde::Serialize;
use ssz_tx::{classify, from_legacy, SignedTransaction, SszObject, TxClass};
use tracing::info;

use crate::common::{write_json, ChainArgs, HexInput, Result};

/// Convert an EIP-2718 transaction to SSZ
#[derive(Parser, Debug)]
pub struct Cmd {
    /// EIP-2718 encoded transaction
    #[command(flatten)]
    pub input: HexInput,

    /// Chain configuration
    #[command(flatten)]
    pub chain_args: ChainArgs,
}

/// Output of `from-legacy`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FromLegacyOutput {
    /// SSZ encoding of the converted transaction.
    pub ssz: Bytes,
    /// Hash tree root of the converted transaction.
    pub root: B256,
    /// Hash the legacy transaction was signed over.
    pub sig_hash: B256,
    /// Hash of the legacy encoding.
    pub tx_hash: B256,
    /// Class derived from the active payload fields.
    pub class: TxClass,
    /// The converted transaction.
    pub tx: SignedTransaction,
}

impl Cmd {
    /// Execute the from-legacy command
    pub fn run<W: Write>(&self, out: &mut W) -> Result<()> {
        let config = self.chain_args.load()?;
        let encoded = self.input.load()?;
        let converted = from_legacy(&encoded, config.chain_id)?;
        info!(tx_hash = %converted.tx_hash, "Converted transaction");

        let output = FromLegacyOutput {
            ssz: converted.tx.ssz_bytes()?.into(),
            root: converted.tx.hash_tree_root()?,
            sig_hash: converted.sig_hash,
            tx_hash: converted.tx_hash,
            class: classify(&converted.payload.active_fields())?,
            tx: converted.tx,
        };
        write_json(out, &output)
    }
}
