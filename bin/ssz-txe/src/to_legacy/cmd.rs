use std::io::Write;

use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Bytes, B256};
use clap::Parser;
use serde::Serialize;
use ssz_tx::{legacy::legacy_hashes, to_legacy, SignedTransaction, SszObject};
use tracing::info;

use crate::common::{write_json, ChainArgs, HexInput, Result};

/// Rebuild the EIP-2718 encoding of an SSZ transaction
#[derive(Parser, Debug)]
pub struct Cmd {
    /// SSZ encoded signed transaction
    #[command(flatten)]
    pub input: HexInput,

    /// Chain configuration
    #[command(flatten)]
    pub chain_args: ChainArgs,
}

/// Output of `to-legacy`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToLegacyOutput {
    /// EIP-2718 encoding.
    pub encoded: Bytes,
    /// Legacy signing hash.
    pub sig_hash: B256,
    /// Legacy transaction hash.
    pub tx_hash: B256,
}

impl Cmd {
    /// Execute the to-legacy command
    pub fn run<W: Write>(&self, out: &mut W) -> Result<()> {
        let config = self.chain_args.load()?;
        let tx = SignedTransaction::from_ssz_bytes(&self.input.load()?)?;
        let envelope = to_legacy(&tx, config.chain_id)?;
        let (sig_hash, tx_hash) = legacy_hashes(&envelope);
        info!(%tx_hash, "Rebuilt legacy transaction");

        write_json(out, &ToLegacyOutput { encoded: envelope.encoded_2718().into(), sig_hash, tx_hash })
    }
}
