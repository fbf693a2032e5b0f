use std::io::Write;

use alloy_primitives::{Address, Bytes, B256};
use clap::Parser;
use serde::Serialize;
use ssz_tx::{from_legacy, legacy::receipt_from_legacy, Receipt, SszObject};
use tracing::info;

use crate::common::{decode_hex, write_json, ChainArgs, Result};

/// Convert an EIP-2718 receipt to SSZ
#[derive(Parser, Debug)]
pub struct Cmd {
    /// EIP-2718 encoded receipt
    #[arg(long = "receipt", value_name = "HEX")]
    pub receipt: String,

    /// EIP-2718 encoded transaction the receipt belongs to
    #[arg(long = "tx", value_name = "HEX")]
    pub tx: String,

    /// Cumulative gas used by the transactions before this one in the block
    #[arg(long = "cumulative-gas-before", default_value_t = 0)]
    pub cumulative_gas_before: u64,

    /// Chain configuration
    #[command(flatten)]
    pub chain_args: ChainArgs,
}

/// Output of `receipt`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptOutput {
    /// SSZ encoding of the receipt.
    pub ssz: Bytes,
    /// Hash tree root of the receipt.
    pub root: B256,
    /// Gas used by the transaction alone.
    pub gas_used: u64,
    /// Address of the created contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    /// The converted receipt.
    pub receipt: Receipt,
}

impl Cmd {
    /// Execute the receipt command
    pub fn run<W: Write>(&self, out: &mut W) -> Result<()> {
        let config = self.chain_args.load()?;
        let companion = from_legacy(&decode_hex(&self.tx)?, config.chain_id)?;
        let receipt =
            receipt_from_legacy(&decode_hex(&self.receipt)?, &companion.tx, self.cumulative_gas_before)?;
        info!(tx_hash = %companion.tx_hash, gas_used = receipt.gas_used, "Converted receipt");

        let output = ReceiptOutput {
            ssz: receipt.ssz_bytes()?.into(),
            root: receipt.hash_tree_root()?,
            gas_used: receipt.gas_used,
            contract_address: receipt.contract_address,
            receipt,
        };
        write_json(out, &output)
    }
}
