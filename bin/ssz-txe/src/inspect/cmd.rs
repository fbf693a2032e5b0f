use std::io::Write;

use alloy_primitives::{Address, B256};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use ssz_tx::{
    check_pooled_transaction_supported, check_receipt_supported, classify, compute_sig_hash,
    compute_tx_hash, validate_transaction, ChainConfig, K256Recover, PooledTransaction, Receipt,
    SignedTransaction, SszObject, TransactionError, TxClass,
};
use tracing::{info, warn};

use crate::common::{write_json, ChainArgs, HexInput, Result};

/// Kind of SSZ object to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKindArg {
    /// A signed transaction
    #[default]
    Transaction,
    /// A transaction with its blob sidecar
    Pooled,
    /// A receipt
    Receipt,
}

/// Decode and validate an SSZ transaction, pooled transaction or receipt
#[derive(Parser, Debug)]
pub struct Cmd {
    /// SSZ encoded object
    #[command(flatten)]
    pub input: HexInput,

    /// Kind of the encoded object
    #[arg(long = "kind", value_enum, default_value_t = ObjectKindArg::Transaction)]
    pub kind: ObjectKindArg,

    /// Chain configuration
    #[command(flatten)]
    pub chain_args: ChainArgs,
}

/// Output of `inspect`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectOutput {
    /// Kind of the decoded object.
    pub kind: ObjectKindArg,
    /// Hash tree root of the object.
    pub root: B256,
    /// Slots active in the transaction payload or receipt.
    pub active_fields: Vec<usize>,
    /// Whether the object passed validation.
    pub valid: bool,
    /// Reason the object was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Class of the transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<TxClass>,
    /// Recovered sender.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<Address>,
    /// Hash the transaction is signed over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig_hash: Option<B256>,
    /// Identifying hash of the transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,
}

impl InspectOutput {
    fn new(kind: ObjectKindArg, root: B256, active_fields: Vec<usize>) -> Self {
        Self {
            kind,
            root,
            active_fields,
            valid: true,
            error: None,
            class: None,
            sender: None,
            sig_hash: None,
            tx_hash: None,
        }
    }

    fn reject(&mut self, error: &TransactionError) {
        warn!(%error, "Object rejected");
        self.valid = false;
        self.error = Some(error.to_string());
    }

    fn inspect_transaction(&mut self, tx: &SignedTransaction, config: &ChainConfig) {
        self.class = classify(&tx.payload.active_fields()).ok();
        let validated = validate_transaction(&K256Recover, tx, config.chain_id).and_then(|sender| {
            Ok((
                sender,
                compute_sig_hash(tx, config.chain_id)?,
                compute_tx_hash(tx, config.chain_id)?,
            ))
        });
        match validated {
            Ok((sender, sig_hash, tx_hash)) => {
                self.sender = Some(sender);
                self.sig_hash = Some(sig_hash);
                self.tx_hash = Some(tx_hash);
            }
            Err(error) => self.reject(&error),
        }
    }
}

impl Cmd {
    /// Execute the inspect command
    pub fn run<W: Write>(&self, out: &mut W) -> Result<()> {
        let config = self.chain_args.load()?;
        let bytes = self.input.load()?;

        let output = match self.kind {
            ObjectKindArg::Transaction => {
                let tx = SignedTransaction::from_ssz_bytes(&bytes)?;
                let mut output = InspectOutput::new(
                    self.kind,
                    tx.hash_tree_root()?,
                    tx.payload.active_fields().iter().collect(),
                );
                output.inspect_transaction(&tx, &config);
                output
            }
            ObjectKindArg::Pooled => {
                let pooled = PooledTransaction::from_ssz_bytes(&bytes)?;
                let mut output = InspectOutput::new(
                    self.kind,
                    pooled.hash_tree_root()?,
                    pooled.tx.payload.active_fields().iter().collect(),
                );
                match check_pooled_transaction_supported(&pooled) {
                    Ok(()) => output.inspect_transaction(&pooled.tx, &config),
                    Err(error) => output.reject(&error),
                }
                output
            }
            ObjectKindArg::Receipt => {
                let receipt = Receipt::from_ssz_bytes(&bytes)?;
                let mut output = InspectOutput::new(
                    self.kind,
                    receipt.hash_tree_root()?,
                    receipt.active_fields().iter().collect(),
                );
                if let Err(error) = check_receipt_supported(&receipt) {
                    output.reject(&error);
                }
                output
            }
        };
        info!(root = %output.root, valid = output.valid, "Inspected object");
        write_json(out, &output)
    }
}
