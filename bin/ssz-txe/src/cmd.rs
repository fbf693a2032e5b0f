use std::io::Write;

use clap::{Parser, Subcommand};

use crate::common::{LogArgs, Result};

/// SSZ transaction and receipt tool.
#[derive(Parser, Debug)]
#[command(name = "ssz-txe", infer_subcommands = true, version)]
pub struct MainCmd {
    /// Logging configuration
    #[command(flatten)]
    pub log_args: LogArgs,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of `ssz-txe`.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert an EIP-2718 transaction to SSZ
    FromLegacy(crate::from_legacy::Cmd),
    /// Rebuild the EIP-2718 encoding of an SSZ transaction
    ToLegacy(crate::to_legacy::Cmd),
    /// Decode and validate an SSZ transaction, pooled transaction or receipt
    Inspect(crate::inspect::Cmd),
    /// Convert an EIP-2718 receipt to SSZ
    Receipt(crate::receipt::Cmd),
}

impl MainCmd {
    /// Runs the selected command, writing its JSON output to `out`.
    pub fn run<W: Write>(&self, out: &mut W) -> Result<()> {
        match &self.command {
            Command::FromLegacy(cmd) => cmd.run(out),
            Command::ToLegacy(cmd) => cmd.run(out),
            Command::Inspect(cmd) => cmd.run(out),
            Command::Receipt(cmd) => cmd.run(out),
        }
    }
}
