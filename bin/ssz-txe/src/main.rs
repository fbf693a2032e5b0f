//! `ssz-txe`: convert legacy transactions and receipts to SSZ and inspect SSZ objects.

use clap::Parser;
use ssz_txe::{MainCmd, ToolError};

fn main() -> Result<(), ToolError> {
    let cmd = MainCmd::parse();
    cmd.log_args.init()?;
    cmd.run(&mut std::io::stdout().lock()).inspect_err(|e| eprintln!("{e}"))
}
