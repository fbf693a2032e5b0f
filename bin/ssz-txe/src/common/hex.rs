//! Hex loading utilities for ssz-txe

use std::{fs, io::Read};

use alloy_primitives::{hex, Bytes};

use super::{Result, ToolError};

/// Hex input given either inline or as a file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct HexInput {
    /// Hex encoded input, with or without a 0x prefix
    #[arg(value_name = "HEX", required_unless_present = "input_file")]
    pub input: Option<String>,

    /// File holding the hex encoded input. Use - to read from stdin
    #[arg(long = "input-file", conflicts_with = "input")]
    pub input_file: Option<String>,
}

impl HexInput {
    /// Loads the input bytes.
    pub fn load(&self) -> Result<Bytes> {
        load_hex(self.input.clone(), self.input_file.clone())?
            .ok_or_else(|| ToolError::InvalidInput("no input given".to_string()))
    }
}

/// Load hex-encoded bytes from an argument or a file. If the file is a dash (-), read from stdin.
/// Priority: arg > file. Returns `None` if neither is provided.
pub fn load_hex(arg: Option<String>, file: Option<String>) -> Result<Option<Bytes>> {
    let hex_string = if let Some(arg) = arg {
        arg
    } else if let Some(file) = file {
        if file == "-" {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        } else {
            fs::read_to_string(file)?
        }
    } else {
        return Ok(None);
    };

    decode_hex(&hex_string).map(|bytes| Some(Bytes::from(bytes)))
}

/// Decode hex string, handling optional 0x prefix
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    let hex_str = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);

    if hex_str.len() % 2 != 0 {
        return Err(ToolError::InvalidInput(format!(
            "Invalid hex string length: {} (must be even)",
            hex_str.len()
        )));
    }

    Ok(hex::decode(hex_str)?)
}
