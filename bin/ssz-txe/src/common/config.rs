use std::{fs, path::PathBuf};

use alloy_primitives::ChainId;
use clap::Args;
use ssz_tx::ChainConfig;
use tracing::debug;

use super::Result;

/// Chain configuration arguments.
#[derive(Debug, Clone, Default, Args)]
pub struct ChainArgs {
    /// Chain id. Overrides the chain id of the config file.
    #[arg(long = "chain-id", env = "SSZ_TXE_CHAIN_ID")]
    pub chain_id: Option<ChainId>,

    /// JSON chain configuration file, e.g. `{"chainId": 1}`.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

impl ChainArgs {
    /// Builds the chain configuration. Without a file, mainnet defaults apply.
    pub fn load(&self) -> Result<ChainConfig> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => ChainConfig::default(),
        };
        if let Some(chain_id) = self.chain_id {
            config.chain_id = chain_id;
        }
        debug!(chain_id = config.chain_id, "Loaded chain configuration");
        Ok(config)
    }
}
