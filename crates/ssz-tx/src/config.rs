//! Chain configuration.

use alloy_primitives::ChainId;
use serde::{Deserialize, Serialize};

use crate::constants::wire::DEFAULT_MAX_UNCOMPRESSED_MESSAGE_SIZE;

/// Parameters that differ between networks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Chain id mixed into signature domains and checked against legacy transactions.
    pub chain_id: ChainId,
    /// Ceiling on the uncompressed size of a gossiped message.
    #[serde(default = "default_max_uncompressed_message_size")]
    pub max_uncompressed_message_size: usize,
}

const fn default_max_uncompressed_message_size() -> usize {
    DEFAULT_MAX_UNCOMPRESSED_MESSAGE_SIZE
}

impl ChainConfig {
    /// Configuration for `chain_id` with default limits.
    pub const fn new(chain_id: ChainId) -> Self {
        Self { chain_id, max_uncompressed_message_size: DEFAULT_MAX_UNCOMPRESSED_MESSAGE_SIZE }
    }

    /// Ethereum mainnet.
    pub const fn mainnet() -> Self {
        Self::new(1)
    }

    /// Sets the message size ceiling.
    pub const fn with_max_uncompressed_message_size(mut self, size: usize) -> Self {
        self.max_uncompressed_message_size = size;
        self
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ChainConfig = serde_json::from_str(r#"{"chainId": 17000}"#).unwrap();
        assert_eq!(config, ChainConfig::new(17000));
        assert_eq!(config.max_uncompressed_message_size, DEFAULT_MAX_UNCOMPRESSED_MESSAGE_SIZE);

        let config: ChainConfig =
            serde_json::from_str(r#"{"chainId": 1, "maxUncompressedMessageSize": 1024}"#).unwrap();
        assert_eq!(config, ChainConfig::mainnet().with_max_uncompressed_message_size(1024));
    }
}
