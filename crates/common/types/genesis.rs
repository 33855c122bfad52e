use serde::{Deserialize, Serialize};

pub type BlockNumber = u64;

/// Blockchain settings defined per chain.
///
/// Activation fields hold the block number (or timestamp, for time-scheduled
/// forks) at which each fork turns on: `None` means the fork is never
/// scheduled, `Some(0)` that it is active from genesis.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Current chain identifier
    pub chain_id: u64,

    pub eip155_block: Option<u64>,
    pub berlin_block: Option<u64>,
    pub london_block: Option<u64>,

    /// Timestamp of the settlement-layer adjustment fork that, among other
    /// things, retires the system-transaction flag on deposits.
    pub regolith_time: Option<u64>,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Default, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Fork {
    #[default]
    Frontier,
    SpuriousDragon,
    Berlin,
    London,
    Regolith,
}

impl From<Fork> for &str {
    fn from(fork: Fork) -> Self {
        match fork {
            Fork::Frontier => "Frontier",
            Fork::SpuriousDragon => "SpuriousDragon",
            Fork::Berlin => "Berlin",
            Fork::London => "London",
            Fork::Regolith => "Regolith",
        }
    }
}

impl std::fmt::Display for Fork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &str = (*self).into();
        write!(f, "{name}")
    }
}

impl ChainConfig {
    pub fn is_eip155_activated(&self, block_number: BlockNumber) -> bool {
        self.eip155_block.is_some_and(|num| num <= block_number)
    }

    pub fn is_berlin_activated(&self, block_number: BlockNumber) -> bool {
        self.berlin_block.is_some_and(|num| num <= block_number)
    }

    pub fn is_london_activated(&self, block_number: BlockNumber) -> bool {
        self.london_block.is_some_and(|num| num <= block_number)
    }

    pub fn is_regolith_activated(&self, block_timestamp: u64) -> bool {
        self.regolith_time.is_some_and(|time| time <= block_timestamp)
    }

    // A transaction under construction has no block context yet, so format
    // acceptance is a chain-capability question: a fork scheduled anywhere on
    // the chain makes the matching transaction format constructible.

    pub fn is_access_list_scheduled(&self) -> bool {
        self.berlin_block.is_some()
    }

    pub fn is_fee_market_scheduled(&self) -> bool {
        self.london_block.is_some()
    }

    pub fn is_regolith_scheduled(&self) -> bool {
        self.regolith_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mainnet_like_config() -> ChainConfig {
        ChainConfig {
            chain_id: 1729,
            eip155_block: Some(0),
            berlin_block: Some(0),
            london_block: Some(0),
            regolith_time: None,
        }
    }

    #[test]
    fn fork_activation_by_block() {
        let config = ChainConfig {
            london_block: Some(100),
            ..mainnet_like_config()
        };
        assert!(!config.is_london_activated(99));
        assert!(config.is_london_activated(100));
        assert!(config.is_london_activated(101));
    }

    #[test]
    fn unscheduled_fork_never_activates() {
        let config = ChainConfig::default();
        assert!(!config.is_london_activated(u64::MAX));
        assert!(!config.is_fee_market_scheduled());
        assert!(!config.is_regolith_activated(u64::MAX));
    }

    #[test]
    fn scheduled_capability_queries() {
        let config = mainnet_like_config();
        assert!(config.is_access_list_scheduled());
        assert!(config.is_fee_market_scheduled());
        assert!(!config.is_regolith_scheduled());
    }

    #[test]
    fn deserialize_chain_config() {
        let json = r#"{
            "chainId": 1729,
            "eip155Block": 0,
            "berlinBlock": 0,
            "londonBlock": 10,
            "regolithTime": 1700000000
        }"#;
        let config: ChainConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.chain_id, 1729);
        assert_eq!(config.london_block, Some(10));
        assert!(config.is_regolith_scheduled());
    }
}
