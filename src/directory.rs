use crate::config::{MarketEntry, NetworkConfig};
use crate::state::MarketDuration;

/// One canonical market for a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMarket {
    pub pubkey: String,
    pub duration: MarketDuration,
}

/// Source of the valid market accounts for a network and pair.
pub trait MarketDirectory {
    fn market_pubkeys(&self, network: &NetworkConfig, pair: &str) -> Vec<CanonicalMarket>;
}

/// Directory backed by the `[[markets]]` entries of the config file.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entries: Vec<MarketEntry>,
}

impl StaticDirectory {
    pub fn new(entries: Vec<MarketEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MarketDirectory for StaticDirectory {
    fn market_pubkeys(&self, network: &NetworkConfig, pair: &str) -> Vec<CanonicalMarket> {
        self.entries
            .iter()
            .filter(|e| e.network == network.name && e.pair == pair)
            .map(|e| CanonicalMarket {
                pubkey: e.pubkey.clone(),
                duration: e.duration,
            })
            .collect()
    }
}
