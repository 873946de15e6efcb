//! Reward table: symbol identifier → match count → reward

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::symbols::{SymbolId, SymbolSet};

/// Rewards for one symbol, keyed by match count
pub type RewardSteps = BTreeMap<u32, u64>;

/// Static reward lookup, built once at load and shared read-only during play
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardTable {
    entries: BTreeMap<SymbolId, RewardSteps>,
}

impl RewardTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the reward steps of a symbol
    pub fn with_symbol<I>(mut self, id: impl Into<SymbolId>, steps: I) -> Self
    where
        I: IntoIterator<Item = (u32, u64)>,
    {
        self.entries.insert(id.into(), steps.into_iter().collect());
        self
    }

    /// Reward table of the reference machine
    pub fn reference() -> Self {
        Self::new()
            .with_symbol("Bell", [(5, 100), (4, 75), (3, 50), (2, 25)])
            .with_symbol("Plum", [(5, 40), (4, 20), (3, 10), (2, 5)])
            .with_symbol("Cherry", [(5, 10), (4, 5), (3, 2), (2, 1)])
            .with_symbol("Watermelon", [(5, 60), (4, 30), (3, 20), (2, 10)])
            .with_symbol("Orange", [(5, 30), (4, 15), (3, 10), (2, 5)])
            .with_symbol("Grapes", [(5, 50), (4, 20), (3, 10), (2, 5)])
            .with_symbol("Lemon", [(5, 20), (4, 10), (3, 5), (2, 2)])
    }

    /// Reward for `count` matching symbols; 0 when the symbol or count is undefined
    pub fn reward(&self, id: &SymbolId, count: u32) -> u64 {
        self.lookup(id, count).unwrap_or(0)
    }

    /// Reward for `count` matching symbols, `None` when the table has no entry
    pub fn lookup(&self, id: &SymbolId, count: u32) -> Option<u64> {
        self.entries.get(id).and_then(|steps| steps.get(&count)).copied()
    }

    /// Highest reward any entry pays
    pub fn max_reward(&self) -> u64 {
        self.entries
            .values()
            .flat_map(|steps| steps.values())
            .copied()
            .max()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every entry against the symbol set
    pub fn validate(&self, symbols: &SymbolSet) -> ConfigResult<()> {
        for (id, steps) in &self.entries {
            if !symbols.contains(id.as_str()) {
                return Err(ConfigError::UnknownRewardSymbol(id.to_string()));
            }
            if steps.contains_key(&0) {
                return Err(ConfigError::InvalidMatchCount {
                    symbol: id.to_string(),
                    count: 0,
                });
            }
        }
        Ok(())
    }
}
