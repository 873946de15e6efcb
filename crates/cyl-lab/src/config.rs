//! Machine configuration

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::pattern::{
    PartialRunHighlight, PatternDef, reference_linear_patterns, reference_wild_patterns,
};
use crate::paytable::RewardTable;
use crate::symbols::{SymbolId, SymbolSet};
use crate::timing::{TimingConfig, TimingProfile};

fn default_radius() -> f64 {
    3.0
}

fn default_rows() -> usize {
    3
}

fn default_name() -> String {
    "machine".to_string()
}

/// One reel strip and its cylinder geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelSpec {
    /// Symbol identifiers around the cylinder
    pub symbols: Vec<SymbolId>,
    /// Cylinder radius
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Angle of cell 0 at zero rotation (degrees)
    #[serde(default)]
    pub angle_offset: f64,
}

impl ReelSpec {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SymbolId>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
            radius: default_radius(),
            angle_offset: 0.0,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_angle_offset(mut self, degrees: f64) -> Self {
        self.angle_offset = degrees;
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// What happens to a spin request that arrives mid-cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetriggerPolicy {
    /// Drop it
    #[default]
    Ignore,
    /// Keep one pending request and start it as soon as the machine is at rest
    Queue,
}

/// Complete machine configuration, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Machine name (used as trace machine id)
    #[serde(default = "default_name")]
    pub name: String,

    /// Visible rows per reel
    #[serde(default = "default_rows")]
    pub visible_rows: usize,

    /// Unique symbols
    pub symbols: SymbolSet,

    /// Symbol → match count → reward, shared with the pattern engine
    pub rewards: Arc<RewardTable>,

    /// Reel strips in start/stop order
    pub reels: Vec<ReelSpec>,

    /// Patterns (wild and linear, configured order kept within each tier)
    pub patterns: Vec<PatternDef>,

    /// Timing
    #[serde(default)]
    pub timing: TimingConfig,

    /// Highlight of linear runs with no reward entry
    #[serde(default)]
    pub partial_run_highlight: PartialRunHighlight,

    /// Mid-cycle spin requests
    #[serde(default)]
    pub retrigger: RetriggerPolicy,

    /// RNG seed (None = seeded from the OS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl MachineConfig {
    /// Reference machine: 7 fruits, 5 reels × 3 rows, 3 row and 6 shape patterns
    pub fn reference() -> Self {
        Self {
            name: "reference".to_string(),
            visible_rows: 3,
            symbols: SymbolSet::reference(),
            rewards: Arc::new(RewardTable::reference()),
            reels: vec![
                ReelSpec::new([
                    "Bell", "Plum", "Cherry", "Watermelon", "Orange", "Grapes", "Lemon", "Cherry",
                ]),
                ReelSpec::new([
                    "Cherry", "Lemon", "Bell", "Orange", "Plum", "Grapes", "Watermelon", "Lemon",
                ]),
                ReelSpec::new([
                    "Grapes", "Cherry", "Orange", "Bell", "Lemon", "Plum", "Cherry", "Watermelon",
                ]),
                ReelSpec::new([
                    "Orange", "Watermelon", "Lemon", "Cherry", "Grapes", "Bell", "Plum", "Orange",
                ]),
                ReelSpec::new([
                    "Lemon", "Grapes", "Plum", "Cherry", "Bell", "Watermelon", "Orange", "Cherry",
                ]),
            ],
            patterns: reference_wild_patterns()
                .into_iter()
                .chain(reference_linear_patterns())
                .collect(),
            timing: TimingConfig::normal(),
            partial_run_highlight: PartialRunHighlight::Discard,
            retrigger: RetriggerPolicy::Ignore,
            seed: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Replace timing with a profile preset
    pub fn with_profile(mut self, profile: TimingProfile) -> Self {
        self.timing = TimingConfig::from_profile(profile);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_retrigger(mut self, policy: RetriggerPolicy) -> Self {
        self.retrigger = policy;
        self
    }

    pub fn with_partial_run_highlight(mut self, policy: PartialRunHighlight) -> Self {
        self.partial_run_highlight = policy;
        self
    }

    /// Number of cells in a grid snapshot
    pub fn grid_len(&self) -> usize {
        self.reels.len() * self.visible_rows
    }

    /// Check every cross reference; an invalid machine never spins
    pub fn validate(&self) -> ConfigResult<()> {
        if self.reels.is_empty() {
            return Err(ConfigError::NoReels);
        }
        if self.visible_rows == 0 {
            return Err(ConfigError::NoVisibleRows);
        }

        self.symbols.validate()?;
        self.rewards.validate(&self.symbols)?;

        for (index, reel) in self.reels.iter().enumerate() {
            if reel.is_empty() {
                return Err(ConfigError::EmptyStrip(index));
            }
            if let Some(unknown) = reel
                .symbols
                .iter()
                .find(|id| !self.symbols.contains(id.as_str()))
            {
                return Err(ConfigError::UnknownReelSymbol {
                    reel: index,
                    symbol: unknown.to_string(),
                });
            }
            if reel.len() < self.visible_rows {
                return Err(ConfigError::RowsExceedStrip {
                    reel: index,
                    rows: self.visible_rows,
                    len: reel.len(),
                });
            }
        }

        let grid_len = self.grid_len();
        for pattern in &self.patterns {
            pattern.validate(grid_len)?;
        }

        self.timing.validate()
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_machine() {
        let config = MachineConfig::reference();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid_len(), 15);
        assert_eq!(config.patterns.len(), 9);
        assert_eq!(config.timing.delay_between_reels, 0.5);
        assert_eq!(config.retrigger, RetriggerPolicy::Ignore);
    }

    #[test]
    fn test_invalid_machines() {
        let mut config = MachineConfig::reference();
        config.reels.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoReels)));

        let mut config = MachineConfig::reference();
        config.visible_rows = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoVisibleRows)));

        let mut config = MachineConfig::reference();
        config.reels[3].symbols.push(SymbolId::new("Seven"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownReelSymbol { reel: 3, .. })
        ));

        let mut config = MachineConfig::reference();
        config.reels[1] = ReelSpec::new(["Bell", "Plum"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RowsExceedStrip { reel: 1, rows: 3, len: 2 })
        ));

        let mut config = MachineConfig::reference();
        config.reels[0] = ReelSpec::new(Vec::<SymbolId>::new());
        assert!(matches!(config.validate(), Err(ConfigError::EmptyStrip(0))));

        // Four reels leave the last column of every pattern outside the grid
        let mut config = MachineConfig::reference();
        config.reels.pop();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PatternIndexOutOfRange { grid_len: 12, .. })
        ));
    }

    #[test]
    fn test_builders() {
        let config = MachineConfig::reference()
            .with_name("fruit")
            .with_profile(TimingProfile::Instant)
            .with_seed(42)
            .with_retrigger(RetriggerPolicy::Queue);
        assert_eq!(config.name, "fruit");
        assert_eq!(config.timing.profile, TimingProfile::Instant);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.retrigger, RetriggerPolicy::Queue);
        assert!(config.validate().is_ok());
    }
}
