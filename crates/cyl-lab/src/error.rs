//! Error types for configuration loading and grid evaluation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors, detected at load time and fatal to startup
#[derive(Error, Debug)]
pub enum ConfigError {
    /// JSON document could not be parsed
    #[error("JSON parse error: {0}")]
    Json(String),

    /// YAML document could not be parsed
    #[error("YAML parse error: {0}")]
    Yaml(String),

    /// Unsupported configuration file extension
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// IO error while reading a config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document exceeds a loader limit
    #[error("Too many {what}: {actual} (limit {limit})")]
    LimitExceeded {
        what: &'static str,
        limit: usize,
        actual: usize,
    },

    /// No reels configured
    #[error("Machine has no reels")]
    NoReels,

    /// Zero visible rows per reel
    #[error("Machine shows no rows")]
    NoVisibleRows,

    /// Symbol identifier appears twice in the symbol set
    #[error("Duplicate symbol: {0}")]
    DuplicateSymbol(String),

    /// Reel strip references a symbol the set does not define
    #[error("Reel {reel} references unknown symbol '{symbol}'")]
    UnknownReelSymbol { reel: usize, symbol: String },

    /// Reward table references a symbol the set does not define
    #[error("Reward table references unknown symbol '{0}'")]
    UnknownRewardSymbol(String),

    /// Match count of zero in the reward table
    #[error("Invalid match count {count} for symbol '{symbol}'")]
    InvalidMatchCount { symbol: String, count: u32 },

    /// Reel strip is empty
    #[error("Reel {0} has an empty strip")]
    EmptyStrip(usize),

    /// More visible rows than symbols on a strip
    #[error("Reel {reel} shows {rows} rows but only holds {len} symbols")]
    RowsExceedStrip { reel: usize, rows: usize, len: usize },

    /// Pattern without indices
    #[error("Pattern '{0}' has no indices")]
    EmptyPattern(String),

    /// Pattern index outside the grid
    #[error("Pattern '{pattern}' index {index} is outside the {grid_len}-cell grid")]
    PatternIndexOutOfRange {
        pattern: String,
        index: usize,
        grid_len: usize,
    },

    /// Timing range or value is unusable
    #[error("Invalid timing for {name}: {reason}")]
    InvalidTiming { name: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Anomalies met while evaluating a grid; recovered locally, never returned as `Err`
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationAnomaly {
    /// Grid snapshot holds no cells
    #[error("Grid snapshot is empty")]
    EmptyGrid,

    /// Pattern has no indices
    #[error("Pattern '{pattern}' has no indices")]
    EmptyPattern { pattern: String },

    /// Pattern index outside the snapshot
    #[error("Pattern '{pattern}' index {index} is outside the {grid_len}-cell grid")]
    IndexOutOfRange {
        pattern: String,
        index: usize,
        grid_len: usize,
    },
}

impl EvaluationAnomaly {
    /// Name of the offending pattern, if the anomaly is pattern-specific
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Self::EmptyGrid => None,
            Self::EmptyPattern { pattern } | Self::IndexOutOfRange { pattern, .. } => {
                Some(pattern)
            }
        }
    }
}
