//! Stage: the core enum defining all canonical spin cycle phases
//!
//! A Stage is NOT an animation, NOT a frame callback.
//! A Stage is the SEMANTIC MEANING of a moment in the spin cycle.

use serde::{Deserialize, Serialize};

/// Canonical cycle stage
///
/// Every cycle the sequencer runs maps onto these stages. Presentation
/// collaborators and traces respond to stages, never to raw sequencer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    // ═══════════════════════════════════════════════════════════════════════
    // SPIN LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Spin accepted, cycle initiated
    SpinStart {
        /// Rotation speed used by every reel this cycle (deg/s)
        spin_speed: f64,
    },

    /// Reel was told to start spinning
    ReelSpinning {
        /// Which reel (0-indexed)
        reel_index: usize,
        /// Visual spin duration handed to the reel (seconds)
        #[serde(default)]
        spin_duration: f64,
    },

    /// All reels spinning, hold phase started
    HoldStart {
        /// Rolled hold duration (seconds)
        duration: f64,
    },

    /// Reel was told to stop and snap to a symbol boundary
    ReelStop {
        /// Which reel (0-indexed)
        reel_index: usize,
    },

    /// Last reel told to stop, input may be re-enabled
    SpinFinished,

    /// Grid snapshot assembled from every settled reel
    GridCollected {
        /// Symbol identifiers in grid order
        #[serde(default)]
        symbols: Vec<String>,
    },

    /// Snapshot handed to the pattern engine
    EvaluateWins,

    /// Cycle complete, machine at rest
    SpinEnd,

    /// Cycle aborted, reels forced to settle, snapshot discarded
    SpinCancelled,

    // ═══════════════════════════════════════════════════════════════════════
    // WIN LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════
    /// A single pattern paid out
    PatternWin {
        /// Pattern display name
        pattern: String,
        /// Pattern tier ("wild" or "linear")
        tier: String,
        /// Credits awarded by this pattern
        reward: u64,
        /// Grid indices claimed by this pattern
        #[serde(default)]
        indices: Vec<usize>,
    },

    /// Total reward published to presentation
    WinPresent {
        /// Sum over all winning patterns
        total_reward: u64,
        /// Number of highlighted cells
        #[serde(default)]
        highlighted: usize,
    },

    /// Evaluation finished without reward
    NoWin {
        /// Number of highlighted cells (wild matches highlight without paying)
        #[serde(default)]
        highlighted: usize,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // INPUT
    // ═══════════════════════════════════════════════════════════════════════
    /// Spin request arrived mid-cycle and was dropped
    TriggerIgnored,

    /// Spin request arrived mid-cycle and was queued for the next rest
    TriggerQueued,

    // ═══════════════════════════════════════════════════════════════════════
    // DIAGNOSTICS
    // ═══════════════════════════════════════════════════════════════════════
    /// Evaluation hit malformed input and recovered
    EvaluationAnomaly {
        /// Pattern that was skipped (if any)
        #[serde(default)]
        pattern: Option<String>,
        /// Human readable description
        detail: String,
    },
}

impl Stage {
    /// Get the stage category for grouping
    pub fn category(&self) -> StageCategory {
        match self {
            Stage::SpinStart { .. }
            | Stage::ReelSpinning { .. }
            | Stage::HoldStart { .. }
            | Stage::ReelStop { .. }
            | Stage::SpinFinished
            | Stage::GridCollected { .. }
            | Stage::EvaluateWins
            | Stage::SpinEnd
            | Stage::SpinCancelled => StageCategory::SpinLifecycle,

            Stage::PatternWin { .. } | Stage::WinPresent { .. } | Stage::NoWin { .. } => {
                StageCategory::WinLifecycle
            }

            Stage::TriggerIgnored | Stage::TriggerQueued => StageCategory::Input,

            Stage::EvaluationAnomaly { .. } => StageCategory::Diagnostics,
        }
    }

    /// Get a simple string name for this stage type
    pub fn type_name(&self) -> &'static str {
        match self {
            Stage::SpinStart { .. } => "spin_start",
            Stage::ReelSpinning { .. } => "reel_spinning",
            Stage::HoldStart { .. } => "hold_start",
            Stage::ReelStop { .. } => "reel_stop",
            Stage::SpinFinished => "spin_finished",
            Stage::GridCollected { .. } => "grid_collected",
            Stage::EvaluateWins => "evaluate_wins",
            Stage::SpinEnd => "spin_end",
            Stage::SpinCancelled => "spin_cancelled",
            Stage::PatternWin { .. } => "pattern_win",
            Stage::WinPresent { .. } => "win_present",
            Stage::NoWin { .. } => "no_win",
            Stage::TriggerIgnored => "trigger_ignored",
            Stage::TriggerQueued => "trigger_queued",
            Stage::EvaluationAnomaly { .. } => "evaluation_anomaly",
        }
    }
}

/// Stage category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageCategory {
    SpinLifecycle,
    WinLifecycle,
    Input,
    Diagnostics,
}

impl StageCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SpinLifecycle => "Spin Lifecycle",
            Self::WinLifecycle => "Win Lifecycle",
            Self::Input => "Input",
            Self::Diagnostics => "Diagnostics",
        }
    }
}

impl std::str::FromStr for StageCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "spin_lifecycle" | "spin" => Ok(Self::SpinLifecycle),
            "win_lifecycle" | "win" => Ok(Self::WinLifecycle),
            "input" => Ok(Self::Input),
            "diagnostics" => Ok(Self::Diagnostics),
            other => Err(format!("unknown stage category '{}'", other)),
        }
    }
}
