//! StageTrace: a complete sequence of stage events for one spin cycle
//!
//! A trace captures the full timeline of a cycle, from the accepted trigger
//! to the published reward (or the cancellation).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::StageEvent;
use crate::stage::{Stage, StageCategory};

/// A complete trace of stage events for one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    /// Unique identifier for this trace
    pub trace_id: String,

    /// Machine identifier (configuration name)
    pub machine_id: String,

    /// Cycle number within the session (1-based)
    #[serde(default)]
    pub cycle: u64,

    /// All events in chronological order
    pub events: Vec<StageEvent>,

    /// When this trace was opened
    pub recorded_at: DateTime<Utc>,
}

impl StageTrace {
    /// Create a new empty trace
    pub fn new(trace_id: impl Into<String>, machine_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            machine_id: machine_id.into(),
            cycle: 0,
            events: Vec::new(),
            recorded_at: Utc::now(),
        }
    }

    /// Set cycle number
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = cycle;
        self
    }

    /// Add an event to the trace
    pub fn push(&mut self, event: StageEvent) {
        self.events.push(event);
    }

    /// Get total duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        let first = self.events.first().map(|e| e.timestamp_ms).unwrap_or(0.0);
        let last = self.events.last().map(|e| e.timestamp_ms).unwrap_or(0.0);
        last - first
    }

    /// Get events by category
    pub fn events_by_category(&self, category: StageCategory) -> Vec<&StageEvent> {
        self.events
            .iter()
            .filter(|e| e.stage.category() == category)
            .collect()
    }

    /// Check if trace contains a specific stage type
    pub fn has_stage(&self, type_name: &str) -> bool {
        self.events.iter().any(|e| e.stage.type_name() == type_name)
    }

    /// Reel indices in the order they were started
    pub fn reel_start_order(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match e.stage {
                Stage::ReelSpinning { reel_index, .. } => Some(reel_index),
                _ => None,
            })
            .collect()
    }

    /// Reel indices in the order they were stopped
    pub fn reel_stop_order(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match e.stage {
                Stage::ReelStop { reel_index } => Some(reel_index),
                _ => None,
            })
            .collect()
    }

    /// Total reward published in this trace (0 if none)
    pub fn total_reward(&self) -> u64 {
        self.events
            .iter()
            .rev()
            .find_map(|e| match e.stage {
                Stage::WinPresent { total_reward, .. } => Some(total_reward),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Was the cycle cancelled?
    pub fn was_cancelled(&self) -> bool {
        self.has_stage("spin_cancelled")
    }

    /// Validate trace has the stages a completed cycle requires
    pub fn validate(&self, reel_count: usize) -> TraceValidation {
        let started = self.reel_start_order().len();
        let stopped = self.reel_stop_order().len();

        TraceValidation {
            has_spin_start: self.has_stage("spin_start"),
            has_spin_end: self.has_stage("spin_end"),
            reels_started: started,
            reels_stopped: stopped,
            has_all_reels: started == reel_count && stopped == reel_count,
            has_evaluation: self.has_stage("evaluate_wins"),
            cancelled: self.was_cancelled(),
        }
    }
}

/// Validation result for a trace
#[derive(Debug, Clone, Default)]
pub struct TraceValidation {
    pub has_spin_start: bool,
    pub has_spin_end: bool,
    pub reels_started: usize,
    pub reels_stopped: usize,
    pub has_all_reels: bool,
    pub has_evaluation: bool,
    pub cancelled: bool,
}

impl TraceValidation {
    /// Check if trace describes one complete cycle
    pub fn is_valid(&self) -> bool {
        self.has_spin_start && self.has_spin_end && self.has_all_reels && self.has_evaluation
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();

        if !self.has_spin_start {
            warnings.push("Missing SPIN_START event");
        }
        if !self.has_spin_end && !self.cancelled {
            warnings.push("Missing SPIN_END event");
        }
        if !self.has_all_reels {
            warnings.push("Not all reels were started and stopped");
        }
        if !self.has_evaluation && !self.cancelled {
            warnings.push("Grid was never evaluated");
        }

        warnings
    }
}
