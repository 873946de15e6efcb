//! StageEvent: a stage occurrence with metadata
//!
//! Wraps a Stage with its cycle-relative timestamp and routing tags.

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// A stage event with full metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// The canonical stage
    pub stage: Stage,

    /// Timestamp in milliseconds from the start of the cycle
    pub timestamp_ms: f64,

    /// Custom tags for filtering/routing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl StageEvent {
    /// Create a new stage event
    pub fn new(stage: Stage, timestamp_ms: f64) -> Self {
        Self {
            stage,
            timestamp_ms,
            tags: Vec::new(),
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Get stage type name
    pub fn type_name(&self) -> &'static str {
        self.stage.type_name()
    }
}
