//! Pattern evaluation engine
//!
//! Scores one grid snapshot against every configured pattern:
//!
//! 1. Wild patterns run first, in configured order. A matching wild pattern
//!    highlights its cells even when it pays nothing.
//! 2. Linear patterns run next. A linear pattern sharing any cell with an
//!    already rewarded pattern is skipped entirely.
//! 3. Every rewarded pattern adds its reward to the total and claims all of
//!    its cells.
//!
//! The engine keeps no state between evaluations. Malformed input never
//! fails the evaluation: the pattern scores 0 and the anomaly goes to the
//! injected [`DiagnosticSink`].

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collaborators::DiagnosticSink;
use crate::error::EvaluationAnomaly;
use crate::grid::GridSnapshot;
use crate::paytable::RewardTable;
use crate::pattern::{
    PartialRunHighlight, PatternDef, PatternTier, evaluate_pattern, reference_linear_patterns,
    reference_wild_patterns,
};

// ═══════════════════════════════════════════════════════════════════════════
// RESULT TYPES
// ═══════════════════════════════════════════════════════════════════════════

/// Why a pattern did not contribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Shares a cell with a pattern rewarded earlier this evaluation
    Claimed,
    /// Input was malformed
    Anomaly,
}

/// Outcome of one pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternOutcome {
    pub name: String,
    pub tier: PatternTier,
    pub reward: u64,
    pub matched: BTreeSet<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
}

impl PatternOutcome {
    fn skipped(pattern: &PatternDef, reason: SkipReason) -> Self {
        Self {
            name: pattern.name.clone(),
            tier: pattern.tier,
            reward: 0,
            matched: BTreeSet::new(),
            skipped: Some(reason),
        }
    }
}

/// Aggregate result of one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Sum over all rewarded patterns
    pub total_reward: u64,
    /// Cells to highlight
    pub highlights: BTreeSet<usize>,
    /// Per pattern, wild patterns first
    pub outcomes: Vec<PatternOutcome>,
    /// Anomalies met (also reported to the diagnostic sink)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<EvaluationAnomaly>,
    /// Number of cells in the evaluated grid
    pub grid_len: usize,
}

impl EvaluationResult {
    pub fn is_win(&self) -> bool {
        self.total_reward > 0
    }

    /// Per-cell activation mask for the evaluated grid
    pub fn mask(&self) -> HighlightMask {
        HighlightMask::from_indices(self.grid_len, &self.highlights)
    }

    /// Outcomes of patterns that paid
    pub fn winning_outcomes(&self) -> impl Iterator<Item = &PatternOutcome> {
        self.outcomes.iter().filter(|o| o.reward > 0)
    }

    /// Outcome of a pattern by name
    pub fn outcome(&self, name: &str) -> Option<&PatternOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

/// One flag per grid cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightMask {
    cells: Vec<bool>,
}

impl HighlightMask {
    /// All cells off
    pub fn cleared(len: usize) -> Self {
        Self {
            cells: vec![false; len],
        }
    }

    /// Cells in `indices` on, every other cell off
    pub fn from_indices(len: usize, indices: &BTreeSet<usize>) -> Self {
        let mut mask = Self::cleared(len);
        for &i in indices {
            if let Some(cell) = mask.cells.get_mut(i) {
                *cell = true;
            }
        }
        mask
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.cells.get(index).copied().unwrap_or(false)
    }

    pub fn active_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| on.then_some(i))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|&&on| on).count()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════

/// Scores grid snapshots against wild then linear patterns
#[derive(Debug, Clone)]
pub struct PatternEngine {
    table: Arc<RewardTable>,
    wild: Vec<PatternDef>,
    linear: Vec<PatternDef>,
    partial: PartialRunHighlight,
}

impl PatternEngine {
    /// Create an engine; patterns keep their configured order within each tier
    pub fn new(table: Arc<RewardTable>, patterns: impl IntoIterator<Item = PatternDef>) -> Self {
        let (wild, linear): (Vec<PatternDef>, Vec<PatternDef>) = patterns
            .into_iter()
            .partition(|p| p.tier == PatternTier::Wild);
        Self {
            table,
            wild,
            linear,
            partial: PartialRunHighlight::default(),
        }
    }

    /// Engine for the reference machine
    pub fn reference() -> Self {
        Self::new(
            Arc::new(RewardTable::reference()),
            reference_wild_patterns()
                .into_iter()
                .chain(reference_linear_patterns()),
        )
    }

    /// Set partial run highlight policy
    pub fn with_partial_run_highlight(mut self, partial: PartialRunHighlight) -> Self {
        self.partial = partial;
        self
    }

    pub fn table(&self) -> &Arc<RewardTable> {
        &self.table
    }

    pub fn wild_patterns(&self) -> &[PatternDef] {
        &self.wild
    }

    pub fn linear_patterns(&self) -> &[PatternDef] {
        &self.linear
    }

    /// Evaluate one grid snapshot
    pub fn evaluate(&self, grid: &GridSnapshot, sink: &dyn DiagnosticSink) -> EvaluationResult {
        let mut result = EvaluationResult {
            grid_len: grid.len(),
            ..Default::default()
        };

        if grid.is_empty() {
            let anomaly = EvaluationAnomaly::EmptyGrid;
            sink.report(&anomaly);
            result.anomalies.push(anomaly);
            return result;
        }

        let mut rewarded: BTreeSet<usize> = BTreeSet::new();

        for pattern in &self.wild {
            self.score(pattern, grid, sink, &mut rewarded, &mut result);
        }

        for pattern in &self.linear {
            if pattern.indices.iter().any(|i| rewarded.contains(i)) {
                result
                    .outcomes
                    .push(PatternOutcome::skipped(pattern, SkipReason::Claimed));
                continue;
            }
            self.score(pattern, grid, sink, &mut rewarded, &mut result);
        }

        result
    }

    fn score(
        &self,
        pattern: &PatternDef,
        grid: &GridSnapshot,
        sink: &dyn DiagnosticSink,
        rewarded: &mut BTreeSet<usize>,
        result: &mut EvaluationResult,
    ) {
        match evaluate_pattern(pattern, grid, &self.table, self.partial) {
            Ok(m) => {
                result.highlights.extend(m.matched.iter().copied());
                if m.is_paid() {
                    result.total_reward = result.total_reward.saturating_add(m.reward);
                    rewarded.extend(pattern.indices.iter().copied());
                    result.highlights.extend(pattern.indices.iter().copied());
                }
                result.outcomes.push(PatternOutcome {
                    name: pattern.name.clone(),
                    tier: pattern.tier,
                    reward: m.reward,
                    matched: m.matched,
                    skipped: None,
                });
            }
            Err(anomaly) => {
                sink.report(&anomaly);
                result.anomalies.push(anomaly);
                result
                    .outcomes
                    .push(PatternOutcome::skipped(pattern, SkipReason::Anomaly));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::RecordingDiagnostics;

    fn set(indices: &[usize]) -> BTreeSet<usize> {
        indices.iter().copied().collect()
    }

    fn cherry_table() -> Arc<RewardTable> {
        Arc::new(RewardTable::new().with_symbol("Cherry", [(2, 1), (3, 2)]))
    }

    #[test]
    fn test_cherry_scenarios() {
        let engine = PatternEngine::new(cherry_table(), [PatternDef::linear("row", vec![0, 1, 2])]);
        let sink = RecordingDiagnostics::new();

        let full = engine.evaluate(&GridSnapshot::from_symbols(["Cherry"; 3]), &sink);
        assert_eq!(full.total_reward, 2);
        assert_eq!(full.highlights, set(&[0, 1, 2]));

        let partial = engine.evaluate(
            &GridSnapshot::from_symbols(["Cherry", "Cherry", "Plum"]),
            &sink,
        );
        assert_eq!(partial.total_reward, 1);
        assert_eq!(partial.outcome("row").map(|o| o.matched.clone()), Some(set(&[0, 1])));
        // The whole pattern is claimed once it pays
        assert_eq!(partial.highlights, set(&[0, 1, 2]));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_total_reward_saturates() {
        let table = Arc::new(RewardTable::new().with_symbol("Bell", [(3, u64::MAX)]));
        let engine = PatternEngine::new(
            table,
            [
                PatternDef::wild("left", vec![0, 1, 2]),
                PatternDef::wild("right", vec![3, 4, 5]),
            ],
        );
        let sink = RecordingDiagnostics::new();

        let result = engine.evaluate(&GridSnapshot::from_symbols(["Bell"; 6]), &sink);
        assert_eq!(result.total_reward, u64::MAX);
        assert_eq!(result.winning_outcomes().count(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unpaid_wild_still_highlights() {
        let table = Arc::new(RewardTable::new().with_symbol("Bell", [(3, 50)]));
        let engine = PatternEngine::new(table, [PatternDef::wild("all", vec![0, 1, 2, 3, 4])]);
        let grid = GridSnapshot::from_symbols(["Bell"; 5]);

        let result = engine.evaluate(&grid, &RecordingDiagnostics::new());
        assert_eq!(result.total_reward, 0);
        assert!(!result.is_win());
        assert_eq!(result.highlights, set(&[0, 1, 2, 3, 4]));
        assert_eq!(result.mask().active_count(), 5);
    }

    #[test]
    fn test_wild_priority_and_exclusion() {
        let table = Arc::new(RewardTable::new().with_symbol("Plum", [(3, 10), (5, 40)]));
        let engine = PatternEngine::new(
            table,
            [
                // Linear listed first, still evaluated after the wild pattern
                PatternDef::linear("row", vec![0, 1, 2]),
                PatternDef::wild("diag", vec![2, 3, 4]),
                PatternDef::linear("tail", vec![5, 6, 7]),
            ],
        );
        let grid = GridSnapshot::from_symbols(["Plum"; 8]);

        let result = engine.evaluate(&grid, &RecordingDiagnostics::new());
        // diag (10) + tail (10); row overlaps diag on cell 2
        assert_eq!(result.total_reward, 20);
        assert_eq!(result.outcomes[0].name, "diag");
        assert_eq!(
            result.outcome("row").and_then(|o| o.skipped),
            Some(SkipReason::Claimed)
        );
        assert_eq!(result.winning_outcomes().count(), 2);
        assert_eq!(result.highlights, set(&[2, 3, 4, 5, 6, 7]));
    }

    #[test]
    fn test_unpaid_wild_does_not_claim() {
        let table = Arc::new(RewardTable::new().with_symbol("Lemon", [(2, 2)]));
        let engine = PatternEngine::new(
            table,
            [
                PatternDef::wild("triple", vec![0, 1, 2]),
                PatternDef::linear("pair", vec![0, 1]),
            ],
        );
        let result = engine.evaluate(&GridSnapshot::from_symbols(["Lemon"; 3]), &RecordingDiagnostics::new());
        assert_eq!(result.total_reward, 2);
        assert_eq!(result.outcome("pair").and_then(|o| o.skipped), None);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let engine = PatternEngine::reference();
        let grid = GridSnapshot::from_symbols([
            "Bell", "Bell", "Lemon", "Bell", "Bell", "Plum", "Bell", "Orange", "Bell", "Bell",
            "Cherry", "Lemon", "Bell", "Grapes", "Lemon",
        ]);
        let sink = RecordingDiagnostics::new();
        let first = engine.evaluate(&grid, &sink);
        let second = engine.evaluate(&grid, &sink);
        assert_eq!(first, second);
        assert_eq!(first.mask(), second.mask());
    }

    #[test]
    fn test_reference_grid() {
        let engine = PatternEngine::reference();
        // Top row all Bell, no shape matches
        let grid = GridSnapshot::from_symbols([
            "Bell", "Plum", "Lemon", "Bell", "Bell", "Plum", "Bell", "Orange", "Lemon", "Bell",
            "Cherry", "Lemon", "Bell", "Grapes", "Orange",
        ]);
        let result = engine.evaluate(&grid, &RecordingDiagnostics::new());
        assert_eq!(result.total_reward, 100);
        assert_eq!(result.highlights, set(&[0, 3, 6, 9, 12]));
        let mask = result.mask();
        assert_eq!(mask.len(), 15);
        assert!(mask.is_active(12));
        assert!(!mask.is_active(1));
    }

    #[test]
    fn test_anomalies_are_reported_not_raised() {
        let engine = PatternEngine::new(
            cherry_table(),
            [
                PatternDef::linear("broken", vec![0, 9]),
                PatternDef::linear("row", vec![0, 1, 2]),
            ],
        );
        let sink = RecordingDiagnostics::new();
        let result = engine.evaluate(&GridSnapshot::from_symbols(["Cherry"; 3]), &sink);
        assert_eq!(result.total_reward, 2);
        assert_eq!(
            result.outcome("broken").and_then(|o| o.skipped),
            Some(SkipReason::Anomaly)
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(result.anomalies, sink.anomalies());

        let empty = engine.evaluate(&GridSnapshot::new(), &sink);
        assert_eq!(empty.total_reward, 0);
        assert!(empty.mask().is_empty());
        assert_eq!(sink.anomalies().last(), Some(&EvaluationAnomaly::EmptyGrid));
    }

    #[test]
    fn test_mask_clears_other_cells() {
        let mask = HighlightMask::from_indices(4, &set(&[1, 3, 9]));
        assert_eq!(mask.cells(), &[false, true, false, true]);
        assert_eq!(mask.active_indices(), vec![1, 3]);
        assert_eq!(HighlightMask::cleared(3).active_count(), 0);
    }
}
