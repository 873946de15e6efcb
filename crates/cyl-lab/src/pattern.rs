//! Pattern definitions and the per-pattern evaluator
//!
//! A pattern is an ordered list of grid indices with a tier tag:
//! - `Linear`: pays the contiguous run of equal symbols starting at position 0
//! - `Wild`: pays only when every index shows the same symbol, and highlights
//!   the full pattern whenever it matches, paid or not

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, EvaluationAnomaly};
use crate::grid::GridSnapshot;
use crate::paytable::RewardTable;

/// Pattern tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTier {
    /// Contiguous prefix run
    Linear,
    /// Every index must match
    Wild,
}

impl PatternTier {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Wild => "wild",
        }
    }
}

/// Highlight behavior of a linear run whose length has no reward entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialRunHighlight {
    /// Nothing is highlighted
    #[default]
    Discard,
    /// The run after position 0 stays highlighted
    Keep,
}

/// A named pattern over grid indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDef {
    pub name: String,
    pub tier: PatternTier,
    pub indices: Vec<usize>,
}

impl PatternDef {
    pub fn new(name: impl Into<String>, tier: PatternTier, indices: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            tier,
            indices,
        }
    }

    pub fn linear(name: impl Into<String>, indices: Vec<usize>) -> Self {
        Self::new(name, PatternTier::Linear, indices)
    }

    pub fn wild(name: impl Into<String>, indices: Vec<usize>) -> Self {
        Self::new(name, PatternTier::Wild, indices)
    }

    /// Check the pattern fits a grid of `grid_len` cells
    pub fn validate(&self, grid_len: usize) -> ConfigResult<()> {
        if self.indices.is_empty() {
            return Err(ConfigError::EmptyPattern(self.name.clone()));
        }
        if let Some(&index) = self.indices.iter().find(|&&i| i >= grid_len) {
            return Err(ConfigError::PatternIndexOutOfRange {
                pattern: self.name.clone(),
                index,
                grid_len,
            });
        }
        Ok(())
    }

    /// Evaluate this pattern against a grid
    pub fn evaluate(
        &self,
        grid: &GridSnapshot,
        table: &RewardTable,
        partial: PartialRunHighlight,
    ) -> Result<PatternMatch, EvaluationAnomaly> {
        evaluate_pattern(self, grid, table, partial)
    }
}

/// Reward and matched indices of one pattern
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub reward: u64,
    pub matched: BTreeSet<usize>,
}

impl PatternMatch {
    /// No reward, nothing matched
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_paid(&self) -> bool {
        self.reward > 0
    }
}

/// Evaluate a pattern of either tier against a grid snapshot
///
/// Malformed input (empty grid, empty pattern, index outside the grid) is
/// returned as an anomaly; the caller scores the pattern 0 with nothing matched.
pub fn evaluate_pattern(
    pattern: &PatternDef,
    grid: &GridSnapshot,
    table: &RewardTable,
    partial: PartialRunHighlight,
) -> Result<PatternMatch, EvaluationAnomaly> {
    if grid.is_empty() {
        return Err(EvaluationAnomaly::EmptyGrid);
    }
    if pattern.indices.is_empty() {
        return Err(EvaluationAnomaly::EmptyPattern {
            pattern: pattern.name.clone(),
        });
    }
    if let Some(&index) = pattern.indices.iter().find(|&&i| i >= grid.len()) {
        return Err(EvaluationAnomaly::IndexOutOfRange {
            pattern: pattern.name.clone(),
            index,
            grid_len: grid.len(),
        });
    }

    let symbols: Vec<_> = pattern
        .indices
        .iter()
        .filter_map(|&i| grid.symbol(i))
        .collect();
    let Some(&first) = symbols.first() else {
        return Ok(PatternMatch::none());
    };

    match pattern.tier {
        PatternTier::Linear => {
            let run = symbols.iter().take_while(|&&s| s == first).count();
            match table.lookup(first, run as u32) {
                Some(reward) => Ok(PatternMatch {
                    reward,
                    matched: pattern.indices[..run].iter().copied().collect(),
                }),
                None => {
                    let matched = match partial {
                        PartialRunHighlight::Discard => BTreeSet::new(),
                        PartialRunHighlight::Keep => {
                            pattern.indices[1..run].iter().copied().collect()
                        }
                    };
                    Ok(PatternMatch {
                        reward: 0,
                        matched,
                    })
                }
            }
        }
        PatternTier::Wild => {
            if symbols.iter().all(|&s| s == first) {
                Ok(PatternMatch {
                    reward: table.reward(first, symbols.len() as u32),
                    matched: pattern.indices.iter().copied().collect(),
                })
            } else {
                Ok(PatternMatch::none())
            }
        }
    }
}

/// The three row patterns of the reference 5×3 machine
pub fn reference_linear_patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::linear("Top row", vec![0, 3, 6, 9, 12]),
        PatternDef::linear("Middle row", vec![1, 4, 7, 10, 13]),
        PatternDef::linear("Bottom row", vec![2, 5, 8, 11, 14]),
    ]
}

/// The six shape patterns of the reference 5×3 machine
pub fn reference_wild_patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::wild("Descent", vec![0, 4, 8, 10, 12]),
        PatternDef::wild("Ascent", vec![2, 4, 6, 10, 14]),
        PatternDef::wild("Low steps", vec![2, 3, 8, 9, 14]),
        PatternDef::wild("High steps", vec![0, 5, 6, 11, 12]),
        PatternDef::wild("Valley", vec![0, 3, 7, 11, 14]),
        PatternDef::wild("Ridge", vec![2, 5, 7, 9, 12]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(indices: &[usize]) -> BTreeSet<usize> {
        indices.iter().copied().collect()
    }

    fn table() -> RewardTable {
        RewardTable::reference()
    }

    #[test]
    fn test_linear_full_run() {
        let grid = GridSnapshot::from_symbols(["Cherry", "Cherry", "Cherry"]);
        let pattern = PatternDef::linear("row", vec![0, 1, 2]);
        let m = evaluate_pattern(&pattern, &grid, &table(), PartialRunHighlight::Discard).unwrap();
        assert_eq!(m.reward, 2);
        assert_eq!(m.matched, set(&[0, 1, 2]));
    }

    #[test]
    fn test_linear_stops_at_first_mismatch() {
        let grid = GridSnapshot::from_symbols(["Cherry", "Cherry", "Plum"]);
        let pattern = PatternDef::linear("row", vec![0, 1, 2]);
        let m = evaluate_pattern(&pattern, &grid, &table(), PartialRunHighlight::Discard).unwrap();
        assert_eq!(m.reward, 1);
        assert_eq!(m.matched, set(&[0, 1]));
    }

    #[test]
    fn test_linear_later_matches_do_not_count() {
        let grid = GridSnapshot::from_symbols(["Lemon", "Plum", "Lemon", "Lemon"]);
        let pattern = PatternDef::linear("row", vec![0, 1, 2, 3]);
        let m = evaluate_pattern(&pattern, &grid, &table(), PartialRunHighlight::Discard).unwrap();
        // Run of one has no reward entry
        assert_eq!(m, PatternMatch::none());
    }

    #[test]
    fn test_linear_partial_run_policy() {
        // Five Plums paid in a table that only knows runs of five
        let table = RewardTable::new().with_symbol("Plum", [(5, 40)]);
        let grid = GridSnapshot::from_symbols(["Plum", "Plum", "Plum", "Bell"]);
        let pattern = PatternDef::linear("row", vec![0, 1, 2, 3]);

        let discard = evaluate_pattern(&pattern, &grid, &table, PartialRunHighlight::Discard).unwrap();
        assert_eq!(discard, PatternMatch::none());

        let keep = evaluate_pattern(&pattern, &grid, &table, PartialRunHighlight::Keep).unwrap();
        assert_eq!(keep.reward, 0);
        assert_eq!(keep.matched, set(&[1, 2]));
    }

    #[test]
    fn test_linear_run_monotonic() {
        let pattern = PatternDef::linear("row", vec![0, 1, 2, 3, 4]);
        let mut previous = 0;
        for run in 2..=5 {
            let symbols: Vec<&str> = (0..5).map(|i| if i < run { "Bell" } else { "Lemon" }).collect();
            let grid = GridSnapshot::from_symbols(symbols);
            let m = evaluate_pattern(&pattern, &grid, &table(), PartialRunHighlight::Discard).unwrap();
            assert!(m.reward >= previous);
            assert_eq!(m.matched.len(), run);
            previous = m.reward;
        }
        assert_eq!(previous, 100);
    }

    #[test]
    fn test_wild_highlights_without_reward() {
        // Bell pays nothing for six in a row
        let grid = GridSnapshot::from_symbols(["Bell"; 6]);
        let pattern = PatternDef::wild("all", vec![0, 1, 2, 3, 4, 5]);
        let m = evaluate_pattern(&pattern, &grid, &table(), PartialRunHighlight::Discard).unwrap();
        assert_eq!(m.reward, 0);
        assert_eq!(m.matched, set(&[0, 1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_wild_pays_full_match() {
        let grid = GridSnapshot::from_symbols(["Grapes"; 5]);
        let pattern = PatternDef::wild("v", vec![4, 3, 2, 1, 0]);
        let m = evaluate_pattern(&pattern, &grid, &table(), PartialRunHighlight::Discard).unwrap();
        assert_eq!(m.reward, 50);
        assert_eq!(m.matched, set(&[0, 1, 2, 3, 4]));
    }

    #[test]
    fn test_wild_mismatch() {
        let grid = GridSnapshot::from_symbols(["Grapes", "Grapes", "Lemon"]);
        let pattern = PatternDef::wild("v", vec![0, 1, 2]);
        let m = evaluate_pattern(&pattern, &grid, &table(), PartialRunHighlight::Discard).unwrap();
        assert_eq!(m, PatternMatch::none());
    }

    #[test]
    fn test_malformed_input() {
        let grid = GridSnapshot::from_symbols(["Bell", "Bell"]);
        let empty = PatternDef::wild("empty", vec![]);
        assert_eq!(
            evaluate_pattern(&empty, &grid, &table(), PartialRunHighlight::Discard),
            Err(EvaluationAnomaly::EmptyPattern {
                pattern: "empty".into()
            })
        );

        let outside = PatternDef::linear("outside", vec![0, 7]);
        assert_eq!(
            evaluate_pattern(&outside, &grid, &table(), PartialRunHighlight::Discard),
            Err(EvaluationAnomaly::IndexOutOfRange {
                pattern: "outside".into(),
                index: 7,
                grid_len: 2,
            })
        );

        let no_grid = GridSnapshot::new();
        assert_eq!(
            outside.evaluate(&no_grid, &table(), PartialRunHighlight::Discard),
            Err(EvaluationAnomaly::EmptyGrid)
        );
    }

    #[test]
    fn test_pattern_validation() {
        for pattern in reference_linear_patterns()
            .iter()
            .chain(reference_wild_patterns().iter())
        {
            assert!(pattern.validate(15).is_ok());
        }
        assert!(matches!(
            PatternDef::wild("x", vec![]).validate(15),
            Err(ConfigError::EmptyPattern(_))
        ));
        assert!(matches!(
            PatternDef::linear("x", vec![0, 15]).validate(15),
            Err(ConfigError::PatternIndexOutOfRange { index: 15, .. })
        ));
    }
}
