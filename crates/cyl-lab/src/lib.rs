//! # cyl-lab: Spin Sequencer and Pattern Evaluation Engine
//!
//! Logic core of a cylinder slot machine: drives reels through a timed spin
//! cycle, snapshots the visible symbol grid and scores it against linear and
//! wild patterns. Rendering, input and sprites stay outside, behind traits.
//!
//! ## Features
//!
//! - **Sequencer**: Start, spin, hold, stop, collect and evaluate, one `advance(dt)` per tick
//! - **Reel Units**: Cylinder geometry, snapping to symbol boundaries, visibility ordering
//! - **Pattern Engine**: Wild patterns first, linear patterns after, pattern-level exclusion
//! - **Stage Traces**: Every transition recorded as a timestamped stage event
//! - **Timing Profiles**: Normal, Turbo, Instant timing modes
//!
//! ## Architecture
//!
//! ```text
//! Sequencer
//!     │
//!     ├── ReelUnit × N (strip, rotation, ReelState)
//!     ├── PatternEngine (Arc<RewardTable>, wild + linear PatternDefs)
//!     ├── TimingConfig (delay, hold, spin ranges, speed)
//!     └── Collaborators (renderer, visibility, presenter, diagnostics)
//!           │
//!           v
//!     CycleResult { GridSnapshot, EvaluationResult, StageTrace }
//! ```

pub mod collaborators;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod grid;
pub mod parser;
pub mod pattern;
pub mod paytable;
pub mod reel;
pub mod sequencer;
pub mod symbols;
pub mod timing;

pub use collaborators::*;
pub use config::*;
pub use error::*;
pub use evaluation::*;
pub use grid::*;
pub use parser::*;
pub use pattern::*;
pub use paytable::*;
pub use reel::*;
pub use sequencer::*;
pub use symbols::*;
pub use timing::*;
