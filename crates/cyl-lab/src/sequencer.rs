//! Spin sequencer, the timed state machine driving every reel
//!
//! ```text
//! Starting ─► Idle ─(trigger)─► Spinning ─► Holding ─► Stopping ─► Collecting ─► Evaluating
//!               ▲                                                                   │
//!               └──────────────────────────(cancel)            (trigger) ◄──────────┘
//! ```
//!
//! The host calls [`Sequencer::advance`] once per tick. Time is accumulated
//! per phase; each tick is split at every threshold it crosses, so reels
//! start and stop at the same logical instants whatever the tick length.

use std::sync::Arc;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use cyl_stage::{Stage, StageEvent, StageTrace};

use crate::collaborators::Collaborators;
use crate::config::{MachineConfig, RetriggerPolicy};
use crate::error::ConfigResult;
use crate::evaluation::{EvaluationResult, HighlightMask, PatternEngine};
use crate::grid::GridSnapshot;
use crate::reel::ReelUnit;

/// Sequencer phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinPhase {
    /// Reels populated, waiting for the first tick
    #[default]
    Starting,
    /// At rest, no result pending
    Idle,
    /// Starting reels one by one
    Spinning,
    /// Every reel spinning, waiting for the hold duration
    Holding,
    /// Stopping reels one by one
    Stopping,
    /// Waiting for every reel to settle
    Collecting,
    /// Result evaluated and published; at rest until the next trigger
    Evaluating,
}

impl SpinPhase {
    /// Can a spin start right now?
    pub fn is_at_rest(&self) -> bool {
        matches!(self, Self::Idle | Self::Evaluating)
    }

    /// Is a cycle running?
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Spinning | Self::Holding | Self::Stopping | Self::Collecting
        )
    }
}

/// What happened to a spin request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// A new cycle started
    Started,
    /// Stored; starts as soon as the machine is at rest
    Queued,
    /// Dropped
    Ignored,
}

/// Everything one completed cycle produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleResult {
    /// Cycle number (1-based)
    pub cycle: u64,
    /// Rotation speed of this cycle (deg/s)
    pub spin_speed: f64,
    /// The evaluated grid
    pub snapshot: GridSnapshot,
    /// Rewards and highlights
    pub evaluation: EvaluationResult,
    /// Stage timeline of the cycle
    pub trace: StageTrace,
}

impl CycleResult {
    pub fn total_reward(&self) -> u64 {
        self.evaluation.total_reward
    }

    pub fn is_win(&self) -> bool {
        self.evaluation.is_win()
    }

    pub fn mask(&self) -> HighlightMask {
        self.evaluation.mask()
    }
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub wins: u64,
    pub losses: u64,
    pub total_reward: u64,
    pub best_reward: u64,
    pub cancelled: u64,
    pub ignored_triggers: u64,
    pub queued_triggers: u64,
    pub anomalies: u64,
}

impl SessionStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Average reward per evaluated spin
    pub fn average_reward(&self) -> f64 {
        if self.total_spins > 0 {
            self.total_reward as f64 / self.total_spins as f64
        } else {
            0.0
        }
    }

    fn record(&mut self, evaluation: &EvaluationResult) {
        self.total_spins += 1;
        if evaluation.is_win() {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.total_reward = self.total_reward.saturating_add(evaluation.total_reward);
        self.best_reward = self.best_reward.max(evaluation.total_reward);
        self.anomalies += evaluation.anomalies.len() as u64;
    }
}

/// The spin sequencer
pub struct Sequencer {
    config: MachineConfig,
    engine: PatternEngine,
    reels: Vec<ReelUnit>,
    collaborators: Collaborators,
    rng: Box<dyn RngCore + Send>,

    phase: SpinPhase,
    /// Time accumulated in the current phase step (seconds)
    phase_elapsed: f64,
    /// Time since the current cycle was accepted (seconds)
    cycle_elapsed: f64,
    next_start: usize,
    next_stop: usize,
    hold_duration: f64,
    spin_speed: f64,
    pending_trigger: bool,

    cycle: u64,
    snapshot: Option<GridSnapshot>,
    trace: Option<StageTrace>,
    last_result: Option<CycleResult>,
    cancelled_trace: Option<StageTrace>,
    stats: SessionStats,
}

impl Sequencer {
    /// Build a sequencer and populate every reel; an invalid machine is rejected here
    pub fn new(config: MachineConfig, mut collaborators: Collaborators) -> ConfigResult<Self> {
        config.validate()?;

        let engine = PatternEngine::new(
            Arc::clone(&config.rewards),
            config.patterns.iter().cloned(),
        )
        .with_partial_run_highlight(config.partial_run_highlight);

        let mut reels = Vec::with_capacity(config.reels.len());
        for (i, spec) in config.reels.iter().enumerate() {
            let mut reel = ReelUnit::new(i, spec.clone());
            reel.start(
                &config.symbols,
                collaborators.renderer.as_mut(),
                collaborators.oracle.as_ref(),
            )?;
            reels.push(reel);
        }
        let rng: Box<dyn RngCore + Send> = match config.seed {
            Some(seed) => Box::new(ChaCha8Rng::seed_from_u64(seed)),
            None => Box::new(ChaCha8Rng::from_rng(&mut rand::rng())),
        };
        let spin_speed = config.timing.spin_speed;

        Ok(Self {
            config,
            engine,
            reels,
            collaborators,
            rng,
            phase: SpinPhase::Starting,
            phase_elapsed: 0.0,
            cycle_elapsed: 0.0,
            next_start: 0,
            next_stop: 0,
            hold_duration: 0.0,
            spin_speed,
            pending_trigger: false,
            cycle: 0,
            snapshot: None,
            trace: None,
            last_result: None,
            cancelled_trace: None,
            stats: SessionStats::default(),
        })
    }

    /// Headless sequencer with the default collaborators
    pub fn headless(config: MachineConfig) -> ConfigResult<Self> {
        let rows = config.visible_rows;
        Self::new(config, Collaborators::headless(rows))
    }

    /// Replace the random source
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Reseed with a deterministic ChaCha8 stream
    pub fn seed(&mut self, seed: u64) {
        self.rng = Box::new(ChaCha8Rng::seed_from_u64(seed));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn is_at_rest(&self) -> bool {
        self.phase.is_at_rest()
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn engine(&self) -> &PatternEngine {
        &self.engine
    }

    pub fn reels(&self) -> &[ReelUnit] {
        &self.reels
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
    }

    /// Number of accepted cycles
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Speed of the current (or last) cycle
    pub fn spin_speed(&self) -> f64 {
        self.spin_speed
    }

    /// Snapshot of the current cycle, once collected
    pub fn snapshot(&self) -> Option<&GridSnapshot> {
        self.snapshot.as_ref()
    }

    /// Most recent completed cycle
    pub fn last_result(&self) -> Option<&CycleResult> {
        self.last_result.as_ref()
    }

    /// Trace of the most recently cancelled cycle
    pub fn cancelled_trace(&self) -> Option<&StageTrace> {
        self.cancelled_trace.as_ref()
    }

    pub fn has_pending_trigger(&self) -> bool {
        self.pending_trigger
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INPUT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Spin request from the host
    pub fn on_spin_requested(&mut self) -> TriggerOutcome {
        if self.phase.is_at_rest() {
            self.begin_cycle();
            return TriggerOutcome::Started;
        }

        let outcome = match self.config.retrigger {
            RetriggerPolicy::Queue if !self.pending_trigger => {
                self.pending_trigger = true;
                self.stats.queued_triggers += 1;
                self.record(Stage::TriggerQueued);
                TriggerOutcome::Queued
            }
            _ => {
                self.stats.ignored_triggers += 1;
                self.record(Stage::TriggerIgnored);
                TriggerOutcome::Ignored
            }
        };
        log::debug!("spin request in {:?}: {:?}", self.phase, outcome);
        outcome
    }

    /// Abort the running cycle
    ///
    /// Every reel is forced to settle, the pending snapshot and any queued
    /// request are dropped and a neutral reward is published. Returns whether
    /// a cycle was actually running.
    pub fn cancel(&mut self) -> bool {
        self.pending_trigger = false;
        if !self.phase.is_in_flight() {
            return false;
        }

        let Collaborators {
            renderer, oracle, ..
        } = &mut self.collaborators;
        for reel in &mut self.reels {
            reel.force_settle(renderer.as_mut(), oracle.as_ref());
        }
        self.snapshot = None;
        self.record(Stage::SpinCancelled);
        self.cancelled_trace = self.trace.take();

        let presenter = &mut self.collaborators.presenter;
        presenter.reward(0, false);
        presenter.highlight(&HighlightMask::cleared(self.config.grid_len()));
        presenter.spin_finished();

        self.stats.cancelled += 1;
        self.phase = SpinPhase::Idle;
        self.phase_elapsed = 0.0;
        log::info!("cycle {} cancelled", self.cycle);
        true
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TICK
    // ═══════════════════════════════════════════════════════════════════════════

    /// Advance by `dt` seconds; returns the result of a cycle evaluated during this tick
    pub fn advance(&mut self, dt: f64) -> Option<CycleResult> {
        let mut remaining = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let mut result = None;

        if self.phase == SpinPhase::Starting {
            self.enter_idle();
        }

        loop {
            if self.pending_trigger && self.phase.is_at_rest() {
                self.pending_trigger = false;
                self.begin_cycle();
            }

            match self.phase {
                SpinPhase::Starting | SpinPhase::Idle | SpinPhase::Evaluating => {
                    self.step_reels(remaining);
                    break;
                }
                SpinPhase::Spinning | SpinPhase::Holding | SpinPhase::Stopping => {
                    let until = (self.threshold() - self.phase_elapsed).max(0.0);
                    if remaining >= until {
                        self.step_reels(until);
                        remaining -= until;
                        self.phase_elapsed = 0.0;
                        self.fire();
                    } else {
                        self.step_reels(remaining);
                        self.phase_elapsed += remaining;
                        break;
                    }
                }
                SpinPhase::Collecting => {
                    // Stopped reels settle on their next advance, whatever its length
                    self.step_reels(0.0);
                    if !self.reels.iter().all(ReelUnit::is_settled) {
                        self.step_reels(remaining);
                        break;
                    }
                    self.collect();
                    result = Some(self.evaluate());
                }
            }
        }

        result
    }

    /// Leave `Starting`; the reels were populated by `new`
    fn enter_idle(&mut self) {
        self.phase = SpinPhase::Idle;
        log::debug!(
            "machine '{}' ready: {} reels × {} rows",
            self.config.name,
            self.reels.len(),
            self.config.visible_rows
        );
    }

    fn begin_cycle(&mut self) {
        self.cycle += 1;
        self.spin_speed = self.config.timing.roll_speed(self.rng.as_mut());
        self.phase_elapsed = 0.0;
        self.cycle_elapsed = 0.0;
        self.next_start = 0;
        self.next_stop = 0;
        self.hold_duration = 0.0;
        self.snapshot = None;
        for reel in &mut self.reels {
            reel.reset_cycle();
        }

        self.trace = Some(
            StageTrace::new(
                format!("{}-{}", self.config.name, self.cycle),
                self.config.name.clone(),
            )
            .with_cycle(self.cycle),
        );
        self.record(Stage::SpinStart {
            spin_speed: self.spin_speed,
        });

        self.collaborators.presenter.spin_started();
        self.phase = SpinPhase::Spinning;
        log::debug!("cycle {} started at {:.0}°/s", self.cycle, self.spin_speed);
    }

    /// Accumulated time the current phase step waits for
    fn threshold(&self) -> f64 {
        match self.phase {
            SpinPhase::Holding => self.hold_duration,
            _ => self.config.timing.delay_between_reels,
        }
    }

    /// Advance every reel and the cycle clock
    fn step_reels(&mut self, dt: f64) {
        if self.phase.is_in_flight() {
            self.cycle_elapsed += dt;
        }
        let Collaborators {
            renderer, oracle, ..
        } = &mut self.collaborators;
        for reel in &mut self.reels {
            reel.advance(dt, renderer.as_mut(), oracle.as_ref());
        }
    }

    /// A phase threshold was reached
    fn fire(&mut self) {
        match self.phase {
            SpinPhase::Spinning => {
                let index = self.next_start;
                let duration = self.config.timing.reel_spin.sample(self.rng.as_mut());
                if let Some(reel) = self.reels.get_mut(index) {
                    reel.set_spin_duration(duration);
                    reel.begin_spin(self.spin_speed);
                }
                self.record(Stage::ReelSpinning {
                    reel_index: index,
                    spin_duration: duration,
                });
                self.next_start += 1;

                if self.next_start >= self.reels.len() {
                    self.hold_duration = self.config.timing.hold.sample(self.rng.as_mut());
                    self.record(Stage::HoldStart {
                        duration: self.hold_duration,
                    });
                    self.phase = SpinPhase::Holding;
                }
            }
            SpinPhase::Holding => {
                self.phase = SpinPhase::Stopping;
            }
            SpinPhase::Stopping => {
                let index = self.next_stop;
                if let Some(reel) = self.reels.get_mut(index) {
                    reel.request_stop();
                }
                self.record(Stage::ReelStop {
                    reel_index: index,
                });
                self.next_stop += 1;

                if self.next_stop >= self.reels.len() {
                    self.record(Stage::SpinFinished);
                    self.collaborators.presenter.spin_finished();
                    self.phase = SpinPhase::Collecting;
                }
            }
            _ => {}
        }
    }

    /// Concatenate the active cells of every reel, in reel order
    fn collect(&mut self) {
        let mut snapshot = GridSnapshot::new();
        for reel in &self.reels {
            snapshot.extend_reel(reel.active_cells());
        }
        self.record(Stage::GridCollected {
            symbols: snapshot.symbol_names(),
        });
        self.snapshot = Some(snapshot);
        self.phase = SpinPhase::Evaluating;
    }

    /// Score the collected snapshot once and publish the outcome
    fn evaluate(&mut self) -> CycleResult {
        let snapshot = self.snapshot.clone().unwrap_or_default();
        self.record(Stage::EvaluateWins);

        let evaluation = self
            .engine
            .evaluate(&snapshot, self.collaborators.diagnostics.as_ref());

        for outcome in evaluation.winning_outcomes() {
            self.record(Stage::PatternWin {
                pattern: outcome.name.clone(),
                tier: outcome.tier.name().to_string(),
                reward: outcome.reward,
                indices: outcome.matched.iter().copied().collect(),
            });
        }
        for anomaly in &evaluation.anomalies {
            self.record(Stage::EvaluationAnomaly {
                pattern: anomaly.pattern().map(str::to_string),
                detail: anomaly.to_string(),
            });
        }
        let highlighted = evaluation.highlights.len();
        if evaluation.is_win() {
            self.record(Stage::WinPresent {
                total_reward: evaluation.total_reward,
                highlighted,
            });
        } else {
            self.record(Stage::NoWin { highlighted });
        }
        self.record(Stage::SpinEnd);

        let mask = evaluation.mask();
        let presenter = &mut self.collaborators.presenter;
        presenter.reward(evaluation.total_reward, evaluation.is_win());
        presenter.highlight(&mask);

        self.stats.record(&evaluation);
        log::info!(
            "cycle {}: reward {} ({} cells highlighted)",
            self.cycle,
            evaluation.total_reward,
            highlighted
        );

        let trace = self.trace.take().unwrap_or_else(|| {
            StageTrace::new(format!("{}-{}", self.config.name, self.cycle), self.config.name.clone())
        });
        let result = CycleResult {
            cycle: self.cycle,
            spin_speed: self.spin_speed,
            snapshot,
            evaluation,
            trace,
        };
        self.last_result = Some(result.clone());
        result
    }

    /// Append a stage to the running trace
    fn record(&mut self, stage: Stage) {
        let timestamp_ms = self.cycle_elapsed * 1000.0;
        if let Some(trace) = self.trace.as_mut() {
            trace.push(StageEvent::new(stage, timestamp_ms));
        }
    }
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("machine", &self.config.name)
            .field("phase", &self.phase)
            .field("cycle", &self.cycle)
            .field("pending_trigger", &self.pending_trigger)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
