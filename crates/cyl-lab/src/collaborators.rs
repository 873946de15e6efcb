//! Collaborator seams: rendering, visibility, presentation, diagnostics
//!
//! The core never draws, reads input or picks sprites. Everything visual is
//! reached through these traits, bundled in [`Collaborators`] and injected
//! into the sequencer. Headless defaults are provided for hosts and tests.

use std::cmp::Reverse;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::EvaluationAnomaly;
use crate::evaluation::HighlightMask;
use crate::symbols::Symbol;

/// Opaque handle to one instantiated cell visual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualHandle(pub u64);

/// Placement of one cell on its cylinder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPose {
    /// Position of the cell on the strip
    pub index: usize,
    /// Current angle in degrees, rotation included (0 = facing the viewer)
    pub angle: f64,
    /// Cylinder radius
    pub radius: f64,
}

impl CellPose {
    /// Distance toward the viewer (radius × cos)
    pub fn depth(&self) -> f64 {
        self.radius * self.angle.to_radians().cos()
    }

    /// Vertical offset from the cylinder axis (radius × sin)
    pub fn height(&self) -> f64 {
        self.radius * self.angle.to_radians().sin()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RENDERER
// ═══════════════════════════════════════════════════════════════════════════

/// Draws reels; the core only hands it symbols, poses and activity flags
pub trait ReelRenderer: Send {
    /// Instantiate the visual of one cell
    fn instantiate(&mut self, reel: usize, symbol: &Symbol) -> VisualHandle;

    /// Place a cell on its cylinder
    fn place(&mut self, handle: VisualHandle, pose: &CellPose);

    /// Apply the current rotation of a reel (degrees)
    fn rotate_reel(&mut self, reel: usize, angle: f64);

    /// Mark a cell visible or hidden
    fn set_active(&mut self, handle: VisualHandle, active: bool);
}

/// Renderer that only allocates handles
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    next_handle: u64,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles allocated so far
    pub fn instantiated(&self) -> u64 {
        self.next_handle
    }
}

impl ReelRenderer for HeadlessRenderer {
    fn instantiate(&mut self, reel: usize, symbol: &Symbol) -> VisualHandle {
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        log::trace!("reel {} instantiate {} -> {:?}", reel, symbol.id, handle);
        handle
    }

    fn place(&mut self, handle: VisualHandle, pose: &CellPose) {
        log::trace!("place {:?} at {:.1}°", handle, pose.angle);
    }

    fn rotate_reel(&mut self, reel: usize, angle: f64) {
        log::trace!("reel {} rotation {:.1}°", reel, angle);
    }

    fn set_active(&mut self, handle: VisualHandle, active: bool) {
        log::trace!("{:?} active={}", handle, active);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// VISIBILITY
// ═══════════════════════════════════════════════════════════════════════════

/// Decides which cells of a reel are visible and in which display order
pub trait VisibilityOracle: Send {
    /// Strip indices of the visible cells, top to bottom
    fn visible(&self, poses: &[CellPose]) -> Vec<usize>;
}

/// The `rows` cells nearest the viewer, ordered top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontArcOracle {
    pub rows: usize,
}

impl FrontArcOracle {
    pub fn new(rows: usize) -> Self {
        Self { rows }
    }
}

/// Quantized key so near-equal floats order by strip index
fn quantize(value: f64) -> i64 {
    (value * 1e9).round() as i64
}

impl VisibilityOracle for FrontArcOracle {
    fn visible(&self, poses: &[CellPose]) -> Vec<usize> {
        let mut nearest: Vec<&CellPose> = poses.iter().collect();
        nearest.sort_by_key(|p| (Reverse(quantize(p.angle.to_radians().cos())), p.index));
        nearest.truncate(self.rows);
        nearest.sort_by_key(|p| (Reverse(quantize(p.angle.to_radians().sin())), p.index));
        nearest.into_iter().map(|p| p.index).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PRESENTATION
// ═══════════════════════════════════════════════════════════════════════════

/// Receives cycle notifications and the evaluation outcome
pub trait SpinPresenter: Send {
    /// A spin was accepted (input may be disabled)
    fn spin_started(&mut self);

    /// The last reel was told to stop (input may be re-enabled)
    fn spin_finished(&mut self);

    /// Total reward of the cycle
    fn reward(&mut self, total: u64, is_win: bool);

    /// Per-cell activation mask
    fn highlight(&mut self, mask: &HighlightMask);
}

/// Presenter that logs every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl SpinPresenter for LogPresenter {
    fn spin_started(&mut self) {
        log::debug!("spin started");
    }

    fn spin_finished(&mut self) {
        log::debug!("spin finished");
    }

    fn reward(&mut self, total: u64, is_win: bool) {
        if is_win {
            log::info!("reward: {}", total);
        } else {
            log::debug!("no reward");
        }
    }

    fn highlight(&mut self, mask: &HighlightMask) {
        log::debug!("highlight {:?}", mask.active_indices());
    }
}

/// One notification received by a [`RecordingPresenter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    SpinStarted,
    SpinFinished,
    Reward { total: u64, is_win: bool },
    Highlight(Vec<bool>),
}

/// Presenter that records notifications; clones share the same record
#[derive(Debug, Default, Clone)]
pub struct RecordingPresenter {
    events: Arc<Mutex<Vec<PresenterEvent>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().clone()
    }

    /// Last published reward
    pub fn last_reward(&self) -> Option<(u64, bool)> {
        self.events.lock().iter().rev().find_map(|e| match e {
            PresenterEvent::Reward { total, is_win } => Some((*total, *is_win)),
            _ => None,
        })
    }

    /// Number of recorded events equal to `event`
    pub fn count(&self, event: &PresenterEvent) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, event: PresenterEvent) {
        self.events.lock().push(event);
    }
}

impl SpinPresenter for RecordingPresenter {
    fn spin_started(&mut self) {
        self.push(PresenterEvent::SpinStarted);
    }

    fn spin_finished(&mut self) {
        self.push(PresenterEvent::SpinFinished);
    }

    fn reward(&mut self, total: u64, is_win: bool) {
        self.push(PresenterEvent::Reward { total, is_win });
    }

    fn highlight(&mut self, mask: &HighlightMask) {
        self.push(PresenterEvent::Highlight(mask.cells().to_vec()));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DIAGNOSTICS
// ═══════════════════════════════════════════════════════════════════════════

/// Receives anomalies the engine recovered from
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, anomaly: &EvaluationAnomaly);
}

/// Forwards anomalies to `log::warn!`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn report(&self, anomaly: &EvaluationAnomaly) {
        log::warn!("evaluation anomaly: {}", anomaly);
    }
}

/// Keeps every reported anomaly; clones share the same record
#[derive(Debug, Default, Clone)]
pub struct RecordingDiagnostics {
    anomalies: Arc<Mutex<Vec<EvaluationAnomaly>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anomalies(&self) -> Vec<EvaluationAnomaly> {
        self.anomalies.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.anomalies.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.lock().is_empty()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn report(&self, anomaly: &EvaluationAnomaly) {
        self.anomalies.lock().push(anomaly.clone());
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BUNDLE
// ═══════════════════════════════════════════════════════════════════════════

/// Every collaborator the sequencer talks to
pub struct Collaborators {
    pub renderer: Box<dyn ReelRenderer>,
    pub oracle: Box<dyn VisibilityOracle>,
    pub presenter: Box<dyn SpinPresenter>,
    pub diagnostics: Box<dyn DiagnosticSink>,
}

impl Collaborators {
    /// Headless renderer, front-arc visibility, logging presenter and diagnostics
    pub fn headless(rows: usize) -> Self {
        Self {
            renderer: Box::new(HeadlessRenderer::new()),
            oracle: Box::new(FrontArcOracle::new(rows)),
            presenter: Box::new(LogPresenter),
            diagnostics: Box::new(LogDiagnostics),
        }
    }

    pub fn with_renderer(mut self, renderer: impl ReelRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_oracle(mut self, oracle: impl VisibilityOracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    pub fn with_presenter(mut self, presenter: impl SpinPresenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
