//! Reel unit: one cylinder of symbols
//!
//! Cells sit at fixed angular steps (`360 / len`) around the cylinder. Cell
//! `i` is at `angle_offset - i * step + rotation` degrees, 0° facing the
//! viewer. A stop request snaps the rotation to the nearest step so exactly
//! one cell faces the viewer when the reel settles.

use serde::{Deserialize, Serialize};

use crate::collaborators::{CellPose, ReelRenderer, VisibilityOracle, VisualHandle};
use crate::config::ReelSpec;
use crate::error::{ConfigError, ConfigResult};
use crate::grid::GridCell;
use crate::symbols::{Symbol, SymbolId, SymbolSet};

/// Reel state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReelState {
    /// Cells not built yet; `start` populates them and moves to `Idle`
    #[default]
    Starting,
    /// At rest, ready to spin
    Idle,
    /// Rotating continuously
    Spinning,
    /// Snapped to a symbol boundary, settles on the next advance
    Stopping,
    /// At rest with a readable result
    Settled,
}

#[derive(Debug, Clone)]
struct ReelCell {
    symbol: Symbol,
    handle: VisualHandle,
    active: bool,
}

/// One cylinder of symbols
#[derive(Debug, Clone)]
pub struct ReelUnit {
    index: usize,
    spec: ReelSpec,
    cells: Vec<ReelCell>,
    state: ReelState,
    rotation: f64,
    speed: f64,
    spin_duration: f64,
    /// Strip indices currently visible, display order
    visible: Vec<usize>,
}

impl ReelUnit {
    pub fn new(index: usize, spec: ReelSpec) -> Self {
        Self {
            index,
            spec,
            cells: Vec::new(),
            state: ReelState::Starting,
            rotation: 0.0,
            speed: 0.0,
            spin_duration: 0.0,
            visible: Vec::new(),
        }
    }

    /// Resolve the strip against the symbol set and instantiate every cell
    pub fn start(
        &mut self,
        symbols: &SymbolSet,
        renderer: &mut dyn ReelRenderer,
        oracle: &dyn VisibilityOracle,
    ) -> ConfigResult<()> {
        self.state = ReelState::Starting;
        let mut cells = Vec::with_capacity(self.spec.symbols.len());
        for id in &self.spec.symbols {
            let symbol = symbols
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| ConfigError::UnknownReelSymbol {
                    reel: self.index,
                    symbol: id.to_string(),
                })?;
            let handle = renderer.instantiate(self.index, &symbol);
            cells.push(ReelCell {
                symbol,
                handle,
                active: false,
            });
        }
        if cells.is_empty() {
            return Err(ConfigError::EmptyStrip(self.index));
        }

        self.cells = cells;
        self.rotation = 0.0;
        self.visible.clear();
        self.state = ReelState::Idle;

        for pose in self.poses() {
            renderer.place(self.cells[pose.index].handle, &pose);
        }
        self.refresh_visibility(renderer, oracle);

        log::debug!("reel {} started with {} cells", self.index, self.cells.len());
        Ok(())
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> ReelState {
        self.state
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn spin_duration(&self) -> f64 {
        self.spin_duration
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Angular distance between neighbouring cells
    pub fn angle_step(&self) -> f64 {
        if self.cells.is_empty() {
            0.0
        } else {
            360.0 / self.cells.len() as f64
        }
    }

    /// Current pose of every cell
    pub fn poses(&self) -> Vec<CellPose> {
        let step = self.angle_step();
        (0..self.cells.len())
            .map(|i| CellPose {
                index: i,
                angle: self.spec.angle_offset - i as f64 * step + self.rotation,
                radius: self.spec.radius,
            })
            .collect()
    }

    /// Begin rotating at `speed` deg/s; only from `Idle` or `Settled`
    pub fn begin_spin(&mut self, speed: f64) -> bool {
        match self.state {
            ReelState::Idle | ReelState::Settled if !self.cells.is_empty() => {
                self.speed = speed;
                self.state = ReelState::Spinning;
                true
            }
            state => {
                log::debug!("reel {}: spin ignored in {:?}", self.index, state);
                false
            }
        }
    }

    /// Visual-only duration hint for this spin
    pub fn set_spin_duration(&mut self, seconds: f64) {
        self.spin_duration = seconds;
    }

    /// Snap to the nearest symbol boundary; settles on the next advance
    pub fn request_stop(&mut self) -> bool {
        match self.state {
            ReelState::Spinning => {
                self.rotation = self.snapped_rotation();
                self.state = ReelState::Stopping;
                true
            }
            state => {
                log::debug!("reel {}: stop ignored in {:?}", self.index, state);
                false
            }
        }
    }

    /// Advance rotation and state by `dt` seconds
    pub fn advance(
        &mut self,
        dt: f64,
        renderer: &mut dyn ReelRenderer,
        oracle: &dyn VisibilityOracle,
    ) {
        match self.state {
            ReelState::Starting | ReelState::Idle | ReelState::Settled => return,
            ReelState::Spinning => self.rotate(dt),
            ReelState::Stopping => self.state = ReelState::Settled,
        }
        renderer.rotate_reel(self.index, self.rotation);
        self.refresh_visibility(renderer, oracle);
    }

    /// Snap and settle immediately
    pub fn force_settle(&mut self, renderer: &mut dyn ReelRenderer, oracle: &dyn VisibilityOracle) {
        if self.cells.is_empty() {
            return;
        }
        self.rotation = self.snapped_rotation();
        self.state = ReelState::Settled;
        renderer.rotate_reel(self.index, self.rotation);
        self.refresh_visibility(renderer, oracle);
    }

    /// Return a settled reel to `Idle` for the next cycle
    pub fn reset_cycle(&mut self) {
        if self.state == ReelState::Settled {
            self.state = ReelState::Idle;
        }
    }

    pub fn is_settled(&self) -> bool {
        self.state == ReelState::Settled
    }

    /// Visible symbols, top to bottom; empty unless settled
    pub fn active_symbols(&self) -> Vec<SymbolId> {
        self.settled_cells().map(|c| c.symbol.id.clone()).collect()
    }

    /// Visible handles, top to bottom; empty unless settled
    pub fn active_handles(&self) -> Vec<VisualHandle> {
        self.settled_cells().map(|c| c.handle).collect()
    }

    /// Visible cells as grid cells, top to bottom; empty unless settled
    pub fn active_cells(&self) -> Vec<GridCell> {
        self.settled_cells()
            .map(|c| GridCell::new(c.symbol.id.clone(), c.handle))
            .collect()
    }

    fn settled_cells(&self) -> impl Iterator<Item = &ReelCell> {
        let visible: &[usize] = if self.is_settled() { &self.visible } else { &[] };
        visible.iter().filter_map(|&i| self.cells.get(i))
    }

    fn rotate(&mut self, dt: f64) {
        self.rotation = (self.rotation + self.speed * dt).rem_euclid(360.0);
    }

    fn snapped_rotation(&self) -> f64 {
        let step = self.angle_step();
        if step <= 0.0 {
            return 0.0;
        }
        let normalized = self.rotation.rem_euclid(360.0);
        ((normalized / step).round() * step).rem_euclid(360.0)
    }

    fn refresh_visibility(&mut self, renderer: &mut dyn ReelRenderer, oracle: &dyn VisibilityOracle) {
        let visible = oracle.visible(&self.poses());
        for (i, cell) in self.cells.iter_mut().enumerate() {
            let active = visible.contains(&i);
            if active != cell.active {
                cell.active = active;
                renderer.set_active(cell.handle, active);
            }
        }
        self.visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{FrontArcOracle, HeadlessRenderer};
    use approx::assert_relative_eq;

    fn strip() -> ReelSpec {
        ReelSpec::new(vec![
            "Bell", "Plum", "Cherry", "Watermelon", "Orange", "Grapes", "Lemon", "Cherry",
        ])
    }

    fn started() -> (ReelUnit, HeadlessRenderer, FrontArcOracle) {
        let mut renderer = HeadlessRenderer::new();
        let oracle = FrontArcOracle::new(3);
        let mut reel = ReelUnit::new(0, strip());
        reel.start(&SymbolSet::reference(), &mut renderer, &oracle).unwrap();
        (reel, renderer, oracle)
    }

    #[test]
    fn test_start_instantiates_every_cell() {
        let (reel, renderer, _) = started();
        assert_eq!(reel.len(), 8);
        assert_eq!(renderer.instantiated(), 8);
        assert_eq!(reel.state(), ReelState::Idle);
        assert_relative_eq!(reel.angle_step(), 45.0);
        // Nothing readable before a spin settles
        assert!(reel.active_symbols().is_empty());
    }

    #[test]
    fn test_starting_until_populated() {
        let mut renderer = HeadlessRenderer::new();
        let oracle = FrontArcOracle::new(3);
        let mut reel = ReelUnit::new(0, strip());
        assert_eq!(reel.state(), ReelState::Starting);
        // Nothing to spin before the cells exist
        assert!(!reel.begin_spin(100.0));
        reel.advance(1.0, &mut renderer, &oracle);
        assert_eq!(reel.state(), ReelState::Starting);

        reel.start(&SymbolSet::reference(), &mut renderer, &oracle).unwrap();
        assert_eq!(reel.state(), ReelState::Idle);
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let mut reel = ReelUnit::new(2, ReelSpec::new(vec!["Bell", "Seven"]));
        let err = reel
            .start(&SymbolSet::reference(), &mut HeadlessRenderer::new(), &FrontArcOracle::new(1))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownReelSymbol { reel: 2, .. }));
        assert_eq!(reel.state(), ReelState::Starting);
    }

    #[test]
    fn test_spin_snap_and_settle() {
        let (mut reel, mut renderer, oracle) = started();
        assert!(reel.begin_spin(100.0));
        assert_eq!(reel.state(), ReelState::Spinning);
        assert_relative_eq!(reel.rotation(), 0.0);

        reel.advance(1.0, &mut renderer, &oracle);
        assert_eq!(reel.state(), ReelState::Spinning);
        assert_relative_eq!(reel.rotation(), 100.0);
        assert!(reel.active_symbols().is_empty());

        assert!(reel.request_stop());
        assert_eq!(reel.state(), ReelState::Stopping);
        assert_relative_eq!(reel.rotation(), 90.0);

        reel.advance(0.016, &mut renderer, &oracle);
        assert!(reel.is_settled());
        // Two steps of rotation bring cell 2 to the front
        let names: Vec<String> = reel.active_symbols().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["Plum", "Cherry", "Watermelon"]);
        assert_eq!(reel.active_handles().len(), 3);
        assert_eq!(reel.active_cells()[1].symbol.as_str(), "Cherry");
    }

    #[test]
    fn test_rotation_wraps_and_snaps_to_zero() {
        let (mut reel, mut renderer, oracle) = started();
        reel.begin_spin(350.0);
        reel.advance(1.0, &mut renderer, &oracle);
        assert_relative_eq!(reel.rotation(), 350.0);
        reel.advance(0.1, &mut renderer, &oracle);
        assert_relative_eq!(reel.rotation(), 25.0, epsilon = 1e-9);
        reel.request_stop();
        assert_relative_eq!(reel.rotation(), 45.0);

        reel.begin_spin(0.0);
        reel.force_settle(&mut renderer, &oracle);
        assert!(reel.is_settled());
    }

    #[test]
    fn test_misuse_is_a_no_op() {
        let (mut reel, mut renderer, oracle) = started();
        assert!(!reel.request_stop());
        assert_eq!(reel.state(), ReelState::Idle);

        reel.begin_spin(200.0);
        assert!(!reel.begin_spin(300.0));
        assert_eq!(reel.speed(), 200.0);

        reel.force_settle(&mut renderer, &oracle);
        reel.reset_cycle();
        assert_eq!(reel.state(), ReelState::Idle);
        assert!(reel.active_symbols().is_empty());
    }

    #[test]
    fn test_angle_offset_shifts_front_cell() {
        let mut renderer = HeadlessRenderer::new();
        let oracle = FrontArcOracle::new(1);
        let mut reel = ReelUnit::new(0, strip().with_angle_offset(135.0));
        reel.start(&SymbolSet::reference(), &mut renderer, &oracle).unwrap();
        reel.force_settle(&mut renderer, &oracle);
        assert_eq!(reel.active_symbols(), vec![SymbolId::new("Watermelon")]);
    }
}
