//! Parallel, activity-tracked generation stepping over growable grids.

use std::fmt;
use std::time::Instant;

use log::{debug, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use thiserror::Error;

use super::camera::Camera;
use super::settings::{Settings, SettingsError};
use super::worker::{self, Frontier};
use crate::domain::{
    Axis, BitGrid, DoubleBuffer, GridError, GrowableGrid, Growth, LibraryError, LifeRule, Pattern,
    RuleEntry, RuleError, RuleSet, SharedRules, WORD_BITS, read_rules, write_rules,
};

/// Rows added above or below when live cells reach the top or bottom edge.
const FRONTIER_ROWS: usize = 64;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("generation step failed: {0}")]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("could not start worker pool: {0}")]
    Pool(#[from] ThreadPoolBuildError),
}

/// The simulation: liveness and activity grid pairs, a generation counter
/// and the view offsets a renderer draws with.
///
/// Coordinates taken by [`GenerationEngine::cell_state`] and
/// [`GenerationEngine::set_cell_state`] are local grid coordinates. Writing
/// outside the extent grows the grid; growth on the left or top moves the
/// local origin, which [`GenerationEngine::origin`] tracks.
pub struct GenerationEngine {
    live: DoubleBuffer<GrowableGrid>,
    active: DoubleBuffer<GrowableGrid>,
    generation: u64,
    origin: (i64, i64),
    camera: Camera,
    rules: SharedRules,
    pool: ThreadPool,
    workers: usize,
}

impl GenerationEngine {
    /// Engine with its own in-memory rule set and one worker per core.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        let workers = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self::with_rules(width, height, RuleSet::new().into_shared(), workers)
    }

    /// Engine stepping under `rules`, shared with whoever edits them.
    pub fn with_rules(
        width: usize,
        height: usize,
        rules: SharedRules,
        workers: usize,
    ) -> Result<Self, EngineError> {
        let workers = workers.max(1);
        let grid = GrowableGrid::new(width, height)?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("gol-worker-{i}"))
            .build()?;
        Ok(Self {
            live: DoubleBuffer::new(grid.clone(), grid.clone()),
            active: DoubleBuffer::new(grid.clone(), grid),
            generation: 0,
            origin: (0, 0),
            camera: Camera::default(),
            rules,
            pool,
            workers,
        })
    }

    pub fn from_settings(settings: &Settings, rules: SharedRules) -> Result<Self, EngineError> {
        settings.validate()?;
        let mut engine = Self::with_rules(
            settings.board.width,
            settings.board.height,
            rules,
            settings.engine.worker_count(),
        )?;
        engine.camera = Camera::new(settings.view.cell_size);
        Ok(engine)
    }

    pub fn width(&self) -> usize {
        self.live.current().board_width()
    }

    pub fn height(&self) -> usize {
        self.live.current().board_height()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn generation_no(&self) -> u64 {
        self.generation
    }

    pub fn cell_state(&self, x: i64, y: i64) -> bool {
        self.live.current().cell_state(x, y)
    }

    /// Whether the cell changed in the last tick (or was written since).
    pub fn is_active(&self, x: i64, y: i64) -> bool {
        self.active.current().cell_state(x, y)
    }

    /// Write a cell and mark it active so the next tick revisits its
    /// neighbourhood. Returns how far the local origin moved.
    ///
    /// A write the grids cannot grow to reach is dropped.
    pub fn set_cell_state(&mut self, x: i64, y: i64, alive: bool) -> Growth {
        let growth = if self.live.current().has_position(x, y) {
            Growth::default()
        } else {
            match self.grow_to(x, y) {
                Ok(growth) => growth,
                Err(err) => {
                    warn!("dropped write to ({x}, {y}): {err}");
                    return Growth::default();
                }
            }
        };
        let x = x + growth.left_cells as i64;
        let y = y + growth.top_rows as i64;
        for grid in self.live.both_mut() {
            grid.set_cell_state(x, y, alive);
        }
        for grid in self.active.both_mut() {
            grid.set_cell_state(x, y, true);
        }
        growth
    }

    /// All four grids share one extent, so either the first grid refuses
    /// before anything grows or every grid grows alike.
    fn grow_to(&mut self, x: i64, y: i64) -> Result<Growth, GridError> {
        let mut growth = Growth::default();
        for grid in self.live.both_mut().chain(self.active.both_mut()) {
            growth = grid.ensure_contains(x, y)?;
        }
        self.follow_growth(growth);
        Ok(growth)
    }

    fn follow_growth(&mut self, growth: Growth) {
        self.origin.0 += growth.left_cells as i64;
        self.origin.1 += growth.top_rows as i64;
        self.camera.shift_origin(growth.left_cells, growth.top_rows);
    }

    /// Grow every grid along `axis` to cover `target`; returns the number
    /// of words or rows prepended.
    fn expand_all(&mut self, axis: Axis, target: i64) -> Result<usize, GridError> {
        let mut prepended = 0;
        for grid in self.live.both_mut().chain(self.active.both_mut()) {
            prepended = grid.expand_board(axis, target, 0)?;
        }
        Ok(prepended)
    }

    /// Pre-grow every side whose outermost row or column holds a live or
    /// active cell, so the coming tick has room to spread.
    fn expand_frontier(&mut self) -> Result<Frontier, GridError> {
        let frontier = worker::frontier(self.live.current(), self.active.current());
        if !frontier.any() {
            return Ok(frontier);
        }

        if frontier.top {
            let top_rows = self.expand_all(Axis::Rows, -(FRONTIER_ROWS as i64))?;
            self.follow_growth(Growth { left_cells: 0, top_rows });
        }
        if frontier.bottom {
            let target = (self.height() + FRONTIER_ROWS - 1) as i64;
            self.expand_all(Axis::Rows, target)?;
        }
        if frontier.left {
            let left_cells = self.expand_all(Axis::Columns, -1)? * WORD_BITS;
            self.follow_growth(Growth { left_cells, top_rows: 0 });
        }
        if frontier.right {
            let target = (self.live.current().stride() * WORD_BITS) as i64;
            self.expand_all(Axis::Columns, target)?;
        }
        debug!(
            "frontier {:?}: grid is now {}x{}",
            frontier,
            self.width(),
            self.height()
        );
        Ok(frontier)
    }

    /// Advance one generation.
    ///
    /// Blocks until every worker has finished. On error the current
    /// generation, the counter and the buffer roles are left as they were;
    /// frontier growth made before a failure stays.
    pub fn next_generation(&mut self) -> Result<(), EngineError> {
        let started = Instant::now();
        self.expand_frontier()?;

        let rule: LifeRule = read_rules(&self.rules).active();
        let stride = self.live.current().stride();
        let rows_per_worker = self.height().div_ceil(self.workers).max(1);
        let span = rows_per_worker * stride;

        let (live, next_live) = self.live.split_mut();
        let (active, next_active) = self.active.split_mut();
        self.pool.install(|| {
            next_live
                .chunks_mut()
                .par_chunks_mut(span)
                .zip(next_active.chunks_mut().par_chunks_mut(span))
                .enumerate()
                .try_for_each(|(i, (live_rows, active_rows))| {
                    worker::step_rows(
                        live,
                        active,
                        &rule,
                        i * rows_per_worker,
                        live_rows,
                        active_rows,
                    )
                })
        })?;

        self.live.swap();
        self.active.swap();
        self.generation += 1;
        debug!(
            "generation {} in {:?} ({} active cells)",
            self.generation,
            started.elapsed(),
            self.active.current().count_alive()
        );
        Ok(())
    }

    /// Kill every cell and reset the counter; the extent is kept.
    pub fn clear(&mut self) {
        for grid in self.live.both_mut().chain(self.active.both_mut()) {
            grid.clear_board();
        }
        self.generation = 0;
    }

    /// Return to the configured extent with every cell dead.
    pub fn reset_size(&mut self) {
        for grid in self.live.both_mut().chain(self.active.both_mut()) {
            grid.reset_size();
        }
        self.generation = 0;
        self.origin = (0, 0);
        self.camera.reset();
    }

    /// Fill the current extent with a random soup (about 25% alive) and
    /// mark every cell active.
    pub fn randomize(&mut self) {
        let mut soup = self.live.current().clone();
        soup.randomize();
        for grid in self.live.both_mut() {
            grid.clone_from(&soup);
        }
        for grid in self.active.both_mut() {
            grid.fill_board();
        }
        self.generation = 0;
    }

    /// Write every cell of `pattern`, its top-left corner at the external
    /// origin, growing as needed.
    pub fn set_pattern(&mut self, pattern: &Pattern) {
        for y in 0..pattern.height() {
            for x in 0..pattern.width() {
                let (ox, oy) = self.origin;
                self.set_cell_state(ox + x as i64, oy + y as i64, pattern.cell_state(x, y));
            }
        }
        debug!(
            "placed {}x{} pattern {:?}",
            pattern.width(),
            pattern.height(),
            pattern.name
        );
    }

    /// Local coordinates of the external (0, 0) cell.
    pub fn origin(&self) -> (i64, i64) {
        self.origin
    }

    /// Live cells in the external frame, row-major.
    pub fn live_cells(&self) -> Vec<(i64, i64)> {
        let grid = self.live.current();
        let (ox, oy) = self.origin;
        let mut cells = Vec::new();
        for y in 0..grid.board_height() {
            for (column, word) in grid.row(y).iter().enumerate() {
                cells.extend(
                    word.ones()
                        .map(|bit| ((column * WORD_BITS + bit) as i64 - ox, y as i64 - oy)),
                );
            }
        }
        cells
    }

    pub fn population(&self) -> usize {
        self.live.current().count_alive()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Whether the view moved since the last call.
    pub fn take_view_changed(&mut self) -> bool {
        self.camera.take_changed()
    }

    pub fn rules(&self) -> &SharedRules {
        &self.rules
    }

    pub fn active_rule(&self) -> LifeRule {
        read_rules(&self.rules).active()
    }

    /// Set the active rule from a rule string; invalid or missing strings
    /// select Conway's rule. Returns whether the string was accepted.
    pub fn set_rule_string(&self, rule_string: Option<&str>) -> bool {
        write_rules(&self.rules).set_rules(rule_string)
    }

    pub fn select_rule(&self, index: usize) -> Result<RuleEntry, EngineError> {
        Ok(write_rules(&self.rules).select(index)?.clone())
    }

    pub fn select_rule_by_name(&self, name: &str) -> Result<RuleEntry, EngineError> {
        Ok(write_rules(&self.rules).select_by_name(name)?.clone())
    }

    /// Snapshot of the rule library in order.
    pub fn rule_library(&self) -> Vec<RuleEntry> {
        read_rules(&self.rules).library().iter().cloned().collect()
    }

    /// Add a named rule and persist the library.
    pub fn add_rule(
        &self,
        name: &str,
        rule_string: &str,
        description: &str,
    ) -> Result<RuleEntry, EngineError> {
        Ok(write_rules(&self.rules).add_rule(name, rule_string, description)?)
    }
}

impl fmt::Display for GenerationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.live.current())
    }
}

impl fmt::Debug for GenerationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationEngine")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("generation", &self.generation)
            .field("origin", &self.origin)
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(width: usize, height: usize) -> GenerationEngine {
        GenerationEngine::with_rules(width, height, RuleSet::new().into_shared(), 2).unwrap()
    }

    #[test]
    fn test_zero_extent_rejected() {
        assert!(matches!(
            GenerationEngine::new(0, 5),
            Err(EngineError::Grid(GridError::ZeroDimension { .. }))
        ));
    }

    #[test]
    fn test_set_cell_marks_active_in_both_roles() {
        let mut engine = engine(64, 8);
        engine.set_cell_state(3, 3, false);
        assert!(engine.is_active(3, 3));
        assert!(engine.active.next().cell_state(3, 3));
        assert!(!engine.cell_state(3, 3));
    }

    #[test]
    fn test_negative_write_shifts_origin_and_camera() {
        let mut engine = engine(64, 8);
        engine.camera_mut().cell_size = 2.0;
        let growth = engine.set_cell_state(-1, -2, true);
        assert_eq!(growth, Growth { left_cells: 64, top_rows: 2 });
        assert_eq!(engine.origin(), (64, 2));
        assert!(engine.cell_state(63, 0));
        assert_eq!(engine.live_cells(), vec![(-1, -2)]);
        assert_eq!((engine.camera().offset_left, engine.camera().offset_top), (128.0, 4.0));
        assert!(engine.take_view_changed());
    }

    #[test]
    fn test_unreachable_write_is_dropped() {
        let mut engine = engine(64, 4);
        engine.set_cell_state(2, 2, true);

        assert!(engine.set_cell_state(i64::MIN, 0, true).is_empty());
        assert!(engine.set_cell_state(0, i64::MAX, true).is_empty());
        assert_eq!((engine.width(), engine.height()), (64, 4));
        assert_eq!(engine.origin(), (0, 0));
        assert_eq!(engine.live_cells(), vec![(2, 2)]);
        for grid in [engine.live.next(), engine.active.current(), engine.active.next()] {
            assert_eq!(grid.dimensions(), (64, 4));
        }
    }

    #[test]
    fn test_frontier_expands_all_four_grids() {
        let mut engine = engine(64, 8);
        engine.set_cell_state(0, 0, true);
        engine.next_generation().unwrap();

        let extent = engine.live.current().dimensions();
        assert_eq!(extent, (128, 8 + FRONTIER_ROWS));
        for grid in [engine.live.next(), engine.active.current(), engine.active.next()] {
            assert_eq!(grid.dimensions(), extent);
        }
        assert_eq!(engine.origin(), (64, FRONTIER_ROWS as i64));
    }

    #[test]
    fn test_poisoned_rule_lock_still_steps() {
        let mut engine = engine(64, 8);
        engine.set_cell_state(10, 4, true);
        let rules = engine.rules().clone();
        let _ = std::thread::spawn(move || {
            let _guard = rules.write().unwrap();
            panic!("writer died");
        })
        .join();
        engine.next_generation().unwrap();
        assert_eq!(engine.generation_no(), 1);
    }

    #[test]
    fn test_rule_management() {
        let engine = engine(8, 8);
        assert_eq!(engine.rule_library().len(), 2);
        assert_eq!(engine.select_rule(1).unwrap().name, "Replicator");
        assert_eq!(engine.active_rule().to_string(), "S1357/B1357");
        engine.select_rule_by_name("Conway's Life").unwrap();
        assert_eq!(engine.active_rule(), LifeRule::CONWAY);

        let entry = engine.add_rule("HighLife", "B36/S23", "").unwrap();
        assert_eq!(entry.index, 2);
        assert!(engine.set_rule_string(Some("B36/S23")));
        assert!(!engine.set_rule_string(Some("nonsense")));
        assert_eq!(engine.active_rule(), LifeRule::CONWAY);
    }

    #[test]
    fn test_display_shows_current_generation() {
        let mut engine = engine(3, 3);
        engine.set_cell_state(1, 1, true);
        assert_eq!(engine.to_string(), "...\n.O.\n...\n");
    }
}
