//! Run state and the per-tick step function.
//!
//! A run owns nothing global: the driver creates a [`RunState`] on start,
//! hands it to [`tick`] once per scheduled tick, and throws it away on reset.
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
    DEFAULT_START_COLUMN, DEFAULT_TICK_INTERVAL_MS, DEFAULT_VERTICAL_THRESHOLD, LOG_TARGET_RUN,
};
use crate::grid::{Grid, Position};
use crate::selector::{Direction, VisitedSet, select_move_with_reason};

/// What the driver does when the selector finds no eligible neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Step straight up even into a visited cell, unless already on the top row.
    #[default]
    ForceUp,
    /// Stop the run as blocked.
    Halt,
}

/// Per-run settings supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// 0-based bottom-row column the marker starts from.
    #[serde(default = "RunConfig::default_start_column")]
    pub start_column: usize,
    #[serde(default = "RunConfig::default_vertical_threshold")]
    pub vertical_threshold: i64,
    #[serde(default)]
    pub fallback: FallbackPolicy,
    #[serde(
        default = "RunConfig::default_tick_interval",
        with = "duration_millis"
    )]
    pub tick_interval: Duration,
}

impl RunConfig {
    const fn default_start_column() -> usize {
        DEFAULT_START_COLUMN
    }

    const fn default_vertical_threshold() -> i64 {
        DEFAULT_VERTICAL_THRESHOLD
    }

    const fn default_tick_interval() -> Duration {
        Duration::from_millis(DEFAULT_TICK_INTERVAL_MS)
    }

    #[must_use]
    pub fn new(start_column: usize, vertical_threshold: i64) -> Self {
        Self {
            start_column,
            vertical_threshold,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub const fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_column: Self::default_start_column(),
            vertical_threshold: Self::default_vertical_threshold(),
            fallback: FallbackPolicy::default(),
            tick_interval: Self::default_tick_interval(),
        }
    }
}

/// Errors raised when a run cannot be started.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    #[error("start column {column} is outside the grid (0..{cols})")]
    StartColumnOutOfRange { column: usize, cols: usize },
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    ReachedTop,
    Blocked,
}

impl RunStatus {
    #[must_use]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// One applied marker move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub tick: u32,
    pub direction: Direction,
    pub from: Position,
    pub to: Position,
    /// Value of the entered cell.
    pub value: i64,
    /// Score after entering the cell.
    pub score: i64,
    /// Entered by the force-up fallback rather than chosen by the selector.
    #[serde(default)]
    pub forced: bool,
}

/// Result of a single [`tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// The selector picked a neighbour and the marker moved there.
    Moved(Step),
    /// Nothing was eligible; the marker was forced straight up.
    Fallback(Step),
    /// Nothing was eligible and no fallback applied; the run is over.
    Blocked,
    /// The run had already finished; nothing changed.
    Idle,
}

impl TickOutcome {
    #[must_use]
    pub const fn step(&self) -> Option<&Step> {
        match self {
            Self::Moved(step) | Self::Fallback(step) => Some(step),
            Self::Blocked | Self::Idle => None,
        }
    }
}

/// Mutable state of the current run: marker, visited cells, score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub config: RunConfig,
    pub position: Position,
    pub start: Position,
    pub visited: VisitedSet,
    pub score: i64,
    pub ticks: u32,
    pub status: RunStatus,
}

impl RunState {
    /// Place the marker on the bottom row at `config.start_column`.
    ///
    /// # Errors
    ///
    /// Returns an error if the start column is not on the grid.
    pub fn start(grid: &Grid, config: RunConfig) -> Result<Self, RunError> {
        let start = grid
            .bottom(config.start_column)
            .ok_or(RunError::StartColumnOutOfRange {
                column: config.start_column,
                cols: grid.cols(),
            })?;
        let status = if start.is_top_row() {
            RunStatus::ReachedTop
        } else {
            RunStatus::Running
        };
        log::info!(
            target: LOG_TARGET_RUN,
            "run started at {start} (threshold {}, fallback {:?})",
            config.vertical_threshold,
            config.fallback
        );
        Ok(Self {
            config,
            position: start,
            start,
            visited: VisitedSet::new(),
            score: 0,
            ticks: 0,
            status,
        })
    }

    /// Record a cell as already occupied, e.g. to pre-block cells before the first tick.
    pub fn mark_visited(&mut self, pos: Position) {
        self.visited.insert(pos);
    }

    #[must_use]
    pub fn has_visited(&self, pos: Position) -> bool {
        self.visited.contains(&pos)
    }

    fn enter(&mut self, grid: &Grid, direction: Direction, to: Position, forced: bool) -> Step {
        let value = grid.value(to).unwrap_or_default();
        let from = self.position;
        self.ticks = self.ticks.saturating_add(1);
        self.score = self.score.saturating_add(value);
        self.position = to;
        self.visited.insert(to);
        if to.is_top_row() {
            self.status = RunStatus::ReachedTop;
        }
        Step {
            tick: self.ticks,
            direction,
            from,
            to,
            value,
            score: self.score,
            forced,
        }
    }
}

/// Advance a run by one tick.
pub fn tick(grid: &Grid, state: &mut RunState) -> TickOutcome {
    if state.status.is_finished() {
        return TickOutcome::Idle;
    }

    let selection = select_move_with_reason(
        grid,
        state.position,
        &state.visited,
        state.config.vertical_threshold,
    );

    if let Some((direction, to)) = selection.choice {
        let step = state.enter(grid, direction, to, false);
        log::debug!(
            target: LOG_TARGET_RUN,
            "tick {}: {:?} {} -> {} (+{}) score {}",
            step.tick,
            direction,
            step.from,
            step.to,
            step.value,
            step.score
        );
        if state.status.is_finished() {
            log::info!(target: LOG_TARGET_RUN, "reached top row with score {}", state.score);
        }
        return TickOutcome::Moved(step);
    }

    let forced_up = match state.config.fallback {
        FallbackPolicy::ForceUp => state.position.up().filter(|pos| grid.contains(*pos)),
        FallbackPolicy::Halt => None,
    };

    if let Some(to) = forced_up {
        let step = state.enter(grid, Direction::Up, to, true);
        log::debug!(
            target: LOG_TARGET_RUN,
            "tick {}: no eligible neighbour, forced up {} -> {} score {}",
            step.tick,
            step.from,
            step.to,
            step.score
        );
        return TickOutcome::Fallback(step);
    }

    state.status = RunStatus::Blocked;
    log::info!(
        target: LOG_TARGET_RUN,
        "blocked at {} with score {}",
        state.position,
        state.score
    );
    TickOutcome::Blocked
}

/// Snapshot of a finished (or abandoned) run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub start: Position,
    pub position: Position,
    pub score: i64,
    pub ticks: u32,
    pub status: RunStatus,
    pub steps: Vec<Step>,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
