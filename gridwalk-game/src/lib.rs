//! Grid Walk Engine
//!
//! Platform-agnostic core logic for Grid Walk: a marker climbs a numeric grid
//! from the bottom row, greedily entering the cheapest neighbour each tick.
//! This crate provides the move selector, run state and drivers without any
//! UI or platform-specific dependencies.

pub mod constants;
pub mod grid;
pub mod render;
pub mod run;
pub mod scheduler;
pub mod selector;
pub mod session;

// Re-export commonly used types
pub use grid::{Grid, GridData, GridError, Position};
pub use render::{NullRenderer, Renderer, TraceRenderer};
pub use run::{
    FallbackPolicy, RunConfig, RunError, RunState, RunStatus, RunSummary, Step, TickOutcome, tick,
};
#[cfg(feature = "async")]
pub use scheduler::drive_on_interval;
pub use scheduler::drive_to_completion;
pub use selector::{
    Candidate, Direction, Selection, VisitedSet, select_move, select_move_with_reason,
};
pub use session::RunSession;

use constants::LOG_TARGET_ENGINE;
use thiserror::Error;

/// Trait for abstracting grid loading.
/// Platform-specific implementations should provide this
pub trait GridLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the grid payload from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the grid data cannot be fetched or parsed.
    fn load_grid_data(&self) -> Result<GridData, Self::Error>;
}

/// Loader serving a payload held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticGridLoader {
    data: GridData,
}

impl StaticGridLoader {
    #[must_use]
    pub const fn new(data: GridData) -> Self {
        Self { data }
    }

    /// Build a loader from a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a grid payload.
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        GridData::from_json(json).map(Self::new)
    }
}

impl GridLoader for StaticGridLoader {
    type Error = std::convert::Infallible;

    fn load_grid_data(&self) -> Result<GridData, Self::Error> {
        Ok(self.data.clone())
    }
}

/// Failures while opening a run through [`GridWalkEngine`].
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("failed to load grid data: {0}")]
    Load(#[source] E),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Run(#[from] RunError),
}

/// Entry point pairing a grid source with run creation
pub struct GridWalkEngine<L>
where
    L: GridLoader,
{
    loader: L,
}

impl<L> GridWalkEngine<L>
where
    L: GridLoader,
{
    /// Create a new engine with the provided grid loader
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load and validate the grid.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the payload is not a rectangular
    /// grid. Failures are logged before being returned.
    pub fn load_grid(&self) -> Result<Grid, EngineError<L::Error>> {
        let data = self.loader.load_grid_data().map_err(|err| {
            log::error!(target: LOG_TARGET_ENGINE, "Error loading grid data: {err}");
            EngineError::Load(err)
        })?;
        Grid::from_data(data).map_err(|err| {
            log::error!(target: LOG_TARGET_ENGINE, "Error loading grid data: {err}");
            EngineError::Grid(err)
        })
    }

    /// Load a fresh grid and start a run on it. On failure no run is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the grid cannot be loaded or the start column is
    /// outside it.
    pub fn start_run(&self, config: RunConfig) -> Result<RunSession, EngineError<L::Error>> {
        let grid = self.load_grid()?;
        log::info!(
            target: LOG_TARGET_ENGINE,
            "loaded {}x{} grid",
            grid.rows(),
            grid.cols()
        );
        Ok(RunSession::new(grid, config)?)
    }

    /// Borrow the loader.
    pub const fn loader(&self) -> &L {
        &self.loader
    }
}
