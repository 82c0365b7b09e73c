use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use gridwalk_game::{
    FallbackPolicy, Grid, GridData, GridLoader, GridWalkEngine, NullRenderer, RunConfig,
    RunSession, RunSummary, StaticGridLoader,
};
use thiserror::Error;

use crate::logic::grids::{GridShape, random_grid, seeded_rng};

const BUNDLED_GRID: &str = include_str!("../../assets/grid-data.json");

/// Failures while reading a grid file from disk.
#[derive(Debug, Error)]
pub enum GridFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Grid source backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileGridLoader {
    path: PathBuf,
}

impl FileGridLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GridLoader for FileGridLoader {
    type Error = GridFileError;

    fn load_grid_data(&self) -> Result<GridData, Self::Error> {
        let raw = fs::read_to_string(&self.path).map_err(|source| GridFileError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| GridFileError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

/// Immutable data shared by every scenario run.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    default_grid: Grid,
}

impl TesterAssets {
    /// Use the grid bundled with the tester.
    pub fn load_default() -> Self {
        let default_grid = Grid::from_json(BUNDLED_GRID).unwrap_or_else(|err| {
            log::warn!("bundled grid invalid ({err}); using a 1x1 grid");
            Self::fallback_grid()
        });
        Self { default_grid }
    }

    /// Load the default grid from a file instead of the bundled asset.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let engine = GridWalkEngine::new(FileGridLoader::new(path));
        let default_grid = engine
            .load_grid()
            .with_context(|| format!("loading grid from {}", path.display()))?;
        Ok(Self { default_grid })
    }

    fn fallback_grid() -> Grid {
        Grid::from_data(GridData {
            rows: 1,
            cols: 1,
            data: vec![vec![0]],
        })
        .unwrap_or_else(|_| unreachable!("1x1 grid is rectangular"))
    }

    pub const fn default_grid(&self) -> &Grid {
        &self.default_grid
    }
}

/// Where a plan takes its grid from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridSource {
    /// The tester's default grid.
    Default,
    /// A grid generated from the iteration seed.
    Random(GridShape),
    /// A fixed grid given inline.
    Inline(Vec<Vec<i64>>),
}

/// Assertion hook run after a plan completes.
type RunExpectationFn = Arc<dyn Fn(&RunOutcome) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct RunExpectation(RunExpectationFn);

impl fmt::Debug for RunExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunExpectation").finish()
    }
}

impl RunExpectation {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RunOutcome) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn check(&self, outcome: &RunOutcome) -> Result<()> {
        (self.0)(outcome)
    }
}

impl<F> From<F> for RunExpectation
where
    F: Fn(&RunOutcome) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// Hook that mutates a freshly started session before the first tick.
pub type RunSetup = fn(&mut RunSession, u64);

/// Description of one kind of run plus the checks applied to it.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub grid: GridSource,
    /// 0-based start column; derived from the seed when unset.
    pub column: Option<usize>,
    /// Vertical threshold; derived from the seed when unset.
    pub threshold: Option<i64>,
    pub fallback: FallbackPolicy,
    pub setup: Option<RunSetup>,
    pub expectations: Vec<RunExpectation>,
}

impl RunPlan {
    #[must_use]
    pub const fn new(grid: GridSource) -> Self {
        Self {
            grid,
            column: None,
            threshold: None,
            fallback: FallbackPolicy::ForceUp,
            setup: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    #[must_use]
    pub const fn with_threshold(mut self, threshold: i64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    #[must_use]
    pub const fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: RunSetup) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<RunExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Everything a run produced, handed to expectations.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub seed: u64,
    pub grid: Grid,
    pub config: RunConfig,
    /// Cells marked visited by the plan's setup hook before the first tick.
    pub preblocked: Vec<gridwalk_game::Position>,
    pub summary: RunSummary,
    pub tick_budget: usize,
}

impl RunOutcome {
    /// Start a fresh session on the same grid and configuration.
    pub fn replay(&self) -> Result<RunSession> {
        RunSession::new(self.grid.clone(), self.config.clone()).context("replaying run")
    }
}

#[derive(Debug, Clone)]
pub struct GameTester {
    verbose: bool,
    assets: Arc<TesterAssets>,
}

impl GameTester {
    pub const fn new(assets: Arc<TesterAssets>, verbose: bool) -> Self {
        Self { verbose, assets }
    }

    pub fn try_new(verbose: bool) -> Self {
        Self::new(Arc::new(TesterAssets::load_default()), verbose)
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn assets(&self) -> &TesterAssets {
        &self.assets
    }

    fn resolve_grid(&self, source: &GridSource, seed: u64) -> Result<Grid> {
        match source {
            GridSource::Default => Ok(self.assets.default_grid().clone()),
            GridSource::Random(shape) => Ok(random_grid(*shape, seed)),
            GridSource::Inline(rows) => {
                let loader = StaticGridLoader::new(GridData::from_rows(rows.clone()));
                GridWalkEngine::new(loader)
                    .load_grid()
                    .context("inline grid is not rectangular")
            }
        }
    }

    /// Build the run configuration a plan resolves to for `seed`.
    pub fn resolve_config(&self, plan: &RunPlan, grid: &Grid, seed: u64) -> RunConfig {
        use rand::Rng;

        let mut rng = seeded_rng(seed ^ 0x5EED_C0DE);
        let column = plan
            .column
            .unwrap_or_else(|| rng.gen_range(0..grid.cols()));
        let threshold = plan.threshold.unwrap_or_else(|| rng.gen_range(-10..=30));
        RunConfig::new(column, threshold).with_fallback(plan.fallback)
    }

    /// Run a plan to completion for a single seed.
    pub fn run_plan(&self, plan: &RunPlan, seed: u64) -> Result<RunOutcome> {
        let grid = self.resolve_grid(&plan.grid, seed)?;
        let config = self.resolve_config(plan, &grid, seed);
        let mut session =
            RunSession::new(grid, config.clone()).context("starting run for plan")?;
        if let Some(setup) = plan.setup {
            setup(&mut session, seed);
        }
        let preblocked = session.state().visited.iter().copied().collect();
        let tick_budget = session.tick_budget();
        let summary = session.run_to_completion(&mut NullRenderer);

        if self.verbose {
            log::debug!(
                "seed {seed}: {:?} after {} ticks, score {}",
                summary.status,
                summary.ticks,
                summary.score
            );
        }

        Ok(RunOutcome {
            seed,
            grid: session.into_grid(),
            config,
            preblocked,
            summary,
            tick_budget,
        })
    }
}
