use crate::grid::{Grid, Position};
use crate::render::{Renderer, render_step};
use crate::run::{RunConfig, RunError, RunState, RunStatus, RunSummary, Step, TickOutcome, tick};

/// High-level wrapper binding a loaded grid to the state of its current run.
#[derive(Debug, Clone)]
pub struct RunSession {
    grid: Grid,
    state: RunState,
    steps: Vec<Step>,
}

impl RunSession {
    /// Start a run on `grid` with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the start column is not on the grid.
    pub fn new(grid: Grid, config: RunConfig) -> Result<Self, RunError> {
        let state = RunState::start(&grid, config)?;
        Ok(Self {
            grid,
            state,
            steps: Vec::new(),
        })
    }

    /// Advance the run by one tick.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = tick(&self.grid, &mut self.state);
        if let Some(step) = outcome.step() {
            self.steps.push(*step);
        }
        outcome
    }

    /// Advance by one tick and forward the result to `renderer`.
    pub fn tick_with<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> TickOutcome {
        let outcome = self.tick();
        if let Some(step) = outcome.step() {
            render_step(renderer, step);
        }
        if outcome.step().is_some_and(|_| self.is_finished())
            || matches!(outcome, TickOutcome::Blocked)
        {
            renderer.on_finish(self.state.status, self.state.score);
        }
        outcome
    }

    /// Discard the current run and start a fresh one from `start_column`,
    /// keeping threshold, fallback and cadence.
    ///
    /// # Errors
    ///
    /// Returns an error if the new start column is not on the grid; the
    /// current run is left untouched in that case.
    pub fn reset(&mut self, start_column: usize) -> Result<(), RunError> {
        let config = RunConfig {
            start_column,
            ..self.state.config.clone()
        };
        self.state = RunState::start(&self.grid, config)?;
        self.steps.clear();
        Ok(())
    }

    /// [`Self::reset`], then announce the new start to `renderer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the new start column is not on the grid.
    pub fn reset_with<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        start_column: usize,
    ) -> Result<(), RunError> {
        self.reset(start_column)?;
        renderer.on_reset(&self.grid, self.state.position);
        Ok(())
    }

    /// Tick until the run finishes, bounded by [`Self::tick_budget`].
    pub fn run_to_completion<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> RunSummary {
        crate::scheduler::drive_to_completion(self, renderer)
    }

    /// Upper bound on ticks any run over this grid can take: one per cell for
    /// selector moves plus one per row for forced upward moves.
    #[must_use]
    pub fn tick_budget(&self) -> usize {
        self.grid.rows() * self.grid.cols() + self.grid.rows()
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            start: self.state.start,
            position: self.state.position,
            score: self.state.score,
            ticks: self.state.ticks,
            status: self.state.status,
            steps: self.steps.clone(),
        }
    }

    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    /// Borrow the run state mutably, e.g. to pre-block cells.
    pub const fn state_mut(&mut self) -> &mut RunState {
        &mut self.state
    }

    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.state.config
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.state.position
    }

    #[must_use]
    pub const fn score(&self) -> i64 {
        self.state.score
    }

    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.state.status
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.state.status.is_finished()
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Consume the session, returning the grid it was running on.
    #[must_use]
    pub fn into_grid(self) -> Grid {
        self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::TraceRenderer;

    fn session(rows: Vec<Vec<i64>>, column: usize, threshold: i64) -> RunSession {
        let grid = Grid::from_rows(rows).unwrap();
        RunSession::new(grid, RunConfig::new(column, threshold)).unwrap()
    }

    #[test]
    fn reset_mid_run_clears_score_and_visited() {
        let mut session = session(vec![vec![1, 1], vec![4, 4], vec![7, 7]], 0, 10);
        session.tick();
        assert!(session.score() > 0);
        assert_eq!(session.state().visited.len(), 1);

        session.reset(1).unwrap();
        assert_eq!(session.score(), 0);
        assert_eq!(session.position(), Position::new(2, 1));
        assert!(session.state().visited.is_empty());
        assert!(session.steps().is_empty());
        assert_eq!(session.status(), RunStatus::Running);
        assert_eq!(session.config().vertical_threshold, 10);
    }

    #[test]
    fn failed_reset_keeps_current_run() {
        let mut session = session(vec![vec![1], vec![2]], 0, 10);
        assert!(session.reset(3).is_err());
        assert_eq!(session.position(), Position::new(1, 0));
    }

    #[test]
    fn tick_with_reports_steps_and_finish() {
        let mut session = session(vec![vec![3, 9], vec![2, 8]], 1, 2);
        let mut trace = TraceRenderer::new();
        session.reset_with(&mut trace, 1).unwrap();

        let summary = session.run_to_completion(&mut trace);
        assert_eq!(summary.status, RunStatus::ReachedTop);
        assert_eq!(
            trace.path(),
            vec![Position::new(1, 1), Position::new(1, 0), Position::new(0, 0)]
        );
        assert_eq!(trace.finish, Some((RunStatus::ReachedTop, 5)));
        assert_eq!(summary.score, 5);
        assert_eq!(summary.steps.len(), 2);
    }

    #[test]
    fn tick_budget_covers_cells_and_rows() {
        let session = session(vec![vec![0; 4]; 3], 0, 0);
        assert_eq!(session.tick_budget(), 15);
    }
}
