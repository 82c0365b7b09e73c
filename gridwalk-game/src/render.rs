//! Rendering seam between a run and whatever displays it.
use crate::grid::{Grid, Position};
use crate::run::{RunStatus, Step};

/// Receives run progress. Implementations decide how (or whether) to draw it.
pub trait Renderer {
    /// A run was (re)started with the marker at `start`.
    fn on_reset(&mut self, grid: &Grid, start: Position);

    /// The marker moved from `before` to `after`; `score` is the new total.
    fn on_step(&mut self, before: Position, after: Position, score: i64);

    /// The run stopped.
    fn on_finish(&mut self, _status: RunStatus, _score: i64) {}
}

/// Renderer that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn on_reset(&mut self, _grid: &Grid, _start: Position) {}

    fn on_step(&mut self, _before: Position, _after: Position, _score: i64) {}
}

/// Renderer that records every callback, used by tests and trace exports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceRenderer {
    pub resets: Vec<Position>,
    pub steps: Vec<(Position, Position, i64)>,
    pub finish: Option<(RunStatus, i64)>,
}

impl TraceRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marker positions in visiting order, starting with the latest reset.
    #[must_use]
    pub fn path(&self) -> Vec<Position> {
        let mut path: Vec<Position> = self.resets.last().copied().into_iter().collect();
        path.extend(self.steps.iter().map(|(_, after, _)| *after));
        path
    }
}

impl Renderer for TraceRenderer {
    fn on_reset(&mut self, _grid: &Grid, start: Position) {
        self.resets.push(start);
        self.steps.clear();
        self.finish = None;
    }

    fn on_step(&mut self, before: Position, after: Position, score: i64) {
        self.steps.push((before, after, score));
    }

    fn on_finish(&mut self, status: RunStatus, score: i64) {
        self.finish = Some((status, score));
    }
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn on_reset(&mut self, grid: &Grid, start: Position) {
        (**self).on_reset(grid, start);
    }

    fn on_step(&mut self, before: Position, after: Position, score: i64) {
        (**self).on_step(before, after, score);
    }

    fn on_finish(&mut self, status: RunStatus, score: i64) {
        (**self).on_finish(status, score);
    }
}

/// Forward a step to a renderer.
pub(crate) fn render_step<R: Renderer + ?Sized>(renderer: &mut R, step: &Step) {
    renderer.on_step(step.from, step.to, step.score);
}
