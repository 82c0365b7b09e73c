//! Terminal playback of a run.
use colored::Colorize;
use std::io::{self, Write};

use gridwalk_game::{Grid, Position, Renderer, RunStatus, VisitedSet};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Draws the grid after every step: `@` for the marker, dimmed values for
/// cells already walked over.
pub struct TerminalRenderer<W: Write> {
    out: W,
    grid: Option<Grid>,
    marker: Option<Position>,
    trail: VisitedSet,
    score: i64,
    clear_screen: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self {
            out,
            grid: None,
            marker: None,
            trail: VisitedSet::new(),
            score: 0,
            clear_screen,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn cell_width(grid: &Grid) -> usize {
        grid.row_slices()
            .flatten()
            .map(|value| value.to_string().len())
            .max()
            .unwrap_or(1)
            .max(1)
    }

    fn draw(&mut self) -> io::Result<()> {
        let Some(grid) = self.grid.as_ref() else {
            return Ok(());
        };
        if self.clear_screen {
            write!(self.out, "{CLEAR_SCREEN}")?;
        }
        let width = Self::cell_width(grid);
        for (row, values) in grid.row_slices().enumerate() {
            let mut line = String::new();
            for (col, value) in values.iter().enumerate() {
                let pos = Position::new(row, col);
                let cell = if self.marker == Some(pos) {
                    format!("{:>width$}", "@").bright_yellow().bold().to_string()
                } else if self.trail.contains(&pos) {
                    format!("{value:>width$}").dimmed().to_string()
                } else {
                    format!("{value:>width$}")
                };
                line.push_str(&cell);
                line.push(' ');
            }
            writeln!(self.out, "{}", line.trim_end())?;
        }
        writeln!(self.out, "Score: {}", self.score.to_string().bold())?;
        self.out.flush()
    }

    fn redraw(&mut self) {
        if let Err(err) = self.draw() {
            log::warn!("failed to draw grid: {err}");
        }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn on_reset(&mut self, grid: &Grid, start: Position) {
        self.grid = Some(grid.clone());
        self.marker = Some(start);
        self.trail.clear();
        self.trail.insert(start);
        self.score = 0;
        self.redraw();
    }

    fn on_step(&mut self, _before: Position, after: Position, score: i64) {
        self.marker = Some(after);
        self.trail.insert(after);
        self.score = score;
        self.redraw();
    }

    fn on_finish(&mut self, status: RunStatus, score: i64) {
        let label = match status {
            RunStatus::ReachedTop => "Reached the top row".green(),
            RunStatus::Blocked => "Blocked".red(),
            RunStatus::Running => "Stopped".yellow(),
        };
        if let Err(err) = writeln!(self.out, "{label} with score {score}") {
            log::warn!("failed to report finish: {err}");
        }
    }
}
