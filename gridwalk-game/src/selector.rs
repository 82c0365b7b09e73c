//! Greedy next-cell selection.
//!
//! Single-step lookahead over the up, left and right neighbours of the
//! marker. Up is taken whenever it is eligible and cheaper than the vertical
//! threshold; otherwise the sides compete against whatever up offered, left
//! before right, and only a strictly lower value displaces the current pick.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;

use crate::grid::{Grid, Position};

/// Positions entered by a move during the current run.
pub type VisitedSet = BTreeSet<Position>;

/// Direction of a single marker step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Left,
    Right,
}

impl Direction {
    /// Evaluation order used by the selector.
    pub const ORDER: [Self; 3] = [Self::Up, Self::Left, Self::Right];

    /// Neighbour of `from` in this direction, if it has a coordinate at all.
    #[must_use]
    pub fn step(self, from: Position) -> Option<Position> {
        match self {
            Self::Up => from.up(),
            Self::Left => from.left(),
            Self::Right => from.right(),
        }
    }
}

/// One neighbour as seen by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub direction: Direction,
    /// Target cell; `None` when the neighbour is off the grid.
    pub position: Option<Position>,
    /// Cell value; `None` stands for positive infinity.
    pub value: Option<i64>,
    pub visited: bool,
}

impl Candidate {
    fn probe(grid: &Grid, from: Position, direction: Direction, visited: &VisitedSet) -> Self {
        let position = direction.step(from).filter(|pos| grid.contains(*pos));
        let value = position.and_then(|pos| grid.value(pos));
        Self {
            direction,
            position,
            value,
            visited: position.is_some_and(|pos| visited.contains(&pos)),
        }
    }

    /// On-grid and not yet entered this run.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        self.value.is_some() && !self.visited
    }
}

/// Chosen move together with the neighbourhood it was picked from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub choice: Option<(Direction, Position)>,
    pub candidates: SmallVec<[Candidate; 3]>,
}

impl Selection {
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.choice.map(|(_, pos)| pos)
    }

    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        self.choice.map(|(direction, _)| direction)
    }
}

/// Pick the next cell for a marker at `position`, or `None` when up, left
/// and right are all off the grid or already visited.
#[must_use]
pub fn select_move(
    grid: &Grid,
    position: Position,
    visited: &VisitedSet,
    vertical_threshold: i64,
) -> Option<Position> {
    select_move_with_reason(grid, position, visited, vertical_threshold).position()
}

/// Same decision as [`select_move`], also reporting every candidate considered.
#[must_use]
pub fn select_move_with_reason(
    grid: &Grid,
    position: Position,
    visited: &VisitedSet,
    vertical_threshold: i64,
) -> Selection {
    let candidates: SmallVec<[Candidate; 3]> = Direction::ORDER
        .iter()
        .map(|&direction| Candidate::probe(grid, position, direction, visited))
        .collect();

    let up = &candidates[0];
    let mut best: Option<(Direction, Position, i64)> = match (up.position, up.value) {
        (Some(pos), Some(value)) if !up.visited => Some((Direction::Up, pos, value)),
        _ => None,
    };

    let lateral_open = best.is_none_or(|(_, _, value)| value >= vertical_threshold);
    if lateral_open {
        for side in &candidates[1..] {
            let (Some(pos), Some(value)) = (side.position, side.value) else {
                continue;
            };
            if side.visited {
                continue;
            }
            if best.is_none_or(|(_, _, current)| value < current) {
                best = Some((side.direction, pos, value));
            }
        }
    }

    Selection {
        choice: best.map(|(direction, pos, _)| (direction, pos)),
        candidates,
    }
}
