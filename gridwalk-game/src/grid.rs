//! Grid storage, coordinates, and the JSON wire format grids arrive in.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Row/column coordinate into a grid, 0-indexed from the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Cell directly above, or `None` on the top row.
    #[must_use]
    pub fn up(self) -> Option<Self> {
        self.row.checked_sub(1).map(|row| Self::new(row, self.col))
    }

    /// Cell directly to the left, or `None` on the first column.
    #[must_use]
    pub fn left(self) -> Option<Self> {
        self.col.checked_sub(1).map(|col| Self::new(self.row, col))
    }

    /// Cell directly to the right. May fall off the grid; callers check bounds.
    #[must_use]
    pub fn right(self) -> Option<Self> {
        self.col.checked_add(1).map(|col| Self::new(self.row, col))
    }

    #[must_use]
    pub const fn is_top_row(self) -> bool {
        self.row == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Errors raised when grid data does not describe a rectangular grid.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid must have at least one row and one column (got {rows}x{cols})")]
    Empty { rows: usize, cols: usize },
    #[error("grid declares {declared} rows but carries {actual}")]
    RowCountMismatch { declared: usize, actual: usize },
    #[error("row {row} has {actual} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("grid data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Grid payload as served by a grid source: `{rows, cols, data}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridData {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<i64>>,
}

impl GridData {
    /// Parse a grid payload from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a grid payload.
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a payload from rows of cell values, deriving the dimensions.
    #[must_use]
    pub fn from_rows(data: Vec<Vec<i64>>) -> Self {
        let rows = data.len();
        let cols = data.first().map_or(0, Vec::len);
        Self { rows, cols, data }
    }
}

/// Rectangular table of integer cells. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridData", into = "GridData")]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<i64>,
}

impl Grid {
    /// Validate a payload and flatten it into row-major storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is empty, its row count disagrees with
    /// `rows`, or any row is not `cols` cells long.
    pub fn from_data(data: GridData) -> Result<Self, GridError> {
        let GridData { rows, cols, data } = data;
        if rows == 0 || cols == 0 {
            return Err(GridError::Empty { rows, cols });
        }
        if data.len() != rows {
            return Err(GridError::RowCountMismatch {
                declared: rows,
                actual: data.len(),
            });
        }
        let mut cells = Vec::with_capacity(rows * cols);
        for (row, values) in data.into_iter().enumerate() {
            if values.len() != cols {
                return Err(GridError::RowLength {
                    row,
                    expected: cols,
                    actual: values.len(),
                });
            }
            cells.extend(values);
        }
        Ok(Self { rows, cols, cells })
    }

    /// Build a grid straight from rows of values.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows are empty or ragged.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self, GridError> {
        Self::from_data(GridData::from_rows(rows))
    }

    /// Parse and validate a grid from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the grid is not rectangular.
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        Self::from_data(GridData::from_json(json)?)
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub const fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Value of an on-grid cell, `None` when the position is off the grid.
    #[must_use]
    pub fn value(&self, pos: Position) -> Option<i64> {
        if self.contains(pos) {
            self.cells.get(pos.row * self.cols + pos.col).copied()
        } else {
            None
        }
    }

    /// Bottom-row position for a 0-based start column.
    #[must_use]
    pub fn bottom(&self, col: usize) -> Option<Position> {
        let pos = Position::new(self.rows - 1, col);
        self.contains(pos).then_some(pos)
    }

    /// Iterate rows as slices, top to bottom.
    pub fn row_slices(&self) -> impl Iterator<Item = &[i64]> {
        self.cells.chunks(self.cols)
    }
}

impl TryFrom<GridData> for Grid {
    type Error = GridError;

    fn try_from(data: GridData) -> Result<Self, Self::Error> {
        Self::from_data(data)
    }
}

impl From<Grid> for GridData {
    fn from(grid: Grid) -> Self {
        let data = grid.row_slices().map(<[i64]>::to_vec).collect();
        Self {
            rows: grid.rows,
            cols: grid.cols,
            data,
        }
    }
}
