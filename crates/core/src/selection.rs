//! Drag selection over grid cells.
//!
//! A [`Selection`] is an immutable value: pointer-down creates one with a
//! `start` cell, each drag-move produces a new value via
//! [`Selection::with_end`], and the host keeps whichever value is current.
//! The rectangle is always derived on demand from `start`/`end`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A grid cell coordinate.
///
/// Well-formed cells have non-negative row and column. [`Cell::NONE`]
/// (`-1, -1`) is the sentinel for "no cell".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: i64,
    pub col: i64,
}

impl Cell {
    /// Sentinel coordinate for "no cell".
    pub const NONE: Cell = Cell { row: -1, col: -1 };

    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(i64, i64)> for Cell {
    fn from((row, col): (i64, i64)) -> Self {
        Self { row, col }
    }
}

/// A rectangular range of cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start_row: i64,
    pub start_col: i64,
    pub end_row: i64,
    pub end_col: i64,
}

impl CellRange {
    /// Create a new range, automatically normalizing so start <= end.
    pub fn new(r1: i64, c1: i64, r2: i64, c2: i64) -> Self {
        Self {
            start_row: r1.min(r2),
            start_col: c1.min(c2),
            end_row: r1.max(r2),
            end_col: c1.max(c2),
        }
    }

    /// Range spanning two corner cells in any order.
    pub fn spanning(a: Cell, b: Cell) -> Self {
        Self::new(a.row, a.col, b.row, b.col)
    }

    /// Create a single-cell range.
    pub fn single(cell: Cell) -> Self {
        Self::spanning(cell, cell)
    }

    pub fn contains(&self, row: i64, col: i64) -> bool {
        row >= self.start_row && row <= self.end_row &&
        col >= self.start_col && col <= self.end_col
    }

    /// Number of cells in this range.
    pub fn cell_count(&self) -> usize {
        let rows = (self.end_row - self.start_row + 1) as usize;
        let cols = (self.end_col - self.start_col + 1) as usize;
        rows * cols
    }

    /// Iterate over all cells in this range (row-major order).
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let start_col = self.start_col;
        let end_col = self.end_col;

        (self.start_row..=self.end_row).flat_map(move |r| {
            (start_col..=end_col).map(move |c| Cell::new(r, c))
        })
    }

    pub fn is_single(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }

    /// Corners in the fixed order top-left, top-right, bottom-left, bottom-right.
    pub fn corners(&self) -> [Cell; 4] {
        [
            Cell::new(self.start_row, self.start_col),
            Cell::new(self.start_row, self.end_col),
            Cell::new(self.end_row, self.start_col),
            Cell::new(self.end_row, self.end_col),
        ]
    }
}

/// Anchor/terminal pair describing the highlighted rectangle of a drag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    start: Option<Cell>,
    end: Option<Cell>,
}

impl Selection {
    /// The empty selection.
    pub const fn empty() -> Self {
        Self { start: None, end: None }
    }

    /// A selection from an optional anchor and optional terminal cell.
    ///
    /// A lone `end` is kept and behaves like a lone `start`.
    pub const fn new(start: Option<Cell>, end: Option<Cell>) -> Self {
        Self { start, end }
    }

    /// Single-cell selection anchored at `cell` (pointer-down).
    pub const fn at(cell: Cell) -> Self {
        Self { start: Some(cell), end: None }
    }

    /// The selection after dragging to `cell`. The anchor is unchanged.
    #[must_use]
    pub fn with_end(self, cell: Cell) -> Self {
        Self { start: self.start, end: Some(cell) }
    }

    /// The selection with a new anchor and no terminal cell.
    #[must_use]
    pub fn with_start(self, cell: Cell) -> Self {
        Self { start: Some(cell), end: None }
    }

    pub fn start(&self) -> Option<Cell> {
        self.start
    }

    pub fn end(&self) -> Option<Cell> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Normalized bounding range, or `None` for the empty selection.
    pub fn range(&self) -> Option<CellRange> {
        let (start, end) = match (self.start, self.end) {
            (None, None) => return None,
            (Some(s), Some(e)) => (s, e),
            (Some(s), None) => (s, s),
            (None, Some(e)) => (e, e),
        };
        Some(CellRange::spanning(start, end))
    }

    /// The four corners `[top-left, top-right, bottom-left, bottom-right]`.
    ///
    /// The empty selection yields four [`Cell::NONE`] corners. Recomputed on
    /// every call.
    pub fn rect(&self) -> [Cell; 4] {
        match self.range() {
            Some(range) => range.corners(),
            None => [Cell::NONE; 4],
        }
    }

    pub fn contains(&self, row: i64, col: i64) -> bool {
        self.range().is_some_and(|r| r.contains(row, col))
    }

    pub fn cell_count(&self) -> usize {
        self.range().map_or(0, |r| r.cell_count())
    }

    /// Human-readable form for diagnostics. Not meant for parsing.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Selection: None");
        }

        let side = |cell: Option<Cell>| match cell {
            Some(c) => c.to_string(),
            None => "undefined".to_string(),
        };
        let rect = serde_json::to_string(&self.rect()).map_err(|_| fmt::Error)?;

        write!(
            f,
            "Selection: Start = {}, End = {}, rect: {}",
            side(self.start),
            side(self.end),
            rect
        )
    }
}
