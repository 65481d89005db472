//! Board model: cell kinds, the level container, and stable jewel ids.
//!
//! A [`Level`] is a parsed, well-formed puzzle: a rectangular [`Board`] plus
//! the move budget. Everything the solver derives (move graph, metric, SCCs)
//! is keyed off coordinates into this board.

pub mod io;

use std::fmt;

use crate::core::coord::Coord;
use crate::core::grid::Grid;

/// What occupies a single board cell.
///
/// `Invalid` marks cells the text format never assigned; the reader skips
/// unknown glyphs, so a well-formed level contains none inside its interior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Wall,
    Jewel,
    Mine,
    Hole,
    Vehicle,
    Blank,
    Invalid,
}

impl CellKind {
    pub fn from_char(c: char) -> CellKind {
        match c {
            '#' => CellKind::Wall,
            '+' => CellKind::Jewel,
            '*' => CellKind::Mine,
            'O' => CellKind::Hole,
            '.' => CellKind::Vehicle,
            ' ' => CellKind::Blank,
            _ => CellKind::Invalid,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            CellKind::Wall => '#',
            CellKind::Jewel => '+',
            CellKind::Mine => '*',
            CellKind::Hole => 'O',
            CellKind::Vehicle => '.',
            CellKind::Blank => ' ',
            CellKind::Invalid => '?',
        }
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    cells: Grid<CellKind>,
}

impl Board {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            cells: Grid::new(width, height, CellKind::Invalid),
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.cells.width()
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.cells.height()
    }

    #[inline]
    pub fn cell(&self, c: Coord) -> CellKind {
        self.cells[c]
    }

    /// Cell at `c`, treating anything outside the grid as wall. Well-formed
    /// levels are walled on the border already; this keeps the slide walk
    /// total on levels that leave the outermost ring implicit.
    #[inline]
    pub fn cell_or_wall(&self, c: Coord) -> CellKind {
        if self.cells.contains(c) {
            self.cells[c]
        } else {
            CellKind::Wall
        }
    }

    #[inline]
    pub fn set_cell(&mut self, c: Coord, kind: CellKind) {
        self.cells[c] = kind;
    }

    /// Column-major scan over all cells.
    pub fn iter_with_coords(&self) -> impl Iterator<Item = (Coord, CellKind)> + '_ {
        self.cells.iter_with_coords().map(|(c, &k)| (c, k))
    }

    /// Coordinates of the vehicle cell, if any. With several vehicle glyphs
    /// the last one in scan order wins; the reader rejects such levels.
    pub fn vehicle_coords(&self) -> Option<Coord> {
        let mut found = None;
        for (c, kind) in self.iter_with_coords() {
            if kind == CellKind::Vehicle {
                found = Some(c);
            }
        }
        found
    }

    pub fn count_jewels(&self) -> usize {
        self.iter_with_coords()
            .filter(|&(_, k)| k == CellKind::Jewel)
            .count()
    }
}

/// A board plus the move budget the emitted solution must respect.
#[derive(Debug, Clone)]
pub struct Level {
    board: Board,
    max_moves: i32,
}

impl Level {
    pub fn new(board: Board, max_moves: i32) -> Self {
        Self { board, max_moves }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn max_moves(&self) -> i32 {
        self.max_moves
    }

    pub fn set_max_moves(&mut self, max_moves: i32) {
        self.max_moves = max_moves;
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.board.width()
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.board.height()
    }

    #[inline]
    pub fn cell(&self, c: Coord) -> CellKind {
        self.board.cell(c)
    }

    #[inline]
    pub fn cell_or_wall(&self, c: Coord) -> CellKind {
        self.board.cell_or_wall(c)
    }

    pub fn vehicle_coords(&self) -> Option<Coord> {
        self.board.vehicle_coords()
    }
}

pub type JewelId = usize;

/// Stable numeric ids for the collectible cells, assigned in column-major
/// scan order.
#[derive(Debug, Clone)]
pub struct JewelIndex {
    id_at: Grid<Option<JewelId>>,
    count: usize,
}

impl JewelIndex {
    pub fn new(board: &Board) -> Self {
        let mut id_at = Grid::new(board.width(), board.height(), None);
        let mut count = 0;
        for (c, kind) in board.iter_with_coords() {
            if kind == CellKind::Jewel {
                id_at[c] = Some(count);
                count += 1;
            }
        }
        Self { id_at, count }
    }

    #[inline]
    pub fn id_at(&self, c: Coord) -> Option<JewelId> {
        self.id_at[c]
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Errors of the text I/O collaborator. The solver core itself never errors;
/// a failed solve is a non-existent [`crate::solver::solution::Solution`].
#[derive(Debug)]
pub enum LevelError {
    Parse {
        stage: &'static str,
        reason: String,
    },
    Io {
        stage: &'static str,
        error: String,
    },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Parse { stage, reason } => {
                write!(f, "malformed level at {stage}: {reason}")
            }
            LevelError::Io { stage, error } => write!(f, "io error at {stage}: {error}"),
        }
    }
}

impl std::error::Error for LevelError {}
