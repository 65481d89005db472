//! The solution value and its replay validator.

use crate::board::{CellKind, JewelIndex, Level};
use crate::core::coord::Coord;
use crate::core::direction::Direction;

/// An ordered direction sequence, or the statement that none exists.
///
/// The empty existing solution is valid (a level with no jewels needs no
/// moves); `invalid()` is the single non-existent value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    exists: bool,
    moves: Vec<Direction>,
}

impl Solution {
    pub fn empty() -> Solution {
        Solution {
            exists: true,
            moves: Vec::new(),
        }
    }

    pub fn invalid() -> Solution {
        Solution {
            exists: false,
            moves: Vec::new(),
        }
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn set_exists(&mut self, exists: bool) {
        self.exists = exists;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize) -> Direction {
        self.moves[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        self.moves.iter().copied()
    }

    pub fn push(&mut self, dir: Direction) {
        self.moves.push(dir);
    }

    pub fn pop(&mut self) -> Direction {
        self.moves.pop().expect("pop from a non-empty solution")
    }

    pub fn append(&mut self, path: &[Direction]) {
        self.moves.extend_from_slice(path);
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }

    /// Shorter beats longer; anything beats non-existence.
    pub fn is_better_than(&self, other: &Solution) -> bool {
        !other.exists() || self.len() < other.len()
    }

    /// Replace `length` moves starting at `start` with `replacement`, which
    /// must not be longer than the slice it replaces.
    pub fn replace(&mut self, start: usize, length: usize, replacement: &[Direction]) {
        assert!(replacement.len() <= length);
        let shrink = length - replacement.len();
        self.moves.drain(start..start + shrink);
        self.moves[start..start + replacement.len()].copy_from_slice(replacement);
    }
}

/// Replay a solution cell by cell under the slide rule and check that it
/// collects every jewel without ever crossing a mine.
///
/// This is the ground-truth validator: it walks the board directly and does
/// not consult the move graph.
pub fn replay_collects_all(
    level: &Level,
    jewels: &JewelIndex,
    vehicle: Coord,
    solution: &Solution,
    vehicle_spot_is_hole: bool,
) -> bool {
    let mut collected = vec![false; jewels.count()];
    let mut pos = vehicle;

    for dir in solution.iter() {
        let step = dir.offset();

        loop {
            let next = pos + step;

            match level.cell(pos) {
                CellKind::Invalid | CellKind::Mine => return false,
                CellKind::Jewel => {
                    collected[jewels.id_at(pos).expect("jewel cells are indexed")] = true;
                }
                _ => {}
            }

            if level.cell_or_wall(next) == CellKind::Wall {
                break;
            }

            pos = next;

            let kind = level.cell(pos);
            if kind == CellKind::Hole || (kind == CellKind::Vehicle && vehicle_spot_is_hole) {
                break;
            }
        }
    }

    collected.into_iter().all(|c| c)
}
