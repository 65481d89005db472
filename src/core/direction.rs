use std::fmt;

use crate::core::coord::Coord;

/// The eight compass directions, indexed clockwise from North.
///
/// The index doubles as the output digit of a solution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

pub const DIRECTIONS: [Direction; 8] = [
    Direction::North,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
    Direction::West,
    Direction::NorthWest,
];

/// Unit displacement per direction, in `DIRECTIONS` order.
const OFFSETS: [Coord; 8] = [
    Coord { x: 0, y: -1 },
    Coord { x: 1, y: -1 },
    Coord { x: 1, y: 0 },
    Coord { x: 1, y: 1 },
    Coord { x: 0, y: 1 },
    Coord { x: -1, y: 1 },
    Coord { x: -1, y: 0 },
    Coord { x: -1, y: -1 },
];

impl Direction {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Direction {
        DIRECTIONS[index]
    }

    #[inline]
    pub fn offset(self) -> Coord {
        OFFSETS[self.index()]
    }

    #[inline]
    pub fn rotated_clockwise(self) -> Direction {
        DIRECTIONS[(self.index() + 1) % 8]
    }

    #[inline]
    pub fn rotated_counter_clockwise(self) -> Direction {
        DIRECTIONS[(self.index() + 7) % 8]
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        DIRECTIONS[(self.index() + 4) % 8]
    }

    #[inline]
    pub fn is_opposite_to(self, other: Direction) -> bool {
        (self.index() as i32 - other.index() as i32).abs() == 4
    }

    #[inline]
    pub fn is_parallel_to(self, other: Direction) -> bool {
        let diff = (self.index() as i32 - other.index() as i32).abs();
        diff == 0 || diff == 4
    }

    #[inline]
    pub fn is_perpendicular_to(self, other: Direction) -> bool {
        let diff = (self.index() as i32 - other.index() as i32).abs();
        diff == 2 || diff == 6
    }

    #[inline]
    pub fn is_diagonal(self) -> bool {
        self.index() & 1 == 1
    }

    /// Direction of the straight or diagonal ray from `start` to `end`.
    ///
    /// Returns `None` when the coordinates coincide; the displacement is
    /// assumed to lie exactly on one of the eight rays.
    pub fn from_displacement(start: Coord, end: Coord) -> Option<Direction> {
        let step = (end - start).signum();
        DIRECTIONS.into_iter().find(|d| d.offset() == step)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "North",
            Direction::NorthEast => "NorthEast",
            Direction::East => "East",
            Direction::SouthEast => "SouthEast",
            Direction::South => "South",
            Direction::SouthWest => "SouthWest",
            Direction::West => "West",
            Direction::NorthWest => "NorthWest",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_the_eight_unit_steps() {
        for d in DIRECTIONS {
            let o = d.offset();
            assert!(o != Coord::new(0, 0));
            assert!(o.x.abs() <= 1 && o.y.abs() <= 1);
            assert_eq!(Direction::from_displacement(Coord::new(0, 0), o * 3), Some(d));
        }
    }

    #[test]
    fn rotation_and_opposition() {
        assert_eq!(Direction::North.rotated_clockwise(), Direction::NorthEast);
        assert_eq!(Direction::North.rotated_counter_clockwise(), Direction::NorthWest);
        assert_eq!(Direction::East.opposite(), Direction::West);
        assert!(Direction::East.is_opposite_to(Direction::West));
        assert!(Direction::East.is_parallel_to(Direction::East));
        assert!(Direction::East.is_parallel_to(Direction::West));
        assert!(Direction::North.is_perpendicular_to(Direction::East));
        assert!(!Direction::North.is_perpendicular_to(Direction::NorthEast));
    }

    #[test]
    fn diagonals_are_the_odd_indices() {
        assert!(Direction::NorthEast.is_diagonal());
        assert!(Direction::SouthWest.is_diagonal());
        assert!(!Direction::North.is_diagonal());
        assert!(!Direction::West.is_diagonal());
    }
}
