//! Slide moves and the move arena.
//!
//! A [`Move`] is a directed edge from the cell where a slide begins to the
//! cell where the vehicle comes to rest, together with the jewels swept up
//! along the way. The arena assigns ids in discovery order; all auxiliary
//! tables hold ids, never references, so the graph stays a plain value.

use rustc_hash::FxHashMap;

use crate::board::{CellKind, JewelId, JewelIndex, Level};
use crate::core::coord::Coord;
use crate::core::direction::{Direction, DIRECTIONS};
use crate::core::grid::Grid;
use crate::solver::jewels::JewelState;

pub type MoveId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub id: MoveId,
    pub start: Coord,
    pub end: Coord,
    pub dir: Direction,
    /// Jewels on the slide, in traversal order: the start cell's jewel (if
    /// any) first, then interior cells.
    pub jewels: Vec<JewelId>,
}

impl Move {
    pub fn num_uncollected_jewels(&self, state: &JewelState) -> usize {
        self.jewels
            .iter()
            .filter(|&&j| !state.is_collected(j))
            .count()
    }
}

/// Where a single-direction slide ends up.
enum Slide {
    /// Stops at `end` with the listed jewels swept; dead when `end == start`.
    Stops { end: Coord, jewels: Vec<JewelId> },
    /// The ray runs into a mine; the whole direction is dead.
    Mined,
}

/// The complete edge set of the slide graph, reachable from the vehicle.
#[derive(Debug, Clone)]
pub struct MoveGraph {
    vehicle: Coord,
    moves: Vec<Move>,
    by_start: Grid<[Option<MoveId>; 8]>,
    by_end: FxHashMap<Coord, Vec<MoveId>>,
    collecting: Vec<Vec<MoveId>>,
}

impl MoveGraph {
    /// Work-queue exploration from the vehicle cell: each drained cell gets
    /// its eight slides computed once, and every live end is enqueued. The
    /// result has exactly one entry per reachable (start, direction) pair.
    pub fn build(level: &Level, jewels: &JewelIndex, vehicle_spot_is_hole: bool) -> MoveGraph {
        let vehicle = level
            .vehicle_coords()
            .expect("level has exactly one vehicle cell");

        let mut graph = MoveGraph {
            vehicle,
            moves: Vec::new(),
            by_start: Grid::new(level.width(), level.height(), [None; 8]),
            by_end: FxHashMap::default(),
            collecting: vec![Vec::new(); jewels.count()],
        };

        let mut visited = Grid::new(level.width(), level.height(), false);
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(vehicle);

        while let Some(start) = queue.pop_front() {
            if visited[start] {
                continue;
            }
            visited[start] = true;

            for dir in DIRECTIONS {
                let Slide::Stops { end, jewels: swept } =
                    slide(level, jewels, start, dir, vehicle_spot_is_hole)
                else {
                    continue;
                };
                if end == start {
                    continue;
                }

                graph.register(Move {
                    id: 0,
                    start,
                    end,
                    dir,
                    jewels: swept,
                });
                queue.push_back(end);
            }
        }

        graph
    }

    fn register(&mut self, mut mv: Move) {
        let id = self.moves.len();
        mv.id = id;

        self.by_start[mv.start][mv.dir.index()] = Some(id);
        self.by_end.entry(mv.end).or_default().push(id);
        for &jewel in &mv.jewels {
            self.collecting[jewel].push(id);
        }
        self.moves.push(mv);
    }

    #[inline]
    pub fn vehicle(&self) -> Coord {
        self.vehicle
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
    pub fn get(&self, id: MoveId) -> &Move {
        &self.moves[id]
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Move> + '_ {
        self.moves.iter()
    }

    /// The live move starting at `c` in direction `dir`, if any.
    #[inline]
    pub fn from_cell_dir(&self, c: Coord, dir: Direction) -> Option<&Move> {
        self.by_start[c][dir.index()].map(|id| &self.moves[id])
    }

    /// All live moves starting at `c`, in direction-index order.
    pub fn moves_from(&self, c: Coord) -> impl Iterator<Item = &Move> + '_ {
        self.by_start[c]
            .into_iter()
            .flatten()
            .map(move |id| &self.moves[id])
    }

    /// Ids of moves that come to rest at `c`.
    pub fn ending_at(&self, c: Coord) -> &[MoveId] {
        self.by_end.get(&c).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of moves whose slide sweeps jewel `jewel`.
    #[inline]
    pub fn collecting(&self, jewel: JewelId) -> &[MoveId] {
        &self.collecting[jewel]
    }

    /// Every jewel appears on at least one live move.
    pub fn all_jewels_reachable(&self) -> bool {
        self.collecting.iter().all(|moves| !moves.is_empty())
    }
}

/// The slide rule: from `start`, step along `dir` until a stopping feature.
///
/// - a jewel on the start cell or any traversed cell joins the move's list,
/// - a wall stops the slide one cell short,
/// - a hole (and the vehicle cell, when configured as a hole) stops the
///   slide on the cell itself,
/// - a mine kills the whole direction.
///
/// The board border is assumed walled, so the walk needs no bounds checks.
fn slide(
    level: &Level,
    jewels: &JewelIndex,
    start: Coord,
    dir: Direction,
    vehicle_spot_is_hole: bool,
) -> Slide {
    let offset = dir.offset();
    let mut swept = Vec::new();
    if level.cell(start) == CellKind::Jewel {
        swept.push(jewels.id_at(start).expect("jewel cells are indexed"));
    }

    let mut walking = start;
    loop {
        walking += offset;

        match level.cell_or_wall(walking) {
            CellKind::Jewel => {
                swept.push(jewels.id_at(walking).expect("jewel cells are indexed"));
            }
            CellKind::Wall => {
                return Slide::Stops {
                    end: walking - offset,
                    jewels: swept,
                };
            }
            CellKind::Mine => return Slide::Mined,
            CellKind::Hole => {
                return Slide::Stops {
                    end: walking,
                    jewels: swept,
                };
            }
            CellKind::Vehicle if vehicle_spot_is_hole => {
                return Slide::Stops {
                    end: walking,
                    jewels: swept,
                };
            }
            _ => {}
        }
    }
}
