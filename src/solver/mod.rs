//! The solver pipeline.
//!
//! [`Solver::solve`] runs the stages in order: feature identification, move
//! graph construction, reachability check, all-pairs metric, SCC
//! condensation, the solvability prefilter, the timed CAH heuristic (with a
//! 3-opt pass over its best candidates), and finally the potential-guided
//! backtracking search. The first stage that proves the level unsolvable
//! returns [`Solution::invalid`]; a candidate is only ever emitted when it
//! fits the move budget.

pub mod backtrack;
pub mod bench;
pub mod cah;
pub mod jewels;
pub mod opt3;
pub mod potential;
pub mod report;
pub mod shorten;
pub mod solution;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::board::{JewelIndex, Level};
use crate::core::coord::Coord;
use crate::core::direction::Direction;
use crate::core::grid::Grid;
use crate::graph::metric::Metric;
use crate::graph::moves::{Move, MoveGraph};
use crate::graph::scc::SccGraph;
use crate::solver::bench::Bench;
use crate::solver::jewels::JewelState;
use crate::solver::potential::PotentialField;
use crate::solver::solution::{replay_collects_all, Solution};

/// Tuning knobs with their authoritative defaults.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Whether the vehicle's own cell acts as a hole for later slides.
    pub vehicle_spot_is_hole: bool,
    /// Replay-check every candidate before committing to it.
    pub validate_solutions: bool,
    /// Growth of the 3-opt search window after a fruitless iteration.
    pub opt3_window_increase_factor: f32,
    pub minimal_opt3_window_size: usize,
    pub max_time_for_stochastic_heuristic: Duration,
    pub max_time_for_opt3: Duration,
    pub rng_seed: u64,
    /// Starting potential of one jewel on one collecting edge.
    pub max_potential: u8,
    /// Below this total potential a cycling search tries a detour to the
    /// nearest collecting move instead of trusting the field.
    pub uncertain_potential_threshold: u32,
    /// Probabilistic sibling skipping only engages below this depth.
    pub min_depth_to_allow_skip: i32,
    /// The search may overshoot the budget by this fraction of `max_moves`
    /// and then try to compress the result back under it.
    pub additional_moves_factor: f32,
    /// Moves with potential below `best * pruning_factor` are cut. Keep in
    /// [0.5, 1]; 0.5 disables pruning because that is the propagation rate.
    pub pruning_factor: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            vehicle_spot_is_hole: false,
            validate_solutions: true,
            opt3_window_increase_factor: 4.0,
            minimal_opt3_window_size: 16,
            max_time_for_stochastic_heuristic: Duration::from_secs(1),
            max_time_for_opt3: Duration::from_secs(1),
            rng_seed: 12345,
            max_potential: u8::MAX,
            uncertain_potential_threshold: 256,
            min_depth_to_allow_skip: 10,
            additional_moves_factor: 0.3,
            pruning_factor: 0.5,
        }
    }
}

pub struct Solver {
    level: Level,
    config: SolverConfig,
    bench: Bench,
}

impl Solver {
    /// The level must be well-formed (exactly one vehicle cell, walled
    /// border); the I/O layer guarantees this.
    pub fn new(level: Level, config: SolverConfig) -> Self {
        Self {
            level,
            config,
            bench: Bench::new(),
        }
    }

    #[inline]
    pub fn level(&self) -> &Level {
        &self.level
    }

    #[inline]
    pub fn bench(&self) -> &Bench {
        &self.bench
    }

    pub fn solve(&mut self) -> Solution {
        let num_jewels = self.level.board().count_jewels();
        if num_jewels == 0 {
            self.bench.stop();
            return Solution::empty();
        }

        let jewels = JewelIndex::new(self.level.board());
        debug!(num_jewels, "identified features");

        let graph = MoveGraph::build(&self.level, &jewels, self.config.vehicle_spot_is_hole);
        debug!(num_moves = graph.len(), "generated slide moves");

        if !graph.all_jewels_reachable() {
            debug!("some jewel lies on no slide move");
            self.bench.stop();
            return Solution::invalid();
        }

        let metric = Metric::build(&self.level, &graph);
        debug!(num_nodes = metric.num_nodes(), "computed pairwise distances");

        let mut sccs = SccGraph::build(&self.level, &graph, &metric, &jewels);
        debug!(num_sccs = sccs.len(), "identified strongly connected components");

        if !sccs.may_be_solvable() {
            debug!("mutually exclusive required components");
            self.bench.stop();
            return Solution::invalid();
        }

        self.bench.start();

        let mut search = Search {
            config: &self.config,
            level: &self.level,
            jewels: &jewels,
            graph: &graph,
            metric: &metric,
            sccs: &mut sccs,
            bench: &mut self.bench,
            rng: StdRng::seed_from_u64(self.config.rng_seed),
            jewel_state: JewelState::new(num_jewels),
            potential: PotentialField::empty(),
            num_jewels_left_at: Grid::new(0, 0, 0),
            skip_probability: Vec::new(),
        };

        let cah = search.run_cah();
        debug!(
            exists = cah.exists(),
            len = cah.len(),
            "cheapest-addition heuristic finished"
        );
        if cah.exists() && cah.len() as i32 <= self.level.max_moves() {
            self.bench.stop();
            return cah;
        }

        search.prepare_backtracking();
        debug!("potential field ready, entering backtracking search");

        let solution = search.run_backtracking();
        self.bench.stop();

        if solution.exists() && solution.len() as i32 <= self.level.max_moves() {
            solution
        } else {
            Solution::invalid()
        }
    }
}

/// Everything the heuristic and search stages share, borrowed from the
/// pipeline-built structures. Mutable state (`jewel_state`, the potential
/// totals, the per-cell progress table) is pushed and popped strictly along
/// the recursion, so a failed expansion leaves it untouched.
pub(crate) struct Search<'a> {
    pub(crate) config: &'a SolverConfig,
    pub(crate) level: &'a Level,
    pub(crate) jewels: &'a JewelIndex,
    pub(crate) graph: &'a MoveGraph,
    pub(crate) metric: &'a Metric,
    pub(crate) sccs: &'a mut SccGraph,
    pub(crate) bench: &'a mut Bench,
    pub(crate) rng: StdRng,
    pub(crate) jewel_state: JewelState,
    pub(crate) potential: PotentialField,
    pub(crate) num_jewels_left_at: Grid<i32>,
    pub(crate) skip_probability: Vec<f32>,
}

impl Search<'_> {
    pub(crate) fn is_solution_valid(&self, solution: &Solution) -> bool {
        if !self.config.validate_solutions {
            return true;
        }
        replay_collects_all(
            self.level,
            self.jewels,
            self.graph.vehicle(),
            solution,
            self.config.vehicle_spot_is_hole,
        )
    }

    /// Vehicle position before each step of `solution`, plus the final one.
    pub(crate) fn coords_along(&self, solution: &Solution) -> Vec<Coord> {
        let mut coords = Vec::with_capacity(solution.len() + 1);
        let mut pos = self.graph.vehicle();
        coords.push(pos);
        for dir in solution.iter() {
            let mv = self
                .graph
                .from_cell_dir(pos, dir)
                .expect("solution follows live moves");
            pos = mv.end;
            coords.push(pos);
        }
        coords
    }
}

/// Walk a direction sequence through the move graph, calling `f` on every
/// move taken; returns the final position. The sequence must follow live
/// moves.
pub(crate) fn walk_moves(
    graph: &MoveGraph,
    start: Coord,
    dirs: impl IntoIterator<Item = Direction>,
    mut f: impl FnMut(&Move),
) -> Coord {
    let mut pos = start;
    for dir in dirs {
        let mv = graph
            .from_cell_dir(pos, dir)
            .expect("path follows live moves");
        f(mv);
        pos = mv.end;
    }
    pos
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::board::io::read_level;

    /// Build the full pipeline for a level text and hand a ready [`Search`]
    /// to the test body.
    pub(crate) fn with_search<R>(text: &str, f: impl for<'a> FnOnce(&mut Search<'a>) -> R) -> R {
        let level = read_level(&mut text.as_bytes()).expect("test level parses");
        let config = SolverConfig::default();

        let num_jewels = level.board().count_jewels();
        let jewels = JewelIndex::new(level.board());
        let graph = MoveGraph::build(&level, &jewels, config.vehicle_spot_is_hole);
        let metric = Metric::build(&level, &graph);
        let mut sccs = SccGraph::build(&level, &graph, &metric, &jewels);
        let mut bench = Bench::new();

        let mut search = Search {
            config: &config,
            level: &level,
            jewels: &jewels,
            graph: &graph,
            metric: &metric,
            sccs: &mut sccs,
            bench: &mut bench,
            rng: StdRng::seed_from_u64(config.rng_seed),
            jewel_state: JewelState::new(num_jewels),
            potential: PotentialField::empty(),
            num_jewels_left_at: Grid::new(0, 0, 0),
            skip_probability: Vec::new(),
        };

        f(&mut search)
    }
}
