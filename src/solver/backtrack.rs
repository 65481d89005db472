//! The potential-guided backtracking search.
//!
//! Moves out of each cell are tried in descending total-potential order,
//! with three escape hatches against plateaus: weak moves are pruned
//! relative to the best sibling, cycles that make no collection progress
//! either fall back to a routed detour or are skipped, and after a failed
//! recursion the remaining siblings may be abandoned with a depth-dependent
//! probability. Every mutation made on the way down is inverted exactly on
//! the way back up.

use smallvec::SmallVec;
use std::f32::consts::FRAC_1_SQRT_2;

use rand::Rng;

use crate::core::coord::Coord;
use crate::core::direction::DIRECTIONS;
use crate::core::grid::Grid;
use crate::graph::moves::MoveId;
use crate::graph::scc::SccId;
use crate::solver::potential::PotentialField;
use crate::solver::solution::Solution;
use crate::solver::Search;

fn is_perfect_square(n: i32) -> bool {
    if n < 0 {
        return false;
    }
    let root = (n as f64).sqrt() as i32;
    root * root == n || (root + 1) * (root + 1) == n
}

impl Search<'_> {
    /// Build the structures only this stage needs: the skip-probability
    /// table, the propagated potential field, and the per-cell progress
    /// marks.
    pub(crate) fn prepare_backtracking(&mut self) {
        self.skip_probability = self.build_skip_table();
        self.potential = PotentialField::build(
            self.graph,
            self.jewel_state.num_jewels(),
            self.config.max_potential,
        );
        self.num_jewels_left_at = Grid::new(
            self.level.width(),
            self.level.height(),
            self.jewel_state.num_jewels() as i32 + 1,
        );
    }

    /// Skip probability per depth: zero for shallow depths and perfect
    /// squares (periodic full re-exploration), approaching one as the
    /// remaining budget shrinks.
    fn build_skip_table(&self) -> Vec<f32> {
        let max_moves = self.level.max_moves();
        let mut table = vec![0.0f32; max_moves as usize];
        for depth in 0..max_moves {
            if depth <= self.config.min_depth_to_allow_skip || is_perfect_square(depth) {
                continue;
            }
            let mut skip = (max_moves as f32 / ((max_moves - depth) as f32).sqrt()) as i32 + 1;
            skip *= skip;
            table[depth as usize] = 1.0 - 1.0 / skip as f32;
        }
        table
    }

    pub(crate) fn run_backtracking(&mut self) -> Solution {
        let additional_moves =
            (self.level.max_moves() as f32 * self.config.additional_moves_factor) as i32;

        let mut solution = Solution::empty();
        let mut min_depth = 0;
        if self.search(
            &mut solution,
            self.graph.vehicle(),
            self.level.max_moves() - 1,
            0,
            additional_moves,
            &mut min_depth,
        ) {
            solution
        } else {
            Solution::invalid()
        }
    }

    /// A component whose rank is past some uncollected jewel's last chance
    /// must not be entered. False negatives cannot happen; false positives
    /// only cost time.
    fn can_move_to_scc(&self, id: SccId) -> bool {
        for jewel in 0..self.jewel_state.num_jewels() {
            if id > self.sccs.last_scc_with_jewel(jewel) && !self.jewel_state.is_collected(jewel) {
                return false;
            }
        }
        true
    }

    /// Admissible moves out of `coords`, best total potential first.
    fn order_moves(&self, coords: Coord) -> SmallVec<[MoveId; 8]> {
        let mut moves: SmallVec<[MoveId; 8]> = SmallVec::new();

        for dir in DIRECTIONS {
            let Some(mv) = self.graph.from_cell_dir(coords, dir) else {
                continue;
            };

            let start_scc = self.sccs.id(mv.start);
            let end_scc = self.sccs.id(mv.end);
            if start_scc != end_scc && !self.can_move_to_scc(end_scc) {
                continue;
            }

            moves.push(mv.id);
        }

        moves.sort_by(|&a, &b| self.potential.total(b).cmp(&self.potential.total(a)));
        moves
    }

    /// Globally nearest admissible move that still collects something new.
    fn find_nearest_collecting_move(&self, coords: Coord) -> Option<MoveId> {
        let from = self.metric.node(coords);

        let mut best = None;
        let mut best_distance = i32::MAX;
        for jewel in 0..self.jewel_state.num_jewels() {
            if self.jewel_state.is_collected(jewel) {
                continue;
            }

            for &move_id in self.graph.collecting(jewel) {
                let mv = self.graph.get(move_id);
                let start_scc = self.sccs.id(mv.start);
                let end_scc = self.sccs.id(mv.end);
                if start_scc != end_scc && !self.can_move_to_scc(end_scc) {
                    continue;
                }

                let distance = self.metric.distance(from, self.metric.node(mv.start)) as i32;
                if distance < best_distance {
                    best_distance = distance;
                    best = Some(move_id);
                }
            }
        }

        best
    }

    /// Exact inverse of taking `move_id`: jewel counts, potential
    /// contributions, the progress mark and the solution tail.
    fn undo_move(&mut self, move_id: MoveId, old_num_left: i32, solution: &mut Solution) {
        let mv = self.graph.get(move_id);
        for &jewel in &mv.jewels {
            if self.jewel_state.remove(jewel) {
                self.potential.enable_contribution(jewel);
            }
        }
        self.num_jewels_left_at[mv.end] = old_num_left;
        solution.pop();
    }

    fn search(
        &mut self,
        solution: &mut Solution,
        coords: Coord,
        moves_left: i32,
        depth: i32,
        additional_moves: i32,
        min_depth: &mut i32,
    ) -> bool {
        self.bench.node();

        if depth < *min_depth {
            *min_depth = depth;
        }

        let ordered = self.order_moves(coords);
        if ordered.is_empty() {
            return false;
        }

        let best_potential = self.potential.total(ordered[0]) as f32;
        let potential_threshold = best_potential * self.config.pruning_factor;

        for &move_id in &ordered {
            let graph = self.graph;
            let mv = graph.get(move_id);

            let total = self.potential.total(move_id);
            if (total as f32) < potential_threshold {
                // The list is sorted; nothing behind this move survives.
                return false;
            }

            let end = mv.end;
            let old_num_left = self.num_jewels_left_at[end];

            let progress =
                self.jewel_state.num_left() as i32 - mv.num_uncollected_jewels(&self.jewel_state) as i32;
            if progress >= old_num_left {
                // We have been at `end` before with nothing more collected:
                // a cycle. With an uninformative potential, route straight
                // to the nearest move that still collects; otherwise just
                // try the next direction.
                if total < self.config.uncertain_potential_threshold {
                    let Some(target_id) = self.find_nearest_collecting_move(coords) else {
                        return false;
                    };
                    let target = graph.get(target_id);

                    let mut path = Vec::new();
                    if !self.metric.shortest_path(graph, coords, target.start, &mut path)
                        || !self.metric.shortest_path(graph, target.start, target.end, &mut path)
                    {
                        return false;
                    }
                    if path.len() as i32 > moves_left + additional_moves {
                        return false;
                    }

                    let mut detour_end = coords;
                    for &dir in &path {
                        let step = graph
                            .from_cell_dir(detour_end, dir)
                            .expect("detour follows live moves");
                        for &jewel in &step.jewels {
                            if self.jewel_state.add(jewel) {
                                self.potential.disable_contribution(jewel);
                            }
                        }
                        solution.push(step.dir);
                        detour_end = step.end;
                    }

                    if self.search(
                        solution,
                        detour_end,
                        moves_left - path.len() as i32,
                        depth + path.len() as i32,
                        additional_moves,
                        min_depth,
                    ) {
                        return true;
                    }

                    let mut pos = coords;
                    for &dir in &path {
                        let step = graph
                            .from_cell_dir(pos, dir)
                            .expect("detour follows live moves");
                        for &jewel in &step.jewels {
                            if self.jewel_state.remove(jewel) {
                                self.potential.enable_contribution(jewel);
                            }
                        }
                        solution.pop();
                        pos = step.end;
                    }
                    return false;
                }

                continue;
            }

            solution.push(mv.dir);
            for &jewel in &mv.jewels {
                if self.jewel_state.add(jewel) {
                    self.potential.disable_contribution(jewel);
                }
            }
            self.num_jewels_left_at[end] = self.jewel_state.num_left() as i32;

            if self.jewel_state.num_left() == 0 {
                if solution.len() as i32 > self.level.max_moves() {
                    // Over budget. Give up outright when the search never
                    // backed far enough out for compression to stand a
                    // chance.
                    let hopeless = (*min_depth as f32)
                        > self.level.max_moves() as f32
                            - additional_moves as f32 * FRAC_1_SQRT_2;
                    if hopeless {
                        self.undo_move(move_id, old_num_left, solution);
                        return false;
                    }

                    *min_depth = depth;

                    let saved_state = self.jewel_state.clone();
                    let mut compressed = solution.clone();
                    while self.try_remove_any_run(&mut compressed) {}
                    self.jewel_state = saved_state;

                    if self.is_solution_valid(&compressed)
                        && compressed.len() as i32 <= self.level.max_moves()
                    {
                        *solution = compressed;
                        return true;
                    }

                    self.undo_move(move_id, old_num_left, solution);
                    return false;
                }

                return true;
            } else if moves_left > -additional_moves {
                if self.search(
                    solution,
                    end,
                    moves_left - 1,
                    depth + 1,
                    additional_moves,
                    min_depth,
                ) {
                    return true;
                } else if moves_left > 0 {
                    let skip_probability = 1.0
                        - (1.0 - self.skip_probability[depth as usize]) * (total as f32)
                            / (best_potential + 1.0);
                    if self.rng.gen_bool(skip_probability as f64) {
                        self.undo_move(move_id, old_num_left, solution);
                        return false;
                    }
                } else {
                    self.undo_move(move_id, old_num_left, solution);
                    return false;
                }
            }

            self.undo_move(move_id, old_num_left, solution);
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::testutil::with_search;

    // Two jewels on opposite sides; no single move collects both.
    const TWO_SIDED: &str = "4 6 3\n######\n#+.+ #\n#    #\n######\n";

    #[test]
    fn failed_search_restores_all_mutable_state() {
        with_search(TWO_SIDED, |search| {
            search.prepare_backtracking();

            let state_before = search.jewel_state.clone();
            let marks_before = search.num_jewels_left_at.clone();
            let totals_before: Vec<u32> =
                (0..search.graph.len()).map(|e| search.potential.total(e)).collect();

            let mut solution = Solution::empty();
            let mut min_depth = 0;
            // Zero budget: every expansion fails and must unwind exactly.
            let found = search.search(
                &mut solution,
                search.graph.vehicle(),
                0,
                0,
                0,
                &mut min_depth,
            );

            assert!(!found);
            assert!(solution.is_empty());
            assert_eq!(search.jewel_state, state_before);
            assert_eq!(search.num_jewels_left_at, marks_before);
            let totals_after: Vec<u32> =
                (0..search.graph.len()).map(|e| search.potential.total(e)).collect();
            assert_eq!(totals_after, totals_before);
        });
    }

    #[test]
    fn search_solves_a_two_sided_pickup() {
        with_search(TWO_SIDED, |search| {
            search.prepare_backtracking();
            let solution = search.run_backtracking();

            assert!(solution.exists());
            assert!(solution.len() as i32 <= search.level.max_moves());
            assert!(crate::solver::solution::replay_collects_all(
                search.level,
                search.jewels,
                search.graph.vehicle(),
                &solution,
                search.config.vehicle_spot_is_hole,
            ));
        });
    }

    #[test]
    fn skip_table_is_zero_for_shallow_depths_and_squares() {
        with_search(TWO_SIDED, |search| {
            search.prepare_backtracking();
            for (depth, &p) in search.skip_probability.iter().enumerate() {
                assert!((0.0..1.0).contains(&p));
                if depth as i32 <= search.config.min_depth_to_allow_skip
                    || is_perfect_square(depth as i32)
                {
                    assert_eq!(p, 0.0);
                }
            }
        });
    }

    #[test]
    fn perfect_squares() {
        let squares: Vec<i32> = (0..12).map(|n| n * n).collect();
        for n in 0..150 {
            assert_eq!(is_perfect_square(n), squares.contains(&n), "n = {n}");
        }
    }
}
