//! The cheapest-addition construction heuristic.
//!
//! Tours are built by inserting, for each uncollected jewel in a fresh
//! random order, the collecting move with the lowest insertion cost
//! (detour length minus the move's jewel count plus its learned penalty).
//! Tours that strand a jewel strike every edge they used, and strikes on
//! consecutive iterations escalate quadratically, steering later tours away
//! from dead ends; edges of an accepted best tour get their penalty reduced
//! instead. Finished tours pass through a 2-swap exchange and run removal
//! before being scored.

use rand::seq::SliceRandom;
use tracing::debug;

use crate::board::JewelId;
use crate::graph::metric::{NodeId, INFINITE_DISTANCE};
use crate::graph::moves::MoveId;
use crate::graph::scc::SccId;
use crate::solver::solution::Solution;
use crate::solver::{walk_moves, Search};

/// Learned per-edge penalties with their escalation bookkeeping.
pub(crate) struct Penalties {
    value: Vec<i32>,
    last_strike_iter: Vec<i32>,
    consecutive_strikes: Vec<i32>,
}

impl Penalties {
    fn new(num_moves: usize) -> Self {
        Self {
            value: vec![0; num_moves],
            last_strike_iter: vec![-1; num_moves],
            consecutive_strikes: vec![0; num_moves],
        }
    }

    #[inline]
    fn get(&self, id: MoveId) -> i32 {
        self.value[id]
    }

    /// Penalize an edge of a failed tour. A strike in iteration `iter`
    /// escalates only if the previous strike was in `iter - 1`.
    fn strike(&mut self, id: MoveId, iter: i32) {
        if iter > self.last_strike_iter[id] + 1 {
            self.consecutive_strikes[id] = 0;
        }
        self.value[id] += self.consecutive_strikes[id] * 2 + 1;
        self.consecutive_strikes[id] += 1;
        self.last_strike_iter[id] = iter;
    }

    /// Bias future tours toward an edge of an accepted best solution.
    fn reward(&mut self, id: MoveId) {
        self.value[id] -= 1;
    }
}

impl Search<'_> {
    /// Run randomized tour construction until the stochastic time budget is
    /// spent, then 3-opt the recorded best tours (most recent first) within
    /// the combined budget. Returns the best solution found, which may be
    /// over budget or invalid().
    pub(crate) fn run_cah(&mut self) -> Solution {
        let mut penalties = Penalties::new(self.graph.len());

        let mut best_solutions: Vec<Solution> = Vec::new();
        let mut best = Solution::invalid();
        let mut num_valid = 0u32;
        let mut iter = 0;

        // Tour construction only applies the costly exchange pass when the
        // raw tour beats the best raw length seen so far.
        let mut best_before_reduction = i32::MAX;

        loop {
            iter += 1;
            if let Some(solution) =
                self.build_tour(&mut penalties, &mut best_before_reduction, iter)
            {
                num_valid += 1;
                if self.is_solution_valid(&solution) && solution.is_better_than(&best) {
                    walk_moves(self.graph, self.graph.vehicle(), solution.iter(), |mv| {
                        penalties.reward(mv.id);
                    });

                    best_solutions.push(solution.clone());
                    best = solution;
                    debug!(iter, len = best.len(), "improved CAH tour");
                }
            }

            if best.exists() && best.len() as i32 <= self.level.max_moves() {
                return best;
            }

            if self.bench.elapsed_to_now() > self.config.max_time_for_stochastic_heuristic {
                break;
            }
        }

        debug!(num_valid, iterations = iter, "CAH construction finished");

        // Most promising candidates first. Shrinking them rarely succeeds,
        // but on large boards it is far more hopeful than the later search.
        best_solutions.reverse();
        let opt_budget =
            self.config.max_time_for_stochastic_heuristic + self.config.max_time_for_opt3;
        for mut candidate in best_solutions {
            if self.bench.elapsed_to_now() > opt_budget {
                break;
            }

            self.optimize_3opt(&mut candidate);
            if !self.is_solution_valid(&candidate) {
                continue;
            }

            if candidate.len() as i32 <= self.level.max_moves() {
                return candidate;
            } else if candidate.is_better_than(&best) {
                best = candidate;
            }
        }

        best
    }

    /// One construction iteration. Returns `None` when some jewel could not
    /// be inserted (penalties have then been applied and the jewel state
    /// reset).
    fn build_tour(
        &mut self,
        penalties: &mut Penalties,
        best_before_reduction: &mut i32,
        iter: i32,
    ) -> Option<Solution> {
        let num_jewels = self.jewel_state.num_jewels();
        let mut shuffled: Vec<JewelId> = (0..num_jewels).collect();
        shuffled.shuffle(&mut self.rng);

        // The tour alternates connection segments and committed moves:
        // [vehicle, m1.start, m1.end, m2.start, m2.end, ...].
        let mut tour: Vec<NodeId> = vec![self.metric.node(self.graph.vehicle())];
        let mut traversed = vec![false; self.sccs.len()];
        let mut enterable = vec![true; self.sccs.len()];
        traversed[self.sccs.id(self.graph.vehicle())] = true;

        while self.jewel_state.num_left() > 0 {
            for a in 0..num_jewels {
                let jewel = shuffled[a];
                if self.jewel_state.is_collected(jewel) {
                    continue;
                }

                self.insert_for_jewel(
                    jewel,
                    &mut tour,
                    penalties,
                    &mut traversed,
                    &mut enterable,
                    iter,
                )?;
            }
        }

        let mut solution = self.solution_through_nodes(&tour);

        // Measure how short the raw tour can get; the counts are restored
        // because the exchange pass keeps working against the tour.
        {
            let saved = self.jewel_state.clone();
            while self.try_remove_any_run(&mut solution) {}
            self.jewel_state = saved;
        }

        if (solution.len() as i32) < *best_before_reduction {
            *best_before_reduction = solution.len() as i32;

            loop {
                if solution.len() as i32 <= self.level.max_moves() {
                    break;
                }
                if !self.exchange(&mut tour, penalties, &mut traversed, &mut enterable, iter) {
                    break;
                }
            }
        }

        let mut solution = self.solution_through_nodes(&tour);
        while self.try_remove_any_run(&mut solution) {}

        self.jewel_state.clear();

        Some(solution)
    }

    /// Insert the cheapest collecting move for `jewel` into the tour.
    /// Returns the added tour length, or `None` when no admissible insertion
    /// exists (the current tour is then penalized and the state cleared).
    fn insert_for_jewel(
        &mut self,
        jewel: JewelId,
        tour: &mut Vec<NodeId>,
        penalties: &mut Penalties,
        traversed: &mut [bool],
        enterable: &mut [bool],
        iter: i32,
    ) -> Option<i32> {
        let graph = self.graph;

        let mut best_move: Option<MoveId> = None;
        let mut best_position = 0;
        let mut lowest_cost = i32::MAX;
        let mut added_distance = 0;

        for &move_id in graph.collecting(jewel) {
            let mv = graph.get(move_id);

            let start_scc = self.sccs.id(mv.start);
            let end_scc = self.sccs.id(mv.end);
            if !self.scc_admissible(start_scc, traversed, enterable)
                || !self.scc_admissible(end_scc, traversed, enterable)
            {
                continue;
            }

            let move_value = mv.jewels.len() as i32 - penalties.get(move_id);
            let move_start = self.metric.node(mv.start);
            let move_end = self.metric.node(mv.end);

            // Positions step by two: a committed move's own segment can
            // never be split.
            let mut i = 0;
            while i + 1 < tour.len() {
                let d0 = self.metric.distance(tour[i], move_start);
                let d1 = self.metric.distance(move_end, tour[i + 1]);
                if d0 != INFINITE_DISTANCE && d1 != INFINITE_DISTANCE {
                    let d_old = self.metric.distance(tour[i], tour[i + 1]);
                    let detour = d0 as i32 + d1 as i32 - d_old as i32;
                    let cost = detour - move_value;
                    if cost < lowest_cost {
                        best_move = Some(move_id);
                        best_position = i;
                        lowest_cost = cost;
                        added_distance = detour;
                    }
                }
                i += 2;
            }

            // Appending after the last node has no closing leg.
            let dn = self.metric.distance(*tour.last().expect("tour is non-empty"), move_start);
            if dn != INFINITE_DISTANCE {
                let cost = dn as i32 - move_value;
                if cost < lowest_cost {
                    best_move = Some(move_id);
                    best_position = tour.len() - 1;
                    lowest_cost = cost;
                    added_distance = dn as i32;
                }
            }
        }

        let Some(best_move) = best_move else {
            self.apply_penalties_to_tour(tour, penalties, iter);
            self.jewel_state.clear();
            return None;
        };

        let mv = graph.get(best_move);
        for &j in &mv.jewels {
            self.jewel_state.add(j);
        }

        let move_start = self.metric.node(mv.start);
        let move_end = self.metric.node(mv.end);
        traversed[self.sccs.id(mv.start)] = true;
        traversed[self.sccs.id(mv.end)] = true;

        let seg_start = tour[best_position];
        self.add_jewels_on_path(seg_start, move_start);
        if best_position != tour.len() - 1 {
            let seg_end = tour[best_position + 1];
            self.add_jewels_on_path(move_end, seg_end);
            self.remove_jewels_on_path(seg_start, seg_end);
        }

        tour.splice(best_position + 1..best_position + 1, [move_start, move_end]);

        Some(added_distance + 1)
    }

    /// Whether a tour may enter the component without stranding a jewel.
    /// Components proven inadmissible stay so for this tour: they are gated
    /// out of every later insertion, so their reachability never changes.
    fn scc_admissible(&mut self, id: SccId, traversed: &[bool], enterable: &mut [bool]) -> bool {
        if !enterable[id] {
            return false;
        }
        if !self.sccs.remains_solvable_after_entering(traversed, id) {
            enterable[id] = false;
            return false;
        }
        true
    }

    /// 2-swap pass: for each committed move, try deleting it (and its
    /// connection) and re-inserting whatever became uncovered; keep the
    /// change only when it shortened the tour.
    fn exchange(
        &mut self,
        tour: &mut Vec<NodeId>,
        penalties: &mut Penalties,
        traversed: &mut [bool],
        enterable: &mut [bool],
        iter: i32,
    ) -> bool {
        let mut any_improvement = false;

        let mut i = 0;
        while i + 1 < tour.len() {
            let saved_state = self.jewel_state.clone();
            let saved_tour = tour.clone();
            if self.try_exchange(i, tour, penalties, traversed, enterable, iter) {
                any_improvement = true;
            } else {
                self.jewel_state = saved_state;
                *tour = saved_tour;
            }
            i += 2;
        }

        any_improvement
    }

    fn try_exchange(
        &mut self,
        i: usize,
        tour: &mut Vec<NodeId>,
        penalties: &mut Penalties,
        traversed: &mut [bool],
        enterable: &mut [bool],
        iter: i32,
    ) -> bool {
        let seg_start = tour[i];
        let left_middle = tour[i + 1];
        let right_middle = tour[i + 2];

        self.remove_jewels_on_path(seg_start, left_middle);
        self.remove_jewels_on_path(left_middle, right_middle);

        let mut distance_saved = self.metric.distance(seg_start, left_middle) as i32;

        if i + 3 < tour.len() {
            let seg_end = tour[i + 3];
            self.remove_jewels_on_path(right_middle, seg_end);
            self.add_jewels_on_path(seg_start, seg_end);

            distance_saved += self.metric.distance(right_middle, seg_end) as i32
                - self.metric.distance(seg_start, seg_end) as i32;
        }

        tour.drain(i + 1..i + 3);

        let num_jewels = self.jewel_state.num_jewels();
        let mut added_distance = 0i64;
        while self.jewel_state.num_left() > 0 {
            for jewel in 0..num_jewels {
                if self.jewel_state.is_collected(jewel) {
                    continue;
                }

                match self.insert_for_jewel(jewel, tour, penalties, traversed, enterable, iter) {
                    Some(added) => added_distance += added as i64,
                    // The caller restores the tour and the counts.
                    None => return false,
                }
            }
        }

        added_distance < distance_saved as i64
    }

    fn apply_penalties_to_tour(&mut self, tour: &[NodeId], penalties: &mut Penalties, iter: i32) {
        let mut path = Vec::new();
        for segment in tour.windows(2) {
            path.clear();
            self.metric.shortest_path(
                self.graph,
                self.metric.pos(segment[0]),
                self.metric.pos(segment[1]),
                &mut path,
            );
            walk_moves(
                self.graph,
                self.metric.pos(segment[0]),
                path.iter().copied(),
                |mv| penalties.strike(mv.id, iter),
            );
        }
    }

    fn add_jewels_on_path(&mut self, from: NodeId, to: NodeId) {
        let mut path = Vec::new();
        self.metric.shortest_path(
            self.graph,
            self.metric.pos(from),
            self.metric.pos(to),
            &mut path,
        );

        let mut pos = self.metric.pos(from);
        for dir in path {
            let mv = self
                .graph
                .from_cell_dir(pos, dir)
                .expect("path follows live moves");
            for &j in &mv.jewels {
                self.jewel_state.add(j);
            }
            pos = mv.end;
        }
    }

    fn remove_jewels_on_path(&mut self, from: NodeId, to: NodeId) {
        let mut path = Vec::new();
        self.metric.shortest_path(
            self.graph,
            self.metric.pos(from),
            self.metric.pos(to),
            &mut path,
        );

        let mut pos = self.metric.pos(from);
        for dir in path {
            let mv = self
                .graph
                .from_cell_dir(pos, dir)
                .expect("path follows live moves");
            for &j in &mv.jewels {
                self.jewel_state.remove(j);
            }
            pos = mv.end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_strikes_escalate_quadratically() {
        let mut penalties = Penalties::new(1);

        penalties.strike(0, 1);
        assert_eq!(penalties.get(0), 1);
        penalties.strike(0, 2);
        assert_eq!(penalties.get(0), 4);
        penalties.strike(0, 3);
        assert_eq!(penalties.get(0), 9);
    }

    #[test]
    fn a_gap_resets_the_escalation() {
        let mut penalties = Penalties::new(1);

        penalties.strike(0, 1);
        penalties.strike(0, 2);
        assert_eq!(penalties.get(0), 4);

        // Iteration 4 is not consecutive with 2.
        penalties.strike(0, 4);
        assert_eq!(penalties.get(0), 5);
        penalties.strike(0, 5);
        assert_eq!(penalties.get(0), 8);
    }

    #[test]
    fn rewards_can_drive_penalties_negative() {
        let mut penalties = Penalties::new(1);
        penalties.reward(0);
        penalties.reward(0);
        assert_eq!(penalties.get(0), -2);
    }
}
