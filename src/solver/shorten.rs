//! Run removal: delete a contiguous slice of redundant moves and reroute
//! its endpoints through a shortest path.
//!
//! A slice is redundant when every jewel on every move inside it is swept at
//! least twice across the whole solution, so dropping one traversal loses
//! nothing. The best slice maximizes `length − dist(start, end)`; iterating
//! to fixpoint is a contraction on solution length.

use crate::core::direction::Direction;
use crate::solver::solution::Solution;
use crate::solver::Search;

impl Search<'_> {
    /// Remove the most profitable redundant run, if any. `jewel_state` must
    /// reflect the traversal counts of `solution`; it is kept in sync with
    /// the replacement.
    pub(crate) fn try_remove_any_run(&mut self, solution: &mut Solution) -> bool {
        let Some((start, length)) = self.find_most_improvable_redundant_run(solution) else {
            return false;
        };
        let Some(replacement) = self.try_shorten_run(solution, start, length) else {
            return false;
        };

        self.update_jewel_state_on_replaced(solution, start, length, &replacement);
        solution.replace(start, length, &replacement);
        true
    }

    /// Sliding-window scan for the redundant slice whose replacement saves
    /// the most moves. `num_omitted` tracks, per jewel, how many of its
    /// traversals lie inside the current window.
    fn find_most_improvable_redundant_run(&self, solution: &Solution) -> Option<(usize, usize)> {
        let starts = self.coords_along(solution);
        let len = solution.len();

        let mut num_omitted = vec![0u32; self.jewel_state.num_jewels()];
        let mut best = None;
        let mut best_improvement = 0i32;

        let mut begin = 0;
        let mut end = 0;
        while begin < len && end < len {
            if end < begin {
                end = begin;
            }

            while end < len {
                let mv = self
                    .graph
                    .from_cell_dir(starts[end], solution.get(end))
                    .expect("solution follows live moves");

                let redundant = mv
                    .jewels
                    .iter()
                    .all(|&j| self.jewel_state.num_collected(j) - num_omitted[j] >= 2);
                if !redundant {
                    break;
                }

                for &j in &mv.jewels {
                    num_omitted[j] += 1;
                }
                end += 1;
            }

            if end > begin {
                let length = end - begin;
                if length as i32 > best_improvement {
                    let from = self.metric.node(starts[begin]);
                    let to = self.metric.node(starts[end]);
                    let improvement = length as i32 - self.metric.distance(from, to) as i32;
                    if improvement > best_improvement {
                        best_improvement = improvement;
                        best = Some((begin, length));
                    }
                }

                let mv = self
                    .graph
                    .from_cell_dir(starts[begin], solution.get(begin))
                    .expect("solution follows live moves");
                for &j in &mv.jewels {
                    num_omitted[j] -= 1;
                }
            }

            begin += 1;
        }

        best
    }

    /// A replacement direction sequence for `solution[start..start+length]`
    /// within a budget of `length − 1` moves, or `None` when the slice
    /// cannot be rerouted shorter.
    fn try_shorten_run(
        &self,
        solution: &Solution,
        start: usize,
        length: usize,
    ) -> Option<Vec<Direction>> {
        if length <= 1 {
            return None;
        }

        let mut from = self.graph.vehicle();
        for i in 0..start {
            from = self
                .graph
                .from_cell_dir(from, solution.get(i))
                .expect("solution follows live moves")
                .end;
        }

        let mut to = from;
        for i in start..start + length {
            to = self
                .graph
                .from_cell_dir(to, solution.get(i))
                .expect("solution follows live moves")
                .end;
        }

        let mut path = Vec::new();
        if self
            .metric
            .path_with_length(self.graph, from, to, length as i32 - 1, &mut path)
        {
            Some(path)
        } else {
            None
        }
    }

    /// Re-count jewels: drop the traversals of the replaced slice, add the
    /// traversals of its replacement. Runs against the *old* solution, so it
    /// must happen before the splice.
    fn update_jewel_state_on_replaced(
        &mut self,
        old: &Solution,
        start: usize,
        length: usize,
        replacement: &[Direction],
    ) {
        let starts = self.coords_along(old);
        let anchor = starts[start];

        let mut pos = anchor;
        for i in start..start + length {
            let mv = self
                .graph
                .from_cell_dir(pos, old.get(i))
                .expect("solution follows live moves");
            for &j in &mv.jewels {
                self.jewel_state.remove(j);
            }
            pos = mv.end;
        }

        pos = anchor;
        for &dir in replacement {
            let mv = self
                .graph
                .from_cell_dir(pos, dir)
                .expect("replacement follows live moves");
            for &j in &mv.jewels {
                self.jewel_state.add(j);
            }
            pos = mv.end;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::direction::Direction;
    use crate::solver::solution::{replay_collects_all, Solution};
    use crate::solver::testutil::with_search;
    use crate::solver::walk_moves;

    // An open room: east to the far wall, then south onto the jewel.
    const OPEN_ROOM: &str = "5 6 10\n######\n#.   #\n#    #\n#   +#\n######\n";

    #[test]
    fn run_removal_contracts_to_a_fixpoint() {
        with_search(OPEN_ROOM, |search| {
            let mut solution = Solution::empty();
            for dir in [
                Direction::East,
                Direction::West,
                Direction::East,
                Direction::South,
            ] {
                solution.push(dir);
            }

            // Counts must reflect the solution before shortening.
            let mut jewel_state = search.jewel_state.clone();
            walk_moves(search.graph, search.graph.vehicle(), solution.iter(), |mv| {
                for &j in &mv.jewels {
                    jewel_state.add(j);
                }
            });
            search.jewel_state = jewel_state;

            let mut previous = solution.len();
            while search.try_remove_any_run(&mut solution) {
                assert!(solution.len() < previous);
                previous = solution.len();
            }

            assert_eq!(solution.len(), 2);
            // Idempotent at the fixpoint.
            assert!(!search.try_remove_any_run(&mut solution));

            assert!(replay_collects_all(
                search.level,
                search.jewels,
                search.graph.vehicle(),
                &solution,
                search.config.vehicle_spot_is_hole,
            ));
        });
    }

    #[test]
    fn solutions_without_redundancy_are_untouched() {
        with_search(OPEN_ROOM, |search| {
            let mut solution = Solution::empty();
            solution.push(Direction::East);
            solution.push(Direction::South);

            let mut jewel_state = search.jewel_state.clone();
            walk_moves(search.graph, search.graph.vehicle(), solution.iter(), |mv| {
                for &j in &mv.jewels {
                    jewel_state.add(j);
                }
            });
            search.jewel_state = jewel_state;

            assert!(!search.try_remove_any_run(&mut solution));
            assert_eq!(solution.len(), 2);
        });
    }
}
