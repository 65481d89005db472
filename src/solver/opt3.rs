//! Non-reversing 3-opt over coalesced tours.
//!
//! The tour is reduced to the nodes around edges that first-collect a jewel;
//! everything between them is re-derivable from the distance table. On that
//! list the only order-preserving 3-opt reconnection is
//! `0→1→2→3  ⇒  0→2→1→3`, evaluated with a bounded window that grows when an
//! iteration stops improving, which converges much faster on big boards.

use crate::graph::metric::{NodeId, INFINITE_DISTANCE};
use crate::solver::solution::Solution;
use crate::solver::{walk_moves, Search};

impl Search<'_> {
    /// Shrink `solution` with growing-window 3-opt passes until it fits the
    /// move budget or stops improving.
    pub(crate) fn optimize_3opt(&self, solution: &mut Solution) {
        let (nodes, important) = self.solution_to_coalesced_node_list(solution);

        let mut successors: Vec<usize> = (1..=nodes.len()).collect();

        let mut window = self
            .config
            .minimal_opt3_window_size
            .max((nodes.len() as f32).sqrt() as usize);

        while solution.len() as i32 > self.level.max_moves() {
            if !self.opt3_pass(&nodes, &mut successors, &important, window) {
                break;
            }

            *solution = self.solution_through_successors(&nodes, &successors);

            window = ((window as f32 * self.config.opt3_window_increase_factor) as usize)
                .min(nodes.len());
        }
    }

    /// One scan over ordered edge triples `(i, j, k)` within the window.
    /// Commits the first improving reconnection it finds and restarts from
    /// the outside, because a rewire invalidates the successor walk.
    fn opt3_pass(
        &self,
        nodes: &[NodeId],
        successors: &mut [usize],
        important: &[bool],
        window: usize,
    ) -> bool {
        let len = nodes.len();
        let total_length = self.solution_through_successors(nodes, successors).len() as i32;
        let mut saved_length = 0i32;
        let mut any_improvement = false;

        let mut i = 0;
        let mut i0 = 0;
        while i0 + 5 < len {
            if total_length - saved_length <= self.level.max_moves() {
                break;
            }

            if !important[i] {
                let i_start = nodes[i];
                let i_end = nodes[successors[i]];
                let i_cost = self.metric.distance(i_start, i_end) as i32;

                let mut j = successors[successors[i]];
                let mut j0 = i0 + 2;
                'scan: while j0 + 3 < len && j0 < i0 + window {
                    if !important[j] {
                        let j_start = nodes[j];
                        let j_end = nodes[successors[j]];
                        let j_cost = self.metric.distance(j_start, j_end) as i32;

                        let mut k = successors[successors[j]];
                        let mut k0 = j0 + 2;
                        while k0 + 1 < len && k0 < j0 + window {
                            if !important[k] {
                                let k_start = nodes[k];
                                let k_end = nodes[successors[k]];
                                let k_cost = self.metric.distance(k_start, k_end) as i32;

                                // 0→1→2→3 becomes 0→2→1→3.
                                let i_cost_new = self.metric.distance(i_start, j_end);
                                let j_cost_new = self.metric.distance(k_start, i_end);
                                let k_cost_new = self.metric.distance(j_start, k_end);
                                if i_cost_new != INFINITE_DISTANCE
                                    && j_cost_new != INFINITE_DISTANCE
                                    && k_cost_new != INFINITE_DISTANCE
                                {
                                    let cost = i_cost + j_cost + k_cost;
                                    let cost_new = i_cost_new as i32
                                        + j_cost_new as i32
                                        + k_cost_new as i32;
                                    if cost_new < cost {
                                        let sj = successors[j];
                                        successors[j] = successors[k];
                                        successors[k] = successors[i];
                                        successors[i] = sj;

                                        saved_length += cost - cost_new;
                                        any_improvement = true;
                                        // The inner walks are stale after a
                                        // rewire; continue from i along the
                                        // new chain.
                                        break 'scan;
                                    }
                                }
                            }

                            k = successors[k];
                            k0 += 1;
                        }
                    }

                    j = successors[j];
                    j0 += 1;
                }
            }

            i = successors[i];
            i0 += 1;
        }

        any_improvement
    }

    /// Expand consecutive tour nodes into a direction sequence via shortest
    /// paths.
    pub(crate) fn solution_through_nodes(&self, nodes: &[NodeId]) -> Solution {
        let mut solution = Solution::empty();
        let mut path = Vec::new();
        for segment in nodes.windows(2) {
            path.clear();
            self.metric.shortest_path(
                self.graph,
                self.metric.pos(segment[0]),
                self.metric.pos(segment[1]),
                &mut path,
            );
            solution.append(&path);
        }
        solution
    }

    /// Same expansion, but following the successor chain of a 3-opt tour.
    fn solution_through_successors(&self, nodes: &[NodeId], successors: &[usize]) -> Solution {
        let mut solution = Solution::empty();
        let mut path = Vec::new();
        let mut i = 0;
        for _ in 0..nodes.len().saturating_sub(1) {
            let next = successors[i];
            path.clear();
            self.metric.shortest_path(
                self.graph,
                self.metric.pos(nodes[i]),
                self.metric.pos(nodes[next]),
                &mut path,
            );
            solution.append(&path);
            i = next;
        }
        solution
    }

    /// Node list of a solution plus, per edge, whether it collects a jewel
    /// for the first time.
    fn solution_to_node_list(&self, solution: &Solution) -> (Vec<NodeId>, Vec<bool>) {
        let mut nodes = vec![self.metric.node(self.graph.vehicle())];
        let mut important = Vec::with_capacity(solution.len());

        let mut collected = vec![false; self.jewels.count()];
        walk_moves(self.graph, self.graph.vehicle(), solution.iter(), |mv| {
            let mut any_new = false;
            for &jewel in &mv.jewels {
                if !collected[jewel] {
                    collected[jewel] = true;
                    any_new = true;
                }
            }

            nodes.push(self.metric.node(mv.end));
            important.push(any_new);
        });

        (nodes, important)
    }

    /// Drop interior nodes whose surrounding edges collect nothing new; the
    /// remaining tour is what 3-opt may rewire.
    fn solution_to_coalesced_node_list(&self, solution: &Solution) -> (Vec<NodeId>, Vec<bool>) {
        let (nodes, important) = self.solution_to_node_list(solution);

        let mut coalesced_nodes = vec![self.metric.node(self.graph.vehicle())];
        let mut coalesced_important = Vec::new();
        for i in 0..important.len().saturating_sub(1) {
            if important[i] || important[i + 1] {
                coalesced_nodes.push(nodes[i + 1]);
                coalesced_important.push(important[i]);
            }
        }
        coalesced_nodes.push(*nodes.last().expect("solution has a start node"));
        coalesced_important.push(*important.last().expect("solution is non-empty"));

        (coalesced_nodes, coalesced_important)
    }
}
