//! Strongly connected components of the slide graph.
//!
//! Components carry topological ranks (0 = source-most), bridge edges,
//! successor/predecessor lists and the jewels collectible inside them. On
//! top of that sits the conditional-unreachability matrix: `U[a][b]` holds
//! when entering component `a` makes component `b` unreachable for the rest
//! of the run, which is what the solvability prefilter and the search-time
//! admission checks consume.

use std::collections::BTreeSet;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::board::{JewelId, JewelIndex, Level};
use crate::core::coord::Coord;
use crate::core::direction::DIRECTIONS;
use crate::core::grid::Grid;
use crate::graph::metric::Metric;
use crate::graph::moves::{MoveGraph, MoveId};

pub type SccId = usize;

#[derive(Debug, Clone)]
pub struct Scc {
    /// Topological rank; every bridge goes from a lower to a higher rank.
    pub id: SccId,
    pub nodes: Vec<Coord>,
    /// Moves leaving this component.
    pub bridges: Vec<MoveId>,
    pub neighbours: Vec<SccId>,
    pub predecessors: Vec<SccId>,
    /// Jewels assignable to this component, sorted.
    pub jewels: Vec<JewelId>,
}

#[derive(Debug, Clone)]
pub struct SccGraph {
    sccs: Vec<Scc>,
    id_at: Grid<Option<SccId>>,
    /// Row-major `num_sccs × num_sccs`: true iff traversing the row's
    /// component forbids ever reaching the column's.
    unreachable_after: Vec<bool>,
    last_scc_with_jewel: Vec<SccId>,
    num_sccs_with_jewel: Vec<i32>,
}

impl SccGraph {
    pub fn build(level: &Level, graph: &MoveGraph, metric: &Metric, jewels: &JewelIndex) -> SccGraph {
        let n = metric.num_nodes();

        let mut digraph: DiGraph<(), ()> = DiGraph::with_capacity(n, graph.len());
        for _ in 0..n {
            digraph.add_node(());
        }
        for mv in graph.iter() {
            digraph.add_edge(
                NodeIndex::new(metric.node(mv.start)),
                NodeIndex::new(metric.node(mv.end)),
                (),
            );
        }

        // tarjan_scc emits components in reverse topological order; flip the
        // list so index 0 is the source-most component.
        let mut components = petgraph::algo::tarjan_scc(&digraph);
        components.reverse();

        let mut id_at = Grid::new(level.width(), level.height(), None);
        let mut sccs: Vec<Scc> = Vec::with_capacity(components.len());
        for (id, members) in components.into_iter().enumerate() {
            let nodes: Vec<Coord> = members.iter().map(|&ix| metric.pos(ix.index())).collect();
            for &pos in &nodes {
                id_at[pos] = Some(id);
            }
            sccs.push(Scc {
                id,
                nodes,
                bridges: Vec::new(),
                neighbours: Vec::new(),
                predecessors: Vec::new(),
                jewels: Vec::new(),
            });
        }

        let mut scc_graph = SccGraph {
            sccs,
            id_at,
            unreachable_after: Vec::new(),
            last_scc_with_jewel: vec![0; jewels.count()],
            num_sccs_with_jewel: vec![0; jewels.count()],
        };
        scc_graph.fill_bridges(graph);
        scc_graph.fill_unreachability();
        scc_graph.assign_jewels(graph, jewels);
        scc_graph
    }

    fn fill_bridges(&mut self, graph: &MoveGraph) {
        let num_sccs = self.sccs.len();
        for id in 0..num_sccs {
            let mut neighbours = BTreeSet::new();
            let mut bridges = Vec::new();

            for i in 0..self.sccs[id].nodes.len() {
                let pos = self.sccs[id].nodes[i];
                for dir in DIRECTIONS {
                    let Some(mv) = graph.from_cell_dir(pos, dir) else {
                        continue;
                    };
                    let target = self.id(mv.end);
                    if target != id {
                        bridges.push(mv.id);
                        neighbours.insert(target);
                    }
                }
            }

            self.sccs[id].bridges = bridges;
            self.sccs[id].neighbours = neighbours.into_iter().collect();

            let neighbours = self.sccs[id].neighbours.clone();
            for target in neighbours {
                self.sccs[target].predecessors.push(id);
            }
        }
    }

    /// `U[a][b]` is the complement of forward + backward reachability from
    /// `a` in the condensation DAG.
    fn fill_unreachability(&mut self) {
        let n = self.sccs.len();
        self.unreachable_after = vec![true; n * n];

        let mut stack = Vec::new();
        let mut seen = vec![false; n];
        for a in 0..n {
            for forward in [true, false] {
                seen.fill(false);
                seen[a] = true;
                stack.clear();
                stack.push(a);
                while let Some(s) = stack.pop() {
                    self.unreachable_after[a * n + s] = false;
                    let next = if forward {
                        &self.sccs[s].neighbours
                    } else {
                        &self.sccs[s].predecessors
                    };
                    for &t in next {
                        if !seen[t] {
                            seen[t] = true;
                            stack.push(t);
                        }
                    }
                }
            }
        }
    }

    /// A jewel sitting on a bridge is collectible from the bridge's target
    /// component, unless it lies on the bridge's start cell (the vehicle is
    /// still in the source component when it sweeps that cell).
    fn assign_jewels(&mut self, graph: &MoveGraph, jewels: &JewelIndex) {
        let mut per_scc: Vec<BTreeSet<JewelId>> = vec![BTreeSet::new(); self.sccs.len()];

        for mv in graph.iter() {
            let source = self.id(mv.start);
            let target = self.id(mv.end);
            for &jewel in &mv.jewels {
                if source != target && jewels.id_at(mv.start) != Some(jewel) {
                    per_scc[target].insert(jewel);
                } else {
                    per_scc[source].insert(jewel);
                }
            }
        }

        for (scc, set) in self.sccs.iter_mut().zip(per_scc) {
            scc.jewels = set.into_iter().collect();
        }

        for scc in &self.sccs {
            for &jewel in &scc.jewels {
                self.last_scc_with_jewel[jewel] = scc.id;
                self.num_sccs_with_jewel[jewel] += 1;
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sccs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sccs.is_empty()
    }

    #[inline]
    pub fn sccs(&self) -> &[Scc] {
        &self.sccs
    }

    /// Component of a coordinate known to be a graph node.
    #[inline]
    pub fn id(&self, c: Coord) -> SccId {
        self.id_at[c].expect("coordinate is a graph node")
    }

    #[inline]
    pub fn id_at(&self, c: Coord) -> Option<SccId> {
        self.id_at[c]
    }

    #[inline]
    pub fn unreachable_after(&self, traversed: SccId, target: SccId) -> bool {
        self.unreachable_after[traversed * self.sccs.len() + target]
    }

    /// Largest topological rank of a component containing `jewel`.
    #[inline]
    pub fn last_scc_with_jewel(&self, jewel: JewelId) -> SccId {
        self.last_scc_with_jewel[jewel]
    }

    #[inline]
    pub fn num_sccs_with_jewel(&self, jewel: JewelId) -> i32 {
        self.num_sccs_with_jewel[jewel]
    }

    /// Prefilter: unsolvable when two jewels each live in a single component
    /// and those components are mutually exclusive.
    pub fn may_be_solvable(&self) -> bool {
        for scc in &self.sccs {
            for &jewel in &scc.jewels {
                if self.num_sccs_with_jewel[jewel] != 1 {
                    continue;
                }
                for other in &self.sccs {
                    if other.id == scc.id || !self.unreachable_after(scc.id, other.id) {
                        continue;
                    }
                    for &other_jewel in &other.jewels {
                        if self.num_sccs_with_jewel[other_jewel] == 1 {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    /// Whether entering component `id` keeps every jewel collectible, given
    /// the components already traversed. Temporarily discounts the
    /// per-jewel component counts; false positives only cost search time.
    pub fn remains_solvable_after_entering(&mut self, traversed: &[bool], id: SccId) -> bool {
        if traversed[id] {
            return true;
        }

        let n = self.sccs.len();
        let mut remains_solvable = true;
        for lost in 0..n {
            if !self.unreachable_after(id, lost) {
                continue;
            }
            for i in 0..self.sccs[lost].jewels.len() {
                let jewel = self.sccs[lost].jewels[i];
                self.num_sccs_with_jewel[jewel] -= 1;
                if self.num_sccs_with_jewel[jewel] <= 0 {
                    remains_solvable = false;
                }
            }
        }

        for lost in 0..n {
            if !self.unreachable_after(id, lost) {
                continue;
            }
            for i in 0..self.sccs[lost].jewels.len() {
                let jewel = self.sccs[lost].jewels[i];
                self.num_sccs_with_jewel[jewel] += 1;
            }
        }

        remains_solvable
    }
}
