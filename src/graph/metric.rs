//! Dense node ids and the BFS all-pairs distance table.
//!
//! A node is any cell where some live move comes to rest, plus the vehicle
//! start (which may have no incoming move). Every edge has unit weight, so
//! one BFS per node fills its distance row.

use smallvec::SmallVec;

use crate::core::coord::Coord;
use crate::core::direction::Direction;
use crate::core::grid::Grid;
use crate::graph::moves::MoveGraph;
use crate::board::Level;

pub type NodeId = usize;
pub type Distance = u16;

/// Larger than any path on a board whose coordinates fit `i32`.
pub const INFINITE_DISTANCE: Distance = Distance::MAX;

#[derive(Debug, Clone)]
pub struct Metric {
    node_id_at: Grid<Option<NodeId>>,
    node_pos: Vec<Coord>,
    dist: Vec<Distance>,
}

impl Metric {
    pub fn build(level: &Level, graph: &MoveGraph) -> Metric {
        let mut node_id_at = Grid::new(level.width(), level.height(), None);
        let mut node_pos = Vec::new();

        // Ends get ids in move-discovery order; every node other than the
        // vehicle start is some move's end.
        for mv in graph.iter() {
            if node_id_at[mv.end].is_none() {
                node_id_at[mv.end] = Some(node_pos.len());
                node_pos.push(mv.end);
            }
        }
        if node_id_at[graph.vehicle()].is_none() {
            node_id_at[graph.vehicle()] = Some(node_pos.len());
            node_pos.push(graph.vehicle());
        }

        let n = node_pos.len();
        let mut metric = Metric {
            node_id_at,
            node_pos,
            dist: vec![INFINITE_DISTANCE; n * n],
        };
        metric.fill_distances(graph);
        metric
    }

    fn fill_distances(&mut self, graph: &MoveGraph) {
        let n = self.node_pos.len();

        let mut succ: Vec<SmallVec<[NodeId; 8]>> = vec![SmallVec::new(); n];
        for (u, &pos) in self.node_pos.iter().enumerate() {
            for mv in graph.moves_from(pos) {
                succ[u].push(self.node(mv.end));
            }
        }

        // A fixed-length queue works because each node is visited once.
        let mut queue: Vec<NodeId> = vec![0; n];
        let mut visited = vec![false; n];
        for s in 0..n {
            visited.fill(false);
            visited[s] = true;
            self.dist[s * n + s] = 0;
            queue[0] = s;
            let mut head = 0;
            let mut tail = 1;
            while head < tail {
                let v = queue[head];
                head += 1;
                let base = self.dist[s * n + v];
                for &w in &succ[v] {
                    if !visited[w] {
                        visited[w] = true;
                        self.dist[s * n + w] = base + 1;
                        queue[tail] = w;
                        tail += 1;
                    }
                }
            }
        }
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.node_pos.len()
    }

    #[inline]
    pub fn node_at(&self, c: Coord) -> Option<NodeId> {
        self.node_id_at[c]
    }

    /// Node id of a coordinate known to be a graph node.
    #[inline]
    pub fn node(&self, c: Coord) -> NodeId {
        self.node_id_at[c].expect("coordinate is a graph node")
    }

    #[inline]
    pub fn pos(&self, node: NodeId) -> Coord {
        self.node_pos[node]
    }

    #[inline]
    pub fn distance(&self, from: NodeId, to: NodeId) -> Distance {
        self.dist[from * self.node_pos.len() + to]
    }

    #[inline]
    pub fn distance_between(&self, from: Coord, to: Coord) -> Distance {
        self.distance(self.node(from), self.node(to))
    }

    /// Append a shortest direction sequence from `from` to `to` onto `path`.
    pub fn shortest_path(
        &self,
        graph: &MoveGraph,
        from: Coord,
        to: Coord,
        path: &mut Vec<Direction>,
    ) -> bool {
        let budget = self.distance_between(from, to) as i32;
        self.path_with_length(graph, from, to, budget, path)
    }

    /// Append a direction sequence of at most `length` moves from `from` to
    /// `to`, chosen greedily by strictly decreasing distance-to-target.
    /// Returns false (leaving `path` partially extended) when no such
    /// sequence exists.
    pub fn path_with_length(
        &self,
        graph: &MoveGraph,
        from: Coord,
        to: Coord,
        mut length: i32,
        path: &mut Vec<Direction>,
    ) -> bool {
        let to_id = self.node(to);
        let mut from_id = self.node(from);

        if (self.distance(from_id, to_id) as i32) > length {
            return false;
        }

        while from_id != to_id {
            if length <= 0 {
                return false;
            }
            length -= 1;

            let here = self.distance(from_id, to_id);
            let mut advanced = false;
            for mv in graph.moves_from(self.node_pos[from_id]) {
                let next = self.node(mv.end);
                if self.distance(next, to_id) < here {
                    path.push(mv.dir);
                    from_id = next;
                    advanced = true;
                    break;
                }
            }

            if !advanced {
                return false;
            }
        }

        true
    }
}
