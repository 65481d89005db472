//! The potential field guiding the backtracking search.
//!
//! Every uncollected jewel exerts a pull on every edge: 255 on the edges
//! that sweep it, attenuated by `⌊p/7⌋·3` per backward hop through the
//! move graph. The per-edge sum over currently uncollected jewels is the
//! ordering key of the search; collecting or un-collecting a jewel flips
//! its whole row in and out of the totals.

use std::f32::consts::FRAC_1_SQRT_2;

use crate::board::JewelId;
use crate::graph::moves::{MoveGraph, MoveId};

pub type Potential = u8;
pub type TotalPotential = u32;

#[derive(Debug, Clone)]
pub struct PotentialField {
    num_edges: usize,
    /// Jewel-major rows: `per_jewel[jewel * num_edges + edge]`.
    per_jewel: Vec<Potential>,
    total: Vec<TotalPotential>,
}

impl PotentialField {
    /// A zero-size placeholder for solves that never reach the search stage.
    pub fn empty() -> Self {
        Self {
            num_edges: 0,
            per_jewel: Vec::new(),
            total: Vec::new(),
        }
    }

    /// Seed, propagate and summarize in one pass. All jewels contribute;
    /// the caller disables rows as jewels get collected.
    pub fn build(graph: &MoveGraph, num_jewels: usize, max_potential: Potential) -> Self {
        let num_edges = graph.len();
        let mut field = Self {
            num_edges,
            per_jewel: vec![0; num_jewels * num_edges],
            total: vec![0; num_edges],
        };

        for mv in graph.iter() {
            for &jewel in &mv.jewels {
                field.per_jewel[jewel * num_edges + mv.id] = max_potential;
            }
        }

        for jewel in 0..num_jewels {
            field.propagate_from(graph, jewel);
        }

        field.summarize(graph);
        field
    }

    /// One attenuation step. Integer truncation makes repeated application
    /// hit zero within 32 hops from any starting value.
    #[inline]
    pub fn saturate(p: Potential) -> Potential {
        p / 7 * 3
    }

    /// Backward BFS from the jewel's collecting edges: an edge ending where
    /// another edge starts inherits the attenuated potential, and is
    /// re-expanded only when its value strictly increased.
    fn propagate_from(&mut self, graph: &MoveGraph, jewel: JewelId) {
        let base = jewel * self.num_edges;

        let mut queue: std::collections::VecDeque<MoveId> =
            graph.collecting(jewel).iter().copied().collect();

        while let Some(id) = queue.pop_front() {
            let start = graph.get(id).start;
            let propagated = Self::saturate(self.per_jewel[base + id]);

            for &incoming in graph.ending_at(start) {
                if propagated > self.per_jewel[base + incoming] {
                    self.per_jewel[base + incoming] = propagated;
                    queue.push_back(incoming);
                }
            }
        }
    }

    /// Scale diagonal edges by 1/√2 (they cover more board per step) and
    /// fold every row into the totals.
    fn summarize(&mut self, graph: &MoveGraph) {
        let num_jewels = self.per_jewel.len() / self.num_edges.max(1);
        for jewel in 0..num_jewels {
            let base = jewel * self.num_edges;
            for edge in 0..self.num_edges {
                if graph.get(edge).dir.is_diagonal() {
                    let scaled = self.per_jewel[base + edge] as f32 * FRAC_1_SQRT_2;
                    self.per_jewel[base + edge] = scaled as Potential;
                }
                self.total[edge] += self.per_jewel[base + edge] as TotalPotential;
            }
        }
    }

    #[inline]
    pub fn total(&self, edge: MoveId) -> TotalPotential {
        self.total[edge]
    }

    #[inline]
    pub fn jewel_potential(&self, jewel: JewelId, edge: MoveId) -> Potential {
        self.per_jewel[jewel * self.num_edges + edge]
    }

    /// The jewel became uncollected again: its row pulls once more.
    pub fn enable_contribution(&mut self, jewel: JewelId) {
        let base = jewel * self.num_edges;
        for edge in 0..self.num_edges {
            self.total[edge] += self.per_jewel[base + edge] as TotalPotential;
        }
    }

    /// The jewel was collected for the first time: retract its row.
    pub fn disable_contribution(&mut self, jewel: JewelId) {
        let base = jewel * self.num_edges;
        for edge in 0..self.num_edges {
            self.total[edge] -= self.per_jewel[base + edge] as TotalPotential;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::JewelIndex;
    use crate::board::io::read_level;
    use crate::graph::moves::MoveGraph;

    #[test]
    fn saturation_is_a_contraction_to_zero() {
        for start in 0..=u8::MAX {
            assert!(PotentialField::saturate(start) <= start);

            let mut p = start;
            let mut hops = 0;
            while p > 0 {
                p = PotentialField::saturate(p);
                hops += 1;
                assert!(hops <= 32);
            }
        }
    }

    #[test]
    fn collecting_edges_peak_and_contributions_flip() {
        // A hole splits the corridor: the second hop collects the jewel.
        let text = "3 7 9\n#######\n#.O  +#\n#######\n";
        let level = read_level(&mut text.as_bytes()).unwrap();
        let jewels = JewelIndex::new(level.board());
        let graph = MoveGraph::build(&level, &jewels, false);

        let mut field = PotentialField::build(&graph, jewels.count(), u8::MAX);

        let mut saw_peak = false;
        for mv in graph.iter() {
            let p = field.jewel_potential(0, mv.id);
            if mv.jewels.contains(&0) {
                assert_eq!(p, u8::MAX);
                saw_peak = true;
            } else {
                assert!(p < u8::MAX);
            }
            assert_eq!(field.total(mv.id), p as TotalPotential);
        }
        assert!(saw_peak);

        let totals: Vec<TotalPotential> = (0..graph.len()).map(|e| field.total(e)).collect();
        field.disable_contribution(0);
        assert!((0..graph.len()).all(|e| field.total(e) == 0));
        field.enable_contribution(0);
        assert_eq!(
            (0..graph.len()).map(|e| field.total(e)).collect::<Vec<_>>(),
            totals
        );
    }
}
