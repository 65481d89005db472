use jewel_hunt::board::io::read_level;
use jewel_hunt::board::JewelIndex;
use jewel_hunt::graph::metric::Metric;
use jewel_hunt::graph::moves::MoveGraph;
use jewel_hunt::graph::scc::SccGraph;

// Two one-way chambers behind holes, separated by a mine. Entering either
// chamber strands the jewel of the other one.
const TWO_CHAMBERS: &str = "\
4 9 20
#########
#+O * O+#
####.####
#########
";

const PLAYGROUND: &str = "\
5 8 10
########
#.  + O#
#   *  #
#+     #
########
";

fn build(text: &str) -> (MoveGraph, SccGraph) {
    let level = read_level(&mut text.as_bytes()).unwrap();
    let jewels = JewelIndex::new(level.board());
    let graph = MoveGraph::build(&level, &jewels, false);
    let metric = Metric::build(&level, &graph);
    let sccs = SccGraph::build(&level, &graph, &metric, &jewels);
    (graph, sccs)
}

#[test]
fn bridges_go_from_lower_to_higher_rank() {
    for text in [TWO_CHAMBERS, PLAYGROUND] {
        let (graph, sccs) = build(text);
        for mv in graph.iter() {
            let source = sccs.id(mv.start);
            let target = sccs.id(mv.end);
            if source != target {
                assert!(source < target);
            }
        }
    }
}

#[test]
fn unreachability_is_the_complement_of_dag_reachability() {
    for text in [TWO_CHAMBERS, PLAYGROUND] {
        let (_, sccs) = build(text);
        let n = sccs.len();

        // Forward reachability over the recorded neighbour lists.
        let mut reach = vec![vec![false; n]; n];
        for a in 0..n {
            let mut stack = vec![a];
            while let Some(s) = stack.pop() {
                if reach[a][s] {
                    continue;
                }
                reach[a][s] = true;
                stack.extend(sccs.sccs()[s].neighbours.iter().copied());
            }
        }

        for a in 0..n {
            assert!(!sccs.unreachable_after(a, a));
            for b in 0..n {
                let expected = !reach[a][b] && !reach[b][a];
                assert_eq!(sccs.unreachable_after(a, b), expected, "a={a} b={b}");
            }
        }
    }
}

#[test]
fn predecessors_mirror_neighbours() {
    for text in [TWO_CHAMBERS, PLAYGROUND] {
        let (_, sccs) = build(text);
        for scc in sccs.sccs() {
            for &next in &scc.neighbours {
                assert!(sccs.sccs()[next].predecessors.contains(&scc.id));
            }
            for &prev in &scc.predecessors {
                assert!(sccs.sccs()[prev].neighbours.contains(&scc.id));
            }
        }
    }
}

#[test]
fn chamber_jewels_are_assigned_to_their_single_component() {
    let (_, sccs) = build(TWO_CHAMBERS);

    assert!(sccs.len() >= 3);
    assert_eq!(sccs.num_sccs_with_jewel(0), 1);
    assert_eq!(sccs.num_sccs_with_jewel(1), 1);

    let home_of_0 = sccs.last_scc_with_jewel(0);
    let home_of_1 = sccs.last_scc_with_jewel(1);
    assert_ne!(home_of_0, home_of_1);
    assert!(sccs.unreachable_after(home_of_0, home_of_1));
    assert!(sccs.unreachable_after(home_of_1, home_of_0));
}

#[test]
fn the_prefilter_rejects_mutually_exclusive_chambers() {
    let (_, sccs) = build(TWO_CHAMBERS);
    assert!(!sccs.may_be_solvable());

    let (_, sccs) = build(PLAYGROUND);
    assert!(sccs.may_be_solvable());
}
