use jewel_hunt::board::io::read_level;
use jewel_hunt::board::JewelIndex;
use jewel_hunt::core::direction::Direction;
use jewel_hunt::graph::metric::{Metric, INFINITE_DISTANCE};
use jewel_hunt::graph::moves::MoveGraph;

const PLAYGROUND: &str = "\
5 8 10
########
#.  + O#
#   *  #
#+     #
########
";

fn build(text: &str) -> (jewel_hunt::board::Level, MoveGraph, Metric) {
    let level = read_level(&mut text.as_bytes()).unwrap();
    let jewels = JewelIndex::new(level.board());
    let graph = MoveGraph::build(&level, &jewels, false);
    let metric = Metric::build(&level, &graph);
    (level, graph, metric)
}

#[test]
fn every_move_endpoint_is_a_node() {
    let (_, graph, metric) = build(PLAYGROUND);

    for mv in graph.iter() {
        assert!(metric.node_at(mv.start).is_some());
        assert!(metric.node_at(mv.end).is_some());
    }
    assert!(metric.node_at(graph.vehicle()).is_some());
}

#[test]
fn self_distance_is_zero() {
    let (_, _, metric) = build(PLAYGROUND);
    for u in 0..metric.num_nodes() {
        assert_eq!(metric.distance(u, u), 0);
    }
}

#[test]
fn distances_satisfy_the_triangle_inequality() {
    let (_, _, metric) = build(PLAYGROUND);

    let n = metric.num_nodes();
    for u in 0..n {
        for v in 0..n {
            for w in 0..n {
                let uw = metric.distance(u, w);
                let wv = metric.distance(w, v);
                if uw == INFINITE_DISTANCE || wv == INFINITE_DISTANCE {
                    continue;
                }
                let uv = metric.distance(u, v);
                assert!(uv != INFINITE_DISTANCE && uv as u32 <= uw as u32 + wv as u32);
            }
        }
    }
}

#[test]
fn finite_distances_are_realized_by_some_successor() {
    let (_, graph, metric) = build(PLAYGROUND);

    let n = metric.num_nodes();
    for u in 0..n {
        for v in 0..n {
            let d = metric.distance(u, v);
            if d == 0 || d == INFINITE_DISTANCE {
                continue;
            }

            let realized = graph
                .moves_from(metric.pos(u))
                .any(|mv| metric.distance(metric.node(mv.end), v) == d - 1);
            assert!(realized, "no realizing successor for {u} -> {v}");
        }
    }
}

#[test]
fn shortest_path_reconstruction_matches_the_table() {
    let (_, graph, metric) = build(PLAYGROUND);

    let n = metric.num_nodes();
    for u in 0..n {
        for v in 0..n {
            let d = metric.distance(u, v);
            let mut path: Vec<Direction> = Vec::new();
            let found = metric.shortest_path(&graph, metric.pos(u), metric.pos(v), &mut path);
            if d == INFINITE_DISTANCE {
                assert!(!found);
                continue;
            }

            assert!(found);
            assert_eq!(path.len(), d as usize);

            let mut pos = metric.pos(u);
            for dir in path {
                pos = graph.from_cell_dir(pos, dir).expect("path is live").end;
            }
            assert_eq!(pos, metric.pos(v));
        }
    }
}

#[test]
fn budgeted_paths_respect_their_length_bound() {
    let (_, graph, metric) = build(PLAYGROUND);

    let n = metric.num_nodes();
    for u in 0..n {
        for v in 0..n {
            let d = metric.distance(u, v);
            if d == INFINITE_DISTANCE || d == 0 {
                continue;
            }

            let mut path = Vec::new();
            assert!(!metric.path_with_length(&graph, metric.pos(u), metric.pos(v), d as i32 - 1, &mut path));
        }
    }
}
