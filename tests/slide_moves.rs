use jewel_hunt::board::io::read_level;
use jewel_hunt::board::JewelIndex;
use jewel_hunt::core::coord::Coord;
use jewel_hunt::core::direction::Direction;
use jewel_hunt::graph::moves::MoveGraph;

const PLAYGROUND: &str = "\
5 8 10
########
#.  + O#
#   *  #
#+     #
########
";

fn build(text: &str) -> (jewel_hunt::board::Level, JewelIndex, MoveGraph) {
    let level = read_level(&mut text.as_bytes()).unwrap();
    let jewels = JewelIndex::new(level.board());
    let graph = MoveGraph::build(&level, &jewels, false);
    (level, jewels, graph)
}

#[test]
fn a_slide_sweeps_interior_jewels_and_stops_at_a_hole() {
    let (_, jewels, graph) = build(PLAYGROUND);
    let top_jewel = jewels.id_at(Coord::new(4, 1)).unwrap();

    let mv = graph
        .from_cell_dir(Coord::new(1, 1), Direction::East)
        .expect("east slide is live");
    assert_eq!(mv.end, Coord::new(6, 1));
    assert_eq!(mv.jewels, vec![top_jewel]);
}

#[test]
fn a_wall_stops_the_slide_one_cell_short() {
    let (_, jewels, graph) = build(PLAYGROUND);
    let left_jewel = jewels.id_at(Coord::new(1, 3)).unwrap();

    let mv = graph
        .from_cell_dir(Coord::new(1, 1), Direction::South)
        .expect("south slide is live");
    assert_eq!(mv.end, Coord::new(1, 3));
    assert_eq!(mv.jewels, vec![left_jewel]);

    // Blocked immediately: the north neighbour is the border wall.
    assert!(graph
        .from_cell_dir(Coord::new(1, 1), Direction::North)
        .is_none());
}

#[test]
fn a_mine_kills_the_whole_direction() {
    let (_, _, graph) = build(PLAYGROUND);

    // (4,1) is reachable (NW slide from (6,3) stops there); sliding south
    // from it runs straight into the mine at (4,2).
    assert!(graph
        .from_cell_dir(Coord::new(4, 1), Direction::NorthWest)
        .is_none());
    assert!(graph
        .from_cell_dir(Coord::new(4, 1), Direction::South)
        .is_none());
    assert!(graph
        .from_cell_dir(Coord::new(4, 1), Direction::East)
        .is_some());
}

#[test]
fn a_jewel_on_the_start_cell_joins_the_move() {
    let (_, jewels, graph) = build(PLAYGROUND);
    let top_jewel = jewels.id_at(Coord::new(4, 1)).unwrap();

    let mv = graph
        .from_cell_dir(Coord::new(4, 1), Direction::East)
        .expect("east slide from the jewel cell is live");
    assert_eq!(mv.end, Coord::new(6, 1));
    assert_eq!(mv.jewels, vec![top_jewel]);
}

#[test]
fn every_live_move_is_a_proper_edge() {
    let (_, _, graph) = build(PLAYGROUND);

    assert!(!graph.is_empty());
    for mv in graph.iter() {
        assert_ne!(mv.start, mv.end);
        assert_eq!(
            Direction::from_displacement(mv.start, mv.end),
            Some(mv.dir)
        );
    }
}

#[test]
fn two_independent_builds_produce_identical_edge_sets() {
    let (level, jewels, first) = build(PLAYGROUND);
    let second = MoveGraph::build(&level, &jewels, false);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a, b);
    }
}

#[test]
fn vehicle_spot_can_be_configured_as_a_hole() {
    let text = "3 7 9\n#######\n#  .  #\n#######\n";
    let level = read_level(&mut text.as_bytes()).unwrap();
    let jewels = JewelIndex::new(level.board());

    let pass_through = MoveGraph::build(&level, &jewels, false);
    let mv = pass_through
        .from_cell_dir(Coord::new(1, 1), Direction::East)
        .expect("east slide is live");
    assert_eq!(mv.end, Coord::new(5, 1));

    let trapping = MoveGraph::build(&level, &jewels, true);
    let mv = trapping
        .from_cell_dir(Coord::new(1, 1), Direction::East)
        .expect("east slide is live");
    assert_eq!(mv.end, Coord::new(3, 1));
}
