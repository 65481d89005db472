use jewel_hunt::board::io::{read_level, write_solution};
use jewel_hunt::board::JewelIndex;
use jewel_hunt::solver::solution::{replay_collects_all, Solution};
use jewel_hunt::solver::{Solver, SolverConfig};

fn solve(text: &str) -> (Solution, String) {
    let level = read_level(&mut text.as_bytes()).unwrap();
    let mut solver = Solver::new(level, SolverConfig::default());
    let solution = solver.solve();

    let mut out = Vec::new();
    write_solution(&solution, &mut out).unwrap();
    (solution, String::from_utf8(out).unwrap())
}

fn assert_valid(text: &str, solution: &Solution) {
    let level = read_level(&mut text.as_bytes()).unwrap();
    let jewels = JewelIndex::new(level.board());
    let vehicle = level.vehicle_coords().unwrap();
    assert!(solution.len() as i32 <= level.max_moves());
    assert!(replay_collects_all(&level, &jewels, vehicle, solution, false));
}

#[test]
fn minimal_level_is_a_single_east_slide() {
    let text = "3 3 1\n###\n#.+\n###\n";
    let (solution, out) = solve(text);
    assert!(solution.exists());
    assert_eq!(out, "2");
    assert_valid(text, &solution);
}

#[test]
fn a_level_without_jewels_has_the_empty_solution() {
    let (solution, out) = solve("3 3 5\n###\n#.#\n###\n");
    assert!(solution.exists());
    assert!(solution.is_empty());
    assert_eq!(out, "");
}

#[test]
fn a_walled_off_jewel_is_unsolvable() {
    let (solution, out) = solve("3 5 10\n#####\n#.#+#\n#####\n");
    assert!(!solution.exists());
    assert_eq!(out, "BRAK");
}

#[test]
fn mutually_exclusive_chambers_are_unsolvable() {
    let text = "4 9 20\n#########\n#+O * O+#\n####.####\n#########\n";
    let (solution, out) = solve(text);
    assert!(!solution.exists());
    assert_eq!(out, "BRAK");
}

#[test]
fn a_hole_short_of_the_jewel_breaks_a_one_move_budget() {
    // The eastward slide parks in the hole; the jewel needs a second slide.
    let (solution, out) = solve("3 9 1\n#########\n#.  O  +#\n#########\n");
    assert!(!solution.exists());
    assert_eq!(out, "BRAK");
}

#[test]
fn the_hole_stop_is_usable_as_a_waypoint() {
    let text = "3 9 2\n#########\n#.  O  +#\n#########\n";
    let (solution, out) = solve(text);
    assert!(solution.exists());
    assert_eq!(out, "22");
    assert_valid(text, &solution);
}

#[test]
fn a_tight_budget_is_met_exactly() {
    let text = "5 6 2\n######\n#.   #\n#    #\n#   +#\n######\n";
    let (solution, _) = solve(text);
    assert!(solution.exists());
    assert_eq!(solution.len(), 2);
    assert_valid(text, &solution);
}

#[test]
fn a_mixed_board_is_solved_within_budget() {
    let text = "5 8 10\n########\n#.  + O#\n#   *  #\n#+     #\n########\n";
    let (solution, _) = solve(text);
    assert!(solution.exists());
    assert_valid(text, &solution);
}

#[test]
fn solving_twice_is_deterministic() {
    let text = "5 8 10\n########\n#.  + O#\n#   *  #\n#+     #\n########\n";
    let (first, first_out) = solve(text);
    let (second, second_out) = solve(text);
    assert_eq!(first, second);
    assert_eq!(first_out, second_out);
}
