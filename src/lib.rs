//! # jewel_hunt
//!
//! A solver for sliding-vehicle jewel-collection puzzles: the vehicle slides
//! in one of eight directions until it hits a stopping feature, and every
//! jewel on the board must be swept within a move budget.
//!
//! ## Architecture
//!
//! The codebase is structured as layered components:
//!
//! - [`core`]: allocation-free primitives (`Coord`, `Direction`,
//!   column-major [`core::grid::Grid`]).
//! - [`board`]: the cell/board/level model, stable jewel ids and the text
//!   I/O collaborator.
//! - [`graph`]: the slide-move arena, the BFS all-pairs metric and the SCC
//!   condensation with its conditional-unreachability matrix.
//! - [`solver`]: the pipeline — cheapest-addition heuristic with penalty
//!   learning, non-reversing 3-opt, run removal, the potential field and the
//!   backtracking search.
//!
//! ## Quick start
//!
//! ```
//! use jewel_hunt::board::io::read_level;
//! use jewel_hunt::solver::{Solver, SolverConfig};
//!
//! let text = "3 4 2\n####\n#.+#\n####\n";
//! let level = read_level(&mut text.as_bytes()).unwrap();
//! let mut solver = Solver::new(level, SolverConfig::default());
//! let solution = solver.solve();
//! assert!(solution.exists());
//! ```

pub mod board;
pub mod core;
pub mod graph;
pub mod solver;
