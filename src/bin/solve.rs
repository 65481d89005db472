use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use tracing_subscriber::EnvFilter;

use jewel_hunt::board::io::{read_level, write_solution};
use jewel_hunt::solver::report::{write_report, SolveReport};
use jewel_hunt::solver::{Solver, SolverConfig};

struct Args {
    max_moves: Option<i32>,
    report: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = Args {
        max_moves: None,
        report: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--report" => {
                let Some(path) = iter.next() else {
                    usage("--report needs a path");
                };
                args.report = Some(PathBuf::from(path));
            }
            other => {
                if args.max_moves.is_some() {
                    usage("at most one max-moves override is accepted");
                }
                let Ok(max_moves) = other.parse::<i32>() else {
                    usage("max-moves override must be a decimal integer");
                };
                args.max_moves = Some(max_moves);
            }
        }
    }

    args
}

fn usage(reason: &str) -> ! {
    eprintln!("{reason}\n\nUsage: solve [max_moves] [--report <path>]\n\nReads a level from stdin and writes the solution digits (or BRAK) to stdout.");
    process::exit(2);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();

    let stdin = std::io::stdin();
    let mut level = match read_level(&mut BufReader::new(stdin.lock())) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if let Some(max_moves) = args.max_moves {
        level.set_max_moves(max_moves);
    }

    let width = level.width();
    let height = level.height();
    let max_moves = level.max_moves();
    let num_jewels = level.board().count_jewels();

    let mut solver = Solver::new(level, SolverConfig::default());
    let solution = solver.solve();

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if let Err(e) = write_solution(&solution, &mut out).and_then(|()| {
        out.flush().map_err(|e| jewel_hunt::board::LevelError::Io {
            stage: "solution_flush",
            error: e.to_string(),
        })
    }) {
        eprintln!("{e}");
        process::exit(1);
    }

    if let Some(path) = args.report {
        let report = SolveReport {
            width,
            height,
            max_moves,
            num_jewels,
            solution_exists: solution.exists(),
            solution_len: solution.exists().then(|| solution.len()),
            search_nodes: solver.bench().nodes(),
            elapsed_ms: solver.bench().elapsed().as_millis() as u64,
        };
        if let Err(e) = write_report(&path, &report) {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}
