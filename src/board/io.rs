//! Text format: level reader/writer and the solution writer.
//!
//! Input is whitespace-separated `height width max_moves`, followed by
//! `height` rows of `width` cell glyphs. Glyphs outside the alphabet are
//! skipped without advancing the column cursor, which is what lets rows be
//! separated by newlines of any flavor.

use std::io::{BufRead, Write};

use crate::board::{Board, CellKind, Level, LevelError};
use crate::core::coord::Coord;
use crate::solver::solution::Solution;

pub fn read_level(reader: &mut impl BufRead) -> Result<Level, LevelError> {
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .map_err(|e| LevelError::Io {
            stage: "level_read",
            error: e.to_string(),
        })?;

    let mut chars = input.chars().peekable();

    let height = read_int(&mut chars, "header_height")?;
    let width = read_int(&mut chars, "header_width")?;
    let max_moves = read_int(&mut chars, "header_max_moves")?;

    if width <= 0 || height <= 0 {
        return Err(LevelError::Parse {
            stage: "header",
            reason: format!("board dimensions {width}x{height} are not positive"),
        });
    }
    if max_moves <= 0 {
        return Err(LevelError::Parse {
            stage: "header",
            reason: format!("move budget {max_moves} is not positive"),
        });
    }

    let mut board = Board::new(width, height);
    let mut vehicles = 0;
    for y in 0..height {
        let mut x = 0;
        while x < width {
            let Some(c) = chars.next() else {
                return Err(LevelError::Parse {
                    stage: "cells",
                    reason: format!("input ended inside row {y}"),
                });
            };
            let kind = CellKind::from_char(c);
            if kind == CellKind::Invalid {
                continue;
            }
            if kind == CellKind::Vehicle {
                vehicles += 1;
            }
            board.set_cell(Coord::new(x, y), kind);
            x += 1;
        }
    }

    if vehicles != 1 {
        return Err(LevelError::Parse {
            stage: "cells",
            reason: format!("expected exactly one vehicle cell, found {vehicles}"),
        });
    }

    Ok(Level::new(board, max_moves))
}

pub fn write_level(level: &Level, writer: &mut impl Write) -> Result<(), LevelError> {
    let io_err = |e: std::io::Error| LevelError::Io {
        stage: "level_write",
        error: e.to_string(),
    };

    writeln!(
        writer,
        "{} {} {}",
        level.height(),
        level.width(),
        level.max_moves()
    )
    .map_err(io_err)?;

    for y in 0..level.height() {
        for x in 0..level.width() {
            let kind = level.cell(Coord::new(x, y));
            write!(writer, "{}", kind.to_char()).map_err(io_err)?;
        }
        writeln!(writer).map_err(io_err)?;
    }

    Ok(())
}

/// Write `BRAK` for a non-existent solution, otherwise the direction digits
/// with no separators.
pub fn write_solution(solution: &Solution, writer: &mut impl Write) -> Result<(), LevelError> {
    let io_err = |e: std::io::Error| LevelError::Io {
        stage: "solution_write",
        error: e.to_string(),
    };

    if !solution.exists() {
        return write!(writer, "BRAK").map_err(io_err);
    }

    for dir in solution.iter() {
        write!(writer, "{}", dir.index()).map_err(io_err)?;
    }

    Ok(())
}

fn read_int(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    stage: &'static str,
) -> Result<i32, LevelError> {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }

    let mut digits = String::new();
    if chars.peek() == Some(&'-') {
        digits.push('-');
        chars.next();
    }
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }

    digits.parse().map_err(|_| LevelError::Parse {
        stage,
        reason: "expected a decimal integer".to_string(),
    })
}
