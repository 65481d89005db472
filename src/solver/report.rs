//! Machine-readable solve summary.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::LevelError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveReport {
    pub width: i32,
    pub height: i32,
    pub max_moves: i32,
    pub num_jewels: usize,
    pub solution_exists: bool,
    /// Present only when a solution exists.
    pub solution_len: Option<usize>,
    pub search_nodes: u64,
    pub elapsed_ms: u64,
}

pub fn write_report(path: &Path, report: &SolveReport) -> Result<(), LevelError> {
    let file = fs::File::create(path).map_err(|e| LevelError::Io {
        stage: "report_create",
        error: e.to_string(),
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).map_err(|e| LevelError::Io {
        stage: "report_serialize",
        error: e.to_string(),
    })?;
    writer.flush().map_err(|e| LevelError::Io {
        stage: "report_flush",
        error: e.to_string(),
    })
}
