//! Schedule export.
//!
//! Writes one value per line, in time order, appending to whatever the
//! destination already holds. Running an export twice doubles the file.

use elasticsim_scheduler::{ScheduleDecision, TransitionRecord};
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Append `values` to `path`, one per line. Creates the file if missing.
pub fn append_lines<T: Display>(path: &Path, values: &[T]) -> Result<usize, ExportError> {
    let io_err = |source: std::io::Error| ExportError::Io {
        path: path.display().to_string(),
        source,
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    for value in values {
        writeln!(writer, "{}", value).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;

    debug!(path = %path.display(), lines = values.len(), "appended export");
    Ok(values.len())
}

/// Append the active-server count of every decision.
pub fn export_schedule(path: &Path, decisions: &[ScheduleDecision]) -> Result<usize, ExportError> {
    let counts: Vec<u32> = decisions.iter().map(|d| d.active_servers).collect();
    append_lines(path, &counts)
}

/// Append the magnitude of every transition.
pub fn export_transitions(
    path: &Path,
    transitions: &[TransitionRecord],
) -> Result<usize, ExportError> {
    let deltas: Vec<u32> = transitions.iter().map(|t| t.delta).collect();
    append_lines(path, &deltas)
}
