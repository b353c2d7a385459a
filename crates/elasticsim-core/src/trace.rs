//! Load trace ingestion for ElasticSim.
//!
//! Supports two input formats:
//! - **Tokens** (`csv`): numeric tokens separated by commas and/or
//!   whitespace, one raw load measurement per token.
//! - **Timeseries**: `time,count` rows under a header line. Counts are summed
//!   per whole second, giving one raw measurement per second.
//!
//! Raw measurements are normalized against the topology's rated capacity.
//! A malformed token is always a hard error; nothing is skipped or read as
//! zero.

use crate::topology::Topology;
use elasticsim_scheduler::LoadSample;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to read trace file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed load record at line {line}: {token:?}")]
    Parse { line: usize, token: String },
    #[error("Unsupported trace format: {0}")]
    UnsupportedFormat(String),
    #[error("Rated capacity must be > 0, got {0}")]
    InvalidCapacity(f64),
}

/// Ordered sequence of normalized load samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadTrace {
    samples: Vec<LoadSample>,
}

impl LoadTrace {
    pub fn new(samples: Vec<LoadSample>) -> Self {
        Self { samples }
    }

    /// Build a trace from already-normalized values.
    pub fn from_normalized(values: &[f64]) -> Self {
        Self::new(values.iter().copied().map(LoadSample::new).collect())
    }

    pub fn samples(&self) -> &[LoadSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Normalized load values in time order.
    pub fn loads(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.normalized_load)
    }
}

/// Load a trace from a file and normalize it against the topology.
pub fn load_trace(
    path: &Path,
    format: &str,
    topology: &Topology,
) -> Result<LoadTrace, TraceError> {
    let raw = load_raw(path, format)?;
    let trace = normalize(&raw, topology.rated_capacity())?;
    info!(
        path = %path.display(),
        format,
        samples = trace.len(),
        "loaded load trace"
    );
    Ok(trace)
}

/// Load raw (unnormalized) measurements from a file.
pub fn load_raw(path: &Path, format: &str) -> Result<Vec<f64>, TraceError> {
    match format {
        "csv" | "tokens" => {
            let file = std::fs::File::open(path)?;
            parse_raw_tokens(BufReader::new(file))
        }
        "timeseries" => aggregate_timeseries(&[path]),
        other => Err(TraceError::UnsupportedFormat(other.to_string())),
    }
}

/// Divide every raw measurement by the aggregate rated capacity.
pub fn normalize(raw: &[f64], rated_capacity: f64) -> Result<LoadTrace, TraceError> {
    if !rated_capacity.is_finite() || rated_capacity <= 0.0 {
        return Err(TraceError::InvalidCapacity(rated_capacity));
    }
    Ok(LoadTrace::new(
        raw.iter()
            .map(|&value| LoadSample::new(value / rated_capacity))
            .collect(),
    ))
}

/// Parse comma- and/or whitespace-delimited numeric tokens.
///
/// Adjacent delimiters produce no token. Any token that is not a number
/// fails the whole parse.
pub fn parse_raw_tokens<R: Read>(reader: BufReader<R>) -> Result<Vec<f64>, TraceError> {
    let mut values = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        for token in line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            values.push(parse_number(token, line_num + 1)?);
        }
    }
    Ok(values)
}

fn parse_number(token: &str, line: usize) -> Result<f64, TraceError> {
    token.parse::<f64>().map_err(|_| TraceError::Parse {
        line,
        token: token.to_string(),
    })
}

/// Parse one `time,count` export into per-second buckets.
///
/// The first line is a header. Rows with fewer than two columns are ignored;
/// a row whose time or count is not numeric is an error.
fn parse_timeseries_into<R: Read>(
    reader: BufReader<R>,
    buckets: &mut BTreeMap<i64, f64>,
) -> Result<(), TraceError> {
    for (line_num, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 2 {
            continue;
        }
        let time = parse_number(fields[0], line_num + 1)?;
        let count = parse_number(fields[1], line_num + 1)?;
        if !time.is_finite() {
            return Err(TraceError::Parse {
                line: line_num + 1,
                token: fields[0].to_string(),
            });
        }
        *buckets.entry(time.floor() as i64).or_insert(0.0) += count;
    }
    Ok(())
}

/// Parse a single timeseries export from any reader.
pub fn parse_timeseries<R: Read>(reader: BufReader<R>) -> Result<Vec<f64>, TraceError> {
    let mut buckets = BTreeMap::new();
    parse_timeseries_into(reader, &mut buckets)?;
    Ok(buckets.into_values().collect())
}

/// Merge several timeseries exports into one raw series, summing counts that
/// land in the same second. Output is in ascending time order.
pub fn aggregate_timeseries<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<f64>, TraceError> {
    let mut buckets = BTreeMap::new();
    for path in paths {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        parse_timeseries_into(BufReader::new(file), &mut buckets)?;
        debug!(
            path = %path.display(),
            seconds = buckets.len(),
            "aggregated timeseries file"
        );
    }
    Ok(buckets.into_values().collect())
}

/// Write a raw series one value per line, replacing the destination.
pub fn write_raw_series(values: &[f64], path: &Path) -> Result<(), TraceError> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    for value in values {
        writeln!(writer, "{}", value)?;
    }
    writer.flush()?;
    Ok(())
}

/// Shape of a synthetic diurnal load curve.
#[derive(Debug, Clone, Copy)]
pub struct DiurnalShape {
    /// Raw load at the top of the curve.
    pub peak: f64,
    /// Steps per day.
    pub period: u64,
    /// Relative jitter applied to every step, in `[0, 1)`.
    pub noise: f64,
}

/// Generate a seeded synthetic raw-load series following a daily cycle.
///
/// The curve swings between 10% and 100% of `peak`. The same seed always
/// yields the same series.
pub fn generate_diurnal(steps: u64, shape: DiurnalShape, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let period = shape.period.max(1) as f64;
    (0..steps)
        .map(|t| {
            let phase = 2.0 * std::f64::consts::PI * (t as f64 / period);
            let base = shape.peak * (0.55 - 0.45 * phase.cos());
            let jitter = 1.0 + shape.noise * (rng.gen::<f64>() * 2.0 - 1.0);
            (base * jitter).max(0.0)
        })
        .collect()
}
