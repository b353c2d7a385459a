//! ElasticSim — elastic capacity scheduling for server fleets.
//!
//! This crate provides the run engine around the policies in
//! `elasticsim-scheduler`: the fleet topology, load trace ingestion, schedule
//! export and report metrics. A trace of raw load is normalized against the
//! fleet's rated capacity, fed to a policy step by step, and the resulting
//! active-server counts are appended to plain-text outputs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐     ┌───────────┐     ┌──────────────┐
//! │  Trace   │────▶│  Engine   │────▶│   Metrics    │
//! │ Ingestion│     │  (Steps)  │     │    Report    │
//! └──────────┘     └─────┬─────┘     └──────────────┘
//!       ▲                │
//!       │        ┌───────┴───────┐
//! ┌─────┴────┐   │    Policy     │
//! │ Topology │   │ offline/online│
//! │ (rated   │   └───────┬───────┘
//! │ capacity)│           │
//! └──────────┘           ▼
//!                  ┌──────────┐
//!                  │  Export  │
//!                  │ (append) │
//!                  └──────────┘
//! ```

pub mod clock;
pub mod config;
pub mod engine;
pub mod export;
pub mod metrics;
pub mod topology;
pub mod trace;

// Re-export key types for convenience.
pub use clock::StepClock;
pub use config::{ConfigError, SimConfig};
pub use engine::{schedule_clusters, ScheduleEngine, ScheduleOutcome};
pub use export::{export_schedule, export_transitions, ExportError};
pub use metrics::{EnergyModel, MetricsCollector, ScheduleReport};
pub use topology::{ClusterShape, Rack, Topology};
pub use trace::{load_trace, LoadTrace, TraceError};

use elasticsim_scheduler::{Policy, SchedulerError};
use thiserror::Error;

/// Any failure from a library entry point.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),
}

/// Run one policy over a trace with the given config.
pub fn run_schedule(
    config: SimConfig,
    trace: &LoadTrace,
    policy: Policy,
) -> Result<ScheduleOutcome, RunError> {
    let mut engine = ScheduleEngine::new(config)?;
    Ok(engine.run(policy, trace)?)
}

/// Run several policies, by name, on the same trace and config.
pub fn compare_policies(
    config: &SimConfig,
    trace: &LoadTrace,
    policy_names: &[&str],
) -> Result<Vec<ScheduleReport>, RunError> {
    let mut engine = ScheduleEngine::new(config.clone())?;
    policy_names
        .iter()
        .map(|name| {
            let policy = elasticsim_scheduler::policy_by_name(name)
                .ok_or_else(|| RunError::UnknownPolicy(name.to_string()))?;
            Ok(engine.run(policy, trace)?.report)
        })
        .collect()
}

/// Append a run's schedule and transitions to the configured output files.
///
/// Returns the number of lines written to each, skipping unset paths.
pub fn export_outcome(
    config: &SimConfig,
    outcome: &ScheduleOutcome,
) -> Result<(usize, usize), RunError> {
    let schedule_lines = match &config.output.schedule_path {
        Some(path) => export_schedule(std::path::Path::new(path), &outcome.decisions)?,
        None => 0,
    };
    let transition_lines = match &config.output.transitions_path {
        Some(path) => export_transitions(std::path::Path::new(path), &outcome.transitions)?,
        None => 0,
    };
    Ok((schedule_lines, transition_lines))
}
