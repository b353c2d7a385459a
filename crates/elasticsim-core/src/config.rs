//! TOML configuration parsing for ElasticSim.
//!
//! Defines the complete configuration schema for a scheduling run: fleet
//! shape, online controller settings, energy model, trace source and output
//! destinations.

use crate::topology::Topology;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationSection,
    pub fleet: FleetSection,
    #[serde(default)]
    pub online: OnlineSection,
    #[serde(default)]
    pub energy: EnergySection,
    #[serde(default)]
    pub trace: TraceSection,
    #[serde(default)]
    pub output: OutputSection,
}

/// General run parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSection {
    /// Human-readable name for this run.
    #[serde(default = "default_sim_name")]
    pub name: String,
    /// Seconds represented by one trace step.
    #[serde(default = "default_step_secs")]
    pub step_secs: f64,
}

fn default_sim_name() -> String {
    "elasticsim".to_string()
}

fn default_step_secs() -> f64 {
    1.0
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            name: default_sim_name(),
            step_secs: default_step_secs(),
        }
    }
}

/// Fleet shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSection {
    /// Servers in one schedulable pool.
    pub total_servers: u32,
    /// Clusters under the origin. Topology only; the scheduler ignores it.
    #[serde(default = "default_num_clusters")]
    pub num_clusters: u32,
    /// Maximum utilization a server may sustain.
    #[serde(default = "default_threshold")]
    pub utilization_threshold: f64,
    /// Rated rate of one server, in the trace's units.
    #[serde(default = "default_server_rate")]
    pub server_rate: f64,
}

fn default_num_clusters() -> u32 {
    1
}
fn default_threshold() -> f64 {
    0.75
}
fn default_server_rate() -> f64 {
    20_000.0
}

/// Online controller settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineSection {
    /// Spare-capacity ratio, strictly between 0 and 1.
    #[serde(default = "default_kappa")]
    pub kappa: f64,
    /// Servers live before the first step. Defaults to the whole pool.
    pub initial_active: Option<u32>,
    /// Allowed server transitions per step.
    #[serde(default = "default_transition_budget")]
    pub transition_budget: u32,
}

fn default_kappa() -> f64 {
    0.1
}
fn default_transition_budget() -> u32 {
    10
}

impl Default for OnlineSection {
    fn default() -> Self {
        Self {
            kappa: default_kappa(),
            initial_active: None,
            transition_budget: default_transition_budget(),
        }
    }
}

/// Linear server power model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergySection {
    #[serde(default = "default_idle_watts")]
    pub idle_watts: f64,
    #[serde(default = "default_peak_watts")]
    pub peak_watts: f64,
}

fn default_idle_watts() -> f64 {
    63.0
}
fn default_peak_watts() -> f64 {
    92.0
}

impl Default for EnergySection {
    fn default() -> Self {
        Self {
            idle_watts: default_idle_watts(),
            peak_watts: default_peak_watts(),
        }
    }
}

/// Trace source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSection {
    /// Format: "csv" or "timeseries".
    #[serde(default = "default_trace_format")]
    pub format: String,
    /// Path to the trace file.
    pub path: Option<String>,
}

fn default_trace_format() -> String {
    "csv".to_string()
}

impl Default for TraceSection {
    fn default() -> Self {
        Self {
            format: default_trace_format(),
            path: None,
        }
    }
}

/// Export destinations. Both are appended to, never truncated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub schedule_path: Option<String>,
    pub transitions_path: Option<String>,
}

impl SimConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency.
    fn validate(&self) -> Result<(), ConfigError> {
        // Fleet checks live in Topology::new.
        let topology = self.topology()?;

        let kappa = self.online.kappa;
        if !kappa.is_finite() || kappa <= 0.0 || kappa >= 1.0 {
            return Err(ConfigError::Validation(format!(
                "kappa must be in (0, 1), got {}",
                kappa
            )));
        }
        if let Some(initial) = self.online.initial_active {
            if initial == 0 || initial > topology.total_servers() {
                return Err(ConfigError::Validation(format!(
                    "initial_active must be in 1..={}, got {}",
                    topology.total_servers(),
                    initial
                )));
            }
        }
        if self.energy.idle_watts < 0.0 || self.energy.peak_watts < self.energy.idle_watts {
            return Err(ConfigError::Validation(
                "energy model requires 0 <= idle_watts <= peak_watts".to_string(),
            ));
        }
        if !self.simulation.step_secs.is_finite() || self.simulation.step_secs <= 0.0 {
            return Err(ConfigError::Validation(
                "step_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the fleet topology.
    pub fn topology(&self) -> Result<Topology, ConfigError> {
        Topology::new(
            self.fleet.total_servers,
            self.fleet.num_clusters,
            self.fleet.utilization_threshold,
            self.fleet.server_rate,
        )
    }

    /// Servers live before the first online step.
    pub fn initial_active(&self) -> u32 {
        self.online
            .initial_active
            .unwrap_or(self.fleet.total_servers)
    }
}
