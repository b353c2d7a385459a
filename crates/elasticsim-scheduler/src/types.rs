//! Shared scheduling types.
//!
//! These are the scheduler's view of the fleet and the trace: only the
//! numbers the policies need (pool size, threshold, normalized load), not the
//! full topology or the raw measurements.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid load sample at step {index}: {value}")]
    InvalidSample { index: u64, value: f64 },
}

/// Capacity parameters every policy is computed against.
///
/// Construction validates the parameters, so a `FleetCapacity` in hand is
/// always usable inside the per-step loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFleetCapacity")]
pub struct FleetCapacity {
    total_servers: u32,
    utilization_threshold: f64,
}

/// Unvalidated wire form of [`FleetCapacity`].
#[derive(Deserialize)]
struct RawFleetCapacity {
    total_servers: u32,
    utilization_threshold: f64,
}

impl TryFrom<RawFleetCapacity> for FleetCapacity {
    type Error = SchedulerError;

    fn try_from(raw: RawFleetCapacity) -> Result<Self, Self::Error> {
        FleetCapacity::new(raw.total_servers, raw.utilization_threshold)
    }
}

impl FleetCapacity {
    pub fn new(total_servers: u32, utilization_threshold: f64) -> Result<Self, SchedulerError> {
        if total_servers == 0 {
            return Err(SchedulerError::InvalidConfig(
                "total_servers must be > 0".to_string(),
            ));
        }
        if !utilization_threshold.is_finite()
            || utilization_threshold <= 0.0
            || utilization_threshold > 1.0
        {
            return Err(SchedulerError::InvalidConfig(format!(
                "utilization_threshold must be in (0, 1], got {}",
                utilization_threshold
            )));
        }
        Ok(Self {
            total_servers,
            utilization_threshold,
        })
    }

    /// Number of servers in the schedulable pool.
    pub fn total_servers(&self) -> u32 {
        self.total_servers
    }

    /// Maximum utilization a server may sustain.
    pub fn utilization_threshold(&self) -> f64 {
        self.utilization_threshold
    }

    /// Clamp a raw server count into `1..=total_servers`.
    pub fn clamp_active(&self, servers: u32) -> u32 {
        servers.clamp(1, self.total_servers)
    }
}

/// One time step's observed demand, normalized against rated capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadSample {
    pub normalized_load: f64,
}

impl LoadSample {
    pub fn new(normalized_load: f64) -> Self {
        Self { normalized_load }
    }

    /// Reject negative and non-finite loads. Never clamps.
    pub fn validate(&self, index: u64) -> Result<f64, SchedulerError> {
        let value = self.normalized_load;
        if !value.is_finite() || value < 0.0 {
            return Err(SchedulerError::InvalidSample { index, value });
        }
        Ok(value)
    }
}

impl From<f64> for LoadSample {
    fn from(normalized_load: f64) -> Self {
        Self::new(normalized_load)
    }
}

/// Active-server count decided for one time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDecision {
    pub time_index: u64,
    pub active_servers: u32,
}

/// Magnitude of the change between two consecutive decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Step at which the change lands.
    pub time_index: u64,
    pub delta: u32,
}

/// Signals emitted by the online controller.
///
/// None of these are errors. They tell the capacity-adjustment actor what it
/// may want to do before the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnlineSignal {
    /// Demand exceeds live capacity by `deficit` servers. The portion within
    /// the active pool is served, the remainder is dropped.
    Shortfall { deficit: u32 },
    /// Spare capacity fell below the configured target; the hibernation
    /// window closes. No server is torn down.
    SpareRuleEnded { spare: u32, target: u32 },
    /// Servers `first..=last` are eligible for hibernation in a later step.
    Hibernate { first: u32, last: u32 },
    /// Demand exactly matches the active pool.
    Balanced,
}

impl OnlineSignal {
    pub fn name(&self) -> &'static str {
        match self {
            OnlineSignal::Shortfall { .. } => "shortfall",
            OnlineSignal::SpareRuleEnded { .. } => "spare_rule_ended",
            OnlineSignal::Hibernate { .. } => "hibernate",
            OnlineSignal::Balanced => "balanced",
        }
    }
}

/// Result of feeding one sample to the online controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineOutcome {
    pub time_index: u64,
    /// Demand in servers (`lambda_t`).
    pub demand: u32,
    /// Active servers in force while the sample was served.
    pub active_servers: u32,
    pub signal: OnlineSignal,
}
