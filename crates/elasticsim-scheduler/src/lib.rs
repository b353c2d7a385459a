//! Capacity scheduling policies for ElasticSim.
//!
//! Given a trace of normalized load and a pool of `total_servers` servers,
//! every policy decides how many servers must be live so utilization stays at
//! or below the configured threshold.
//!
//! | Policy | Entry point | Output |
//! |--------|-------------|--------|
//! | [`Policy::Offline`] | [`compute_schedule`] | One decision per step |
//! | [`Policy::Transitions`] | [`compute_schedule_with_transitions`] | Decisions plus interior transitions |
//! | [`Policy::Online`] | [`OnlineController::step_online`] | One signal per step, no lookahead |
//!
//! All three share the demand formula in [`demand`].

pub mod demand;
pub mod offline;
pub mod online;
pub mod types;

pub use offline::{
    budget_violations, compute_schedule, compute_schedule_with_transitions, TransitionSchedule,
};
pub use online::{classify_demand, OnlineController};
pub use types::*;

/// Scheduling mode selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Full trace known in advance.
    Offline,
    /// Offline, with transition accounting.
    Transitions,
    /// One sample at a time.
    Online,
}

impl Policy {
    pub fn name(&self) -> &'static str {
        match self {
            Policy::Offline => "offline",
            Policy::Transitions => "transitions",
            Policy::Online => "online",
        }
    }
}

/// Look up a policy by name.
pub fn policy_by_name(name: &str) -> Option<Policy> {
    match name {
        "offline" => Some(Policy::Offline),
        "transitions" | "offline_transitions" => Some(Policy::Transitions),
        "online" => Some(Policy::Online),
        _ => None,
    }
}

/// List all available policy names.
pub fn available_policies() -> Vec<&'static str> {
    vec!["offline", "transitions", "online"]
}
