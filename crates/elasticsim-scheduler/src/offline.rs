//! Offline scheduling.
//!
//! The whole trace is known in advance. Each step is sized independently from
//! its own load; transition accounting additionally looks at the previous
//! decision.

use crate::demand::floor_demand;
use crate::types::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which bound, if any, shaped a step's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    /// Demand below one server; the floor of one active server applied.
    Floor,
    /// Demand inside the elastic range; used as-is.
    Elastic,
    /// Demand at or above the pool size; the whole pool is active.
    Ceiling,
}

fn size_step(load: f64, capacity: &FleetCapacity) -> (u32, Band) {
    let m_t = floor_demand(load, capacity);
    if m_t < 1 {
        (1, Band::Floor)
    } else if m_t < capacity.total_servers() {
        (m_t, Band::Elastic)
    } else {
        (capacity.total_servers(), Band::Ceiling)
    }
}

/// Decisions plus the transitions recorded between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionSchedule {
    pub decisions: Vec<ScheduleDecision>,
    pub transitions: Vec<TransitionRecord>,
}

/// Compute the active-server count for every step of a trace.
///
/// Fails on the first negative or non-finite sample; no partial schedule is
/// returned.
pub fn compute_schedule(
    trace: &[LoadSample],
    capacity: &FleetCapacity,
) -> Result<Vec<ScheduleDecision>, SchedulerError> {
    let mut decisions = Vec::with_capacity(trace.len());
    for (t, sample) in trace.iter().enumerate() {
        let time_index = t as u64;
        let load = sample.validate(time_index)?;
        let (active_servers, _) = size_step(load, capacity);
        decisions.push(ScheduleDecision {
            time_index,
            active_servers,
        });
    }
    Ok(decisions)
}

/// Compute the schedule and the transitions between elastic steps.
///
/// A transition is recorded for step `t > 0` only when neither the floor nor
/// the ceiling was hit at `t`. The previous step may have been clamped; its
/// clamped value is what the delta is measured against.
pub fn compute_schedule_with_transitions(
    trace: &[LoadSample],
    capacity: &FleetCapacity,
) -> Result<TransitionSchedule, SchedulerError> {
    let mut schedule = TransitionSchedule {
        decisions: Vec::with_capacity(trace.len()),
        transitions: Vec::new(),
    };

    for (t, sample) in trace.iter().enumerate() {
        let time_index = t as u64;
        let load = sample.validate(time_index)?;
        let (active_servers, band) = size_step(load, capacity);

        if band == Band::Elastic {
            if let Some(prev) = schedule.decisions.last() {
                let delta = active_servers.abs_diff(prev.active_servers);
                debug!(step = time_index, delta, "server transition");
                schedule.transitions.push(TransitionRecord { time_index, delta });
            }
        }

        schedule.decisions.push(ScheduleDecision {
            time_index,
            active_servers,
        });
    }

    Ok(schedule)
}

/// Transitions whose magnitude exceeds the allowed number of transitions per
/// step.
pub fn budget_violations(transitions: &[TransitionRecord], budget: u32) -> Vec<TransitionRecord> {
    transitions
        .iter()
        .filter(|t| t.delta > budget)
        .copied()
        .collect()
}
