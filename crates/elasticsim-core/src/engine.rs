//! Schedule run engine.
//!
//! The engine drives one [`Policy`] over a [`LoadTrace`], threading a
//! [`StepClock`] through every step and collecting metrics as it goes. For
//! the online policy it also plays the capacity-adjustment actor: after each
//! step it reads the controller's signal and decides the active count for the
//! next step.

use crate::clock::StepClock;
use crate::config::{ConfigError, SimConfig};
use crate::metrics::{EnergyModel, MetricsCollector, ScheduleReport};
use crate::topology::Topology;
use crate::trace::LoadTrace;
use elasticsim_scheduler::{
    compute_schedule, compute_schedule_with_transitions, FleetCapacity, OnlineController,
    OnlineOutcome, OnlineSignal, Policy, ScheduleDecision, SchedulerError, TransitionRecord,
    TransitionSchedule,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything a single run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub decisions: Vec<ScheduleDecision>,
    pub transitions: Vec<TransitionRecord>,
    /// Per-step controller output. Empty for offline policies.
    pub online: Vec<OnlineOutcome>,
    pub report: ScheduleReport,
}

/// Active count the actor applies after seeing `outcome`.
///
/// Shortfalls are provisioned up to demand (capped at the pool). Hibernation
/// tears down to demand plus the spare target. Other signals leave the pool
/// unchanged.
pub fn next_active(outcome: &OnlineOutcome, spare_target: u32, capacity: &FleetCapacity) -> u32 {
    match outcome.signal {
        OnlineSignal::Shortfall { .. } => capacity.clamp_active(outcome.demand),
        OnlineSignal::Hibernate { .. } => {
            capacity.clamp_active(outcome.demand.saturating_add(spare_target))
        }
        OnlineSignal::SpareRuleEnded { .. } | OnlineSignal::Balanced => outcome.active_servers,
    }
}

/// Runs scheduling policies against one fleet configuration.
pub struct ScheduleEngine {
    config: SimConfig,
    topology: Topology,
    clock: StepClock,
}

impl ScheduleEngine {
    /// Create an engine from a configuration.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let topology = config.topology()?;
        let clock = StepClock::new().with_step_secs(config.simulation.step_secs);
        Ok(Self {
            config,
            topology,
            clock,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Clock position after the last run.
    pub fn clock(&self) -> &StepClock {
        &self.clock
    }

    /// Run `policy` over the whole trace. Each run restarts the clock at zero.
    pub fn run(
        &mut self,
        policy: Policy,
        trace: &LoadTrace,
    ) -> Result<ScheduleOutcome, SchedulerError> {
        self.clock = StepClock::new().with_step_secs(self.config.simulation.step_secs);
        let capacity = self.topology.capacity();
        let mut collector = MetricsCollector::new();

        info!(
            policy = policy.name(),
            steps = trace.len(),
            total_servers = capacity.total_servers(),
            "starting schedule run"
        );

        match policy {
            Policy::Offline => {
                for decision in compute_schedule(trace.samples(), &capacity)? {
                    collector.record_decision(decision);
                }
                self.clock.advance_to(trace.len() as u64);
            }
            Policy::Transitions => {
                let schedule = compute_schedule_with_transitions(trace.samples(), &capacity)?;
                schedule
                    .decisions
                    .into_iter()
                    .for_each(|d| collector.record_decision(d));
                schedule
                    .transitions
                    .into_iter()
                    .for_each(|t| collector.record_transition(t));
                self.clock.advance_to(trace.len() as u64);
            }
            Policy::Online => self.run_online(capacity, trace, &mut collector)?,
        }

        let report = collector.aggregate(
            &self.config.simulation.name,
            policy,
            trace,
            capacity.total_servers(),
            &EnergyModel::from(self.config.energy.clone()),
            self.config.online.transition_budget,
        );

        info!(
            policy = policy.name(),
            steps = report.steps,
            transitions = report.transitions,
            shortfalls = report.shortfall_events,
            elapsed_secs = self.clock.now_secs(),
            "schedule run complete"
        );

        Ok(ScheduleOutcome {
            decisions: collector.decisions().to_vec(),
            transitions: collector.transitions().to_vec(),
            online: collector.outcomes().to_vec(),
            report,
        })
    }

    fn run_online(
        &mut self,
        capacity: FleetCapacity,
        trace: &LoadTrace,
        collector: &mut MetricsCollector,
    ) -> Result<(), SchedulerError> {
        let mut controller = OnlineController::new(
            capacity,
            self.config.online.kappa,
            self.config.initial_active(),
        )?;
        let last = trace.len().saturating_sub(1);

        for (t, sample) in trace.samples().iter().enumerate() {
            let step = self.clock.now();
            let outcome = controller.step_online(step, *sample)?;
            collector.record_decision(ScheduleDecision {
                time_index: step,
                active_servers: outcome.active_servers,
            });

            // Adjustments take effect on the following step; none after the last.
            if t < last {
                let next = next_active(&outcome, controller.spare_target(), &capacity);
                if next != outcome.active_servers {
                    collector.record_transition(TransitionRecord {
                        time_index: step + 1,
                        delta: next.abs_diff(outcome.active_servers),
                    });
                    controller.set_active(next)?;
                }
            }

            collector.record_outcome(outcome);
            self.clock.tick();
        }
        Ok(())
    }
}

/// Schedule several independent traces against the same pool in parallel.
///
/// Results come back in input order. The first failing trace's error is
/// returned.
pub fn schedule_clusters(
    capacity: &FleetCapacity,
    traces: &[LoadTrace],
) -> Result<Vec<TransitionSchedule>, SchedulerError> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = traces
            .iter()
            .map(|trace| {
                scope.spawn(move || compute_schedule_with_transitions(trace.samples(), capacity))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}
