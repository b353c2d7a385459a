//! Online admission / hibernation control.
//!
//! The controller sees one sample at a time and never looks ahead. It only
//! detects: shortfalls, the end of the spare-capacity window, and servers
//! that could be hibernated. Acting on those signals (provisioning, tearing
//! down) is left to the caller, which applies its choice with
//! [`OnlineController::set_active`] before the next step.

use crate::demand::ceil_demand;
use crate::types::*;
use tracing::{debug, info, warn};

/// Classify a demand against the active pool.
///
/// `demand` is `lambda_t` in servers. `kappa` is the spare-capacity ratio;
/// the spare target is `floor(kappa * total_servers)`.
pub fn classify_demand(
    demand: u32,
    current_active: u32,
    total_servers: u32,
    kappa: f64,
) -> OnlineSignal {
    if demand > current_active {
        return OnlineSignal::Shortfall {
            deficit: demand - current_active,
        };
    }

    let target = spare_target(kappa, total_servers);
    let spare = current_active - demand;
    if spare < target {
        OnlineSignal::SpareRuleEnded { spare, target }
    } else if spare > 0 {
        OnlineSignal::Hibernate {
            first: demand + 1,
            last: current_active,
        }
    } else {
        OnlineSignal::Balanced
    }
}

/// Number of servers to keep idle-but-ready.
pub fn spare_target(kappa: f64, total_servers: u32) -> u32 {
    (kappa * total_servers as f64).floor() as u32
}

/// Online controller state for one pool.
#[derive(Debug, Clone)]
pub struct OnlineController {
    capacity: FleetCapacity,
    kappa: f64,
    current_active: u32,
}

impl OnlineController {
    /// Create a controller with `initial_active` servers live.
    pub fn new(
        capacity: FleetCapacity,
        kappa: f64,
        initial_active: u32,
    ) -> Result<Self, SchedulerError> {
        if !kappa.is_finite() || kappa <= 0.0 || kappa >= 1.0 {
            return Err(SchedulerError::InvalidConfig(format!(
                "kappa must be in (0, 1), got {}",
                kappa
            )));
        }
        let mut controller = Self {
            capacity,
            kappa,
            current_active: capacity.total_servers(),
        };
        controller.set_active(initial_active)?;
        Ok(controller)
    }

    pub fn capacity(&self) -> &FleetCapacity {
        &self.capacity
    }

    pub fn kappa(&self) -> f64 {
        self.kappa
    }

    pub fn current_active(&self) -> u32 {
        self.current_active
    }

    /// Spare target for this pool.
    pub fn spare_target(&self) -> u32 {
        spare_target(self.kappa, self.capacity.total_servers())
    }

    /// Apply an adjustment chosen by the capacity-adjustment actor.
    pub fn set_active(&mut self, active: u32) -> Result<(), SchedulerError> {
        if active < 1 || active > self.capacity.total_servers() {
            return Err(SchedulerError::InvalidConfig(format!(
                "active servers must be in 1..={}, got {}",
                self.capacity.total_servers(),
                active
            )));
        }
        self.current_active = active;
        Ok(())
    }

    /// Process one sample.
    ///
    /// `step` is the caller's step counter; it is only echoed back in the
    /// outcome. `current_active` is left untouched.
    pub fn step_online(
        &self,
        step: u64,
        sample: LoadSample,
    ) -> Result<OnlineOutcome, SchedulerError> {
        let load = sample.validate(step)?;
        let demand = ceil_demand(load, &self.capacity);
        let signal = classify_demand(
            demand,
            self.current_active,
            self.capacity.total_servers(),
            self.kappa,
        );

        match signal {
            OnlineSignal::Shortfall { deficit } => {
                warn!(
                    step,
                    demand,
                    active = self.current_active,
                    deficit,
                    "insufficient live servers for load"
                );
            }
            OnlineSignal::SpareRuleEnded { spare, target } => {
                info!(step, spare, target, "spare rule ends");
            }
            OnlineSignal::Hibernate { first, last } => {
                debug!(step, first, last, "servers eligible for hibernation");
            }
            OnlineSignal::Balanced => {}
        }

        Ok(OnlineOutcome {
            time_index: step,
            demand,
            active_servers: self.current_active,
            signal,
        })
    }
}
