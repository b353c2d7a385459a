//! Step clock for schedule runs.
//!
//! The [`StepClock`] counts discrete time steps independently of wall-clock
//! time. The engine owns one per run and threads it through every online
//! step, so instrumentation never depends on process-wide timers.

use serde::{Deserialize, Serialize};

/// Discrete step counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepClock {
    /// Index of the current step.
    current: u64,
    /// Seconds represented by one step, for reporting only.
    step_secs: f64,
}

impl StepClock {
    /// Create a clock at step zero with one-second steps.
    pub fn new() -> Self {
        Self {
            current: 0,
            step_secs: 1.0,
        }
    }

    /// Set how many seconds one step represents.
    pub fn with_step_secs(mut self, step_secs: f64) -> Self {
        self.step_secs = step_secs;
        self
    }

    /// Current step index.
    pub fn now(&self) -> u64 {
        self.current
    }

    /// Current position in seconds.
    pub fn now_secs(&self) -> f64 {
        self.current as f64 * self.step_secs
    }

    /// Move to the next step and return its index.
    pub fn tick(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    /// Jump to a specific step.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `step` is in the past.
    pub fn advance_to(&mut self, step: u64) {
        debug_assert!(
            step >= self.current,
            "Cannot move clock backwards: current={}, target={}",
            self.current,
            step,
        );
        self.current = step;
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new()
    }
}
