//! Metrics collection and aggregation for schedule runs.
//!
//! Tracks the active-server distribution, transition churn, online signals
//! and an energy estimate against an always-on fleet.

use crate::config::EnergySection;
use crate::trace::LoadTrace;
use elasticsim_scheduler::{
    budget_violations, OnlineOutcome, OnlineSignal, Policy, ScheduleDecision, TransitionRecord,
};
use serde::{Deserialize, Serialize};

/// Percentile values for a distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Percentiles {
    /// Compute percentiles from a slice of values.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                p50: 0.0,
                p90: 0.0,
                p99: 0.0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
            };
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;

        Self {
            p50: percentile_sorted(&sorted, 50.0),
            p90: percentile_sorted(&sorted, 90.0),
            p99: percentile_sorted(&sorted, 99.0),
            min: sorted[0],
            max: sorted[n - 1],
            mean,
        }
    }
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Linear server power model: `idle + (peak - idle) * load` per live server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnergyModel {
    pub idle_watts: f64,
    pub peak_watts: f64,
}

impl EnergyModel {
    pub fn power(&self, load: f64, servers: u32) -> f64 {
        (self.idle_watts + (self.peak_watts - self.idle_watts) * load) * servers as f64
    }
}

impl Default for EnergyModel {
    fn default() -> Self {
        EnergySection::default().into()
    }
}

impl From<EnergySection> for EnergyModel {
    fn from(s: EnergySection) -> Self {
        EnergyModel {
            idle_watts: s.idle_watts,
            peak_watts: s.peak_watts,
        }
    }
}

/// Energy over the run, in watt-steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyEstimate {
    /// With the schedule applied.
    pub scheduled: f64,
    /// With every server in the pool live at every step.
    pub baseline: f64,
    /// Fraction of the baseline saved (0.0–1.0).
    pub savings: f64,
}

/// Aggregated report for one schedule run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleReport {
    /// Run name from the configuration.
    pub name: String,
    pub policy: String,
    pub steps: u64,
    pub total_servers: u32,

    // Capacity
    pub active_servers: Percentiles,
    /// Server-steps not spent compared to keeping the pool fully live.
    pub server_steps_saved: u64,

    // Churn
    pub transitions: u64,
    pub total_transition_magnitude: u64,
    pub max_transition: u32,
    pub transition_budget: u32,
    pub budget_violations: u64,

    // Online signals
    pub shortfall_events: u64,
    pub total_deficit: u64,
    pub spare_rule_ends: u64,
    pub hibernate_signals: u64,

    pub energy: EnergyEstimate,
}

/// Collector that accumulates per-step results during a run.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    decisions: Vec<ScheduleDecision>,
    transitions: Vec<TransitionRecord>,
    outcomes: Vec<OnlineOutcome>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_decision(&mut self, decision: ScheduleDecision) {
        self.decisions.push(decision);
    }

    pub fn record_transition(&mut self, transition: TransitionRecord) {
        self.transitions.push(transition);
    }

    pub fn record_outcome(&mut self, outcome: OnlineOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn decisions(&self) -> &[ScheduleDecision] {
        &self.decisions
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn outcomes(&self) -> &[OnlineOutcome] {
        &self.outcomes
    }

    /// Aggregate everything recorded into a report.
    pub fn aggregate(
        &self,
        name: &str,
        policy: Policy,
        trace: &LoadTrace,
        total_servers: u32,
        energy: &EnergyModel,
        transition_budget: u32,
    ) -> ScheduleReport {
        let active: Vec<f64> = self
            .decisions
            .iter()
            .map(|d| d.active_servers as f64)
            .collect();
        let steps = self.decisions.len() as u64;
        let used: u64 = self.decisions.iter().map(|d| d.active_servers as u64).sum();
        let server_steps_saved = (total_servers as u64 * steps).saturating_sub(used);

        let total_transition_magnitude: u64 = self.transitions.iter().map(|t| t.delta as u64).sum();
        let max_transition = self.transitions.iter().map(|t| t.delta).max().unwrap_or(0);
        let violations = budget_violations(&self.transitions, transition_budget).len() as u64;

        let mut shortfall_events = 0;
        let mut total_deficit = 0u64;
        let mut spare_rule_ends = 0;
        let mut hibernate_signals = 0;
        for outcome in &self.outcomes {
            match outcome.signal {
                OnlineSignal::Shortfall { deficit } => {
                    shortfall_events += 1;
                    total_deficit += deficit as u64;
                }
                OnlineSignal::SpareRuleEnded { .. } => spare_rule_ends += 1,
                OnlineSignal::Hibernate { .. } => hibernate_signals += 1,
                OnlineSignal::Balanced => {}
            }
        }

        let (scheduled, baseline) = trace.loads().zip(self.decisions.iter()).fold(
            (0.0, 0.0),
            |(scheduled, baseline), (load, decision)| {
                (
                    scheduled + energy.power(load, decision.active_servers),
                    baseline + energy.power(load, total_servers),
                )
            },
        );
        let savings = if baseline > 0.0 {
            1.0 - scheduled / baseline
        } else {
            0.0
        };

        ScheduleReport {
            name: name.to_string(),
            policy: policy.name().to_string(),
            steps,
            total_servers,
            active_servers: Percentiles::from_values(&active),
            server_steps_saved,
            transitions: self.transitions.len() as u64,
            total_transition_magnitude,
            max_transition,
            transition_budget,
            budget_violations: violations,
            shortfall_events,
            total_deficit,
            spare_rule_ends,
            hibernate_signals,
            energy: EnergyEstimate {
                scheduled,
                baseline,
                savings,
            },
        }
    }
}

/// Format a report as a pretty-printed table string.
pub fn format_table(report: &ScheduleReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n{:=<70}\n",
        format!("  {} / {}  ", report.name, report.policy)
    ));
    out.push_str(&format!(
        "  Steps: {} | Pool: {} servers | Server-steps saved: {}\n",
        report.steps, report.total_servers, report.server_steps_saved
    ));
    out.push_str(&format!("{:-<70}\n", "  Active servers  "));
    out.push_str(&format!(
        "  P50={:>6.1}  P90={:>6.1}  P99={:>6.1}  min={:>4.0}  max={:>4.0}  mean={:>6.2}\n",
        report.active_servers.p50,
        report.active_servers.p90,
        report.active_servers.p99,
        report.active_servers.min,
        report.active_servers.max,
        report.active_servers.mean,
    ));
    out.push_str(&format!("{:-<70}\n", "  Transitions  "));
    out.push_str(&format!(
        "  Count: {}  Total: {}  Max: {}  Over budget ({}): {}\n",
        report.transitions,
        report.total_transition_magnitude,
        report.max_transition,
        report.transition_budget,
        report.budget_violations,
    ));
    if report.policy == Policy::Online.name() {
        out.push_str(&format!("{:-<70}\n", "  Online signals  "));
        out.push_str(&format!(
            "  Shortfalls: {} (deficit {})  Spare rule ends: {}  Hibernate: {}\n",
            report.shortfall_events,
            report.total_deficit,
            report.spare_rule_ends,
            report.hibernate_signals,
        ));
    }
    out.push_str(&format!("{:-<70}\n", "  Energy  "));
    out.push_str(&format!(
        "  Scheduled: {:.0} W-steps  Always-on: {:.0} W-steps  Saved: {:.1}%\n",
        report.energy.scheduled,
        report.energy.baseline,
        report.energy.savings * 100.0,
    ));
    out.push_str(&format!("{:=<70}\n", ""));
    out
}

/// Format a comparison table of multiple policy results.
pub fn format_comparison_table(results: &[ScheduleReport]) -> String {
    if results.is_empty() {
        return String::from("No results to compare.\n");
    }

    let mut out = String::new();
    out.push_str(&format!("\n{:=<84}\n", "  Policy Comparison  "));
    out.push_str(&format!(
        "{:<14} {:>8} {:>8} {:>8} {:>10} {:>10} {:>10} {:>9}\n",
        "Policy", "Act p50", "Act p99", "Mean", "Trans", "Shortfall", "Deficit", "Saved%"
    ));
    out.push_str(&format!("{:-<84}\n", ""));

    for r in results {
        out.push_str(&format!(
            "{:<14} {:>8.1} {:>8.1} {:>8.2} {:>10} {:>10} {:>10} {:>8.1}%\n",
            r.policy,
            r.active_servers.p50,
            r.active_servers.p99,
            r.active_servers.mean,
            r.transitions,
            r.shortfall_events,
            r.total_deficit,
            r.energy.savings * 100.0,
        ));
    }
    out.push_str(&format!("{:=<84}\n", ""));
    out
}
