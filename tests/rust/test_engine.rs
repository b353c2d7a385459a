/// Integration tests for the schedule engine.
use elasticsim_core::config::SimConfig;
use elasticsim_core::trace::{self, LoadTrace};
use elasticsim_core::{RunError, ScheduleEngine};
use elasticsim_scheduler::*;

fn production_config() -> SimConfig {
    SimConfig::from_str(
        r#"
[simulation]
name = "integration-test"

[fleet]
total_servers = 32
num_clusters = 22
utilization_threshold = 0.75
server_rate = 20000

[online]
kappa = 0.1
transition_budget = 4
"#,
    )
    .unwrap()
}

/// A day of raw load rising to peak and falling back, in rated-capacity units.
fn daily_trace() -> LoadTrace {
    let raw: Vec<f64> = (0..48)
        .map(|i| {
            let hour = i as f64 / 2.0;
            480_000.0 * (0.2 + 0.7 * (1.0 - ((hour - 12.0) / 12.0).abs()))
        })
        .collect();
    trace::normalize(&raw, 480_000.0).unwrap()
}

#[test]
fn test_full_run_all_policies() {
    let config = production_config();
    let load = daily_trace();

    for name in available_policies() {
        let policy = policy_by_name(name).unwrap();
        let outcome = elasticsim_core::run_schedule(config.clone(), &load, policy).unwrap();
        assert_eq!(outcome.decisions.len(), 48, "policy {}", name);
        assert!(
            outcome
                .decisions
                .iter()
                .all(|d| (1..=32).contains(&d.active_servers)),
            "policy {} left the pool bounds",
            name
        );
        assert_eq!(outcome.report.policy, name);
        assert_eq!(outcome.report.steps, 48);
    }
}

#[test]
fn test_elastic_schedule_saves_energy() {
    let outcome =
        elasticsim_core::run_schedule(production_config(), &daily_trace(), Policy::Transitions)
            .unwrap();
    let report = &outcome.report;

    assert!(report.server_steps_saved > 0);
    assert!(report.energy.scheduled < report.energy.baseline);
    assert!(report.energy.savings > 0.0 && report.energy.savings < 1.0);
    assert_eq!(report.transitions as usize, outcome.transitions.len());
}

#[test]
fn test_online_run_records_signals() {
    let outcome =
        elasticsim_core::run_schedule(production_config(), &daily_trace(), Policy::Online)
            .unwrap();

    assert_eq!(outcome.online.len(), 48);
    for (t, step) in outcome.online.iter().enumerate() {
        assert_eq!(step.time_index, t as u64);
        assert_eq!(step.active_servers, outcome.decisions[t].active_servers);
    }
    // The pool starts full on a low-load morning, so the first step hibernates.
    assert!(matches!(
        outcome.online[0].signal,
        OnlineSignal::Hibernate { .. }
    ));
    assert!(outcome.report.hibernate_signals > 0);
}

#[test]
fn test_engine_runs_are_independent() {
    let mut engine = ScheduleEngine::new(production_config()).unwrap();
    let load = daily_trace();
    let first = engine.run(Policy::Online, &load).unwrap();
    let second = engine.run(Policy::Online, &load).unwrap();
    assert_eq!(first.decisions, second.decisions);
    assert_eq!(first.transitions, second.transitions);
    assert_eq!(engine.clock().now(), 48);
}

#[test]
fn test_compare_policies() {
    let config = production_config();
    let reports = elasticsim_core::compare_policies(
        &config,
        &daily_trace(),
        &["offline", "transitions", "online"],
    )
    .unwrap();

    assert_eq!(reports.len(), 3);
    // Offline and transitions share the same decisions.
    assert_eq!(reports[0].active_servers.mean, reports[1].active_servers.mean);
    assert_eq!(reports[0].transitions, 0);

    let table = elasticsim_core::metrics::format_comparison_table(&reports);
    assert!(table.contains("transitions"));
}

#[test]
fn test_compare_unknown_policy() {
    let result =
        elasticsim_core::compare_policies(&production_config(), &daily_trace(), &["greedy"]);
    assert!(matches!(result, Err(RunError::UnknownPolicy(name)) if name == "greedy"));
}

#[test]
fn test_negative_sample_fails_run() {
    let load = LoadTrace::from_normalized(&[0.2, -0.1]);
    let result = elasticsim_core::run_schedule(production_config(), &load, Policy::Offline);
    assert!(matches!(
        result,
        Err(RunError::Scheduler(SchedulerError::InvalidSample { index: 1, .. }))
    ));
}

#[test]
fn test_schedule_clusters_matches_sequential() {
    let config = production_config();
    let topology = config.topology().unwrap();
    let traces: Vec<LoadTrace> = (0..topology.num_clusters())
        .map(|c| {
            let loads: Vec<f64> = (0..24).map(|t| ((t + c) % 12) as f64 / 10.0).collect();
            LoadTrace::from_normalized(&loads)
        })
        .collect();

    let parallel = elasticsim_core::schedule_clusters(&topology.capacity(), &traces).unwrap();
    assert_eq!(parallel.len(), traces.len());
    for (schedule, load) in parallel.iter().zip(&traces) {
        let sequential =
            compute_schedule_with_transitions(load.samples(), &topology.capacity()).unwrap();
        assert_eq!(schedule, &sequential);
    }
}
