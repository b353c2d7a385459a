/// Integration tests for the scheduling policies.
use elasticsim_scheduler::*;

fn samples(loads: &[f64]) -> Vec<LoadSample> {
    loads.iter().copied().map(LoadSample::new).collect()
}

fn active(decisions: &[ScheduleDecision]) -> Vec<u32> {
    decisions.iter().map(|d| d.active_servers).collect()
}

fn varied_loads(n: usize) -> Vec<f64> {
    (0..n).map(|i| ((i * 37) % 101) as f64 / 50.0).collect()
}

#[test]
fn test_schedule_stays_within_pool() {
    let capacity = FleetCapacity::new(32, 0.75).unwrap();
    let decisions = compute_schedule(&samples(&varied_loads(500)), &capacity).unwrap();

    assert_eq!(decisions.len(), 500);
    for d in &decisions {
        assert!(
            (1..=32).contains(&d.active_servers),
            "step {} out of bounds: {}",
            d.time_index,
            d.active_servers
        );
    }
}

#[test]
fn test_schedule_time_indices_are_sequential() {
    let capacity = FleetCapacity::new(8, 0.5).unwrap();
    let decisions = compute_schedule(&samples(&varied_loads(20)), &capacity).unwrap();
    for (t, d) in decisions.iter().enumerate() {
        assert_eq!(d.time_index, t as u64);
    }
}

#[test]
fn test_more_load_never_means_fewer_servers() {
    let capacity = FleetCapacity::new(50, 0.8).unwrap();
    let mut loads: Vec<f64> = varied_loads(300);
    loads.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let counts = active(&compute_schedule(&samples(&loads), &capacity).unwrap());

    for pair in counts.windows(2) {
        assert!(pair[0] <= pair[1], "not monotone: {:?}", pair);
    }
}

#[test]
fn test_schedule_is_deterministic() {
    let capacity = FleetCapacity::new(22, 0.75).unwrap();
    let trace = samples(&varied_loads(200));
    let a = compute_schedule_with_transitions(&trace, &capacity).unwrap();
    let b = compute_schedule_with_transitions(&trace, &capacity).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_floor_and_ceiling_steps_record_no_transition() {
    let capacity = FleetCapacity::new(10, 0.75).unwrap();
    let schedule =
        compute_schedule_with_transitions(&samples(&[0.0, 0.375, 0.75, 1.5]), &capacity).unwrap();

    assert_eq!(active(&schedule.decisions), vec![1, 5, 10, 10]);
    assert_eq!(
        schedule.transitions,
        vec![TransitionRecord {
            time_index: 1,
            delta: 4
        }]
    );
}

#[test]
fn test_transitions_and_plain_schedule_agree() {
    let capacity = FleetCapacity::new(16, 0.6).unwrap();
    let trace = samples(&varied_loads(100));
    let plain = compute_schedule(&trace, &capacity).unwrap();
    let with_transitions = compute_schedule_with_transitions(&trace, &capacity).unwrap();
    assert_eq!(plain, with_transitions.decisions);
    assert!(with_transitions.transitions.len() < 100);
    assert!(with_transitions.transitions.iter().all(|t| t.time_index > 0));
}

#[test]
fn test_saturated_trace_has_no_transitions() {
    let capacity = FleetCapacity::new(4, 0.75).unwrap();
    let schedule = compute_schedule_with_transitions(&samples(&[2.0; 10]), &capacity).unwrap();
    assert_eq!(active(&schedule.decisions), vec![4; 10]);
    assert!(schedule.transitions.is_empty());
}

#[test]
fn test_empty_trace() {
    let capacity = FleetCapacity::new(4, 0.75).unwrap();
    assert!(compute_schedule(&[], &capacity).unwrap().is_empty());
    assert_eq!(
        compute_schedule_with_transitions(&[], &capacity).unwrap(),
        TransitionSchedule::default()
    );
}

#[test]
fn test_negative_load_is_rejected() {
    let capacity = FleetCapacity::new(4, 0.75).unwrap();
    let result = compute_schedule(&samples(&[0.1, 0.2, -0.5, 0.3]), &capacity);
    assert_eq!(
        result,
        Err(SchedulerError::InvalidSample {
            index: 2,
            value: -0.5
        })
    );
}

#[test]
fn test_invalid_capacity_is_rejected() {
    assert!(FleetCapacity::new(0, 0.75).is_err());
    assert!(FleetCapacity::new(10, 0.0).is_err());
    assert!(FleetCapacity::new(10, 1.01).is_err());
    assert!(FleetCapacity::new(10, f64::NAN).is_err());
    assert!(FleetCapacity::new(10, 1.0).is_ok());
}

#[test]
fn test_budget_violations() {
    let transitions = vec![
        TransitionRecord {
            time_index: 1,
            delta: 3,
        },
        TransitionRecord {
            time_index: 2,
            delta: 12,
        },
        TransitionRecord {
            time_index: 3,
            delta: 10,
        },
    ];
    let over = budget_violations(&transitions, 10);
    assert_eq!(over.len(), 1);
    assert_eq!(over[0].time_index, 2);
}

#[test]
fn test_online_shortfall() {
    let capacity = FleetCapacity::new(4, 0.75).unwrap();
    let controller = OnlineController::new(capacity, 0.25, 2).unwrap();
    let outcome = controller.step_online(7, LoadSample::new(1.0)).unwrap();

    assert_eq!(outcome.time_index, 7);
    assert_eq!(outcome.demand, 6);
    assert_eq!(outcome.signal, OnlineSignal::Shortfall { deficit: 4 });
}

#[test]
fn test_online_spare_rule_boundary() {
    // 10 servers, kappa 0.2: two spares are required.
    let capacity = FleetCapacity::new(10, 1.0).unwrap();
    let controller = OnlineController::new(capacity, 0.2, 10).unwrap();

    let at_eight = controller.step_online(0, LoadSample::new(0.8)).unwrap();
    assert_eq!(at_eight.demand, 8);
    assert_eq!(at_eight.signal, OnlineSignal::Hibernate { first: 9, last: 10 });

    let at_nine = controller.step_online(1, LoadSample::new(0.9)).unwrap();
    assert_eq!(at_nine.demand, 9);
    assert_eq!(
        at_nine.signal,
        OnlineSignal::SpareRuleEnded {
            spare: 1,
            target: 2
        }
    );
}

#[test]
fn test_online_step_depends_only_on_state_and_sample() {
    let capacity = FleetCapacity::new(10, 0.75).unwrap();
    let mut controller = OnlineController::new(capacity, 0.1, 10).unwrap();
    let first = controller.step_online(0, LoadSample::new(0.3)).unwrap();
    let again = controller.step_online(0, LoadSample::new(0.3)).unwrap();
    assert_eq!(first, again);

    controller.set_active(3).unwrap();
    let after = controller.step_online(1, LoadSample::new(0.3)).unwrap();
    assert_eq!(after.active_servers, 3);
    assert!(matches!(after.signal, OnlineSignal::Shortfall { .. }));
}
