/// Integration tests for schedule export.
use elasticsim_core::config::SimConfig;
use elasticsim_core::export::{export_schedule, export_transitions};
use elasticsim_core::trace::LoadTrace;
use elasticsim_scheduler::Policy;

fn count_lines(path: &std::path::Path) -> usize {
    std::fs::read_to_string(path).unwrap().lines().count()
}

#[test]
fn test_exporting_twice_doubles_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let schedule_path = dir.path().join("live_servers.txt");
    let transitions_path = dir.path().join("server_transitions.txt");

    let config = SimConfig::from_str("[fleet]\ntotal_servers = 10\n").unwrap();
    let load = LoadTrace::from_normalized(&[0.0, 0.375, 0.75, 1.5]);
    let outcome = elasticsim_core::run_schedule(config, &load, Policy::Transitions).unwrap();

    for _ in 0..2 {
        export_schedule(&schedule_path, &outcome.decisions).unwrap();
        export_transitions(&transitions_path, &outcome.transitions).unwrap();
    }

    assert_eq!(count_lines(&schedule_path), 8);
    assert_eq!(
        std::fs::read_to_string(&schedule_path).unwrap(),
        "1\n5\n10\n10\n1\n5\n10\n10\n"
    );
    assert_eq!(
        std::fs::read_to_string(&transitions_path).unwrap(),
        "4\n4\n"
    );
}

#[test]
fn test_export_appends_to_existing_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("live_servers.txt");
    std::fs::write(&path, "previous\n").unwrap();

    let config = SimConfig::from_str("[fleet]\ntotal_servers = 10\n").unwrap();
    let load = LoadTrace::from_normalized(&[0.375]);
    let outcome = elasticsim_core::run_schedule(config, &load, Policy::Offline).unwrap();
    export_schedule(&path, &outcome.decisions).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous\n5\n");
}

#[test]
fn test_export_outcome_uses_configured_paths() {
    let dir = tempfile::tempdir().unwrap();
    let schedule_path = dir.path().join("schedule.txt");
    let toml = format!(
        "[fleet]\ntotal_servers = 10\n\n[output]\nschedule_path = {:?}\n",
        schedule_path.display().to_string()
    );
    let config = SimConfig::from_str(&toml).unwrap();
    let load = LoadTrace::from_normalized(&[0.0, 0.375]);
    let outcome = elasticsim_core::run_schedule(config.clone(), &load, Policy::Offline).unwrap();

    let written = elasticsim_core::export_outcome(&config, &outcome).unwrap();
    assert_eq!(written, (2, 0));
    assert_eq!(std::fs::read_to_string(&schedule_path).unwrap(), "1\n5\n");
}

#[test]
fn test_empty_export_creates_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transitions.txt");
    assert_eq!(export_transitions(&path, &[]).unwrap(), 0);
    assert!(path.exists());
    assert_eq!(count_lines(&path), 0);
}
