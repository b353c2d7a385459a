/// Integration tests for trace ingestion.
use elasticsim_core::topology::Topology;
use elasticsim_core::trace::{self, TraceError};
use std::io::Write;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn cdn_topology() -> Topology {
    // 0.75 * 32 * 20000 = 480000 rated capacity.
    Topology::new(32, 22, 0.75, 20_000.0).unwrap()
}

#[test]
fn test_load_csv_trace_normalizes_against_topology() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "data.csv", "0,120000,240000\n480000 960000\n");

    let load = trace::load_trace(&path, "csv", &cdn_topology()).unwrap();
    let loads: Vec<f64> = load.loads().collect();
    assert_eq!(loads, vec![0.0, 0.25, 0.5, 1.0, 2.0]);
}

#[test]
fn test_malformed_token_fails_whole_trace() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "bad.csv", "100,200\n300,n/a\n");

    match trace::load_trace(&path, "csv", &cdn_topology()) {
        Err(TraceError::Parse { line, token }) => {
            assert_eq!(line, 2);
            assert_eq!(token, "n/a");
        }
        other => panic!("Expected Parse error, got {:?}", other),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.csv");
    assert!(matches!(
        trace::load_trace(&path, "csv", &cdn_topology()),
        Err(TraceError::Io(_))
    ));
}

#[test]
fn test_aggregate_timeseries_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_file(&dir, "a.csv", "time,count\n0.1,10\n1.4,20\n2.0,5\n");
    let b = write_file(&dir, "b.csv", "time,count\n0.7,1\n2.9,2\n");

    let series = trace::aggregate_timeseries(&[a, b]).unwrap();
    assert_eq!(series, vec![11.0, 20.0, 7.0]);
}

#[test]
fn test_timeseries_format_through_load_trace() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "ts.csv", "time,count\n0.5,240000\n1.5,480000\n");

    let load = trace::load_trace(&path, "timeseries", &cdn_topology()).unwrap();
    let loads: Vec<f64> = load.loads().collect();
    assert_eq!(loads, vec![0.5, 1.0]);
}

#[test]
fn test_written_series_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.txt");
    let values = vec![1.5, 0.0, 480000.0];

    trace::write_raw_series(&values, &path).unwrap();
    // Writing again replaces rather than appends.
    trace::write_raw_series(&values, &path).unwrap();

    assert_eq!(trace::load_raw(&path, "tokens").unwrap(), values);
}

#[test]
fn test_unsupported_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "trace.jsonl", "{}");
    assert!(matches!(
        trace::load_trace(&path, "jsonl", &cdn_topology()),
        Err(TraceError::UnsupportedFormat(_))
    ));
}
