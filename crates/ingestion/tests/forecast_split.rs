//! End-to-end forecast ingestion: raw export on disk to per-day artifacts.

use ingestion::{day_artifact_name, read_forecast_csv, split_forecast_file, IngestionError};
use test_utils::{assert_coords_approx_eq, forecast::DAY_HEADER, ForecastCsvBuilder, ForecastRow};

const POINTS: [(f64, f64); 2] = [(27.7, 85.3), (27.75, 85.45)];

#[test]
fn test_split_three_days_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("forecast.csv");
    let out = dir.path().join("days");
    std::fs::create_dir(&out).unwrap();

    ForecastCsvBuilder::new()
        .day("2024-04-03", &POINTS, 0.4, 31.0, 35.0)
        .day("2024-04-01", &POINTS, 12.5, 29.6, 48.0)
        .day("2024-04-02", &POINTS, 300.0, 30.0, 40.0)
        .write_to(&raw)
        .unwrap();

    let outcome = split_forecast_file(&raw, &out).unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.completed(), 3);

    for (i, day) in outcome.days.iter().enumerate() {
        assert_eq!(day.index, i + 1);
        assert_eq!(day.path, out.join(day_artifact_name(i + 1)));
        assert_eq!(day.records.len(), POINTS.len());
    }

    let first = std::fs::read_to_string(out.join("1_day_forecast.csv")).unwrap();
    let lines: Vec<_> = first.lines().collect();
    assert_eq!(lines[0], DAY_HEADER);
    // 12.5 rounds half to even, 29.6 rounds up
    assert!(lines[1].ends_with(",12,30,48,2024-04-01,2024-04-01"));

    let second = std::fs::read_to_string(out.join("2_day_forecast.csv")).unwrap();
    assert!(second.lines().skip(1).all(|l| l.contains(",127,")));
}

#[test]
fn test_offset_starts_group_by_local_day() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("forecast.csv");
    let row = |start: &str, end: &str| ForecastRow {
        administrative_id: 1,
        start: start.to_string(),
        end: end.to_string(),
        ppt: 1.0,
        tmax: 30.0,
        rh: 40.0,
        ws: 2.0,
        lat: 27.7,
        lon: 85.3,
    };
    ForecastCsvBuilder::new()
        .row(row("2024-04-02 00:00:00+05:45", "2024-04-03 00:00:00+05:45"))
        .row(row("2024-04-01 00:00:00+05:45", "2024-04-02 00:00:00+05:45"))
        .write_to(&raw)
        .unwrap();

    let outcome = split_forecast_file(&raw, dir.path()).unwrap();
    let dates: Vec<String> = outcome.days.iter().map(|d| d.date.to_string()).collect();
    assert_eq!(dates, vec!["2024-04-01", "2024-04-02"]);

    let first = std::fs::read_to_string(dir.path().join("1_day_forecast.csv")).unwrap();
    assert!(first
        .lines()
        .nth(1)
        .unwrap()
        .ends_with(",1,30,40,2024-04-01 00:00:00+05:45,2024-04-02 00:00:00+05:45"));
}

#[test]
fn test_geometry_decoded_from_export() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("forecast.csv");
    ForecastCsvBuilder::new()
        .day("2024-04-01", &POINTS, 1.0, 30.0, 40.0)
        .write_to(&raw)
        .unwrap();

    let records = read_forecast_csv(&raw).unwrap();
    assert_eq!(records.len(), 2);
    assert_coords_approx_eq!((records[1].lat, records[1].lon), (27.75, 85.45), 1e-12);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = split_forecast_file(&dir.path().join("absent.csv"), dir.path()).unwrap_err();
    assert!(matches!(err, IngestionError::FileRead(_)));
}
