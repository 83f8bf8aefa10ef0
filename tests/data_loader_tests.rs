use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use btc_forecast::config::DataConfig;
use btc_forecast::data::{load_price_series, read_price_series};
use btc_forecast::error::AppError;

fn temp_csv_path(test_name: &str) -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be monotonic")
        .as_nanos();
    std::env::temp_dir().join(format!("btcf-{}-{}.csv", test_name, ts))
}

fn write_csv(test_name: &str, body: &str) -> PathBuf {
    let path = temp_csv_path(test_name);
    std::fs::write(&path, body).expect("temp csv should be writable");
    path
}

#[test]
/// Verifies the row-coercion invariant:
/// a row survives iff both its timestamp and close parse; others vanish silently.
fn malformed_rows_are_dropped_and_counted() {
    let path = write_csv(
        "coercion",
        "Timestamp,Open,Close\n\
         2024-01-01 00:02:00,1,102.5\n\
         not-a-date,1,100\n\
         2024-01-01 00:00:00,1,100.0\n\
         2024-01-01 00:03:00,1,\n\
         2024-01-01 00:01:00,1,abc\n\
         ,1,\n\
         2024-01-01 00:04:00,1,104\n",
    );
    let loaded = load_price_series(&path, &DataConfig::default()).expect("load should succeed");

    assert_eq!(loaded.series.len(), 3);
    let closes: Vec<f64> = loaded.series.points().iter().map(|p| p.close).collect();
    assert_eq!(closes, vec![100.0, 102.5, 104.0]);
    assert_eq!(loaded.report.total_rows, 7);
    assert_eq!(loaded.report.kept_rows, 3);
    assert_eq!(loaded.report.bad_timestamp, 2);
    assert_eq!(loaded.report.bad_close, 2);
    assert_eq!(loaded.report.dropped_rows(), 4);
    let _ = std::fs::remove_file(path);
}

#[test]
/// Verifies the ordering invariant on out-of-order input with mixed encodings.
fn loaded_series_is_time_ordered() {
    let path = write_csv(
        "ordering",
        "Timestamp,Close\n\
         1704067500,5\n\
         2024-01-01T00:00:00Z,1\n\
         2024-01-01 00:03:00,4\n\
         1704067260,2\n\
         2024-01-01 00:02,3\n",
    );
    let loaded = load_price_series(&path, &DataConfig::default()).expect("load should succeed");
    let points = loaded.series.points();
    assert_eq!(points.len(), 5);
    assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
    assert_eq!(closes, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    let _ = std::fs::remove_file(path);
}

#[test]
fn missing_file_is_data_unavailable() {
    let path = temp_csv_path("missing");
    let err = load_price_series(&path, &DataConfig::default()).unwrap_err();
    assert!(matches!(err, AppError::DataUnavailable { .. }));
    assert!(err.to_string().ends_with("not found."));
}

#[test]
fn missing_close_column_is_fatal() {
    let body = "Timestamp,Price\n2024-01-01 00:00:00,1\n";
    let err = read_price_series(body.as_bytes(), Path::new("mem.csv"), &DataConfig::default())
        .unwrap_err();
    match err {
        AppError::MissingColumn { column, .. } => assert_eq!(column, "Close"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn configured_column_names_are_honoured() {
    let cfg = DataConfig {
        timestamp_column: "ts".to_string(),
        close_column: "px".to_string(),
        ..DataConfig::default()
    };
    let body = "px,ts\n10,2024-05-01 10:00:00\n11,2024-05-01 10:01:00\n";
    let loaded = read_price_series(body.as_bytes(), Path::new("mem.csv"), &cfg).unwrap();
    assert_eq!(loaded.series.len(), 2);
    assert_eq!(loaded.series.points()[1].close, 11.0);
}

#[test]
/// Verifies short rows from ragged files count as malformed instead of failing the load.
fn ragged_rows_are_tolerated() {
    let body = "Timestamp,Open,Close\n2024-01-01 00:00:00,1\n2024-01-01 00:01:00,1,7,extra\n";
    let loaded =
        read_price_series(body.as_bytes(), Path::new("mem.csv"), &DataConfig::default()).unwrap();
    assert_eq!(loaded.series.len(), 1);
    assert_eq!(loaded.report.bad_close, 1);
}

#[test]
fn header_only_file_loads_empty_series() {
    let loaded = read_price_series(
        "Timestamp,Close\n".as_bytes(),
        Path::new("mem.csv"),
        &DataConfig::default(),
    )
    .unwrap();
    assert!(loaded.series.is_empty());
    assert_eq!(loaded.report.total_rows, 0);
}

#[test]
/// Verifies invalid UTF-8 in an unused column does not cost the row,
/// while invalid bytes in the close column count as a bad close.
fn undecodable_side_column_keeps_row() {
    let mut body = b"Timestamp,Note,Close\n2024-01-01 00:00:00,ok,100\n".to_vec();
    body.extend_from_slice(b"2024-01-01 00:01:00,");
    body.extend_from_slice(&[0xff, 0xfe]);
    body.extend_from_slice(b",101\n2024-01-01 00:02:00,ok,");
    body.extend_from_slice(&[0xff]);
    body.extend_from_slice(b"\n");

    let loaded =
        read_price_series(body.as_slice(), Path::new("mem.csv"), &DataConfig::default()).unwrap();

    assert_eq!(loaded.series.len(), 2);
    assert_eq!(loaded.series.points()[1].close, 101.0);
    assert_eq!(loaded.report.total_rows, 3);
    assert_eq!(loaded.report.unreadable, 0);
    assert_eq!(loaded.report.bad_close, 1);
}
