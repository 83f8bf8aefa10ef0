//! Price history loading from CSV.
//!
//! Rows are coerced field by field; a row whose timestamp or close does not
//! parse is dropped and counted, never repaired.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::config::DataConfig;
use crate::error::AppError;
use crate::model::price::{PricePoint, PriceSeries};

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// One CSV record before coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRecord {
    Fields { timestamp: String, close: String },
    /// The CSV reader could not decode the record at all.
    Unreadable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub bad_timestamp: usize,
    pub bad_close: usize,
    pub unreadable: usize,
}

impl CleaningReport {
    pub fn dropped_rows(&self) -> usize {
        self.total_rows - self.kept_rows
    }
}

#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: PriceSeries,
    pub report: CleaningReport,
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    parse_epoch_seconds(s)
}

/// Last resort: any bare finite number is read as Unix seconds, so `"42"` is
/// 1970-01-01T00:00:42Z. Date-shaped strings never reach this point.
fn parse_epoch_seconds(s: &str) -> Option<DateTime<Utc>> {
    let secs: f64 = s.parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    Utc.timestamp_opt(whole as i64, nanos).single()
}

pub fn parse_close(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce every record and keep only rows whose timestamp and close both parse.
pub fn best_effort_clean<I>(records: I) -> (Vec<PricePoint>, CleaningReport)
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut report = CleaningReport::default();
    let mut points = Vec::new();
    for record in records {
        report.total_rows += 1;
        let (timestamp, close) = match record {
            RawRecord::Fields { timestamp, close } => (timestamp, close),
            RawRecord::Unreadable => {
                report.unreadable += 1;
                continue;
            }
        };
        let Some(ts) = parse_timestamp(&timestamp) else {
            report.bad_timestamp += 1;
            continue;
        };
        let Some(close) = parse_close(&close) else {
            report.bad_close += 1;
            continue;
        };
        points.push(PricePoint::new(ts, close));
    }
    report.kept_rows = points.len();
    (points, report)
}

pub fn load_price_series(path: &Path, cfg: &DataConfig) -> Result<LoadedSeries, AppError> {
    let file = File::open(path).map_err(|e| AppError::DataUnavailable {
        path: path.to_path_buf(),
        source: Some(e),
    })?;
    read_price_series(BufReader::new(file), path, cfg)
}

/// `origin` is only used in error messages and logs.
pub fn read_price_series<R: Read>(
    reader: R,
    origin: &Path,
    cfg: &DataConfig,
) -> Result<LoadedSeries, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::Io(e.into()))?
        .clone();
    let column_index = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AppError::MissingColumn {
                path: origin.to_path_buf(),
                column: name.to_string(),
            })
    };
    let ts_idx = column_index(&cfg.timestamp_column)?;
    let close_idx = column_index(&cfg.close_column)?;

    // Only the two used columns are decoded; bytes elsewhere in the row are ignored.
    let field = |record: &csv::ByteRecord, idx: usize| {
        record
            .get(idx)
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .unwrap_or_default()
            .to_string()
    };
    let records = reader.byte_records().map(|result| match result {
        Ok(record) => RawRecord::Fields {
            timestamp: field(&record, ts_idx),
            close: field(&record, close_idx),
        },
        Err(_) => RawRecord::Unreadable,
    });
    let (points, report) = best_effort_clean(records);
    let series = PriceSeries::from_unsorted(points);

    tracing::info!(
        path = %origin.display(),
        rows = report.kept_rows,
        dropped = report.dropped_rows(),
        bad_timestamp = report.bad_timestamp,
        bad_close = report.bad_close,
        unreadable = report.unreadable,
        "Loaded price history"
    );

    Ok(LoadedSeries { series, report })
}
