use chrono::{DateTime, Duration, Utc};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }
}

/// Close prices ordered by timestamp (non-decreasing, duplicates allowed).
///
/// Built once per run and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Stable sort, so rows sharing a timestamp keep their file order.
    pub fn from_unsorted(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    /// Latest observed timestamp (the series maximum).
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    /// Last `n` points in time order.
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// Points with `timestamp >= max(timestamp) - duration`.
    ///
    /// The window is anchored on the series itself, not on the wall clock, and
    /// is always a contiguous suffix. An empty series has no anchor and yields
    /// `AppError::EmptySeries`; an empty slice means "no data in this window".
    pub fn window_since(&self, duration: Duration) -> Result<&[PricePoint], AppError> {
        let last = self.last_timestamp().ok_or(AppError::EmptySeries)?;
        let Some(threshold) = last.checked_sub_signed(duration) else {
            return Ok(&self.points);
        };
        let start = self.points.partition_point(|p| p.timestamp < threshold);
        Ok(&self.points[start..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn from_unsorted_orders_and_keeps_duplicates() {
        let series = PriceSeries::from_unsorted(vec![
            PricePoint::new(ts(300), 3.0),
            PricePoint::new(ts(100), 1.0),
            PricePoint::new(ts(300), 4.0),
            PricePoint::new(ts(200), 2.0),
        ]);
        let closes: Vec<f64> = series.points().iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(series.first_timestamp(), Some(ts(100)));
        assert_eq!(series.last_timestamp(), Some(ts(300)));
    }

    #[test]
    fn tail_handles_short_series() {
        let series = PriceSeries::from_unsorted(vec![
            PricePoint::new(ts(1), 1.0),
            PricePoint::new(ts(2), 2.0),
        ]);
        assert_eq!(series.tail(5).len(), 2);
        assert_eq!(series.tail(1)[0].close, 2.0);
        assert!(series.tail(0).is_empty());
    }

    #[test]
    fn window_since_includes_threshold_point() {
        let series = PriceSeries::from_unsorted(vec![
            PricePoint::new(ts(0), 1.0),
            PricePoint::new(ts(40), 2.0),
            PricePoint::new(ts(100), 3.0),
        ]);
        let window = series.window_since(Duration::seconds(60)).unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].timestamp, ts(40));
    }

    #[test]
    fn window_since_empty_series_is_an_error() {
        let series = PriceSeries::default();
        assert!(matches!(
            series.window_since(Duration::days(1)),
            Err(AppError::EmptySeries)
        ));
    }

    #[test]
    fn negative_duration_gives_empty_window() {
        let series = PriceSeries::from_unsorted(vec![PricePoint::new(ts(10), 1.0)]);
        let window = series.window_since(Duration::seconds(-1)).unwrap();
        assert!(window.is_empty());
    }
}
