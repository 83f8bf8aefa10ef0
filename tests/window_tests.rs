use chrono::{DateTime, Duration, TimeZone, Utc};

use btc_forecast::data::{fluctuation_windows, LookbackWindow};
use btc_forecast::model::price::{PricePoint, PriceSeries};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).single().unwrap()
}

#[test]
/// Verifies window correctness on a dense series:
/// 400 days of minute bars, the 30-day window is exactly [max - 30d, max].
fn thirty_day_window_on_minute_series_is_inclusive() {
    let minutes = 400 * 24 * 60;
    let points: Vec<PricePoint> = (0..=minutes)
        .map(|m| PricePoint::new(t0() + Duration::minutes(m), m as f64))
        .collect();
    let series = PriceSeries::from_unsorted(points);
    let last = series.last_timestamp().unwrap();

    let window = series.window_since(LookbackWindow::Month.duration()).unwrap();
    assert_eq!(window.len(), 30 * 24 * 60 + 1);
    assert_eq!(window.first().unwrap().timestamp, last - Duration::days(30));
    assert_eq!(window.last().unwrap().timestamp, last);
    assert!(window
        .iter()
        .all(|p| p.timestamp >= last - Duration::days(30) && p.timestamp <= last));
}

#[test]
/// Verifies the worked example: only the point at t0+40d is within 30 days.
fn sparse_example_keeps_only_recent_point() {
    let series = PriceSeries::from_unsorted(vec![
        PricePoint::new(t0(), 100.0),
        PricePoint::new(t0() + Duration::days(1), 110.0),
        PricePoint::new(t0() + Duration::days(40), 200.0),
    ]);
    let window = series.window_since(Duration::days(30)).unwrap();
    assert_eq!(window, &[PricePoint::new(t0() + Duration::days(40), 200.0)]);
}

#[test]
/// Verifies windows are self-relative:
/// a lone point from long ago still fills every window because it is its own max.
fn single_old_point_fills_every_window() {
    let old = Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).single().unwrap();
    let series = PriceSeries::from_unsorted(vec![PricePoint::new(old, 5.0)]);
    for slice in fluctuation_windows(&series).unwrap() {
        assert_eq!(slice.points.len(), 1, "{:?} should hold the point", slice.window);
    }
}

#[test]
fn day_window_respects_boundary_exactly() {
    let last = t0() + Duration::days(10);
    let series = PriceSeries::from_unsorted(vec![
        PricePoint::new(last - Duration::days(1) - Duration::seconds(1), 1.0),
        PricePoint::new(last - Duration::days(1), 2.0),
        PricePoint::new(last, 3.0),
    ]);
    let window = series.window_since(LookbackWindow::Day.duration()).unwrap();
    let closes: Vec<f64> = window.iter().map(|p| p.close).collect();
    assert_eq!(closes, vec![2.0, 3.0]);
}

#[test]
fn window_titles_and_notices() {
    assert_eq!(LookbackWindow::Day.title(), "Last 24 Hours Price Fluctuations");
    assert_eq!(LookbackWindow::Month.empty_notice(), "No data for last month.");
    assert_eq!(LookbackWindow::Year.empty_notice(), "No data for last year.");
}
