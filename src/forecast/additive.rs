//! Additive trend + seasonality forecaster loaded from a JSON document.
//!
//! `y(t) = (trend(t) + Σ seasonality_i(t)) * y_scale`, where `trend` is
//! piecewise linear in scaled time and each seasonality is a Fourier series
//! over days since the Unix epoch. Parameters come from an external training
//! step; this module only evaluates them.

use std::f64::consts::PI;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ForecastError};
use crate::model::forecast::{ForecastComponent, ForecastPoint, ForecastResult};

use super::ForecastModel;

pub const TREND_COMPONENT: &str = "trend";

const SECONDS_PER_DAY: f64 = 86_400.0;

fn default_interval_width() -> f64 {
    0.8
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Changepoint {
    /// Location in scaled time.
    pub t: f64,
    /// Rate adjustment applied from `t` onwards.
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    pub name: String,
    pub period_days: f64,
    pub fourier_order: usize,
    /// `[sin_1, cos_1, sin_2, cos_2, ...]`, length `2 * fourier_order`.
    pub coefficients: Vec<f64>,
}

impl Seasonality {
    fn value_at(&self, days: f64) -> f64 {
        (1..=self.fourier_order)
            .map(|n| {
                let x = 2.0 * PI * n as f64 * days / self.period_days;
                let (a, b) = (self.coefficients[2 * n - 2], self.coefficients[2 * n - 1]);
                a * x.sin() + b * x.cos()
            })
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveModel {
    #[serde(default)]
    pub name: String,
    /// Origin of scaled time.
    pub start: DateTime<Utc>,
    pub t_scale_seconds: f64,
    pub y_scale: f64,
    pub growth_rate: f64,
    pub offset: f64,
    #[serde(default)]
    pub changepoints: Vec<Changepoint>,
    #[serde(default)]
    pub seasonalities: Vec<Seasonality>,
    /// Observation noise in scaled units.
    pub sigma_obs: f64,
    #[serde(default = "default_interval_width")]
    pub interval_width: f64,
    /// Last training timestamp; trend uncertainty widens after it.
    #[serde(default)]
    pub history_end: Option<DateTime<Utc>>,
}

impl AdditiveModel {
    pub fn validate(&self) -> Result<(), ForecastError> {
        let malformed = |msg: String| Err(ForecastError::MalformedModel(msg));
        if !(self.t_scale_seconds.is_finite() && self.t_scale_seconds > 0.0) {
            return malformed(format!("t_scale_seconds = {}", self.t_scale_seconds));
        }
        if !self.y_scale.is_finite() || self.y_scale == 0.0 {
            return malformed(format!("y_scale = {}", self.y_scale));
        }
        if !(self.growth_rate.is_finite() && self.offset.is_finite()) {
            return malformed("non-finite trend parameters".to_string());
        }
        if !(self.sigma_obs.is_finite() && self.sigma_obs >= 0.0) {
            return malformed(format!("sigma_obs = {}", self.sigma_obs));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return malformed(format!("interval_width = {}", self.interval_width));
        }
        if self
            .changepoints
            .iter()
            .any(|cp| !(cp.t.is_finite() && cp.delta.is_finite()))
        {
            return malformed("non-finite changepoint".to_string());
        }
        if self.changepoints.windows(2).any(|w| w[0].t > w[1].t) {
            return malformed("changepoints are not sorted".to_string());
        }
        for s in &self.seasonalities {
            if !(s.period_days.is_finite() && s.period_days > 0.0) {
                return malformed(format!("seasonality '{}' period = {}", s.name, s.period_days));
            }
            if s.coefficients.len() != 2 * s.fourier_order {
                return malformed(format!(
                    "seasonality '{}' has {} coefficients for order {}",
                    s.name,
                    s.coefficients.len(),
                    s.fourier_order
                ));
            }
            if s.name == TREND_COMPONENT {
                return malformed("seasonality may not be named 'trend'".to_string());
            }
        }
        Ok(())
    }

    fn scaled_time(&self, ts: DateTime<Utc>) -> f64 {
        seconds_between(self.start, ts) / self.t_scale_seconds
    }

    fn trend_at(&self, t: f64) -> f64 {
        let mut rate = self.growth_rate;
        let mut offset = self.offset;
        for cp in self.changepoints.iter().take_while(|cp| cp.t <= t) {
            rate += cp.delta;
            offset -= cp.t * cp.delta;
        }
        rate * t + offset
    }

    /// Laplace scale of the changepoint deltas, used to grow the band past the
    /// end of training history.
    fn trend_volatility(&self) -> f64 {
        if self.changepoints.is_empty() {
            return 0.0;
        }
        self.changepoints.iter().map(|cp| cp.delta.abs()).sum::<f64>()
            / self.changepoints.len() as f64
    }

    fn half_width(&self, t: f64, t_end: Option<f64>, z: f64, volatility: f64) -> f64 {
        let beyond = t_end.map(|end| (t - end).max(0.0)).unwrap_or(0.0);
        let drift = volatility * beyond;
        z * (self.sigma_obs.powi(2) + drift.powi(2)).sqrt() * self.y_scale.abs()
    }
}

impl ForecastModel for AdditiveModel {
    fn predict(&self, timestamps: &[DateTime<Utc>]) -> Result<ForecastResult, ForecastError> {
        self.validate()?;

        let z = z_score(self.interval_width);
        let volatility = self.trend_volatility();
        let t_end = self.history_end.map(|end| self.scaled_time(end));

        let mut points = Vec::with_capacity(timestamps.len());
        let mut trend_values = Vec::with_capacity(timestamps.len());
        let mut seasonal_values: Vec<Vec<f64>> = self
            .seasonalities
            .iter()
            .map(|_| Vec::with_capacity(timestamps.len()))
            .collect();

        for &ts in timestamps {
            let t = self.scaled_time(ts);
            let days = epoch_seconds(ts) / SECONDS_PER_DAY;

            let trend = self.trend_at(t) * self.y_scale;
            let mut predicted = trend;
            for (season, values) in self.seasonalities.iter().zip(seasonal_values.iter_mut()) {
                let v = season.value_at(days) * self.y_scale;
                predicted += v;
                values.push(v);
            }
            trend_values.push(trend);

            let half = self.half_width(t, t_end, z, volatility);
            points.push(ForecastPoint {
                timestamp: ts,
                predicted,
                lower_bound: predicted - half,
                upper_bound: predicted + half,
            });
        }

        let mut components = vec![ForecastComponent {
            name: TREND_COMPONENT.to_string(),
            values: trend_values,
        }];
        components.extend(
            self.seasonalities
                .iter()
                .zip(seasonal_values)
                .map(|(season, values)| ForecastComponent {
                    name: season.name.clone(),
                    values,
                }),
        );

        Ok(ForecastResult { points, components })
    }
}

fn epoch_seconds(ts: DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 + ts.timestamp_subsec_nanos() as f64 * 1e-9
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    delta.num_seconds() as f64 + delta.subsec_nanos() as f64 * 1e-9
}

/// Two-sided normal quantile for common interval widths.
fn z_score(interval_width: f64) -> f64 {
    match interval_width {
        x if x >= 0.99 => 2.576,
        x if x >= 0.95 => 1.96,
        x if x >= 0.90 => 1.645,
        x if x >= 0.80 => 1.282,
        x if x >= 0.50 => 0.674,
        _ => 0.253,
    }
}

pub fn load_model(path: &Path) -> Result<AdditiveModel, AppError> {
    if !path.exists() {
        return Err(AppError::ModelUnavailable {
            path: path.to_path_buf(),
        });
    }
    let payload = std::fs::read_to_string(path)?;
    let model: AdditiveModel =
        serde_json::from_str(&payload).map_err(|source| AppError::ModelFormat {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!(
        path = %path.display(),
        name = %model.name,
        changepoints = model.changepoints.len(),
        seasonalities = model.seasonalities.len(),
        "Loaded forecasting model"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap()
    }

    fn flat_model() -> AdditiveModel {
        AdditiveModel {
            name: "flat".to_string(),
            start: t0(),
            t_scale_seconds: 86_400.0,
            y_scale: 100.0,
            growth_rate: 0.0,
            offset: 1.0,
            changepoints: Vec::new(),
            seasonalities: Vec::new(),
            sigma_obs: 0.01,
            interval_width: 0.8,
            history_end: None,
        }
    }

    #[test]
    fn flat_model_predicts_offset_times_scale() {
        let model = flat_model();
        let result = model.predict(&[t0(), t0() + Duration::days(3)]).unwrap();
        for p in &result.points {
            assert!((p.predicted - 100.0).abs() < 1e-9);
            assert!((p.upper_bound - p.predicted - 1.282).abs() < 1e-9);
            assert!((p.predicted - p.lower_bound - 1.282).abs() < 1e-9);
        }
        assert_eq!(result.components.len(), 1);
        assert_eq!(result.components[0].name, TREND_COMPONENT);
    }

    #[test]
    fn changepoint_bends_trend_continuously() {
        let mut model = flat_model();
        model.growth_rate = 1.0;
        model.offset = 0.0;
        model.changepoints = vec![Changepoint { t: 2.0, delta: -1.0 }];
        assert!((model.trend_at(1.0) - 1.0).abs() < 1e-12);
        assert!((model.trend_at(2.0) - 2.0).abs() < 1e-12);
        assert!((model.trend_at(5.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn seasonality_component_is_reported() {
        let mut model = flat_model();
        model.seasonalities = vec![Seasonality {
            name: "daily".to_string(),
            period_days: 1.0,
            fourier_order: 1,
            coefficients: vec![0.0, 0.5],
        }];
        // Midnight UTC: cos term at full strength.
        let result = model.predict(&[t0()]).unwrap();
        let daily = result.component("daily").unwrap();
        assert!((daily.values[0] - 50.0).abs() < 1e-6);
        assert!((result.points[0].predicted - 150.0).abs() < 1e-6);
    }

    #[test]
    fn band_widens_after_history_end() {
        let mut model = flat_model();
        model.changepoints = vec![
            Changepoint { t: 0.5, delta: 0.0 },
            Changepoint { t: 0.7, delta: 0.2 },
        ];
        model.history_end = Some(t0() + Duration::days(1));
        let result = model
            .predict(&[t0() + Duration::days(1), t0() + Duration::days(2)])
            .unwrap();
        let w0 = result.points[0].upper_bound - result.points[0].lower_bound;
        let w1 = result.points[1].upper_bound - result.points[1].lower_bound;
        assert!(w1 > w0);
    }

    #[test]
    fn malformed_coefficients_are_rejected() {
        let mut model = flat_model();
        model.seasonalities = vec![Seasonality {
            name: "weekly".to_string(),
            period_days: 7.0,
            fourier_order: 3,
            coefficients: vec![0.1, 0.2],
        }];
        assert!(matches!(
            model.predict(&[t0()]),
            Err(ForecastError::MalformedModel(_))
        ));
    }

    #[test]
    fn zero_time_scale_is_rejected() {
        let mut model = flat_model();
        model.t_scale_seconds = 0.0;
        assert!(model.validate().is_err());
    }

    #[test]
    fn model_json_round_trip_keeps_defaults() {
        let json = r#"{
            "start": "2024-01-01T00:00:00Z",
            "t_scale_seconds": 86400.0,
            "y_scale": 50000.0,
            "growth_rate": 0.01,
            "offset": 0.8,
            "sigma_obs": 0.02
        }"#;
        let model: AdditiveModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.interval_width, 0.8);
        assert!(model.changepoints.is_empty());
        assert!(model.history_end.is_none());
        assert!(model.validate().is_ok());
    }
}
