pub mod additive;

use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, ForecastError};
use crate::model::forecast::{ForecastPoint, ForecastResult};
use crate::model::price::PriceSeries;

pub use additive::{load_model, AdditiveModel, Changepoint, Seasonality};

pub const MIN_HORIZON_MINUTES: u32 = 1;
pub const MAX_HORIZON_MINUTES: u32 = 1440;
pub const DEFAULT_HORIZON_MINUTES: u32 = 60;

/// Forecast horizon in minutes, always within `[1, 1440]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Horizon(u32);

impl Horizon {
    pub fn new(minutes: i64) -> Result<Self, AppError> {
        if minutes < MIN_HORIZON_MINUTES as i64 || minutes > MAX_HORIZON_MINUTES as i64 {
            return Err(AppError::HorizonOutOfRange {
                minutes,
                min: MIN_HORIZON_MINUTES,
                max: MAX_HORIZON_MINUTES,
            });
        }
        Ok(Self(minutes as u32))
    }

    /// Pull an arbitrary input back into range. Used for interactive edits.
    pub fn clamped(minutes: i64) -> Self {
        Self(minutes.clamp(MIN_HORIZON_MINUTES as i64, MAX_HORIZON_MINUTES as i64) as u32)
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn offset(self, delta: i64) -> Self {
        Self::clamped(self.0 as i64 + delta)
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self(DEFAULT_HORIZON_MINUTES)
    }
}

/// Externally trained forecaster. The dashboard only relies on this contract.
pub trait ForecastModel {
    /// Timestamps to predict over: the observed history followed by `horizon`
    /// one-minute steps after its last point.
    fn extend(
        &self,
        series: &PriceSeries,
        horizon: Horizon,
    ) -> Result<Vec<DateTime<Utc>>, ForecastError> {
        extend_by_minutes(series, horizon)
    }

    fn predict(&self, timestamps: &[DateTime<Utc>]) -> Result<ForecastResult, ForecastError>;
}

pub fn extend_by_minutes(
    series: &PriceSeries,
    horizon: Horizon,
) -> Result<Vec<DateTime<Utc>>, ForecastError> {
    let last = series.last_timestamp().ok_or(ForecastError::EmptySeries)?;
    let mut timestamps = series.timestamps();
    timestamps.reserve(horizon.minutes() as usize);
    for step in 1..=horizon.minutes() {
        let ts = last
            .checked_add_signed(Duration::minutes(step as i64))
            .ok_or_else(|| {
                ForecastError::MalformedModel(format!(
                    "cannot extend past {} by {} minutes",
                    last, step
                ))
            })?;
        timestamps.push(ts);
    }
    Ok(timestamps)
}

#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub horizon: Horizon,
    pub last_known: DateTime<Utc>,
    /// History fit plus horizon.
    pub full: ForecastResult,
    /// Rows strictly after `last_known`.
    pub future: Vec<ForecastPoint>,
}

/// Extend, predict over the whole extended range, then split off the future rows.
pub fn run_forecast(
    model: &dyn ForecastModel,
    series: &PriceSeries,
    horizon: Horizon,
) -> Result<ForecastOutcome, ForecastError> {
    let last_known = series.last_timestamp().ok_or(ForecastError::EmptySeries)?;
    let timestamps = model.extend(series, horizon)?;
    let full = model.predict(&timestamps)?;

    if full.len() != timestamps.len() {
        return Err(ForecastError::LengthMismatch {
            expected: timestamps.len(),
            got: full.len(),
        });
    }
    if let Some(bad) = full.points.iter().find(|p| {
        !(p.predicted.is_finite() && p.lower_bound.is_finite() && p.upper_bound.is_finite())
    }) {
        return Err(ForecastError::NonFinite(bad.timestamp.to_rfc3339()));
    }

    let future = full.future_after(last_known);
    tracing::info!(
        horizon_minutes = horizon.minutes(),
        predicted_rows = full.len(),
        future_rows = future.len(),
        "Forecast complete"
    );

    Ok(ForecastOutcome {
        horizon,
        last_known,
        full,
        future,
    })
}
