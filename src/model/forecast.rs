use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub predicted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// One additive component (trend or a named seasonality), aligned row-for-row
/// with `ForecastResult::points`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastComponent {
    pub name: String,
    pub values: Vec<f64>,
}

/// Model output over history plus horizon, in timestamp order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastResult {
    pub points: Vec<ForecastPoint>,
    pub components: Vec<ForecastComponent>,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rows strictly after `last_known`. A row exactly at `last_known` is history.
    pub fn future_after(&self, last_known: DateTime<Utc>) -> Vec<ForecastPoint> {
        self.points
            .iter()
            .filter(|p| p.timestamp > last_known)
            .copied()
            .collect()
    }

    pub fn component(&self, name: &str) -> Option<&ForecastComponent> {
        self.components.iter().find(|c| c.name == name)
    }
}
