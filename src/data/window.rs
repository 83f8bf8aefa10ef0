use chrono::Duration;

use crate::error::AppError;
use crate::model::price::{PricePoint, PriceSeries};

/// Fixed trailing durations used for the fluctuation charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookbackWindow {
    Day,
    Month,
    Year,
}

impl LookbackWindow {
    /// Display order on the dashboard.
    pub const ALL: [LookbackWindow; 3] = [
        LookbackWindow::Month,
        LookbackWindow::Day,
        LookbackWindow::Year,
    ];

    pub fn days(self) -> i64 {
        match self {
            Self::Day => 1,
            Self::Month => 30,
            Self::Year => 365,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::days(self.days())
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Day => "Last 24 Hours Price Fluctuations",
            Self::Month => "Last 30 Days Price Fluctuations",
            Self::Year => "Last Year Price Fluctuations",
        }
    }

    pub fn empty_notice(self) -> &'static str {
        match self {
            Self::Day => "No data for last day.",
            Self::Month => "No data for last month.",
            Self::Year => "No data for last year.",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WindowSlice<'a> {
    pub window: LookbackWindow,
    pub points: &'a [PricePoint],
}

/// Each window is cut from the full series on its own; none is derived from another.
pub fn fluctuation_windows(series: &PriceSeries) -> Result<Vec<WindowSlice<'_>>, AppError> {
    LookbackWindow::ALL
        .iter()
        .map(|&window| {
            series
                .window_since(window.duration())
                .map(|points| WindowSlice { window, points })
        })
        .collect()
}
