//! One dashboard run: read both artifacts, forecast, cut the lookback windows.
//!
//! Nothing is cached between runs. Every horizon change calls `build_view`
//! again and re-derives the whole view from the files on disk.

use crate::config::Config;
use crate::data::{
    fluctuation_windows, load_price_series, CleaningReport, LoadedSeries, LookbackWindow,
};
use crate::error::AppError;
use crate::forecast::{load_model, run_forecast, ForecastModel, ForecastOutcome, Horizon};
use crate::model::price::{PricePoint, PriceSeries};

pub const MODEL_LOADED_MESSAGE: &str = "Loaded trained forecasting model.";

#[derive(Debug, Clone)]
pub enum ForecastPanel {
    Ready(ForecastOutcome),
    /// Forecast failed; the rest of the dashboard is unaffected.
    Failed(String),
}

impl ForecastPanel {
    pub fn outcome(&self) -> Option<&ForecastOutcome> {
        match self {
            Self::Ready(outcome) => Some(outcome),
            Self::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FluctuationPanel {
    Chart {
        window: LookbackWindow,
        points: Vec<PricePoint>,
    },
    NoData {
        window: LookbackWindow,
    },
}

impl FluctuationPanel {
    pub fn window(&self) -> LookbackWindow {
        match self {
            Self::Chart { window, .. } | Self::NoData { window } => *window,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub horizon: Horizon,
    pub series: PriceSeries,
    pub cleaning: CleaningReport,
    pub sample: Vec<PricePoint>,
    pub forecast: ForecastPanel,
    pub fluctuations: Vec<FluctuationPanel>,
}

impl DashboardView {
    /// Pure part of a run. Forecast failures are contained in `ForecastPanel::Failed`.
    pub fn assemble(
        loaded: LoadedSeries,
        model: &dyn ForecastModel,
        horizon: Horizon,
        sample_rows: usize,
    ) -> Self {
        let LoadedSeries { series, report } = loaded;

        let forecast = match run_forecast(model, &series, horizon) {
            Ok(outcome) => ForecastPanel::Ready(outcome),
            Err(e) => {
                tracing::warn!(error = %e, horizon_minutes = horizon.minutes(), "Forecast failed");
                ForecastPanel::Failed(format!("Forecasting error: {}", e))
            }
        };

        let fluctuations = match fluctuation_windows(&series) {
            Ok(slices) => slices
                .into_iter()
                .map(|slice| {
                    if slice.points.is_empty() {
                        FluctuationPanel::NoData {
                            window: slice.window,
                        }
                    } else {
                        FluctuationPanel::Chart {
                            window: slice.window,
                            points: slice.points.to_vec(),
                        }
                    }
                })
                .collect(),
            Err(_) => LookbackWindow::ALL
                .iter()
                .map(|&window| FluctuationPanel::NoData { window })
                .collect(),
        };

        let sample = series.tail(sample_rows).to_vec();

        Self {
            horizon,
            series,
            cleaning: report,
            sample,
            forecast,
            fluctuations,
        }
    }

    pub fn row_count_message(&self) -> String {
        format!("Loaded {} rows.", self.series.len())
    }

    pub fn dropped_rows_message(&self) -> Option<String> {
        let dropped = self.cleaning.dropped_rows();
        (dropped > 0).then(|| format!("Dropped {} malformed rows.", dropped))
    }

    pub fn fluctuation(&self, window: LookbackWindow) -> Option<&FluctuationPanel> {
        self.fluctuations.iter().find(|p| p.window() == window)
    }
}

/// Full run against the configured files. Missing data or model halts the run.
pub fn build_view(config: &Config, horizon: Horizon) -> Result<DashboardView, AppError> {
    let loaded = load_price_series(&config.data.csv_path, &config.data)?;
    let model = load_model(&config.model.path)?;
    Ok(DashboardView::assemble(
        loaded,
        &model,
        horizon,
        config.data.sample_rows,
    ))
}
