use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::forecast::{DEFAULT_HORIZON_MINUTES, MAX_HORIZON_MINUTES, MIN_HORIZON_MINUTES};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const MAX_SAMPLE_ROWS: usize = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub csv_path: PathBuf,
    pub timestamp_column: String,
    pub close_column: String,
    pub sample_rows: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data.csv"),
            timestamp_column: "Timestamp".to_string(),
            close_column: "Close".to_string(),
            sample_rows: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("forecast_model.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub default_horizon_minutes: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_horizon_minutes: DEFAULT_HORIZON_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub refresh_rate_ms: u64,
    /// Upper bound on points handed to a single chart dataset.
    pub chart_points: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: 100,
            chart_points: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: PathBuf::from("btc-forecast.log"),
        }
    }
}

fn config_path() -> PathBuf {
    std::env::var("BTCF_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from_path(&config_path())
    }

    /// Missing file means built-in defaults; a present but broken file is an error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let config_str = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&config_str)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let horizon = self.forecast.default_horizon_minutes;
        if !(MIN_HORIZON_MINUTES..=MAX_HORIZON_MINUTES).contains(&horizon) {
            bail!(
                "forecast.default_horizon_minutes = {} must be within [{}, {}]",
                horizon,
                MIN_HORIZON_MINUTES,
                MAX_HORIZON_MINUTES
            );
        }
        if self.data.csv_path.as_os_str().is_empty() {
            bail!("data.csv_path must not be empty");
        }
        if self.model.path.as_os_str().is_empty() {
            bail!("model.path must not be empty");
        }
        if self.data.timestamp_column.trim().is_empty() || self.data.close_column.trim().is_empty()
        {
            bail!("data.timestamp_column and data.close_column must not be empty");
        }
        if self.data.sample_rows > MAX_SAMPLE_ROWS {
            bail!(
                "data.sample_rows = {} must be <= {}",
                self.data.sample_rows,
                MAX_SAMPLE_ROWS
            );
        }
        if self.ui.refresh_rate_ms == 0 {
            bail!("ui.refresh_rate_ms must be > 0");
        }
        if self.ui.chart_points < 2 {
            bail!("ui.chart_points must be >= 2");
        }
        Ok(())
    }
}
