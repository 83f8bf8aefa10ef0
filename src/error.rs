use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{} not found.", .path.display())]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("column '{column}' missing from {}", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("Trained model not found at {}. Please run the training step first.", .path.display())]
    ModelUnavailable { path: PathBuf },

    #[error("invalid model file {}: {source}", .path.display())]
    ModelFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("price series is empty")]
    EmptySeries,

    #[error("forecast horizon {minutes} min outside [{min}, {max}]")]
    HorizonOutOfRange { minutes: i64, min: u32, max: u32 },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures inside the forecast domain. Rendered inline, never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("cannot forecast an empty price series")]
    EmptySeries,

    #[error("malformed model: {0}")]
    MalformedModel(String),

    #[error("model produced a non-finite value at {0}")]
    NonFinite(String),

    #[error("model returned {got} rows for {expected} timestamps")]
    LengthMismatch { expected: usize, got: usize },
}
