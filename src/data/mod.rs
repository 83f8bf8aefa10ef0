pub mod loader;
pub mod window;

pub use loader::{
    best_effort_clean, load_price_series, parse_close, parse_timestamp, read_price_series,
    CleaningReport, LoadedSeries, RawRecord,
};
pub use window::{fluctuation_windows, LookbackWindow, WindowSlice};
