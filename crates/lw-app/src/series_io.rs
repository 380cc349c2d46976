//! JSON encoding of validated time series.
//!
//! A series file is a JSON array of samples:
//!
//! ```json
//! [{"time": 0.0, "setpoint": 50.0, "measurement": 49.8, "output": 31.2}, ...]
//! ```
//!
//! Timestamps are rebased to the first sample on load.

use std::path::Path;

use lw_core::TimeSeries;

use crate::error::{AppError, AppResult};

/// Parse a series from JSON text.
pub fn parse_series(content: &str) -> AppResult<TimeSeries> {
    serde_json::from_str(content)
        .map_err(|e| AppError::Series(format!("Failed to parse series JSON: {}", e)))
}

/// Load a series from a JSON file.
pub fn load_series(path: &Path) -> AppResult<TimeSeries> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::SeriesFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_series(&content)
}

/// Save a series to a JSON file.
pub fn save_series(path: &Path, series: &TimeSeries) -> AppResult<()> {
    let content = serde_json::to_string_pretty(series)
        .map_err(|e| AppError::Series(format!("Failed to serialize series: {}", e)))?;

    std::fs::write(path, content).map_err(|e| AppError::SeriesFileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
