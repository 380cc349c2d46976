//! Error types for the lw-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the core crates and
/// provides a unified error interface for front ends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read series file: {path}")]
    SeriesFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write series file: {path}")]
    SeriesFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Series error: {0}")]
    Series(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Control error: {0}")]
    Control(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for lw-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<lw_core::CoreError> for AppError {
    fn from(err: lw_core::CoreError) -> Self {
        AppError::Series(err.to_string())
    }
}

impl From<lw_model::ModelError> for AppError {
    fn from(err: lw_model::ModelError) -> Self {
        AppError::Model(err.to_string())
    }
}

impl From<lw_controls::ControlError> for AppError {
    fn from(err: lw_controls::ControlError) -> Self {
        AppError::Control(err.to_string())
    }
}
