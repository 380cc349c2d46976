//! Error types for control operations.

use lw_core::CoreError;
use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Simulation time grid is unusable.
    #[error("Invalid time grid: {what}")]
    InvalidTimeGrid { what: String },

    /// Unrecognised aggressiveness preset.
    #[error("Unknown aggressiveness '{0}' (expected conservative, moderate or aggressive)")]
    UnknownAggressiveness(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
