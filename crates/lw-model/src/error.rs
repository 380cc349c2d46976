//! Error types for modelling and identification.

use lw_core::CoreError;
use thiserror::Error;

/// Result type for modelling operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised before any numeric work begins.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// Invalid model parameter or configuration.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Not enough samples to identify a model.
    #[error("Too few samples: need at least {required}, got {actual}")]
    TooFewSamples { required: usize, actual: usize },

    /// The first time step is zero or negative.
    #[error("Time step must be strictly positive, got {dt}")]
    NonPositiveStep { dt: f64 },

    /// Sampling is not uniform enough for a fixed-step model.
    #[error("Non-uniform sampling at interval {index}: expected {expected}s, got {actual}s")]
    NonUniformSampling {
        index: usize,
        expected: f64,
        actual: f64,
    },

    /// Input sequences of different lengths.
    #[error("Length mismatch: {outputs} outputs for {times} timestamps")]
    LengthMismatch { outputs: usize, times: usize },

    /// Every dead-time candidate failed to produce a finite fit.
    #[error("Identification failed: no dead-time candidate produced a finite fit")]
    FitFailed,

    #[error(transparent)]
    Core(#[from] CoreError),
}
