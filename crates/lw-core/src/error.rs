use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Time series is empty")]
    EmptySeries,

    #[error("Non-finite {field} value at sample {index}: {value}")]
    NonFinite {
        field: &'static str,
        index: usize,
        value: f64,
    },

    #[error("Timestamps must be strictly increasing: sample {index} at {current}s follows {previous}s")]
    NonIncreasingTime {
        index: usize,
        previous: f64,
        current: f64,
    },

    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
