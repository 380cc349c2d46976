//! lw-core: shared foundation for loopwise.
//!
//! Contains:
//! - series (validated control-loop `TimeSeries`)
//! - numeric (Real + float helpers)
//! - stats (dispersion, rolling windows, trend fits)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod series;
pub mod stats;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use series::{Sample, TimeSeries};
