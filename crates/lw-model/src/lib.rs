//! Process modelling and identification for loopwise.
//!
//! This crate provides the first-order-plus-dead-time (FOPDT) process model
//! used throughout the workspace, and an identifier that fits one to logged
//! output/measurement data.
//!
//! # Identification strategy
//!
//! Fitting gain, time constant and dead time jointly is non-convex in the
//! dead time. The identifier therefore scans a fixed grid of dead-time
//! candidates and, for each, runs a bounded Levenberg–Marquardt solve over
//! gain, time constant and bias. The best candidate by mean squared residual
//! wins. This is a heuristic global search; it does not guarantee the global
//! optimum.

pub mod error;
pub mod fopdt;
pub mod identify;
pub mod lm;

pub use error::{ModelError, ModelResult};
pub use fopdt::ProcessModel;
pub use identify::{CandidateFit, FitReport, IdentificationConfig, ModelIdentifier};
pub use lm::{LmConfig, LmResult};
