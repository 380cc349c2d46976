//! Loop diagnostics for loopwise.
//!
//! Every analyzer here is a total function of an already validated
//! [`TimeSeries`](lw_core::TimeSeries): no analyzer fails, degenerate inputs
//! produce well-defined neutral results instead.
//!
//! - [`evaluate_performance`]: IAE/ISE plus overshoot and settling of the largest setpoint step
//! - [`characterize_controller`]: output movement, aggressiveness and sampling quality
//! - [`analyze_loop_health`]: heuristic detection of saturation, noise,
//!   oscillation, offset, overshoot and stiction
//! - [`analyze_valve_health`]: per-bin gain linearity, erosion risk and stiction zones
//! - [`check_data_sufficiency`]: whether the series covers enough of the process dynamics

pub mod characterize;
pub mod loop_health;
pub mod performance;
pub mod status;
pub mod sufficiency;
pub mod valve_health;

mod stiction;

pub use characterize::{characterize_controller, ControllerStats};
pub use loop_health::{analyze_loop_health, DiagnosisMasks, DiagnosisResult};
pub use performance::{evaluate_performance, PerformanceMetrics};
pub use status::{HealthIssue, HealthStatus, IssueKind};
pub use sufficiency::{check_data_sufficiency, SufficiencyCheck, MIN_SAMPLES};
pub use valve_health::{analyze_valve_health, BinGain, OutputRange, ValveHealthReport};
