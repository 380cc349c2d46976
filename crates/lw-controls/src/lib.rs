//! PID control primitives for loopwise.
//!
//! This crate covers everything that acts on controller parameters:
//!
//! - **PID parameters**: gain / proportional-band representations
//! - **PID law**: discrete positional PID with output clamping and
//!   back-calculation anti-windup
//! - **Closed-loop simulation**: a PID driving an FOPDT process model
//! - **Tuning**: IMC/SIMC-style targets from an identified model
//! - **Bounded stepping**: safety-limited moves from current toward target
//!
//! All operations are pure functions of their inputs; nothing here keeps
//! state between calls.

pub mod controller;
pub mod error;
pub mod pid;
pub mod setpoint;
pub mod simulate;
pub mod suggest;
pub mod tuning;

pub use controller::{OutputLimits, PidLaw, PidState};
pub use error::{ControlError, ControlResult};
pub use pid::{GainMode, PidParameter, PidParams, PB_SENTINEL};
pub use setpoint::{SetpointProfile, StandardProfile};
pub use simulate::{simulate_closed_loop, ClosedLoopSimulator, SimulationOptions, SimulationTrace};
pub use suggest::{
    suggest_step, ParameterStep, StepOutcome, TuningSuggestion, DEFAULT_MAX_CHANGE_PERCENT,
};
pub use tuning::{calculate_pid, Aggressiveness, MIN_CONTROLLABLE_GAIN};
