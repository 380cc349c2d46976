//! Discrete PID law.
//!
//! Positional form evaluated once per sample:
//! - **P**: `kp * e`
//! - **I**: forward accumulation `I += kp * dt / ti * e` (when `ti > 0`)
//! - **D**: backward difference `kp * td / dt * (e - e_prev)` (when `td > 0`,
//!   skipped on the first sample)
//!
//! The sum is clamped to the output limits. When clamping changes the command
//! and integral action is enabled, the integral is back-calculated so that
//! `output = P + I + D` holds exactly, which prevents wind-up while saturated.
//! A command that overflows saturates at the limit, and the integral is reset
//! to zero if back-calculation would leave it non-finite.

use lw_core::finite_or;
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};
use crate::pid::PidParams;

/// Controller output clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
        }
    }
}

impl OutputLimits {
    pub fn new(min: f64, max: f64) -> ControlResult<Self> {
        let limits = Self { min, max };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> ControlResult<()> {
        if !(self.min.is_finite() && self.max.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "output limits must be finite",
            });
        }
        if self.min >= self.max {
            return Err(ControlError::InvalidArg {
                what: "min must be less than max",
            });
        }
        Ok(())
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// The limit in the direction of `direction`; `max` unless it is negative.
    pub fn saturate(&self, direction: f64) -> f64 {
        if direction < 0.0 { self.min } else { self.max }
    }
}

/// PID law configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PidLaw {
    params: PidParams,
    limits: OutputLimits,
}

/// PID law state carried between samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidState {
    /// Integral accumulator in output units.
    pub integral: f64,
    /// Error of the previous sample, `None` before the first update.
    pub prev_error: Option<f64>,
}

impl PidLaw {
    /// Create a PID law.
    ///
    /// # Errors
    ///
    /// Returns error if a parameter is non-finite or the limits are invalid.
    pub fn new(params: PidParams, limits: OutputLimits) -> ControlResult<Self> {
        if !(params.kp.is_finite() && params.ti.is_finite() && params.td.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "PID parameters must be finite",
            });
        }
        limits.validate()?;
        Ok(Self { params, limits })
    }

    pub fn params(&self) -> &PidParams {
        &self.params
    }

    pub fn limits(&self) -> &OutputLimits {
        &self.limits
    }

    /// Compute the clamped output for one sample.
    ///
    /// # Arguments
    ///
    /// * `state` - State after the previous sample
    /// * `error` - Setpoint minus measurement
    /// * `dt` - Sample period (seconds)
    ///
    /// # Returns
    ///
    /// Updated state and output value.
    pub fn update(&self, state: &PidState, error: f64, dt: f64) -> (PidState, f64) {
        let PidParams { kp, ti, td } = self.params;

        let p_term = kp * error;

        let mut integral = state.integral;
        if ti > 0.0 {
            integral += kp * dt / ti * error;
        }

        let d_term = match state.prev_error {
            Some(prev) if td > 0.0 && dt > 0.0 => kp * td / dt * (error - prev),
            _ => 0.0,
        };

        let raw = p_term + integral + d_term;
        let output = if raw.is_nan() {
            // Opposing infinite terms; push the way the error asks for
            self.limits.saturate(kp.signum() * error)
        } else {
            self.limits.clamp(raw)
        };

        // Back-calculation anti-windup
        if ti > 0.0 && output != raw {
            integral = finite_or(output - p_term - d_term, 0.0);
        }

        let new_state = PidState {
            integral,
            prev_error: Some(error),
        };
        (new_state, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide() -> OutputLimits {
        OutputLimits::new(-1e6, 1e6).unwrap()
    }

    #[test]
    fn proportional_only() {
        let law = PidLaw::new(PidParams::new(2.0, 0.0, 0.0), wide()).unwrap();
        let (state, output) = law.update(&PidState::default(), 0.5, 1.0);
        assert_eq!(output, 1.0);
        assert_eq!(state.integral, 0.0);
    }

    #[test]
    fn integral_accumulates() {
        let law = PidLaw::new(PidParams::new(1.0, 1.0, 0.0), wide()).unwrap();
        let mut state = PidState::default();
        for _ in 0..10 {
            state = law.update(&state, 1.0, 0.1).0;
        }
        assert!((state.integral - 1.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_skips_first_sample() {
        let law = PidLaw::new(PidParams::new(1.0, 0.0, 2.0), wide()).unwrap();
        let (state, first) = law.update(&PidState::default(), 1.0, 0.5);
        assert_eq!(first, 1.0);
        let (_, second) = law.update(&state, 2.0, 0.5);
        // P = 2, D = 1 * 2 / 0.5 * (2 - 1) = 4
        assert_eq!(second, 6.0);
    }

    #[test]
    fn output_clamping_back_calculates_integral() {
        let law = PidLaw::new(PidParams::new(10.0, 1.0, 0.0), OutputLimits::default()).unwrap();
        let (state, output) = law.update(&PidState::default(), 20.0, 0.1);
        assert_eq!(output, 100.0);
        assert!((state.integral - (100.0 - 200.0)).abs() < 1e-12);
    }

    #[test]
    fn overflowing_command_saturates_with_finite_integral() {
        let law = PidLaw::new(PidParams::new(1e300, 1.0, 0.0), OutputLimits::default()).unwrap();
        let (state, first) = law.update(&PidState::default(), 1e10, 1.0);
        assert_eq!(first, 100.0);
        assert_eq!(state.integral, 0.0);

        let (state, second) = law.update(&state, 1e10, 1.0);
        assert_eq!(second, 100.0);
        assert!(state.integral.is_finite());

        let (_, low) = law.update(&state, -1e10, 1.0);
        assert_eq!(low, 0.0);
    }

    #[test]
    fn opposing_infinite_terms_follow_error_sign() {
        // P overflows to +inf and D to -inf, so the raw sum is NaN.
        let law = PidLaw::new(PidParams::new(1e300, 0.0, 1.0), OutputLimits::default()).unwrap();
        let state = PidState {
            integral: 0.0,
            prev_error: Some(1e10),
        };
        let (_, output) = law.update(&state, 1e9, 0.5);
        assert_eq!(output, 100.0);

        let negative = PidLaw::new(PidParams::new(-1e300, 0.0, 1.0), OutputLimits::default())
            .unwrap();
        let (_, output) = negative.update(&state, 1e9, 0.5);
        assert_eq!(output, 0.0);
    }

    #[test]
    fn invalid_limits_and_params() {
        assert!(OutputLimits::new(1.0, 0.0).is_err());
        assert!(OutputLimits::new(f64::NEG_INFINITY, 0.0).is_err());
        assert!(PidLaw::new(PidParams::new(f64::NAN, 1.0, 0.0), OutputLimits::default()).is_err());
    }
}
