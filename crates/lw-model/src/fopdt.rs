//! First-order-plus-dead-time process model.
//!
//! Dynamics: `tau * dy/dt = K * (u(t - theta) - u0) - (y - y0)`, integrated
//! with explicit Euler on the sampling grid. The same single-step recurrence
//! backs both one-shot prediction and the closed-loop simulator.

use lw_core::finite_or;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Time constant floor applied before division (seconds).
pub const MIN_TAU: f64 = 0.1;

/// Largest per-step change the integrator will apply.
pub const MAX_STEP_CHANGE: f64 = 1e5;

/// FOPDT process model.
///
/// Immutable once built; construct with [`ProcessModel::new`] or obtain one
/// from [`crate::ModelIdentifier`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProcessModel")]
pub struct ProcessModel {
    gain: f64,
    time_constant: f64,
    dead_time: f64,
    bias: f64,
}

#[derive(Deserialize)]
struct RawProcessModel {
    gain: f64,
    time_constant: f64,
    dead_time: f64,
    bias: f64,
}

impl TryFrom<RawProcessModel> for ProcessModel {
    type Error = ModelError;

    fn try_from(raw: RawProcessModel) -> ModelResult<Self> {
        Self::new(raw.gain, raw.time_constant, raw.dead_time, raw.bias)
    }
}

impl ProcessModel {
    /// Create a new model.
    ///
    /// # Arguments
    ///
    /// * `gain` - Process gain K (measurement units per output unit)
    /// * `time_constant` - Lag tau in seconds (must be positive)
    /// * `dead_time` - Transport delay theta in seconds (must be non-negative)
    /// * `bias` - Measurement y0 at the initial operating point
    pub fn new(gain: f64, time_constant: f64, dead_time: f64, bias: f64) -> ModelResult<Self> {
        if !(gain.is_finite() && time_constant.is_finite() && dead_time.is_finite()) {
            return Err(ModelError::InvalidArg {
                what: "model parameters must be finite",
            });
        }
        if !bias.is_finite() {
            return Err(ModelError::InvalidArg {
                what: "bias must be finite",
            });
        }
        if time_constant <= 0.0 {
            return Err(ModelError::InvalidArg {
                what: "time_constant must be positive",
            });
        }
        if dead_time < 0.0 {
            return Err(ModelError::InvalidArg {
                what: "dead_time must be non-negative",
            });
        }
        Ok(Self {
            gain,
            time_constant,
            dead_time,
            bias,
        })
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn time_constant(&self) -> f64 {
        self.time_constant
    }

    pub fn dead_time(&self) -> f64 {
        self.dead_time
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Approximate time for the open-loop response to settle: `4 * tau + theta`.
    pub fn settling_horizon(&self) -> f64 {
        4.0 * self.time_constant + self.dead_time
    }

    /// Final measurement change for a sustained output change `delta_output`.
    pub fn steady_state_change(&self, delta_output: f64) -> f64 {
        self.gain * delta_output
    }

    /// Whole samples of transport delay at step `dt`.
    pub fn delay_steps(&self, dt: f64) -> usize {
        if dt <= 0.0 {
            return 0;
        }
        (self.dead_time.max(0.0) / dt).floor() as usize
    }

    /// Advance the measurement by one Euler step.
    ///
    /// `delayed_output` is the output already shifted by the dead time and
    /// `baseline_output` the operating-point output `u0`. A non-finite result
    /// is replaced by `previous`.
    pub fn advance(
        &self,
        previous: f64,
        delayed_output: f64,
        baseline_output: f64,
        dt: f64,
    ) -> f64 {
        let safe_tau = self.time_constant.max(MIN_TAU);

        let driving = finite_or(
            self.gain * (delayed_output - baseline_output) - (previous - self.bias),
            0.0,
        );

        let change = (driving / safe_tau * dt).clamp(-MAX_STEP_CHANGE, MAX_STEP_CHANGE);
        finite_or(previous + change, previous)
    }

    /// Simulate the open-loop response to an output trajectory.
    ///
    /// `times` must be strictly increasing; the step is taken from the first
    /// interval. Outputs before the start are held at `outputs[0]`.
    ///
    /// # Errors
    ///
    /// Fails on mismatched lengths or a non-positive first step.
    pub fn predict(&self, outputs: &[f64], times: &[f64]) -> ModelResult<Vec<f64>> {
        if outputs.len() != times.len() {
            return Err(ModelError::LengthMismatch {
                outputs: outputs.len(),
                times: times.len(),
            });
        }
        match times.len() {
            0 => return Ok(Vec::new()),
            1 => return Ok(vec![self.bias]),
            _ => {}
        }

        let dt = times[1] - times[0];
        if dt <= 0.0 || !dt.is_finite() {
            return Err(ModelError::NonPositiveStep { dt });
        }
        Ok(self.predict_uniform(outputs, dt))
    }

    /// Prediction on a uniform grid with known step. Never fails.
    pub(crate) fn predict_uniform(&self, outputs: &[f64], dt: f64) -> Vec<f64> {
        let n = outputs.len();
        let mut pv = Vec::with_capacity(n);
        if n == 0 {
            return pv;
        }

        let delay = self.delay_steps(dt);
        let baseline = outputs[0];
        pv.push(self.bias);

        for k in 1..n {
            let delayed = (k - 1)
                .checked_sub(delay)
                .map(|idx| outputs[idx])
                .unwrap_or(baseline);
            let next = self.advance(pv[k - 1], delayed, baseline, dt);
            pv.push(next);
        }
        pv
    }
}
