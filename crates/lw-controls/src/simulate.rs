//! Closed-loop simulation of a PID controller on an FOPDT process.
//!
//! One deterministic sweep over a uniform time grid. At each sample the
//! measurement is advanced from the simulated history (delayed output through
//! the first-order lag), then the PID law produces the next output.

use lw_core::TimeSeries;
use lw_model::ProcessModel;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::controller::{OutputLimits, PidLaw, PidState};
use crate::error::{ControlError, ControlResult};
use crate::pid::PidParams;
use crate::setpoint::SetpointProfile;

/// Simulation options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationOptions {
    /// Output clamp applied to every command.
    pub limits: OutputLimits,
    /// Output assumed before the simulation starts (operating point `u0`).
    pub initial_output: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            limits: OutputLimits::default(),
            initial_output: 0.0,
        }
    }
}

/// Simulated signals, one entry per grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationTrace {
    pub time: Vec<f64>,
    pub setpoint: Vec<f64>,
    pub measurement: Vec<f64>,
    pub output: Vec<f64>,
    /// Integral accumulator after each update.
    pub integral: Vec<f64>,
}

impl SimulationTrace {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// View the trace as a logged series for the analyzers.
    pub fn to_series(&self) -> ControlResult<TimeSeries> {
        Ok(TimeSeries::from_columns(
            &self.time,
            &self.setpoint,
            &self.measurement,
            &self.output,
        )?)
    }
}

/// Simulates PID control of a fixed process model.
#[derive(Debug, Clone)]
pub struct ClosedLoopSimulator {
    model: ProcessModel,
    options: SimulationOptions,
}

impl ClosedLoopSimulator {
    pub fn new(model: ProcessModel, options: SimulationOptions) -> ControlResult<Self> {
        options.limits.validate()?;
        if !options.initial_output.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "initial_output must be finite",
            });
        }
        Ok(Self { model, options })
    }

    pub fn model(&self) -> &ProcessModel {
        &self.model
    }

    /// Run one closed-loop sweep.
    ///
    /// # Errors
    ///
    /// Fails if `time_grid` has fewer than two points or is not strictly
    /// increasing, or if the PID parameters are non-finite.
    pub fn simulate<S>(
        &self,
        pid: &PidParams,
        setpoint: &S,
        time_grid: &[f64],
    ) -> ControlResult<SimulationTrace>
    where
        S: SetpointProfile + ?Sized,
    {
        let dt = grid_step(time_grid)?;
        let law = PidLaw::new(*pid, self.options.limits)?;
        let u0 = self.options.initial_output;
        let n = time_grid.len();
        let delay = self.model.delay_steps(dt);

        let mut trace = SimulationTrace {
            time: time_grid.to_vec(),
            setpoint: Vec::with_capacity(n),
            measurement: Vec::with_capacity(n),
            output: Vec::with_capacity(n),
            integral: Vec::with_capacity(n),
        };
        let mut state = PidState::default();

        for (k, &t) in time_grid.iter().enumerate() {
            let sp = setpoint.value_at(t);

            let pv = if k == 0 {
                self.model.bias()
            } else {
                let delayed = (k - 1)
                    .checked_sub(delay)
                    .map(|idx| trace.output[idx])
                    .unwrap_or(u0);
                self.model.advance(trace.measurement[k - 1], delayed, u0, dt)
            };

            let (next_state, op) = law.update(&state, sp - pv, dt);
            state = next_state;

            trace.setpoint.push(sp);
            trace.measurement.push(pv);
            trace.output.push(op);
            trace.integral.push(state.integral);
        }

        debug!(
            samples = n,
            dt,
            delay_steps = delay,
            kp = pid.kp,
            ti = pid.ti,
            td = pid.td,
            "closed-loop simulation finished"
        );
        Ok(trace)
    }
}

/// One-shot closed-loop simulation with default options and given limits.
pub fn simulate_closed_loop<S>(
    model: &ProcessModel,
    pid: &PidParams,
    setpoint: &S,
    time_grid: &[f64],
    limits: OutputLimits,
) -> ControlResult<SimulationTrace>
where
    S: SetpointProfile + ?Sized,
{
    let options = SimulationOptions {
        limits,
        ..SimulationOptions::default()
    };
    ClosedLoopSimulator::new(*model, options)?.simulate(pid, setpoint, time_grid)
}

fn grid_step(time_grid: &[f64]) -> ControlResult<f64> {
    if time_grid.len() < 2 {
        return Err(ControlError::InvalidTimeGrid {
            what: format!("need at least 2 points, got {}", time_grid.len()),
        });
    }
    for (i, w) in time_grid.windows(2).enumerate() {
        if !(w[1] > w[0]) {
            return Err(ControlError::InvalidTimeGrid {
                what: format!("time must strictly increase at index {}", i + 1),
            });
        }
    }
    let dt = time_grid[1] - time_grid[0];
    if !dt.is_finite() {
        return Err(ControlError::InvalidTimeGrid {
            what: "non-finite time step".to_string(),
        });
    }
    Ok(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lw_core::linspace;

    #[test]
    fn rejects_short_or_unordered_grid() {
        let model = ProcessModel::new(1.0, 10.0, 0.0, 0.0).unwrap();
        let pid = PidParams::new(1.0, 10.0, 0.0);
        let sp = |_: f64| 1.0;
        let lim = OutputLimits::default();
        assert!(simulate_closed_loop(&model, &pid, &sp, &[0.0], lim).is_err());
        assert!(simulate_closed_loop(&model, &pid, &sp, &[0.0, 1.0, 1.0], lim).is_err());
    }

    #[test]
    fn starts_at_bias_and_records_setpoint() {
        let model = ProcessModel::new(1.0, 10.0, 0.0, 5.0).unwrap();
        let pid = PidParams::new(1.0, 10.0, 0.0);
        let t = linspace(0.0, 10.0, 11);
        let trace = simulate_closed_loop(
            &model,
            &pid,
            &|t: f64| if t >= 3.0 { 8.0 } else { 5.0 },
            &t,
            OutputLimits::new(-100.0, 100.0).unwrap(),
        )
        .unwrap();
        assert_eq!(trace.measurement[0], 5.0);
        assert_eq!(trace.setpoint[2], 5.0);
        assert_eq!(trace.setpoint[3], 8.0);
        assert_eq!(trace.len(), 11);
    }

    #[test]
    fn dead_time_delays_response() {
        let model = ProcessModel::new(1.0, 5.0, 3.0, 0.0).unwrap();
        let pid = PidParams::new(1.0, 0.0, 0.0);
        let t = linspace(0.0, 20.0, 21);
        let trace = simulate_closed_loop(
            &model,
            &pid,
            &|_: f64| 1.0,
            &t,
            OutputLimits::new(-10.0, 10.0).unwrap(),
        )
        .unwrap();
        // Output 1.0 from k=0 reaches the process at k = 1 + 3
        assert!(trace.measurement[..4].iter().all(|v| *v == 0.0));
        assert!(trace.measurement[4] > 0.0);
    }

    #[test]
    fn trace_converts_to_series() {
        let model = ProcessModel::new(1.0, 10.0, 0.0, 0.0).unwrap();
        let t = linspace(0.0, 5.0, 6);
        let trace = simulate_closed_loop(
            &model,
            &PidParams::new(1.0, 10.0, 0.0),
            &|_: f64| 1.0,
            &t,
            OutputLimits::default(),
        )
        .unwrap();
        let series = trace.to_series().unwrap();
        assert_eq!(series.len(), 6);
        assert_eq!(series.output(), trace.output.as_slice());
    }
}
