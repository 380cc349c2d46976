//! Synthetic tuning-iteration data.
//!
//! A reference process (K = 2, tau = 50 s, theta = 10 s, y0 = 50) is run in
//! closed loop under a sequence of PI settings that walk from an oscillating
//! start toward the tuned optimum. Each run steps the setpoint from 50 to 60
//! at t = 50 s over ten minutes of 1 s samples, with Gaussian measurement
//! noise from a seeded generator so suites are reproducible.

use chrono::{DateTime, Duration, TimeZone, Utc};
use lw_controls::{ClosedLoopSimulator, PidParams, SimulationOptions, StandardProfile};
use lw_core::{linspace, TimeSeries};
use lw_model::ProcessModel;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Run length in seconds.
pub const SCENARIO_DURATION: f64 = 600.0;
/// Standard deviation of the added measurement noise.
pub const DEFAULT_NOISE_STD: f64 = 0.1;

/// One PI setting in the tuning walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub pid: PidParams,
}

/// A scenario together with its simulated data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticRound {
    pub scenario: Scenario,
    pub series: TimeSeries,
}

/// The process all scenarios run against.
pub fn reference_process() -> AppResult<ProcessModel> {
    Ok(ProcessModel::new(2.0, 50.0, 10.0, 50.0)?)
}

/// The six-stage walk from aggressive to tuned.
pub fn scenarios() -> Vec<Scenario> {
    [
        ("0_initial", "initial: severe oscillation", 2.5, 15.0),
        ("1_iter", "round 1: oscillation easing", 2.0, 20.0),
        ("2_iter", "round 2: overshoot remains", 1.5, 30.0),
        ("3_iter", "round 3: slight overshoot", 1.2, 40.0),
        ("4_iter", "round 4: nearly settled", 0.9, 45.0),
        ("5_iter", "round 5: tuned", 0.65, 50.0),
    ]
    .into_iter()
    .map(|(name, description, kp, ti)| Scenario {
        name: name.to_string(),
        description: description.to_string(),
        pid: PidParams::new(kp, ti, 0.0),
    })
    .collect()
}

fn start_time() -> AppResult<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0)
        .single()
        .ok_or_else(|| AppError::InvalidInput("invalid scenario start time".to_string()))
}

/// Simulate one scenario and add measurement noise.
pub fn simulate_scenario(
    model: &ProcessModel,
    pid: &PidParams,
    noise_std: f64,
    rng: &mut StdRng,
) -> AppResult<TimeSeries> {
    let noise = Normal::new(0.0, noise_std)
        .map_err(|e| AppError::InvalidInput(format!("noise standard deviation: {}", e)))?;

    let grid = linspace(0.0, SCENARIO_DURATION, SCENARIO_DURATION as usize + 1);
    let setpoint = StandardProfile::Step {
        initial: 50.0,
        final_value: 60.0,
        at: 50.0,
    };
    let trace = ClosedLoopSimulator::new(*model, SimulationOptions::default())?
        .simulate(pid, &setpoint, &grid)?;

    let start = start_time()?;
    let stamps: Vec<DateTime<Utc>> = trace
        .time
        .iter()
        .map(|&t| start + Duration::milliseconds((t * 1000.0).round() as i64))
        .collect();
    let measurement: Vec<f64> = trace
        .measurement
        .iter()
        .map(|y| y + noise.sample(rng))
        .collect();

    Ok(TimeSeries::from_timestamps(
        &stamps,
        &trace.setpoint,
        &measurement,
        &trace.output,
    )?)
}

/// Generate every scenario with one seeded noise stream.
pub fn generate_suite(seed: u64, noise_std: f64) -> AppResult<Vec<SyntheticRound>> {
    let model = reference_process()?;
    let mut rng = StdRng::seed_from_u64(seed);

    let rounds = scenarios()
        .into_iter()
        .map(|scenario| -> AppResult<SyntheticRound> {
            let series = simulate_scenario(&model, &scenario.pid, noise_std, &mut rng)?;
            info!(
                name = %scenario.name,
                kp = scenario.pid.kp,
                ti = scenario.pid.ti,
                "generated scenario"
            );
            Ok(SyntheticRound { scenario, series })
        })
        .collect::<AppResult<Vec<_>>>()?;
    Ok(rounds)
}
