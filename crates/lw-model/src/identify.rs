//! FOPDT identification from logged data.

use lw_core::{linspace, TimeSeries};
use nalgebra::DVector;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ModelError, ModelResult};
use crate::fopdt::{ProcessModel, MIN_TAU};
use crate::lm::{lm_solve, LmConfig};

/// Residuals are clipped to this magnitude before squaring.
const RESIDUAL_CLIP: f64 = 1e10;

/// Identification configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentificationConfig {
    /// Number of evenly spaced dead-time candidates.
    pub theta_candidates: usize,
    /// Largest candidate as a fraction of the series duration.
    pub max_theta_fraction: f64,
    /// Lower bound on the fitted time constant (seconds).
    pub min_tau: f64,
    /// Allowed relative deviation of any interval from the first one.
    pub uniform_step_tolerance: f64,
    /// Local solver settings.
    pub solver: LmConfig,
}

impl Default for IdentificationConfig {
    fn default() -> Self {
        Self {
            theta_candidates: 15,
            max_theta_fraction: 0.4,
            min_tau: MIN_TAU,
            uniform_step_tolerance: 0.01,
            solver: LmConfig::default(),
        }
    }
}

/// Outcome of the local solve for one dead-time candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFit {
    pub dead_time: f64,
    /// Mean squared residual; infinite when the solve failed.
    pub mse: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Identified model with fit diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub model: ProcessModel,
    /// Mean squared residual of the retained candidate.
    pub mse: f64,
    /// Every candidate in grid order.
    pub candidates: Vec<CandidateFit>,
}

/// Fits a [`ProcessModel`] to output/measurement data.
///
/// Dead time is scanned over a fixed grid on `[0, max_theta_fraction * duration]`;
/// gain, time constant and bias are solved locally for each candidate. The
/// result is the best grid point, not a guaranteed global optimum.
#[derive(Debug, Clone, Default)]
pub struct ModelIdentifier {
    config: IdentificationConfig,
}

struct Candidate {
    fit: CandidateFit,
    params: Option<(f64, f64, f64)>,
}

impl ModelIdentifier {
    pub fn new(config: IdentificationConfig) -> ModelResult<Self> {
        if config.theta_candidates == 0 {
            return Err(ModelError::InvalidArg {
                what: "theta_candidates must be at least 1",
            });
        }
        if !(config.max_theta_fraction >= 0.0 && config.max_theta_fraction <= 1.0) {
            return Err(ModelError::InvalidArg {
                what: "max_theta_fraction must lie in [0, 1]",
            });
        }
        if !(config.min_tau > 0.0) {
            return Err(ModelError::InvalidArg {
                what: "min_tau must be positive",
            });
        }
        if !(config.uniform_step_tolerance >= 0.0) {
            return Err(ModelError::InvalidArg {
                what: "uniform_step_tolerance must be non-negative",
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &IdentificationConfig {
        &self.config
    }

    /// Fit a model and return it.
    pub fn fit(&self, series: &TimeSeries) -> ModelResult<ProcessModel> {
        self.fit_detailed(series).map(|report| report.model)
    }

    /// Fit a model and return per-candidate diagnostics.
    ///
    /// # Errors
    ///
    /// Fails before any solve when the series has fewer than two samples or
    /// its sampling is not uniform.
    pub fn fit_detailed(&self, series: &TimeSeries) -> ModelResult<FitReport> {
        let dt = self.uniform_step(series)?;
        let op = series.output();
        let pv = series.measurement();
        let duration = series.duration();

        let (k0, tau0, y00) = initial_guess(op, pv, duration);
        info!(
            samples = series.len(),
            dt,
            duration,
            k0,
            tau0,
            "identifying FOPDT model"
        );

        let thetas = linspace(
            0.0,
            duration * self.config.max_theta_fraction,
            self.config.theta_candidates,
        );

        let candidates: Vec<Candidate> = thetas
            .par_iter()
            .map(|&theta| self.solve_candidate(theta, op, pv, dt, (k0, tau0, y00)))
            .collect();

        // Sequential pick keeps ties on the earliest candidate
        let mut best: Option<(f64, f64, (f64, f64, f64))> = None;
        for cand in &candidates {
            if let Some(params) = cand.params {
                if best.is_none_or(|(mse, _, _)| cand.fit.mse < mse) {
                    best = Some((cand.fit.mse, cand.fit.dead_time, params));
                }
            }
        }

        let Some((mse, theta, (k, tau, y0))) = best else {
            warn!("no dead-time candidate produced a finite fit");
            return Err(ModelError::FitFailed);
        };

        let model = ProcessModel::new(k, tau.max(self.config.min_tau), theta, y0)?;
        info!(gain = k, tau, theta, mse, "identified model");

        Ok(FitReport {
            model,
            mse,
            candidates: candidates.into_iter().map(|c| c.fit).collect(),
        })
    }

    fn uniform_step(&self, series: &TimeSeries) -> ModelResult<f64> {
        if series.len() < 2 {
            return Err(ModelError::TooFewSamples {
                required: 2,
                actual: series.len(),
            });
        }
        let intervals = series.intervals();
        let dt = intervals[0];
        if dt <= 0.0 {
            return Err(ModelError::NonPositiveStep { dt });
        }
        let tol = self.config.uniform_step_tolerance * dt;
        for (index, actual) in intervals.iter().enumerate().skip(1) {
            if (actual - dt).abs() > tol {
                return Err(ModelError::NonUniformSampling {
                    index,
                    expected: dt,
                    actual: *actual,
                });
            }
        }
        Ok(dt)
    }

    fn solve_candidate(
        &self,
        theta: f64,
        op: &[f64],
        pv: &[f64],
        dt: f64,
        guess: (f64, f64, f64),
    ) -> Candidate {
        let n = pv.len();
        let residual = |p: &DVector<f64>| -> DVector<f64> {
            match ProcessModel::new(p[0], p[1].max(self.config.min_tau), theta, p[2]) {
                Ok(model) => {
                    let pred = model.predict_uniform(op, dt);
                    DVector::from_iterator(
                        n,
                        pv.iter()
                            .zip(&pred)
                            .map(|(y, yh)| (y - yh).clamp(-RESIDUAL_CLIP, RESIDUAL_CLIP)),
                    )
                }
                Err(_) => DVector::from_element(n, f64::NAN),
            }
        };

        let x0 = DVector::from_vec(vec![guess.0, guess.1, guess.2]);
        let lower = [None, Some(self.config.min_tau), None];
        let result = lm_solve(x0, &lower, residual, &self.config.solver);

        let mse = result.cost / n as f64;
        let params = mse
            .is_finite()
            .then(|| (result.x[0], result.x[1], result.x[2]))
            .filter(|(k, tau, y0)| k.is_finite() && tau.is_finite() && y0.is_finite());

        debug!(
            theta,
            mse,
            iterations = result.iterations,
            converged = result.converged,
            "dead-time candidate solved"
        );

        Candidate {
            fit: CandidateFit {
                dead_time: theta,
                mse: if params.is_some() { mse } else { f64::INFINITY },
                iterations: result.iterations,
                converged: result.converged,
            },
            params,
        }
    }
}

/// Starting point for the local solve: `(K0, tau0, y0_0)`.
fn initial_guess(op: &[f64], pv: &[f64], duration: f64) -> (f64, f64, f64) {
    let first_pv = pv.first().copied().unwrap_or(0.0);
    let delta_pv = pv.last().copied().unwrap_or(0.0) - first_pv;
    let delta_op = op.last().copied().unwrap_or(0.0) - op.first().copied().unwrap_or(0.0);

    let k0 = if delta_op.abs() > 1e-3 {
        (delta_pv / delta_op).clamp(-1e4, 1e4)
    } else {
        1.0
    };
    let tau0 = (duration / 5.0).max(1.0);
    (k0, tau0, first_pv)
}
