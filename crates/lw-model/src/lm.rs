//! Levenberg–Marquardt least squares with lower bounds.

use nalgebra::{DMatrix, DVector};

/// Levenberg–Marquardt configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LmConfig {
    /// Maximum accepted iterations
    pub max_iterations: usize,
    /// Initial damping factor
    pub initial_damping: f64,
    /// Damping above which the solve is considered stalled
    pub max_damping: f64,
    /// Stop when the relative cost reduction of an accepted step falls below this
    pub ftol: f64,
    /// Stop when the relative step length falls below this
    pub xtol: f64,
    /// Stop when the gradient infinity-norm falls below this
    pub gtol: f64,
    /// Relative finite-difference step for the Jacobian
    pub fd_step: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            initial_damping: 1e-3,
            max_damping: 1e12,
            ftol: 1e-12,
            xtol: 1e-10,
            gtol: 1e-14,
            fd_step: 1e-7,
        }
    }
}

/// Levenberg–Marquardt result.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Sum of squared residuals at `x` (infinite if never finite)
    pub cost: f64,
    /// Number of accepted iterations
    pub iterations: usize,
    /// Converged flag (false when the iteration budget ran out)
    pub converged: bool,
}

/// Minimise `||r(x)||²` subject to `x[i] >= lower[i]` where a bound is given.
///
/// Steps are projected back onto the feasible box. The Jacobian is built by
/// forward differences. A non-finite trial cost rejects the step, so the
/// returned cost is monotone in the iteration count.
pub fn lm_solve<F>(
    x0: DVector<f64>,
    lower: &[Option<f64>],
    residual_fn: F,
    config: &LmConfig,
) -> LmResult
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let mut x = project(x0, lower);
    let mut r = residual_fn(&x);
    let mut cost = r.norm_squared();

    if !cost.is_finite() {
        return LmResult {
            x,
            cost: f64::INFINITY,
            iterations: 0,
            converged: false,
        };
    }

    let mut lambda = config.initial_damping;

    for iter in 0..config.max_iterations {
        if cost == 0.0 {
            return done(x, cost, iter, true);
        }

        let jac = jacobian(&x, &r, lower, &residual_fn, config.fd_step);
        let jtj = jac.transpose() * &jac;
        let grad = jac.transpose() * &r;

        if grad.amax() < config.gtol {
            return done(x, cost, iter, true);
        }

        // Inner loop: raise damping until a step reduces the cost
        loop {
            let mut a = jtj.clone();
            for i in 0..a.nrows() {
                a[(i, i)] += lambda * jtj[(i, i)].max(1e-12);
            }

            let step = a.cholesky().map(|chol| chol.solve(&(-&grad)));
            let Some(dx) = step else {
                lambda *= 10.0;
                if lambda > config.max_damping {
                    return done(x, cost, iter, true);
                }
                continue;
            };

            let x_new = project(&x + &dx, lower);
            let r_new = residual_fn(&x_new);
            let cost_new = r_new.norm_squared();

            if cost_new.is_finite() && cost_new < cost {
                let reduction = (cost - cost_new) / cost;
                let step_len = (&x_new - &x).norm();
                x = x_new;
                r = r_new;
                cost = cost_new;
                lambda = (lambda / 10.0).max(1e-15);

                if reduction < config.ftol || step_len < config.xtol * (x.norm() + config.xtol) {
                    return done(x, cost, iter + 1, true);
                }
                break;
            }

            lambda *= 10.0;
            if lambda > config.max_damping {
                // No descent direction left: local minimum within the bounds
                return done(x, cost, iter, true);
            }
        }
    }

    done(x, cost, config.max_iterations, false)
}

fn done(x: DVector<f64>, cost: f64, iterations: usize, converged: bool) -> LmResult {
    LmResult {
        x,
        cost,
        iterations,
        converged,
    }
}

fn project(mut x: DVector<f64>, lower: &[Option<f64>]) -> DVector<f64> {
    for (i, bound) in lower.iter().enumerate().take(x.len()) {
        if let Some(lo) = bound {
            if x[i] < *lo {
                x[i] = *lo;
            }
        }
    }
    x
}

fn jacobian<F>(
    x: &DVector<f64>,
    r: &DVector<f64>,
    lower: &[Option<f64>],
    residual_fn: &F,
    rel_step: f64,
) -> DMatrix<f64>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let m = r.len();
    let n = x.len();
    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let h = rel_step * x[j].abs().max(1.0);
        let mut xp = x.clone();
        xp[j] += h;
        let xp = project(xp, lower);
        let actual_h = xp[j] - x[j];
        if actual_h == 0.0 {
            continue;
        }
        let rp = residual_fn(&xp);
        for i in 0..m {
            let d = (rp[i] - r[i]) / actual_h;
            jac[(i, j)] = if d.is_finite() { d } else { 0.0 };
        }
    }
    jac
}
