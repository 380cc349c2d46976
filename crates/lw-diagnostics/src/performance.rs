//! Integral error measures and step-response metrics.

use lw_core::TimeSeries;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum samples after the step for overshoot/settling to be evaluated.
const MIN_POST_STEP_SAMPLES: usize = 5;

/// Settling band as a fraction of the step size.
const SETTLING_BAND: f64 = 0.05;

/// Performance of one series relative to its largest setpoint step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Integral of absolute error.
    pub iae: f64,
    /// Integral of squared error.
    pub ise: f64,
    /// Peak excursion beyond the new setpoint, percent of step size.
    pub overshoot: f64,
    /// Seconds from the step until the measurement last leaves the 5% band.
    pub settling_time: f64,
}

/// Per-sample integration weights: the interval to the next sample, with the
/// final interval repeated for the last sample.
fn sample_weights(series: &TimeSeries) -> Vec<f64> {
    let mut dt = series.intervals();
    let last = dt.last().copied().unwrap_or(1.0);
    dt.push(last);
    dt
}

/// Index of the largest absolute setpoint change; first occurrence wins.
fn largest_step(setpoint: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, w) in setpoint.windows(2).enumerate() {
        let change = (w[1] - w[0]).abs();
        if best.is_none_or(|(_, b)| change > b) {
            best = Some((i + 1, change));
        }
    }
    best.filter(|&(_, change)| change > 0.0).map(|(idx, _)| idx)
}

/// Evaluate IAE, ISE, overshoot and settling time.
///
/// Overshoot and settling are zero when the setpoint never changes or when
/// fewer than six samples follow the largest step.
pub fn evaluate_performance(series: &TimeSeries) -> PerformanceMetrics {
    let errors = series.errors();
    let weights = sample_weights(series);

    let (iae, ise) = errors
        .iter()
        .zip(&weights)
        .fold((0.0, 0.0), |(iae, ise), (e, dt)| {
            (iae + e.abs() * dt, ise + e * e * dt)
        });

    let mut metrics = PerformanceMetrics {
        iae,
        ise,
        ..PerformanceMetrics::default()
    };

    let sp = series.setpoint();
    let pv = series.measurement();
    let times = series.times();

    let Some(idx) = largest_step(sp) else {
        return metrics;
    };
    if series.len() - idx <= MIN_POST_STEP_SAMPLES {
        return metrics;
    }

    let step = sp[idx] - sp[idx - 1];
    let target = sp[idx];
    let post = &pv[idx..];

    let excursion = if step > 0.0 {
        post.iter().copied().fold(f64::NEG_INFINITY, f64::max) - target
    } else {
        target - post.iter().copied().fold(f64::INFINITY, f64::min)
    };
    if step.abs() > 1e-6 {
        metrics.overshoot = excursion.max(0.0) / step.abs() * 100.0;
    }

    let band = SETTLING_BAND * step.abs();
    if let Some(last_out) = post.iter().rposition(|y| (y - target).abs() > band) {
        metrics.settling_time = times[idx + last_out] - times[idx];
    }

    debug!(
        step_index = idx,
        step,
        overshoot = metrics.overshoot,
        settling_time = metrics.settling_time,
        "performance evaluated"
    );
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(sp: &[f64], pv: &[f64]) -> TimeSeries {
        let t: Vec<f64> = (0..sp.len()).map(|i| i as f64).collect();
        let op = vec![0.0; sp.len()];
        TimeSeries::from_columns(&t, sp, pv, &op).unwrap()
    }

    #[test]
    fn perfect_tracking_has_no_error() {
        let sp = vec![50.0; 20];
        let m = evaluate_performance(&series(&sp, &sp));
        assert_eq!(m.iae, 0.0);
        assert_eq!(m.ise, 0.0);
        assert_eq!(m.overshoot, 0.0);
        assert_eq!(m.settling_time, 0.0);
    }

    #[test]
    fn integrals_use_actual_intervals() {
        // intervals 1, 3 and the last one repeated
        let t = [0.0, 1.0, 4.0];
        let s = TimeSeries::from_columns(&t, &[1.0; 3], &[0.0, 2.0, 1.0], &[0.0; 3]).unwrap();
        let m = evaluate_performance(&s);
        assert!((m.iae - (1.0 + 3.0 + 0.0)).abs() < 1e-12);
        assert!((m.ise - (1.0 + 3.0 + 0.0)).abs() < 1e-12);
    }

    #[test]
    fn single_sample_uses_unit_interval() {
        let s = TimeSeries::from_columns(&[0.0], &[2.0], &[0.0], &[0.0]).unwrap();
        let m = evaluate_performance(&s);
        assert_eq!(m.iae, 2.0);
        assert_eq!(m.ise, 4.0);
    }

    #[test]
    fn overshoot_and_settling_of_largest_step() {
        // SP 50 -> 60 at index 10; PV peaks at 62 then settles.
        let mut sp = vec![50.0; 40];
        let mut pv = vec![50.0; 40];
        for v in sp.iter_mut().skip(10) {
            *v = 60.0;
        }
        let shape = [54.0, 58.0, 61.0, 62.0, 61.0, 60.8, 60.3, 60.1];
        pv[10..18].copy_from_slice(&shape);
        for v in pv.iter_mut().skip(18) {
            *v = 60.0;
        }

        let m = evaluate_performance(&series(&sp, &pv));
        assert!((m.overshoot - 20.0).abs() < 1.0);
        // Last sample outside 60 +/- 0.5 is index 15 (60.8).
        assert!((m.settling_time - 5.0).abs() < 1e-12);
    }

    #[test]
    fn downward_step() {
        let mut sp = vec![60.0; 20];
        let mut pv = vec![60.0; 20];
        for i in 5..20 {
            sp[i] = 50.0;
            pv[i] = 50.0;
        }
        pv[6] = 48.0;
        let m = evaluate_performance(&series(&sp, &pv));
        assert!((m.overshoot - 20.0).abs() < 1e-9);
        assert_eq!(m.settling_time, 1.0);
    }

    #[test]
    fn step_too_close_to_end_is_ignored() {
        let mut sp = vec![50.0; 10];
        sp[6] = 60.0;
        sp[7] = 60.0;
        sp[8] = 60.0;
        sp[9] = 60.0;
        let m = evaluate_performance(&series(&sp, &vec![50.0; 10]));
        assert_eq!(m.overshoot, 0.0);
        assert!(m.iae > 0.0);
    }

    #[test]
    fn ties_pick_first_step() {
        assert_eq!(largest_step(&[0.0, 1.0, 1.0, 2.0]), Some(1));
        assert_eq!(largest_step(&[1.0, 1.0]), None);
    }
}
