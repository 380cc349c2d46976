//! Heuristic loop health analysis.
//!
//! Six independent checks run over one series. Each may raise the overall
//! status; none can lower it.
//!
//! | check | severity |
//! |---|---|
//! | output saturation (high/low) | warning |
//! | measurement noise | warning |
//! | diverging oscillation | critical |
//! | sustained oscillation | warning |
//! | steady-state offset | warning |
//! | severe overshoot | warning |
//! | valve stiction | warning |

use std::collections::BTreeMap;

use lw_core::stats::{centered_rolling_mean, index_slope, mean, min_max, sample_std};
use lw_core::TimeSeries;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::status::{HealthIssue, HealthStatus, IssueKind};
use crate::stiction::stiction_candidates;

const NOISE_WINDOW: usize = 5;
const OVERSHOOT_WINDOW: usize = 50;
const MIN_OVERSHOOT_WINDOW: usize = 5;
const MIN_OFFSET_WINDOW: usize = 5;
const MIN_PEAKS: usize = 3;

/// Per-sample flags for plotting which samples drove a finding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagnosisMasks {
    /// Output at a limit while the error pushes further into it.
    pub saturation: Vec<bool>,
    /// Samples inside the half-cycles of a flagged oscillation.
    pub oscillation: Vec<bool>,
    /// Output moving while the measurement is flat.
    pub stiction: Vec<bool>,
}

/// Outcome of [`analyze_loop_health`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// Worst severity reached by any check.
    pub status: HealthStatus,
    /// Findings in check order.
    pub issues: Vec<HealthIssue>,
    /// Auxiliary numbers computed along the way.
    pub details: BTreeMap<String, f64>,
    pub masks: DiagnosisMasks,
}

impl DiagnosisResult {
    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }

    fn raise(&mut self, kind: IssueKind, severity: HealthStatus, message: String) {
        debug!(?kind, %severity, %message, "loop health finding");
        self.status.escalate(severity);
        self.issues.push(HealthIssue::new(kind, severity, message));
    }
}

/// Quantities shared by several checks.
struct Scales {
    sp_mean: f64,
    /// Error magnitude that counts as "persistent".
    err_threshold: f64,
    /// Observed output span, 1.0 when the output is flat.
    op_range: f64,
    /// Observed setpoint span, with fallbacks for a flat setpoint.
    sp_range: f64,
}

impl Scales {
    fn new(series: &TimeSeries) -> Self {
        let sp_mean = mean(series.setpoint());

        let (op_min, op_max) = min_max(series.output()).unwrap_or((0.0, 0.0));
        let mut op_range = op_max - op_min;
        if op_range < 1e-6 {
            op_range = 1.0;
        }

        let (sp_min, sp_max) = min_max(series.setpoint()).unwrap_or((0.0, 0.0));
        let mut sp_range = sp_max - sp_min;
        if sp_range == 0.0 {
            sp_range = sp_mean.abs() * 0.1;
            if sp_range == 0.0 {
                sp_range = 1.0;
            }
        }

        Self {
            sp_mean,
            err_threshold: (0.01 * sp_mean.abs()).max(0.5),
            op_range,
            sp_range,
        }
    }
}

/// Run every loop health check over `series`.
pub fn analyze_loop_health(series: &TimeSeries) -> DiagnosisResult {
    let n = series.len();
    let errors = series.errors();
    let scales = Scales::new(series);

    let mut result = DiagnosisResult {
        masks: DiagnosisMasks {
            saturation: vec![false; n],
            oscillation: vec![false; n],
            stiction: vec![false; n],
        },
        ..DiagnosisResult::default()
    };

    check_saturation(series, &errors, &scales, &mut result);
    check_noise(series, &scales, &mut result);
    check_oscillation(&errors, &scales, &mut result);
    check_offset(series, &errors, &scales, &mut result);
    check_overshoot(series, &scales, &mut result);
    check_stiction(series, &scales, &mut result);

    result
}

fn check_saturation(
    series: &TimeSeries,
    errors: &[f64],
    scales: &Scales,
    result: &mut DiagnosisResult,
) {
    let op = series.output();
    let n = op.len() as f64;
    let Some((op_min, op_max)) = min_max(op) else {
        return;
    };
    let tol = (0.01 * scales.op_range).max(0.1);
    let thr = scales.err_threshold;
    let avg_error = mean(errors);

    let mut at_max = 0usize;
    let mut at_min = 0usize;
    let mut high = 0usize;
    let mut low = 0usize;
    for (i, (&u, &e)) in op.iter().zip(errors).enumerate() {
        let is_max = u >= op_max - tol;
        let is_min = u <= op_min + tol;
        at_max += usize::from(is_max);
        at_min += usize::from(is_min);
        let high_sat = is_max && e > thr;
        let low_sat = is_min && e < -thr;
        high += usize::from(high_sat);
        low += usize::from(low_sat);
        result.masks.saturation[i] = high_sat || low_sat;
    }

    if high as f64 / n > 0.1 {
        result.raise(
            IssueKind::SaturationHigh,
            HealthStatus::Warning,
            "Actuator saturated at high limit: setpoint cannot be reached".to_string(),
        );
    } else if at_max as f64 / n > 0.9 && avg_error > thr {
        result.raise(
            IssueKind::SaturationHigh,
            HealthStatus::Warning,
            "Actuator saturated at high limit: output held at maximum".to_string(),
        );
    }

    if low as f64 / n > 0.1 {
        result.raise(
            IssueKind::SaturationLow,
            HealthStatus::Warning,
            "Actuator saturated at low limit: setpoint cannot be reached".to_string(),
        );
    } else if at_min as f64 / n > 0.9 && avg_error < -thr {
        result.raise(
            IssueKind::SaturationLow,
            HealthStatus::Warning,
            "Actuator saturated at low limit: output held at minimum".to_string(),
        );
    }
}

fn check_noise(series: &TimeSeries, scales: &Scales, result: &mut DiagnosisResult) {
    let pv = series.measurement();
    let residual: Vec<f64> = centered_rolling_mean(pv, NOISE_WINDOW)
        .iter()
        .zip(pv)
        .map(|(smooth, &y)| y - smooth.unwrap_or(y))
        .collect();
    let noise_std = sample_std(&residual);
    result.details.insert("noise_std".to_string(), noise_std);

    if 3.0 * noise_std > 0.05 * scales.sp_range {
        result.raise(
            IssueKind::Noise,
            HealthStatus::Warning,
            format!("High measurement noise (std {noise_std:.3})"),
        );
    }
}

fn check_oscillation(errors: &[f64], scales: &Scales, result: &mut DiagnosisResult) {
    let crossings: Vec<usize> = errors
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0].is_sign_negative() != w[1].is_sign_negative())
        .map(|(i, _)| i)
        .collect();
    if crossings.len() < MIN_PEAKS + 1 {
        return;
    }

    let peaks: Vec<f64> = crossings
        .windows(2)
        .map(|c| {
            errors[c[0]..c[1]]
                .iter()
                .map(|e| e.abs())
                .fold(0.0, f64::max)
        })
        .collect();

    let avg_peak = mean(&peaks);
    let slope = index_slope(&peaks);
    result.details.insert("avg_peak".to_string(), avg_peak);
    result.details.insert("peak_slope".to_string(), slope);

    let sp_abs = scales.sp_mean.abs();
    let finding = if avg_peak > 0.02 * sp_abs && slope > 0.05 * avg_peak {
        Some((
            IssueKind::Divergence,
            HealthStatus::Critical,
            format!("Diverging oscillation (peak growth {slope:.3} per cycle)"),
        ))
    } else if avg_peak > 0.05 * sp_abs {
        Some((
            IssueKind::Oscillation,
            HealthStatus::Warning,
            format!("Sustained oscillation (mean peak error {avg_peak:.3})"),
        ))
    } else {
        None
    };

    if let Some((kind, severity, message)) = finding {
        let (first, last) = (crossings[0], crossings[crossings.len() - 1]);
        for flag in &mut result.masks.oscillation[first..=last] {
            *flag = true;
        }
        result.raise(kind, severity, message);
    }
}

fn check_offset(
    series: &TimeSeries,
    errors: &[f64],
    scales: &Scales,
    result: &mut DiagnosisResult,
) {
    let n = series.len();
    let window = (n as f64 * 0.2) as usize;
    if window <= MIN_OFFSET_WINDOW {
        return;
    }

    let sp_abs = scales.sp_mean.abs();
    if sample_std(&series.setpoint()[n - window..]) >= 0.01 * sp_abs {
        return;
    }

    let offset = mean(&errors[n - window..]);
    result.details.insert("steady_state_offset".to_string(), offset);
    if offset.abs() > (0.02 * sp_abs).max(1.0) {
        result.raise(
            IssueKind::SteadyStateOffset,
            HealthStatus::Warning,
            format!("Steady-state offset: {offset:.2}"),
        );
    }
}

fn check_overshoot(series: &TimeSeries, scales: &Scales, result: &mut DiagnosisResult) {
    let sp = series.setpoint();
    let pv = series.measurement();
    let n = sp.len();
    let step_threshold = 0.05 * scales.sp_mean.abs();

    for idx in 1..n {
        if (sp[idx] - sp[idx - 1]).abs() <= step_threshold {
            continue;
        }
        let end = (idx + OVERSHOOT_WINDOW).min(n);
        if end <= idx + MIN_OVERSHOOT_WINDOW {
            continue;
        }

        let target = sp[end - 1];
        let step = target - sp[idx - 1];
        if step.abs() < 1e-3 {
            continue;
        }

        let window = &pv[idx..end];
        let overshoot = if step > 0.0 {
            window.iter().copied().fold(f64::NEG_INFINITY, f64::max) - target
        } else {
            target - window.iter().copied().fold(f64::INFINITY, f64::min)
        };

        if overshoot > 0.2 * step.abs() {
            let percent = overshoot / step.abs() * 100.0;
            result.details.insert("overshoot_percent".to_string(), percent);
            result.raise(
                IssueKind::Overshoot,
                HealthStatus::Warning,
                format!("Severe overshoot (>{percent:.1}%)"),
            );
            break;
        }
    }
}

fn check_stiction(series: &TimeSeries, scales: &Scales, result: &mut DiagnosisResult) {
    let n = series.len();
    if n <= 2 * NOISE_WINDOW {
        return;
    }

    let mask = stiction_candidates(
        series.output(),
        series.measurement(),
        0.005 * scales.op_range,
        0.001 * scales.sp_range,
    );
    let count = mask.iter().filter(|&&m| m).count();
    result.masks.stiction = mask;

    if count as f64 > 0.05 * n as f64 {
        result
            .details
            .insert("stiction_fraction".to_string(), count as f64 / n as f64);
        result.raise(
            IssueKind::Stiction,
            HealthStatus::Warning,
            "Suspected valve stiction: output moves but measurement lags".to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(sp: &[f64], pv: &[f64], op: &[f64]) -> TimeSeries {
        let t: Vec<f64> = (0..sp.len()).map(|i| i as f64).collect();
        TimeSeries::from_columns(&t, sp, pv, op).unwrap()
    }

    #[test]
    fn flat_setpoint_range_falls_back_to_mean() {
        let s = series(&[50.0; 4], &[50.0; 4], &[1.0; 4]);
        let scales = Scales::new(&s);
        assert_eq!(scales.sp_range, 5.0);
        assert_eq!(scales.op_range, 1.0);
        assert_eq!(scales.err_threshold, 0.5);

        let zero = series(&[0.0; 4], &[0.0; 4], &[1.0; 4]);
        assert_eq!(Scales::new(&zero).sp_range, 1.0);
    }

    #[test]
    fn short_series_skips_window_checks() {
        let r = analyze_loop_health(&series(&[10.0; 8], &[10.0; 8], &[5.0; 8]));
        assert_eq!(r.status, HealthStatus::Healthy);
        assert!(r.masks.stiction.iter().all(|&m| !m));
        assert!(r.details.contains_key("noise_std"));
    }

    #[test]
    fn low_saturation() {
        let n = 100;
        let r = analyze_loop_health(&series(&vec![50.0; n], &vec![60.0; n], &vec![0.0; n]));
        assert!(r.has_issue(IssueKind::SaturationLow));
        assert!(!r.has_issue(IssueKind::SaturationHigh));
        assert!(r.masks.saturation.iter().all(|&m| m));
    }
}
