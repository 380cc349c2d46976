//! Bounded stepping from the current PID toward a tuning target.
//!
//! Each parameter moves independently. A parameter whose current value is
//! exactly zero jumps straight to the target (cold start). Otherwise the
//! move is capped at `|current| * max_change_percent / 100`, so repeated
//! rounds ramp toward the target without overshooting it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pid::{GainMode, PidParameter, PidParams, PB_SENTINEL};

/// Default cap on a single round's relative change.
pub const DEFAULT_MAX_CHANGE_PERCENT: f64 = 20.0;

const REACHED_EPS: f64 = 1e-6;
const ZERO_EPS: f64 = 1e-9;

/// How one parameter moved this round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Current value was zero; next step is the target.
    ColdStart,
    /// Target was within the allowed change.
    ReachedTarget,
    /// Move was truncated; `required_percent` is the change the target needed.
    Limited { required_percent: f64 },
}

/// Per-parameter record of a bounded step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterStep {
    pub parameter: PidParameter,
    pub current: f64,
    pub target: f64,
    pub next: f64,
    pub outcome: StepOutcome,
}

/// Result of one bounded tuning round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningSuggestion {
    pub current: PidParams,
    /// Theoretical optimum.
    pub target: PidParams,
    /// Bounded move from `current` toward `target`.
    pub next_step: PidParams,
    /// One entry per truncated parameter.
    pub warnings: Vec<String>,
    pub steps: Vec<ParameterStep>,
}

impl TuningSuggestion {
    pub fn step(&self, parameter: PidParameter) -> Option<&ParameterStep> {
        self.steps.iter().find(|s| s.parameter == parameter)
    }

    /// True when every parameter reached its target this round.
    pub fn is_converged(&self) -> bool {
        self.steps
            .iter()
            .all(|s| !matches!(s.outcome, StepOutcome::Limited { .. }))
    }

    /// Human-readable movement of one parameter, e.g. `"0.1000 -> 0.1200 (step limited, target 0.2000)"`.
    ///
    /// With [`GainMode::ProportionalBand`], `Kp` is shown as its proportional band.
    pub fn describe(&self, parameter: PidParameter, mode: GainMode) -> String {
        let as_band = mode == GainMode::ProportionalBand && parameter == PidParameter::Kp;
        let value = |pid: &PidParams| {
            if as_band {
                pid.proportional_band()
            } else {
                pid.get(parameter)
            }
        };
        let current = value(&self.current);
        let next = value(&self.next_step);
        let target = value(&self.target);

        if current == 0.0 || (as_band && current >= PB_SENTINEL) {
            return format!("0 -> {next:.4} (initial setting)");
        }

        let percent = if current.abs() > ZERO_EPS {
            (next - current) / current * 100.0
        } else {
            0.0
        };

        if (next - target).abs() < REACHED_EPS {
            format!("{current:.4} -> {next:.4} (target reached, {percent:+.1}%)")
        } else {
            format!("{current:.4} -> {next:.4} (step limited, target {target:.4})")
        }
    }
}

fn bounded_value(current: f64, target: f64, max_change_percent: f64) -> (f64, StepOutcome) {
    if current == 0.0 {
        return (target, StepOutcome::ColdStart);
    }

    let diff = target - current;
    let max_step = current.abs() * (max_change_percent / 100.0);
    if diff.abs() <= max_step {
        (target, StepOutcome::ReachedTarget)
    } else {
        let required_percent = diff / current * 100.0;
        (
            current + max_step * diff.signum(),
            StepOutcome::Limited { required_percent },
        )
    }
}

/// Move each of `kp`, `ti`, `td` from `current` toward `target`.
///
/// # Arguments
///
/// * `current` - Parameters running on the loop now
/// * `target` - Theoretical optimum
/// * `max_change_percent` - Allowed relative change per parameter; negative values act as zero
///
/// # Returns
///
/// The next-step parameters plus one warning per truncated parameter.
pub fn suggest_step(
    current: &PidParams,
    target: &PidParams,
    max_change_percent: f64,
) -> TuningSuggestion {
    let max_change_percent = max_change_percent.max(0.0);
    let mut next_step = *current;
    let mut warnings = Vec::new();
    let mut steps = Vec::with_capacity(PidParameter::ALL.len());

    for parameter in PidParameter::ALL {
        let from = current.get(parameter);
        let to = target.get(parameter);
        let (next, outcome) = bounded_value(from, to, max_change_percent);
        if let StepOutcome::Limited { required_percent } = outcome {
            warnings.push(format!(
                "{parameter} adjustment limited (theoretical change {required_percent:+.1}%)"
            ));
        }
        next_step.set(parameter, next);
        steps.push(ParameterStep {
            parameter,
            current: from,
            target: to,
            next,
            outcome,
        });
    }

    debug!(
        kp = next_step.kp,
        ti = next_step.ti,
        td = next_step.td,
        limited = warnings.len(),
        "bounded tuning step"
    );

    TuningSuggestion {
        current: *current,
        target: *target,
        next_step,
        warnings,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_step_records_warning() {
        let s = suggest_step(
            &PidParams::new(0.1, 50.0, 0.0),
            &PidParams::new(0.2, 50.0, 0.0),
            20.0,
        );
        assert!((s.next_step.kp - 0.12).abs() < 1e-12);
        assert_eq!(s.next_step.ti, 50.0);
        assert_eq!(s.warnings.len(), 1);
        assert_eq!(s.warnings[0], "Kp adjustment limited (theoretical change +100.0%)");
        assert!(!s.is_converged());
        match s.step(PidParameter::Kp).unwrap().outcome {
            StepOutcome::Limited { required_percent } => {
                assert!((required_percent - 100.0).abs() < 1e-9)
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn within_bound_reaches_target_exactly() {
        let s = suggest_step(
            &PidParams::new(1.0, 40.0, 0.0),
            &PidParams::new(1.1, 35.0, 0.0),
            20.0,
        );
        assert_eq!(s.next_step, s.target);
        assert!(s.warnings.is_empty());
        assert!(s.is_converged());
    }

    #[test]
    fn decreasing_move_is_bounded() {
        let s = suggest_step(
            &PidParams::new(2.0, 100.0, 0.0),
            &PidParams::new(0.5, 10.0, 0.0),
            20.0,
        );
        assert!((s.next_step.kp - 1.6).abs() < 1e-12);
        assert!((s.next_step.ti - 80.0).abs() < 1e-12);
        assert_eq!(s.warnings.len(), 2);
    }

    #[test]
    fn zero_current_is_cold_start() {
        let s = suggest_step(&PidParams::zero(), &PidParams::new(0.8, 30.0, 0.0), 20.0);
        assert_eq!(s.next_step, PidParams::new(0.8, 30.0, 0.0));
        assert!(s.warnings.is_empty());
        assert_eq!(
            s.step(PidParameter::Ti).unwrap().outcome,
            StepOutcome::ColdStart
        );
    }

    #[test]
    fn negative_percent_freezes_parameters() {
        let s = suggest_step(
            &PidParams::new(1.0, 10.0, 0.0),
            &PidParams::new(2.0, 10.0, 0.0),
            -5.0,
        );
        assert_eq!(s.next_step.kp, 1.0);
        assert_eq!(s.warnings.len(), 1);
    }

    #[test]
    fn describe_formats() {
        let s = suggest_step(
            &PidParams::new(0.1, 50.0, 0.0),
            &PidParams::new(0.2, 55.0, 0.0),
            20.0,
        );
        assert_eq!(
            s.describe(PidParameter::Kp, GainMode::Gain),
            "0.1000 -> 0.1200 (step limited, target 0.2000)"
        );
        assert_eq!(
            s.describe(PidParameter::Ti, GainMode::Gain),
            "50.0000 -> 55.0000 (target reached, +10.0%)"
        );
        assert_eq!(
            s.describe(PidParameter::Td, GainMode::Gain),
            "0 -> 0.0000 (initial setting)"
        );
        assert_eq!(
            s.describe(PidParameter::Kp, GainMode::ProportionalBand),
            "1000.0000 -> 833.3333 (step limited, target 500.0000)"
        );
    }
}
