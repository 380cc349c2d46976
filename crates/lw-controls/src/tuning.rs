//! IMC/SIMC tuning targets from an FOPDT model.
//!
//! The preset picks the desired closed-loop time constant `lambda_c`:
//!
//! | preset | `lambda_c` |
//! |---|---|
//! | conservative | `max(tau, 10 * theta)` |
//! | moderate | `max(0.5 * tau, 3 * theta)` |
//! | aggressive | `max(0.1 * tau, theta)` |
//!
//! then `kp = tau / (K * (lambda_c + theta))`, `ti = min(tau, 4 * (lambda_c + theta))`
//! and `td = 0`.

use std::fmt;
use std::str::FromStr;

use lw_model::ProcessModel;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ControlError;
use crate::pid::PidParams;

/// Below this absolute gain the process is treated as uncontrollable.
pub const MIN_CONTROLLABLE_GAIN: f64 = 1e-6;

/// Closed-loop speed preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggressiveness {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl Aggressiveness {
    pub const ALL: [Aggressiveness; 3] = [
        Aggressiveness::Conservative,
        Aggressiveness::Moderate,
        Aggressiveness::Aggressive,
    ];

    /// Desired closed-loop time constant for a process with lag `tau` and delay `theta`.
    pub fn closed_loop_time_constant(&self, tau: f64, theta: f64) -> f64 {
        match self {
            Aggressiveness::Conservative => tau.max(10.0 * theta),
            Aggressiveness::Moderate => (0.5 * tau).max(3.0 * theta),
            Aggressiveness::Aggressive => (0.1 * tau).max(theta),
        }
    }
}

impl fmt::Display for Aggressiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggressiveness::Conservative => "conservative",
            Aggressiveness::Moderate => "moderate",
            Aggressiveness::Aggressive => "aggressive",
        };
        f.write_str(name)
    }
}

impl FromStr for Aggressiveness {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Aggressiveness::Conservative),
            "moderate" => Ok(Aggressiveness::Moderate),
            "aggressive" => Ok(Aggressiveness::Aggressive),
            other => Err(ControlError::UnknownAggressiveness(other.to_string())),
        }
    }
}

/// Theoretical PI target for `model` at the chosen speed.
///
/// Returns [`PidParams::zero`] when `|K| < MIN_CONTROLLABLE_GAIN`; callers
/// must treat that as "no recommendation", not as a usable tuning.
pub fn calculate_pid(model: &ProcessModel, aggressiveness: Aggressiveness) -> PidParams {
    let k = model.gain();
    if k.abs() < MIN_CONTROLLABLE_GAIN {
        warn!(gain = k, "process gain too small to control; no tuning target");
        return PidParams::zero();
    }

    let tau = model.time_constant();
    let theta = model.dead_time();
    let lambda_c = aggressiveness.closed_loop_time_constant(tau, theta);

    let kp = (1.0 / k) * tau / (lambda_c + theta);
    let ti = tau.min(4.0 * (lambda_c + theta));
    PidParams::new(kp, ti, 0.0)
}
