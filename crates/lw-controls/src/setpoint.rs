//! Setpoint trajectories for closed-loop simulation.

use serde::{Deserialize, Serialize};

/// A deterministic setpoint as a function of time.
///
/// Implemented for any `Fn(f64) -> f64`; the simulator evaluates it once per
/// sample, in time order.
pub trait SetpointProfile {
    fn value_at(&self, t: f64) -> f64;
}

impl<F> SetpointProfile for F
where
    F: Fn(f64) -> f64,
{
    fn value_at(&self, t: f64) -> f64 {
        self(t)
    }
}

/// Serializable setpoint shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StandardProfile {
    Constant {
        value: f64,
    },
    /// `initial` before `at`, `final_value` from `at` on.
    Step {
        initial: f64,
        final_value: f64,
        at: f64,
    },
}

impl SetpointProfile for StandardProfile {
    fn value_at(&self, t: f64) -> f64 {
        match *self {
            StandardProfile::Constant { value } => value,
            StandardProfile::Step {
                initial,
                final_value,
                at,
            } => {
                if t >= at {
                    final_value
                } else {
                    initial
                }
            }
        }
    }
}
