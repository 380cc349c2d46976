//! PID parameter sets and proportional-band conversion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Proportional band reported when the gain is indistinguishable from zero.
pub const PB_SENTINEL: f64 = 9999.9;

const ZERO_EPS: f64 = 1e-9;

/// PID parameters in gain form.
///
/// `ti <= 0` disables integral action and `td <= 0` disables derivative action.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidParams {
    /// Proportional gain.
    pub kp: f64,
    /// Integral time (seconds).
    pub ti: f64,
    /// Derivative time (seconds).
    #[serde(default)]
    pub td: f64,
}

impl PidParams {
    pub fn new(kp: f64, ti: f64, td: f64) -> Self {
        Self { kp, ti, td }
    }

    /// All-zero parameters, used as the "no recommendation" result.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.kp == 0.0 && self.ti == 0.0 && self.td == 0.0
    }

    pub fn integral_enabled(&self) -> bool {
        self.ti > 0.0
    }

    pub fn derivative_enabled(&self) -> bool {
        self.td > 0.0
    }

    /// Proportional band `100 / kp` in percent.
    ///
    /// Returns [`PB_SENTINEL`] when `kp` is numerically zero.
    pub fn proportional_band(&self) -> f64 {
        if self.kp.abs() > ZERO_EPS {
            100.0 / self.kp
        } else {
            PB_SENTINEL
        }
    }

    /// Build parameters from a proportional band; a zero band yields `kp = 0`.
    pub fn from_proportional_band(pb: f64, ti: f64, td: f64) -> Self {
        let kp = if pb.abs() > ZERO_EPS { 100.0 / pb } else { 0.0 };
        Self { kp, ti, td }
    }

    pub fn get(&self, parameter: PidParameter) -> f64 {
        match parameter {
            PidParameter::Kp => self.kp,
            PidParameter::Ti => self.ti,
            PidParameter::Td => self.td,
        }
    }

    pub(crate) fn set(&mut self, parameter: PidParameter, value: f64) {
        match parameter {
            PidParameter::Kp => self.kp = value,
            PidParameter::Ti => self.ti = value,
            PidParameter::Td => self.td = value,
        }
    }
}

/// One of the three tunable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PidParameter {
    Kp,
    Ti,
    Td,
}

impl PidParameter {
    pub const ALL: [PidParameter; 3] = [PidParameter::Kp, PidParameter::Ti, PidParameter::Td];
}

impl fmt::Display for PidParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PidParameter::Kp => "Kp",
            PidParameter::Ti => "Ti",
            PidParameter::Td => "Td",
        };
        f.write_str(label)
    }
}

/// How the proportional parameter is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GainMode {
    #[default]
    Gain,
    ProportionalBand,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_band_is_inverse_of_gain() {
        let pid = PidParams::new(2.0, 10.0, 0.0);
        assert_eq!(pid.proportional_band(), 50.0);
        let back = PidParams::from_proportional_band(50.0, 10.0, 0.0);
        assert_eq!(back.kp, 2.0);
    }

    #[test]
    fn zero_gain_uses_sentinel() {
        assert_eq!(PidParams::zero().proportional_band(), PB_SENTINEL);
        assert_eq!(PidParams::new(1e-12, 1.0, 0.0).proportional_band(), PB_SENTINEL);
        assert_eq!(PidParams::from_proportional_band(0.0, 1.0, 0.0).kp, 0.0);
    }

    #[test]
    fn action_flags() {
        let pid = PidParams::new(1.0, 0.0, -1.0);
        assert!(!pid.integral_enabled());
        assert!(!pid.derivative_enabled());
        assert!(PidParams::zero().is_zero());
    }

    #[test]
    fn accessors_by_parameter() {
        let mut pid = PidParams::new(1.0, 2.0, 3.0);
        assert_eq!(pid.get(PidParameter::Ti), 2.0);
        pid.set(PidParameter::Td, 4.0);
        assert_eq!(pid.td, 4.0);
        assert_eq!(PidParameter::Kp.to_string(), "Kp");
    }

    #[test]
    fn serde_defaults_td() {
        let pid: PidParams = serde_json::from_str(r#"{"kp":1.5,"ti":20.0}"#).unwrap();
        assert_eq!(pid, PidParams::new(1.5, 20.0, 0.0));
    }
}
