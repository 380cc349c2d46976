//! Analysis configuration loaded from YAML.
//!
//! Every section defaults independently, so a file only needs the keys it
//! changes:
//!
//! ```yaml
//! tuning:
//!   aggressiveness: conservative
//! simulation:
//!   output_limits: { min: -50.0, max: 50.0 }
//! ```

use std::path::Path;

use lw_controls::{Aggressiveness, GainMode, OutputLimits, DEFAULT_MAX_CHANGE_PERCENT};
use lw_model::{IdentificationConfig, LmConfig};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Shortest preview horizon in seconds.
pub const MIN_PREVIEW_DURATION: f64 = 100.0;
/// Longest preview horizon in seconds.
pub const MAX_PREVIEW_DURATION: f64 = 3600.0;

/// Top-level configuration for one analysis round.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub identification: IdentificationSettings,
    pub tuning: TuningSettings,
    pub simulation: SimulationSettings,
    /// How the proportional parameter is presented to the user.
    pub gain_mode: GainMode,
}

/// Model identification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentificationSettings {
    /// Skip identification (and tuning) entirely when false.
    pub enabled: bool,
    pub theta_candidates: usize,
    pub max_theta_fraction: f64,
    pub min_tau: f64,
    /// Relative tolerance on sampling-interval uniformity.
    pub uniform_step_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for IdentificationSettings {
    fn default() -> Self {
        let base = IdentificationConfig::default();
        Self {
            enabled: true,
            theta_candidates: base.theta_candidates,
            max_theta_fraction: base.max_theta_fraction,
            min_tau: base.min_tau,
            uniform_step_tolerance: base.uniform_step_tolerance,
            max_iterations: base.solver.max_iterations,
        }
    }
}

impl IdentificationSettings {
    /// Identifier configuration for these settings.
    pub fn to_identification_config(&self) -> IdentificationConfig {
        IdentificationConfig {
            theta_candidates: self.theta_candidates,
            max_theta_fraction: self.max_theta_fraction,
            min_tau: self.min_tau,
            uniform_step_tolerance: self.uniform_step_tolerance,
            solver: LmConfig {
                max_iterations: self.max_iterations,
                ..LmConfig::default()
            },
        }
    }
}

/// Tuning target and per-round step settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningSettings {
    pub aggressiveness: Aggressiveness,
    /// Largest relative change per parameter per round (percent).
    pub max_change_percent: f64,
}

impl Default for TuningSettings {
    fn default() -> Self {
        Self {
            aggressiveness: Aggressiveness::default(),
            max_change_percent: DEFAULT_MAX_CHANGE_PERCENT,
        }
    }
}

/// Closed-loop preview settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub output_limits: OutputLimits,
    /// Grid points per preview run.
    pub preview_points: usize,
    /// Preview horizon as a multiple of the fitted time constant.
    pub preview_duration_taus: f64,
    /// Setpoint step time as a fraction of the horizon.
    pub preview_step_fraction: f64,
    /// Setpoint step size applied on top of the fitted bias.
    pub preview_step_size: f64,
    pub initial_output: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            output_limits: OutputLimits::default(),
            preview_points: 500,
            preview_duration_taus: 10.0,
            preview_step_fraction: 0.05,
            preview_step_size: 10.0,
            initial_output: 0.0,
        }
    }
}

impl SimulationSettings {
    /// Preview horizon for a process with time constant `tau`, clamped to
    /// `[MIN_PREVIEW_DURATION, MAX_PREVIEW_DURATION]`.
    pub fn preview_duration(&self, tau: f64) -> f64 {
        (tau * self.preview_duration_taus).clamp(MIN_PREVIEW_DURATION, MAX_PREVIEW_DURATION)
    }
}

impl AnalysisConfig {
    /// Parse a YAML document.
    pub fn from_yaml(content: &str) -> AppResult<Self> {
        let config: AnalysisConfig = serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> AppResult<()> {
        let id = &self.identification;
        if id.theta_candidates == 0 {
            return Err(AppError::Config(
                "identification.theta_candidates must be at least 1".to_string(),
            ));
        }
        if !(id.max_theta_fraction > 0.0 && id.max_theta_fraction <= 1.0) {
            return Err(AppError::Config(format!(
                "identification.max_theta_fraction must lie in (0, 1], got {}",
                id.max_theta_fraction
            )));
        }
        if !(id.min_tau > 0.0) {
            return Err(AppError::Config(
                "identification.min_tau must be positive".to_string(),
            ));
        }
        if !(id.uniform_step_tolerance >= 0.0) {
            return Err(AppError::Config(
                "identification.uniform_step_tolerance must be non-negative".to_string(),
            ));
        }
        if id.max_iterations == 0 {
            return Err(AppError::Config(
                "identification.max_iterations must be at least 1".to_string(),
            ));
        }

        if !(self.tuning.max_change_percent >= 0.0) {
            return Err(AppError::Config(format!(
                "tuning.max_change_percent must be non-negative, got {}",
                self.tuning.max_change_percent
            )));
        }

        let sim = &self.simulation;
        sim.output_limits
            .validate()
            .map_err(|e| AppError::Config(format!("simulation.output_limits: {}", e)))?;
        if sim.preview_points < 2 {
            return Err(AppError::Config(
                "simulation.preview_points must be at least 2".to_string(),
            ));
        }
        if !(sim.preview_duration_taus > 0.0) {
            return Err(AppError::Config(
                "simulation.preview_duration_taus must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&sim.preview_step_fraction) {
            return Err(AppError::Config(
                "simulation.preview_step_fraction must lie in [0, 1)".to_string(),
            ));
        }
        if !sim.preview_step_size.is_finite() || !sim.initial_output.is_finite() {
            return Err(AppError::Config(
                "simulation step size and initial output must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and validate configuration from a YAML file.
pub fn load_config(path: &Path) -> AppResult<AnalysisConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    AnalysisConfig::from_yaml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = AnalysisConfig::default();
        config.validate().unwrap();
        assert_eq!(config.identification.theta_candidates, 15);
        assert_eq!(config.tuning.max_change_percent, 20.0);
        assert_eq!(config.simulation.preview_points, 500);
        assert_eq!(config.gain_mode, GainMode::Gain);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = r#"
tuning:
  aggressiveness: conservative
simulation:
  output_limits: { min: -50.0, max: 50.0 }
gain_mode: proportional_band
"#;
        let config = AnalysisConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.tuning.aggressiveness, Aggressiveness::Conservative);
        assert_eq!(config.tuning.max_change_percent, 20.0);
        assert_eq!(config.simulation.output_limits.min, -50.0);
        assert_eq!(config.simulation.preview_points, 500);
        assert!(config.identification.enabled);
        assert_eq!(config.gain_mode, GainMode::ProportionalBand);
    }

    #[test]
    fn rejects_bad_ranges() {
        assert!(AnalysisConfig::from_yaml("identification: { theta_candidates: 0 }").is_err());
        assert!(AnalysisConfig::from_yaml("tuning: { max_change_percent: -1.0 }").is_err());
        assert!(AnalysisConfig::from_yaml(
            "simulation: { output_limits: { min: 10.0, max: 10.0 } }"
        )
        .is_err());
        assert!(AnalysisConfig::from_yaml("tuning: { aggressiveness: reckless }").is_err());
    }

    #[test]
    fn yaml_round_trip() {
        let mut config = AnalysisConfig::default();
        config.tuning.aggressiveness = Aggressiveness::Aggressive;
        let back = AnalysisConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn preview_duration_is_clamped() {
        let sim = SimulationSettings::default();
        assert_eq!(sim.preview_duration(5.0), 100.0);
        assert_eq!(sim.preview_duration(50.0), 500.0);
        assert_eq!(sim.preview_duration(1000.0), 3600.0);
    }

    #[test]
    fn solver_iterations_propagate() {
        let mut settings = IdentificationSettings::default();
        settings.max_iterations = 42;
        assert_eq!(settings.to_identification_config().solver.max_iterations, 42);
    }
}
