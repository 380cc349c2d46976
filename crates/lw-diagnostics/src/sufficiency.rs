//! Whether a series covers enough of the process dynamics.

use lw_core::TimeSeries;
use lw_model::ProcessModel;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Series shorter than this are rejected outright.
pub const MIN_SAMPLES: usize = 50;

/// Margin applied to one settling horizon when a model is known.
const HORIZON_MARGIN: f64 = 1.2;

/// Duration below which a model-less series draws a soft warning.
const MIN_DURATION_WITHOUT_MODEL: f64 = 60.0;

/// Outcome of [`check_data_sufficiency`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SufficiencyCheck {
    pub is_sufficient: bool,
    /// Seconds of data the check asked for; 0 when no requirement applies.
    pub required_duration: f64,
    pub current_duration: f64,
    pub message: String,
    pub suggestions: Vec<String>,
}

/// Check sample count and, when a model is known, coverage of its settling horizon.
///
/// Without a model a series shorter than 60 s is still usable but carries a
/// warning suggestion.
pub fn check_data_sufficiency(series: &TimeSeries, model: Option<&ProcessModel>) -> SufficiencyCheck {
    let duration = series.duration();

    if series.len() < MIN_SAMPLES {
        return SufficiencyCheck {
            is_sufficient: false,
            required_duration: 0.0,
            current_duration: duration,
            message: "Too few data points".to_string(),
            suggestions: vec![format!(
                "Collect at least {MIN_SAMPLES} data points for a meaningful analysis"
            )],
        };
    }

    match model {
        Some(model) => {
            let horizon = model.settling_horizon();
            let required = horizon * HORIZON_MARGIN;
            if duration < required {
                let shortage = required - duration;
                debug!(required, duration, shortage, "series shorter than settling horizon");
                return SufficiencyCheck {
                    is_sufficient: false,
                    required_duration: required,
                    current_duration: duration,
                    message: format!(
                        "Insufficient coverage: {shortage:.1} s short of the {required:.1} s needed \
                         (process response spans about {horizon:.1} s, {duration:.1} s recorded)"
                    ),
                    suggestions: vec![
                        format!("Extend the collection time: at least {shortage:.1} s more"),
                        "The data may still be transient and not show the final steady state; \
                         the identified model and tuning may be unreliable"
                            .to_string(),
                    ],
                };
            }
        }
        None if duration < MIN_DURATION_WITHOUT_MODEL => {
            return SufficiencyCheck {
                is_sufficient: true,
                required_duration: MIN_DURATION_WITHOUT_MODEL,
                current_duration: duration,
                message: "Short data set (no model reference)".to_string(),
                suggestions: vec![
                    "Data is short and may not capture the full dynamics".to_string(),
                ],
            };
        }
        None => {}
    }

    SufficiencyCheck {
        is_sufficient: true,
        required_duration: 0.0,
        current_duration: duration,
        message: "Data coverage is adequate".to_string(),
        suggestions: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize, dt: f64) -> TimeSeries {
        let t: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
        let z = vec![0.0; n];
        TimeSeries::from_columns(&t, &z, &z, &z).unwrap()
    }

    #[test]
    fn too_few_points() {
        let check = check_data_sufficiency(&series(49, 10.0), None);
        assert!(!check.is_sufficient);
        assert_eq!(check.required_duration, 0.0);
        assert_eq!(check.current_duration, 480.0);
    }

    #[test]
    fn short_relative_to_model() {
        // horizon 4 * 50 + 10 = 210, required 252
        let model = ProcessModel::new(2.0, 50.0, 10.0, 0.0).unwrap();
        let check = check_data_sufficiency(&series(100, 2.0), Some(&model));
        assert!(!check.is_sufficient);
        assert!((check.required_duration - 252.0).abs() < 1e-9);
        assert_eq!(check.current_duration, 198.0);
        assert_eq!(check.suggestions.len(), 2);
        assert!(check.suggestions[0].starts_with("Extend the collection time: at least 54.0 s"));
        assert!(check.message.contains("54.0 s short"), "{}", check.message);
    }

    #[test]
    fn long_enough_for_model() {
        let model = ProcessModel::new(2.0, 50.0, 10.0, 0.0).unwrap();
        let check = check_data_sufficiency(&series(301, 1.0), Some(&model));
        assert!(check.is_sufficient);
        assert_eq!(check.required_duration, 0.0);
        assert!(check.suggestions.is_empty());
    }

    #[test]
    fn short_without_model_is_soft_warning() {
        let check = check_data_sufficiency(&series(50, 1.0), None);
        assert!(check.is_sufficient);
        assert_eq!(check.required_duration, 60.0);
        assert_eq!(check.suggestions.len(), 1);

        let long = check_data_sufficiency(&series(100, 1.0), None);
        assert!(long.is_sufficient);
        assert!(long.suggestions.is_empty());
    }
}
