//! One round of loop analysis.
//!
//! A round takes the data logged under the current PID settings and
//! produces everything a user needs to decide the next adjustment:
//!
//! 1. performance, controller statistics, loop and valve health
//! 2. data sufficiency without a model
//! 3. model identification and sufficiency against the model's horizon
//! 4. a tuning target and a bounded step toward it
//! 5. closed-loop previews of current, next-step and target settings
//!
//! Steps 3-5 are skipped when identification is disabled. An identification
//! failure is reported in `warnings` rather than aborting the round, since
//! the diagnostics remain valid on their own.

use chrono::{DateTime, Utc};
use lw_controls::{
    calculate_pid, suggest_step, Aggressiveness, ClosedLoopSimulator, PidParams,
    SimulationOptions, SimulationTrace, TuningSuggestion,
};
use lw_core::{linspace, TimeSeries};
use lw_diagnostics::{
    analyze_loop_health, analyze_valve_health, characterize_controller, check_data_sufficiency,
    evaluate_performance, ControllerStats, DiagnosisResult, PerformanceMetrics, SufficiencyCheck,
    ValveHealthReport,
};
use lw_model::{FitReport, ModelIdentifier, ProcessModel};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::{AnalysisConfig, SimulationSettings};
use crate::error::AppResult;

/// Which parameter set a preview ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    Current,
    NextStep,
    Target,
}

/// Closed-loop preview of one parameter set on the fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRun {
    pub kind: PreviewKind,
    pub pid: PidParams,
    pub metrics: PerformanceMetrics,
    pub trace: SimulationTrace,
}

/// Tuning outcome for a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningRecommendation {
    pub aggressiveness: Aggressiveness,
    pub suggestion: TuningSuggestion,
    pub previews: Vec<PreviewRun>,
}

/// Everything computed for one round of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    /// SHA-256 of the input series.
    pub series_digest: String,
    pub generated_at: DateTime<Utc>,
    pub samples: usize,
    pub current: PidParams,
    pub performance: PerformanceMetrics,
    pub controller: ControllerStats,
    pub loop_health: DiagnosisResult,
    pub valve_health: ValveHealthReport,
    /// Sufficiency judged without a model.
    pub sufficiency: SufficiencyCheck,
    pub model: Option<FitReport>,
    /// Sufficiency judged against the fitted model's settling horizon.
    pub model_sufficiency: Option<SufficiencyCheck>,
    pub tuning: Option<TuningRecommendation>,
    pub warnings: Vec<String>,
}

/// Content digest of a series, stable across runs.
pub fn series_digest(series: &TimeSeries) -> String {
    let mut hasher = Sha256::new();

    let series_json = serde_json::to_string(series).unwrap_or_default();
    hasher.update(series_json.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Analyze one round of logged data taken under `current` settings.
///
/// # Errors
///
/// Fails only on an invalid configuration or when a preview simulation
/// cannot be set up; identification problems become warnings.
pub fn analyze_round(
    series: &TimeSeries,
    current: &PidParams,
    config: &AnalysisConfig,
) -> AppResult<RoundReport> {
    config.validate()?;
    info!(samples = series.len(), duration = series.duration(), "analyzing round");

    let mut report = RoundReport {
        series_digest: series_digest(series),
        generated_at: Utc::now(),
        samples: series.len(),
        current: *current,
        performance: evaluate_performance(series),
        controller: characterize_controller(series),
        loop_health: analyze_loop_health(series),
        valve_health: analyze_valve_health(series),
        sufficiency: check_data_sufficiency(series, None),
        model: None,
        model_sufficiency: None,
        tuning: None,
        warnings: Vec::new(),
    };
    info!(
        status = %report.loop_health.status,
        issues = report.loop_health.issues.len(),
        iae = report.performance.iae,
        "diagnostics complete"
    );

    if !config.identification.enabled {
        return Ok(report);
    }

    let identifier = ModelIdentifier::new(config.identification.to_identification_config())?;
    let fit = match identifier.fit_detailed(series) {
        Ok(fit) => fit,
        Err(e) => {
            warn!(error = %e, "identification failed; skipping tuning");
            report.warnings.push(format!("Model identification failed: {}", e));
            return Ok(report);
        }
    };
    let model = fit.model;
    info!(
        gain = model.gain(),
        tau = model.time_constant(),
        theta = model.dead_time(),
        mse = fit.mse,
        "model identified"
    );

    report.model_sufficiency = Some(check_data_sufficiency(series, Some(&model)));
    report.model = Some(fit);

    let aggressiveness = config.tuning.aggressiveness;
    let target = calculate_pid(&model, aggressiveness);
    if target.is_zero() {
        report
            .warnings
            .push("Process gain is too small to control; no tuning target".to_string());
        return Ok(report);
    }

    let suggestion = suggest_step(current, &target, config.tuning.max_change_percent);
    report.warnings.extend(suggestion.warnings.iter().cloned());

    let previews = preview_runs(&model, &suggestion, &config.simulation)?;
    report.tuning = Some(TuningRecommendation {
        aggressiveness,
        suggestion,
        previews,
    });
    Ok(report)
}

/// Simulate current, next-step and target settings against a setpoint step
/// on the fitted model and score each response.
fn preview_runs(
    model: &ProcessModel,
    suggestion: &TuningSuggestion,
    settings: &SimulationSettings,
) -> AppResult<Vec<PreviewRun>> {
    let duration = settings.preview_duration(model.time_constant());
    let grid = linspace(0.0, duration, settings.preview_points);
    let step_at = duration * settings.preview_step_fraction;
    let base = model.bias();
    let stepped = base + settings.preview_step_size;
    let setpoint = move |t: f64| if t > step_at { stepped } else { base };

    let simulator = ClosedLoopSimulator::new(
        *model,
        SimulationOptions {
            limits: settings.output_limits,
            initial_output: settings.initial_output,
        },
    )?;

    [
        (PreviewKind::Current, suggestion.current),
        (PreviewKind::NextStep, suggestion.next_step),
        (PreviewKind::Target, suggestion.target),
    ]
    .into_iter()
    .map(|(kind, pid)| -> AppResult<PreviewRun> {
        let trace = simulator.simulate(&pid, &setpoint, &grid)?;
        let metrics = evaluate_performance(&trace.to_series()?);
        Ok(PreviewRun {
            kind,
            pid,
            metrics,
            trace,
        })
    })
    .collect()
}
