//! Host-side service layer for loopwise.
//!
//! The core crates are pure transformations over one series at a time. This
//! crate owns everything around them that a front end needs: YAML
//! configuration, JSON series files, the one-round analysis pipeline with
//! closed-loop previews, and synthetic scenario generation.

pub mod config;
pub mod error;
pub mod round;
pub mod series_io;
pub mod synth;

pub use config::{
    load_config, AnalysisConfig, IdentificationSettings, SimulationSettings, TuningSettings,
};
pub use error::{AppError, AppResult};
pub use round::{
    analyze_round, series_digest, PreviewKind, PreviewRun, RoundReport, TuningRecommendation,
};
pub use series_io::{load_series, save_series};
pub use synth::{generate_suite, reference_process, simulate_scenario, Scenario, SyntheticRound};
