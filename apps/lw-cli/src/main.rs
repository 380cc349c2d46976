use clap::{Args, Parser, Subcommand};
use lw_app::{
    analyze_round, generate_suite, load_config, load_series, save_series, AnalysisConfig,
    AppError, AppResult, RoundReport,
};
use lw_controls::{
    simulate_closed_loop, Aggressiveness, GainMode, PidParameter, PidParams, StandardProfile,
};
use lw_core::linspace;
use lw_model::{ModelIdentifier, ProcessModel};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loopwise")]
#[command(about = "Loopwise - PID loop diagnostics and tuning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one round of logged data and suggest the next PID step
    Analyze {
        /// Path to the series JSON file
        series_path: PathBuf,
        #[command(flatten)]
        pid: PidArgs,
        /// Analysis configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the configured tuning aggressiveness
        #[arg(long)]
        aggressiveness: Option<Aggressiveness>,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Identify an FOPDT model from a series
    Fit {
        /// Path to the series JSON file
        series_path: PathBuf,
        /// Analysis configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Simulate a PID loop on a given FOPDT model
    Simulate {
        /// Process gain
        #[arg(long)]
        k: f64,
        /// Time constant in seconds
        #[arg(long)]
        tau: f64,
        /// Dead time in seconds
        #[arg(long, default_value_t = 0.0)]
        theta: f64,
        /// Measurement bias
        #[arg(long, default_value_t = 0.0)]
        y0: f64,
        #[command(flatten)]
        pid: PidArgs,
        /// Simulated duration in seconds
        #[arg(long, default_value_t = 600.0)]
        duration: f64,
        /// Sample period in seconds
        #[arg(long, default_value_t = 1.0)]
        dt: f64,
        /// Setpoint step size applied on top of the bias
        #[arg(long, default_value_t = 10.0)]
        step: f64,
        /// Setpoint step time in seconds
        #[arg(long, default_value_t = 10.0)]
        step_at: f64,
        /// Write the simulated series here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate the synthetic tuning-iteration data suite
    Generate {
        /// Output directory for the series files
        out_dir: PathBuf,
        /// Noise generator seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Measurement noise standard deviation
        #[arg(long, default_value_t = lw_app::synth::DEFAULT_NOISE_STD)]
        noise: f64,
    },
}

/// PID settings given either as a gain or as a proportional band.
#[derive(Args)]
struct PidArgs {
    /// Proportional gain
    #[arg(long, conflicts_with = "pb", required_unless_present = "pb")]
    kp: Option<f64>,
    /// Proportional band in percent (100 / Kp)
    #[arg(long)]
    pb: Option<f64>,
    /// Integral time in seconds (0 disables integral action)
    #[arg(long)]
    ti: f64,
    /// Derivative time in seconds
    #[arg(long, default_value_t = 0.0)]
    td: f64,
}

impl PidArgs {
    fn params(&self) -> PidParams {
        match (self.kp, self.pb) {
            (Some(kp), _) => PidParams::new(kp, self.ti, self.td),
            (None, Some(pb)) => PidParams::from_proportional_band(pb, self.ti, self.td),
            (None, None) => PidParams::new(0.0, self.ti, self.td),
        }
    }

    fn gain_mode(&self) -> Option<GainMode> {
        self.pb.map(|_| GainMode::ProportionalBand)
    }
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            series_path,
            pid,
            config,
            aggressiveness,
            output,
        } => cmd_analyze(
            &series_path,
            &pid,
            config.as_deref(),
            aggressiveness,
            output.as_deref(),
        ),
        Commands::Fit {
            series_path,
            config,
        } => cmd_fit(&series_path, config.as_deref()),
        Commands::Simulate {
            k,
            tau,
            theta,
            y0,
            pid,
            duration,
            dt,
            step,
            step_at,
            output,
        } => {
            let model = ProcessModel::new(k, tau, theta, y0)
                .map_err(|e| AppError::InvalidInput(e.to_string()))?;
            let setpoint = StandardProfile::Step {
                initial: y0,
                final_value: y0 + step,
                at: step_at,
            };
            cmd_simulate(&model, &pid.params(), &setpoint, duration, dt, output.as_deref())
        }
        Commands::Generate {
            out_dir,
            seed,
            noise,
        } => cmd_generate(&out_dir, seed, noise),
    }
}

fn load_or_default_config(path: Option<&Path>) -> AppResult<AnalysisConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(AnalysisConfig::default()),
    }
}

fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::InvalidInput(format!("Failed to serialize output: {}", e)))?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            eprintln!("✓ Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_analyze(
    series_path: &Path,
    pid: &PidArgs,
    config_path: Option<&Path>,
    aggressiveness: Option<Aggressiveness>,
    output: Option<&Path>,
) -> AppResult<()> {
    let mut config = load_or_default_config(config_path)?;
    if let Some(aggressiveness) = aggressiveness {
        config.tuning.aggressiveness = aggressiveness;
    }
    if let Some(mode) = pid.gain_mode() {
        config.gain_mode = mode;
    }

    let series = load_series(series_path)?;
    let report = analyze_round(&series, &pid.params(), &config)?;
    print_round_summary(&report, config.gain_mode);
    emit_json(&report, output)
}

fn print_round_summary(report: &RoundReport, mode: GainMode) {
    eprintln!("Round {} ({} samples)", &report.series_digest[..12], report.samples);
    eprintln!(
        "  IAE {:.2}  ISE {:.2}  overshoot {:.1}%  settling {:.1} s",
        report.performance.iae,
        report.performance.ise,
        report.performance.overshoot,
        report.performance.settling_time
    );
    eprintln!("  Loop health: {}", report.loop_health.status);
    for issue in &report.loop_health.issues {
        eprintln!("    - {}", issue.message);
    }
    if !report.sufficiency.is_sufficient {
        eprintln!("  Data: {}", report.sufficiency.message);
    }
    if let Some(fit) = &report.model {
        eprintln!(
            "  Model: K={:.4}, tau={:.2} s, theta={:.2} s (mse {:.4})",
            fit.model.gain(),
            fit.model.time_constant(),
            fit.model.dead_time(),
            fit.mse
        );
    }
    if let Some(tuning) = &report.tuning {
        eprintln!("  Next step ({}):", tuning.aggressiveness);
        for parameter in PidParameter::ALL {
            let label = match (parameter, mode) {
                (PidParameter::Kp, GainMode::ProportionalBand) => "PB".to_string(),
                _ => parameter.to_string(),
            };
            eprintln!(
                "    {}: {}",
                label,
                tuning.suggestion.describe(parameter, mode)
            );
        }
    }
    for warning in &report.warnings {
        eprintln!("  ! {}", warning);
    }
}

fn cmd_fit(series_path: &Path, config_path: Option<&Path>) -> AppResult<()> {
    let config = load_or_default_config(config_path)?;
    let series = load_series(series_path)?;
    let identifier = ModelIdentifier::new(config.identification.to_identification_config())?;
    let report = identifier.fit_detailed(&series)?;
    eprintln!(
        "✓ K={:.4}, tau={:.2} s, theta={:.2} s, y0={:.3}",
        report.model.gain(),
        report.model.time_constant(),
        report.model.dead_time(),
        report.model.bias()
    );
    emit_json(&report, None)
}

fn cmd_simulate(
    model: &ProcessModel,
    pid: &PidParams,
    setpoint: &StandardProfile,
    duration: f64,
    dt: f64,
    output: Option<&Path>,
) -> AppResult<()> {
    if !(duration > 0.0 && dt > 0.0 && dt <= duration) {
        return Err(AppError::InvalidInput(
            "duration and dt must be positive with dt <= duration".to_string(),
        ));
    }
    let points = (duration / dt).round() as usize + 1;
    let grid = linspace(0.0, duration, points);
    let trace = simulate_closed_loop(model, pid, setpoint, &grid, Default::default())?;
    let series = trace.to_series()?;
    info!(points, "simulation complete");

    match output {
        Some(path) => {
            save_series(path, &series)?;
            println!("✓ Wrote {} samples to {}", series.len(), path.display());
            Ok(())
        }
        None => emit_json(&series, None),
    }
}

fn cmd_generate(out_dir: &Path, seed: u64, noise: f64) -> AppResult<()> {
    std::fs::create_dir_all(out_dir)?;
    println!("Generating synthetic suite in '{}'", out_dir.display());

    for round in generate_suite(seed, noise)? {
        let path = out_dir.join(format!("{}.json", round.scenario.name));
        save_series(&path, &round.series)?;
        println!(
            "  ✓ {}: {} (Kp={}, Ti={})",
            path.display(),
            round.scenario.description,
            round.scenario.pid.kp,
            round.scenario.pid.ti
        );
    }
    Ok(())
}
