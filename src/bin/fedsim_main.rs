// Rest vs. task band power analysis with simulated multi-client aggregation
//
// Usage:
//   eeg-fedsim --rest rest.json --task task.json --clients 3 --output report.json
//   eeg-fedsim --demo --clients 5 --seed 7

use clap::Parser;
use eeg_core::config::constants::federation::DEFAULT_CLIENT_COUNT;
use eeg_core::config::{AnalysisConfig, ConfigLoader, ConfigSummary};
use eeg_core::federation::{aggregate, replicate_recordings, simulate_clients, AggregatedUpdate, ClientFeatureSimulator};
use eeg_core::preprocessing::synthetic::{SyntheticConfig, SyntheticRecordingGenerator};
use eeg_core::preprocessing::RecordingSource;
use eeg_core::processing::{compare, AnalysisReport, ConditionAnalysis, ConditionComparison, FeaturePipeline};
use eeg_core::{version_info, CancellationToken, EegError, VersionInfo};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compare rest and task EEG band power and aggregate per-client features
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Rest recording (JSON)
    #[arg(long, value_name = "FILE", requires = "task", conflicts_with = "demo")]
    rest: Option<PathBuf>,

    /// Task recording (JSON)
    #[arg(long, value_name = "FILE", requires = "rest", conflicts_with = "demo")]
    task: Option<PathBuf>,

    /// Use synthetic rest/task recordings, one distinct pair per client
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Number of simulated clients
    #[arg(short, long, default_value_t = DEFAULT_CLIENT_COUNT)]
    clients: usize,

    /// Seed for synthetic recordings
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Configuration file (TOML), merged over the defaults
    #[arg(short = 'C', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also write the effective configuration (TOML) here
    #[arg(long, value_name = "FILE")]
    export_config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "eeg_core=debug"; RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Serialize)]
struct RunOutput {
    library: VersionInfo,
    config: ConfigSummary,
    report: AnalysisReport,
    aggregated: AggregatedUpdate,
    aggregated_comparison: ConditionComparison,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn load_config(path: Option<&PathBuf>) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) if !path.exists() => Err(format!("configuration file not found: {}", path.display()).into()),
        Some(path) => Ok(ConfigLoader::with_paths(vec![path.clone()]).load()?),
        None => Ok(ConfigLoader::new().load()?),
    }
}

/// One `[rest, task]` recording list per client
fn client_recordings(args: &Args) -> Result<Vec<Vec<RecordingSource>>, EegError> {
    match (&args.rest, &args.task) {
        (Some(rest), Some(task)) if !args.demo => Ok(replicate_recordings(
            &[RecordingSource::File(rest.clone()), RecordingSource::File(task.clone())],
            args.clients,
        )),
        _ => (0..args.clients as u64)
            .map(|client| -> Result<Vec<RecordingSource>, EegError> {
                let seed = args.seed.wrapping_add(client * 2);
                let rest = SyntheticRecordingGenerator::new(SyntheticConfig::resting_state(), seed)?.generate()?;
                let task = SyntheticRecordingGenerator::new(SyntheticConfig::task_state(), seed.wrapping_add(1))?.generate()?;
                Ok(vec![
                    RecordingSource::from_recording(format!("client{}-rest", client), rest),
                    RecordingSource::from_recording(format!("client{}-task", client), task),
                ])
            })
            .collect(),
    }
}

fn run(args: &Args) -> Result<RunOutput, Box<dyn std::error::Error>> {
    if args.clients == 0 {
        return Err("at least one client is required".into());
    }

    let config = load_config(args.config.as_ref())?;
    if let Some(path) = &args.export_config {
        ConfigLoader::new().export_config(&config, path)?;
        info!(path = %path.display(), "effective configuration exported");
    }
    let pipeline = FeaturePipeline::from_config(&config)?;
    let clients = client_recordings(args)?;

    let report = ConditionAnalysis::new(pipeline.clone()).run(&clients[0][0], &clients[0][1])?;

    let token = CancellationToken::new();
    let simulator = ClientFeatureSimulator::new(pipeline);
    let updates = simulate_clients(&simulator, &clients, &token)?;
    let aggregated = aggregate(&updates)?;
    let aggregated_comparison = compare(&aggregated.features[0], &aggregated.features[1])?;

    info!(clients = aggregated.client_count, "run complete");
    Ok(RunOutput {
        library: version_info(),
        config: config.get_summary(),
        report,
        aggregated,
        aggregated_comparison,
    })
}

fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    let output = match run(&args) {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, "analysis failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let json = match serde_json::to_string_pretty(&output) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: cannot serialize report: {}", e);
            std::process::exit(1);
        }
    };

    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, json) {
                eprintln!("Error: cannot write {}: {}", path.display(), e);
                std::process::exit(1);
            }
            info!(path = %path.display(), "report written");
        }
        None => println!("{}", json),
    }

    for band in output.report.comparison.iter() {
        eprintln!(
            "{:<6} rest {:>12.3} pW  task {:>12.3} pW  change {:+7.1}%",
            band.band, band.mean_rest, band.mean_task, band.percent_change
        );
    }
}
