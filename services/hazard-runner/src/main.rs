//! Wildfire hazard preparation runner.
//!
//! Classifies the static environmental layers, splits the regional forecast
//! into days and classifies every day's weather layers:
//! - Constants pipeline per static parameter
//! - Per-day forecast artifacts
//! - Forecast pipeline per day and weather parameter

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use grid_processor::NativeEngine;
use pipeline::{run_workflow, WorkflowOptions};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::RunnerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Parser, Debug)]
#[command(name = "hazard-runner")]
#[command(about = "Prepare classified wildfire hazard layers")]
struct Args {
    /// Configuration file path (defaults apply when omitted)
    #[arg(short, long, env = "HAZARD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    /// Skip the static layers
    #[arg(long)]
    skip_constants: bool,

    /// Skip the forecast layers
    #[arg(long)]
    skip_forecast: bool,

    /// Forecast table to use instead of the configured one
    #[arg(long)]
    forecast: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_format)?;

    info!("Starting hazard preparation runner");

    let mut config = RunnerConfig::load(args.config.as_deref())?;
    if let Some(forecast) = args.forecast {
        config.layout.forecast_table = forecast;
    }
    let weights = config.validate()?;
    info!(
        output = %config.layout.output.display(),
        temporary = %config.layout.temporary.display(),
        "Loaded configuration"
    );

    let engine = NativeEngine::new(config.engine.clone()).context("Failed to start transform engine")?;

    let options = WorkflowOptions {
        constants: !args.skip_constants,
        forecast: !args.skip_forecast,
        grid_algorithm: config.gridding,
    };
    let summary = run_workflow(&config.layout, &weights, &engine, &options)?;

    if let Some(reason) = &summary.split_stop_reason {
        warn!(
            completed = summary.days_completed,
            total = summary.days_total,
            reason = %reason,
            "Forecast days were truncated"
        );
    }
    info!(
        constants = summary.constants.len(),
        days = summary.days_completed,
        forecast_layers = summary.forecast_layers.len(),
        "Hazard preparation completed"
    );

    Ok(())
}

fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }
    Ok(())
}
