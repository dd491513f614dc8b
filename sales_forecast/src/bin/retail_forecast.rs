use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sales_forecast::data::{ALL_CATEGORIES, ALL_REGIONS};
use sales_forecast::{DatasetContext, FilterSelection, ForecastError, ForecastPipeline, PipelineConfig};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Monthly retail sales forecasting")]
struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Transaction CSV, overrides the configured path
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List category and region selector values
    Filters,
    /// Forecast future months for a slice
    Forecast {
        #[command(flatten)]
        slice: SliceArgs,
        /// Months to forecast, defaults to the configured horizon
        #[arg(long)]
        steps: Option<usize>,
    },
    /// Backtest a strategy on the last months of a slice
    Evaluate {
        #[command(flatten)]
        slice: SliceArgs,
    },
}

#[derive(Args)]
struct SliceArgs {
    /// Strategy: sarima or xgboost
    #[arg(long, default_value = "sarima")]
    model: String,
    #[arg(long, default_value = ALL_CATEGORIES)]
    category: String,
    #[arg(long, default_value = ALL_REGIONS)]
    region: String,
}

impl SliceArgs {
    fn selection(&self) -> FilterSelection {
        FilterSelection::new(&self.category, &self.region)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(pipeline: &ForecastPipeline, cmd: &Cmd) -> std::result::Result<(), ForecastError> {
    let rendered = match cmd {
        Cmd::Filters => serde_json::to_value(pipeline.filters()?),
        Cmd::Forecast { slice, steps } => {
            let steps = steps.unwrap_or(pipeline.config().default_steps);
            serde_json::to_value(pipeline.forecast(&slice.model, &slice.selection(), steps)?)
        }
        Cmd::Evaluate { slice } => {
            serde_json::to_value(pipeline.evaluate(&slice.model, &slice.selection())?)
        }
    }
    .map_err(|e| ForecastError::DataError(e.to_string()))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&rendered).map_err(|e| ForecastError::DataError(e.to_string()))?
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    }
    .with_env_overrides()?;

    let data_path = cli
        .data
        .clone()
        .or_else(|| config.dataset_path.clone())
        .context("no dataset given: pass --data or set RETAIL_FORECAST_DATA")?;

    let pipeline = ForecastPipeline::new(DatasetContext::load(&data_path), config);

    if let Err(e) = run(&pipeline, &cli.cmd) {
        print_json(&e.to_response())?;
        std::process::exit(if e.is_client_error() { 2 } else { 1 });
    }

    Ok(())
}
