//! Portfolio Model CLI - build portfolio timelines and analytics from holdings.
//!
//! Prints a JSON summary of the run; the timelines themselves are written as
//! CSV under the configured output directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portfolio_model::{
    config::SourceKind,
    data::{load_holdings, parse_buy_in_date, HoldingRow},
    export::write_report,
    ApiResponse, Config, CsvPriceSource, Pipeline, PipelineReport, PipelineSettings, PriceSource,
};

#[derive(Parser)]
#[command(name = "portfolio-model")]
#[command(about = "Portfolio performance and risk analytics")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.portfolio-model/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build timelines and analytics for the configured holdings
    Run {
        /// Last date to include (DD.MM.YYYY or YYYY-MM-DD, defaults to today)
        #[arg(long)]
        as_of: Option<String>,
        /// Holdings file, overriding the config
        #[arg(long)]
        holdings: Option<PathBuf>,
        /// Output directory, overriding the config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config path
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;

    let output = match cli.command {
        Commands::Run {
            as_of,
            holdings,
            output,
        } => handle_run(config, as_of, holdings, output).await,
        Commands::Config { init } => handle_config(config, config_path, init),
    };

    let response = match output {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => ApiResponse::err(format!("{e:#}")),
    };
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

async fn handle_run(
    mut config: Config,
    as_of: Option<String>,
    holdings: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<Value> {
    if let Some(path) = holdings {
        config.holdings_file = path;
    }
    if let Some(dir) = output {
        config.output_dir = dir;
    }

    let as_of = match as_of {
        Some(value) => parse_buy_in_date(&value)
            .with_context(|| format!("unparsable --as-of date {value:?}"))?,
        None => chrono::Local::now().date_naive(),
    };

    let rows = load_holdings(&config.holdings_file)
        .with_context(|| format!("failed to load holdings {}", config.holdings_file.display()))?;

    let report = match config.source {
        SourceKind::Csv => {
            let source = CsvPriceSource::new(&config.prices_dir);
            run_pipeline(source, &config, &rows, as_of).await?
        }
        #[cfg(feature = "yahoo")]
        SourceKind::Yahoo => {
            let source = portfolio_model::data::YahooPriceSource::new()?;
            run_pipeline(source, &config, &rows, as_of).await?
        }
        #[cfg(not(feature = "yahoo"))]
        SourceKind::Yahoo => {
            anyhow::bail!("the yahoo source needs a build with the `yahoo` feature")
        }
    };

    let files = write_report(&report, &config.output_dir)?;

    Ok(json!({
        "as_of": as_of,
        "assets": report.assets.keys().collect::<Vec<_>>(),
        "benchmarks": report.benchmarks.keys().collect::<Vec<_>>(),
        "dates": report.portfolio.len(),
        "performance": metric(&report.performance),
        "risk": metric(&report.risk),
        "regressions": report
            .regressions
            .iter()
            .map(|(ticker, result)| (ticker.clone(), metric(result)))
            .collect::<serde_json::Map<_, _>>(),
        "warnings": report.warnings,
        "files": files,
    }))
}

async fn run_pipeline<S: PriceSource>(
    source: S,
    config: &Config,
    rows: &[HoldingRow],
    as_of: NaiveDate,
) -> Result<PipelineReport> {
    let pipeline = Pipeline::new(source, PipelineSettings::from(config));
    Ok(pipeline.run_rows(rows, as_of).await?)
}

fn handle_config(config: Config, path: PathBuf, init: bool) -> Result<Value> {
    if init {
        config.save(&path)?;
        tracing::info!(path = %path.display(), "Wrote config");
    }

    Ok(json!({
        "path": path,
        "config": config,
    }))
}

/// A computed metric, or its error message when it could not be computed.
fn metric<T: Serialize>(result: &portfolio_model::Result<T>) -> Value {
    match result {
        Ok(value) => json!(value),
        Err(e) => json!({ "error": e.to_string() }),
    }
}
