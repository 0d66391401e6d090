//! CLI entry point for the paid-search DID pipeline.
//!
//! A bare invocation runs every stage with the default relative paths;
//! subcommands run the preprocessing or estimation stage alone.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use paid_search_did::config::{
    Config, DEFAULT_FIGURES_DIR, DEFAULT_INPUT, DEFAULT_TABLE, DEFAULT_TEMP_DIR, Paths,
    TREATMENT_ONSET,
};
use paid_search_did::pipeline::{estimate_stage, preprocess_stage, run};
use paid_search_did::report::print_json;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "paid_search_did")]
#[command(
    about = "Difference-in-differences estimate of the eBay paid search experiment",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    locations: Locations,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Locations {
    /// Raw observations CSV (date, dma, revenue, search_stays_on, treatment_period)
    #[arg(long, global = true, env = "DID_INPUT", default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Directory holding the per-cohort summary tables
    #[arg(long, global = true, env = "DID_TEMP_DIR", default_value = DEFAULT_TEMP_DIR)]
    temp_dir: PathBuf,

    /// Where the LaTeX results table is written
    #[arg(long, global = true, env = "DID_TABLE_PATH", default_value = DEFAULT_TABLE)]
    table: PathBuf,

    /// Directory for the SVG figures
    #[arg(long, global = true, env = "DID_FIGURES_DIR", default_value = DEFAULT_FIGURES_DIR)]
    figures_dir: PathBuf,

    /// Treatment-onset date marked on the figures
    #[arg(long, global = true, default_value = TREATMENT_ONSET)]
    onset: NaiveDate,
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess, estimate and report (the default)
    Run,
    /// Build the cohort summaries and figures from the raw observations
    Preprocess,
    /// Estimate from existing cohort summaries and write the results table
    Estimate {
        /// Also log the full estimate as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/paid_search_did.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("paid_search_did.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let loc = cli.locations;
    let config = Config {
        paths: Paths::new(loc.input, &loc.temp_dir, loc.table, &loc.figures_dir),
        onset: loc.onset,
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let did = run(&config)?;
            info!(table = %config.paths.table.display(), gamma_hat = did.gamma_hat, "Pipeline finished");
        }
        Commands::Preprocess => {
            let outcome = preprocess_stage(&config)?;
            info!(
                treated_rows = outcome.treated.rows.len(),
                treated_dropped = outcome.treated.dropped,
                control_rows = outcome.control.rows.len(),
                control_dropped = outcome.control.dropped,
                "Preprocessing finished"
            );
        }
        Commands::Estimate { json } => {
            let did = estimate_stage(&config)?;
            if json {
                print_json(&did)?;
            }
        }
    }

    Ok(())
}
