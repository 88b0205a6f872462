//! Docket-Sweep main entry point
//!
//! This is the command-line interface for the Docket-Sweep case collector.

use anyhow::Context;
use clap::{Parser, Subcommand};
use docket_sweep::collector::{BatchRequest, Collector, HtmlExtractor, HttpProber};
use docket_sweep::config::{load_config_with_hash, Config};
use docket_sweep::output::{load_year_summary, print_run_statistics, print_year_summary};
use docket_sweep::storage::SqliteStorage;
use docket_sweep::HarvestError;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Docket-Sweep: a polite collector for year-scoped case ids
///
/// Docket-Sweep finds how far a year's case numbering goes with a small
/// number of requests, then collects every existing case in that range.
/// Repeated runs skip settled ids and resume where an interrupted run
/// stopped.
#[derive(Parser, Debug)]
#[command(name = "docket-sweep")]
#[command(version = "1.0.0")]
#[command(about = "A polite collector for year-scoped case ids", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect a range of ids for one year
    Run {
        /// Two-digit year (e.g. 23)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=99))]
        year: u8,

        /// First id to visit
        #[arg(long, default_value_t = 1)]
        start: u32,

        /// Visit at most this many ids
        #[arg(long)]
        max_cases: Option<u32>,

        /// Last id to visit (overrides --max-cases)
        #[arg(long)]
        end: Option<u32>,

        /// Locate the boundary again even if one is cached
        #[arg(long)]
        rediscover: bool,
    },

    /// Locate and store the id boundary for one year
    Locate {
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=99))]
        year: u8,

        /// First id to probe
        #[arg(long, default_value_t = 1)]
        start_hint: u32,
    },

    /// Show stored statistics for one year
    Stats {
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=99))]
        year: u8,
    },

    /// Make escalated failures of one year eligible for probing again
    Reset {
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=99))]
        year: u8,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Run {
            year,
            start,
            max_cases,
            end,
            rediscover,
        } => {
            let request = BatchRequest {
                year,
                start,
                max_cases,
                end,
                rediscover,
            };
            handle_run(config, config_hash, request).await
        }
        Command::Locate { year, start_hint } => {
            handle_locate(config, config_hash, year, start_hint).await
        }
        Command::Stats { year } => handle_stats(&config, year),
        Command::Reset { year } => handle_reset(config, config_hash, year),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docket_sweep=info,warn"),
            1 => EnvFilter::new("docket_sweep=debug,info"),
            2 => EnvFilter::new("docket_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    SqliteStorage::new(path).with_context(|| format!("Failed to open database {}", path.display()))
}

fn build_collector(
    config: Config,
    config_hash: String,
) -> anyhow::Result<Collector<HttpProber, HtmlExtractor, SqliteStorage>> {
    let prober = HttpProber::new(&config.origin, &config.user_agent)
        .context("Failed to build HTTP client")?;
    let extractor = HtmlExtractor::new(&config.extractor).context("Failed to build extractor")?;
    let storage = open_storage(&config)?;
    Ok(Collector::new(config, prober, extractor, storage).with_config_hash(config_hash))
}

/// Handles the run command
async fn handle_run(config: Config, config_hash: String, request: BatchRequest) -> anyhow::Result<()> {
    let mut collector = build_collector(config, config_hash)?;

    let report = match collector.run(&request).await {
        Ok(report) => report,
        Err(HarvestError::RunFailed {
            run_id,
            stats,
            source,
        }) => {
            println!("Run #{} (stopped early)", run_id);
            print_run_statistics(&stats);
            return Err(anyhow::Error::new(*source)
                .context(format!("Run {} for year {:02} failed", run_id, request.year)));
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Run for year {:02} failed", request.year)))
        }
    };

    for warning in &report.warnings {
        tracing::warn!("{}", warning);
    }

    println!("Run #{}", report.run_id);
    if let Some(boundary) = &report.boundary {
        println!(
            "Boundary: high-water mark {} ({})",
            boundary.high_water_mark,
            if boundary.resolved { "resolved" } else { "unresolved" }
        );
    }
    print_run_statistics(&report.stats);

    Ok(())
}

/// Handles the locate command
async fn handle_locate(
    config: Config,
    config_hash: String,
    year: u8,
    start_hint: u32,
) -> anyhow::Result<()> {
    let mut collector = build_collector(config, config_hash)?;

    let estimate = collector
        .locate(year, start_hint)
        .await
        .with_context(|| format!("Boundary search for year {:02} failed", year))?;

    println!("=== Boundary for year {:02} ===\n", year);
    println!("  High-water mark: {}", estimate.high_water_mark);
    println!("  Confirmed empty at: {}", estimate.confidence_upper);
    println!("  Probes: {}", estimate.probes);
    println!("  Resolved: {}", estimate.resolved);

    Ok(())
}

/// Handles the stats command: shows stored state for one year
fn handle_stats(config: &Config, year: u8) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(config)?;
    let summary = load_year_summary(&storage, year, config.collector.retry_limit)
        .context("Failed to load statistics")?;
    print_year_summary(&summary);

    Ok(())
}

/// Handles the reset command
///
/// Goes through the collector so the reset waits for the single-writer lock.
fn handle_reset(config: Config, config_hash: String, year: u8) -> anyhow::Result<()> {
    let mut collector = build_collector(config, config_hash)?;
    let reset = collector
        .reset_failed(year)
        .context("Failed to reset failed ids")?;

    tracing::info!("Reset {} failed id(s) for year {:02}", reset, year);
    println!("✓ {} failed id(s) of year {:02} will be probed again", reset, year);

    Ok(())
}
