//! SFT-Scraper main entry point
//!
//! This is the command-line interface for the SFT-Scraper title scraper.

use anyhow::Context;
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use sft_scraper::config::{read_config, validate, Config};
use sft_scraper::output::print_summary;
use sft_scraper::scraper::{plan_candidates, scrape};
use sft_scraper::storage::load_done_ids;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// SFT-Scraper: a resumable bulk title scraper
///
/// Fetches one portfolio page per ID in an inclusive range, keeps the page
/// titles that look like real names and appends them to a text file, one
/// per line. With --resume, IDs finished by earlier runs are skipped.
#[derive(Parser, Debug)]
#[command(name = "sft-scraper")]
#[command(version = "1.0.0")]
#[command(about = "Resumable bulk title scraper", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start ID, inclusive [default: 1]
    #[arg(long)]
    start: Option<u64>,

    /// End ID, inclusive [default: 145000]
    #[arg(long)]
    end: Option<u64>,

    /// Number of concurrent workers [default: 64]
    #[arg(long)]
    workers: Option<usize>,

    /// Per-request timeout in seconds [default: 10.0]
    #[arg(long)]
    timeout: Option<f64>,

    /// Retries per request on transient failure [default: 2]
    #[arg(long)]
    retries: Option<u32>,

    /// Backoff base in seconds; attempt k waits base * 2^k [default: 0.2]
    #[arg(long)]
    backoff_base: Option<f64>,

    /// Seconds to pause between dispatches [default: 0.0]
    #[arg(long)]
    rate_delay: Option<f64>,

    /// Output file name, resolved against --base-dir [default: sft_raw.txt]
    #[arg(long)]
    out: Option<String>,

    /// Directory the output file lives in [default: .]
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Skip IDs recorded in <out>.done_ids and record newly finished ones
    #[arg(long)]
    resume: bool,

    /// Seconds between progress lines [default: 5.0]
    #[arg(long)]
    progress_interval: Option<f64>,

    /// Validate config and show what would be scraped without fetching
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(start) = self.start {
            config.range.start = start;
        }
        if let Some(end) = self.end {
            config.range.end = end;
        }
        if let Some(workers) = self.workers {
            config.pool.workers = workers;
        }
        if let Some(timeout) = self.timeout {
            config.fetch.timeout = timeout;
        }
        if let Some(retries) = self.retries {
            config.fetch.retries = retries;
        }
        if let Some(backoff_base) = self.backoff_base {
            config.fetch.backoff_base = backoff_base;
        }
        if let Some(rate_delay) = self.rate_delay {
            config.pool.rate_delay = rate_delay;
        }
        if let Some(out) = &self.out {
            config.output.out = out.clone();
        }
        if let Some(base_dir) = &self.base_dir {
            config.output.base_dir = base_dir.clone();
        }
        if self.resume {
            config.output.resume = true;
        }
        if let Some(interval) = self.progress_interval {
            config.pool.progress_interval = interval;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            read_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_scrape(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sft_scraper=info,warn"),
            1 => EnvFilter::new("sft_scraper=debug,info"),
            2 => EnvFilter::new("sft_scraper=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be scraped
fn handle_dry_run(config: &Config) {
    let output_path = config.output.output_path();
    let done_ids_path = config.output.done_ids_path();

    let done = if config.output.resume {
        load_done_ids(&done_ids_path, &output_path)
    } else {
        HashSet::new()
    };
    let candidates = plan_candidates(config.range.start, config.range.end, &done);

    println!("=== SFT-Scraper Dry Run ===\n");

    println!("Range:");
    println!("  IDs: {}..{} ({} total)", config.range.start, config.range.end, config.range.id_count());
    println!("  Already done: {}", config.range.id_count() - candidates.len() as u64);
    println!("  To do: {}", candidates.len());

    println!("\nFetch:");
    println!("  URL template: {}", config.fetch.url_template);
    println!("  Timeout: {}s", config.fetch.timeout);
    println!("  Retries: {}", config.fetch.retries);
    println!("  Backoff base: {}s", config.fetch.backoff_base);

    println!("\nPool:");
    println!("  Workers: {}", config.pool.workers);
    println!("  Rate delay: {}s", config.pool.rate_delay);
    println!("  Progress interval: {}s", config.pool.progress_interval);

    println!("\nOutput:");
    println!("  Titles: {}", output_path.display());
    if config.output.resume {
        println!("  Ledger: {}", done_ids_path.display());
    } else {
        println!("  Ledger: disabled (no --resume)");
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main scrape operation
async fn handle_scrape(config: &Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let stop = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, finishing in-flight work before exiting");
            stop.cancel();
        }
    });

    let summary = scrape(config, cancel).await.context("scrape failed")?;
    print_summary(&summary);

    Ok(())
}
