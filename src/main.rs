//! Shootings crawler main entry point
//!
//! This is the command-line interface for the incident report crawler.

use anyhow::Context;
use clap::Parser;
use shootings_crawler::config::{finalize_config, load_config_with_hash, Config};
use shootings_crawler::crawler::{run_crawl, PageWalker};
use shootings_crawler::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shootings crawler: harvests mass-shooting incident reports into CSV
///
/// Walks every listing page of one report year, follows each incident's
/// detail page, and writes one CSV row per incident. Requests are spaced by
/// the configured delay; the crawl is strictly sequential.
#[derive(Parser, Debug)]
#[command(name = "shootings-crawler")]
#[command(version)]
#[command(about = "Crawls mass-shooting incident reports into CSV", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Report year to crawl (2013 through the current year)
    #[arg(short, long)]
    year: Option<i32>,

    /// Minimum seconds between requests
    #[arg(short, long)]
    delay: Option<f64>,

    /// Retries per request after the first failure
    #[arg(short, long)]
    tries: Option<u32>,

    /// Output CSV path (".csv" is appended if missing)
    #[arg(short, long)]
    output: Option<String>,

    /// Site root to crawl
    #[arg(long)]
    base_url: Option<String>,

    /// Do not consult robots.txt
    #[arg(long)]
    ignore_robots: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shootings_crawler=info,warn"),
            1 => EnvFilter::new("shootings_crawler=debug,info"),
            2 => EnvFilter::new("shootings_crawler=trace,debug"),
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

/// Loads the config file (if any), applies command-line overrides, validates
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("loading {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(year) = cli.year {
        config.crawl.year = year;
    }
    if let Some(delay) = cli.delay {
        config.crawl.delay_seconds = delay;
    }
    if let Some(tries) = cli.tries {
        config.crawl.max_retries = tries;
    }
    if let Some(output) = &cli.output {
        config.output.path = output.clone();
    }
    if let Some(base_url) = &cli.base_url {
        config.site.base_url = base_url.clone();
    }
    if cli.ignore_robots {
        config.crawl.respect_robots = false;
    }

    finalize_config(config).context("invalid configuration")
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let base_url = url::Url::parse(&config.site.base_url)?;
    let walker = PageWalker::new(base_url, config.crawl.year);

    println!("=== Shootings Crawler Dry Run ===\n");

    println!("Crawl:");
    println!("  Year: {}", config.crawl.year);
    println!("  Delay between requests: {}s", config.crawl.delay_seconds);
    println!("  Max retries: {}", config.crawl.max_retries);
    println!("  Respect robots.txt: {}", config.crawl.respect_robots);
    println!("  Request timeout: {}s", config.crawl.timeout_seconds);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  CSV: {}", config.output.path);

    println!("\nFirst listing page:");
    println!("  {}", walker.page_url(0));

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation, stopping cleanly on Ctrl-C
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling year {} into {} ({}s between requests)",
        config.crawl.year,
        config.output.path,
        config.crawl.delay_seconds
    );

    tokio::select! {
        result = run_crawl(&config) => {
            let stats = result.with_context(|| {
                format!("crawl failed; partial output kept in {}", config.output.path)
            })?;
            print_statistics(&stats);
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!(
                "Interrupted; rows written so far are kept in {}",
                config.output.path
            );
            Ok(())
        }
    }
}
