//! Driftnet main entry point
//!
//! Command-line interface for the driftnet crawler engine.

use clap::Parser;
use driftnet::config::{load_config, validate, Config};
use driftnet::crawler::{Coordinator, CrawlSummary};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Driftnet: a polite, high-throughput web crawler
///
/// Crawls outward from a set of seed URLs, bounded by a global page budget
/// and per-host politeness limits. With --simulation no real HTTP traffic
/// is generated.
#[derive(Parser, Debug)]
#[command(name = "driftnet")]
#[command(version)]
#[command(about = "A polite, high-throughput web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL to crawl from (repeatable; adds to config seeds)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Maximum pages to crawl
    #[arg(long, value_name = "N")]
    max_pages: Option<u64>,

    /// Number of concurrent workers
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Max concurrent requests per host
    #[arg(long, value_name = "N")]
    max_per_host: Option<usize>,

    /// Minimum spacing between requests to one host, in milliseconds
    #[arg(long, value_name = "MS")]
    min_interval_ms: Option<u64>,

    /// Enable simulation mode (no real HTTP requests)
    #[arg(long)]
    simulation: bool,

    /// Simulated request delay in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Use the Bloom filter for URL deduplication
    #[arg(long)]
    bloom: bool,

    /// Disable the DNS cache (raw lookups)
    #[arg(long)]
    no_dns_cache: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Load configuration, then layer CLI overrides on top
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("loading configuration from {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);
    validate(&config)?;

    print_banner(&config);

    let coordinator = Coordinator::new(config)?;

    // Ctrl-C triggers the external-shutdown path
    let token = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            token.cancel();
        }
    });

    let summary = coordinator.run().await?;
    print_summary(&summary);

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("driftnet=info,warn"),
            1 => EnvFilter::new("driftnet=debug,info"),
            2 => EnvFilter::new("driftnet=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    config.seeds.extend(cli.seeds.iter().cloned());

    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(workers) = cli.workers {
        config.crawler.num_workers = workers;
    }
    if let Some(max_per_host) = cli.max_per_host {
        config.crawler.max_per_host = max_per_host;
    }
    if let Some(interval) = cli.min_interval_ms {
        config.crawler.min_interval_per_host_ms = interval;
    }
    if cli.simulation {
        config.simulation.enabled = true;
    }
    if let Some(delay) = cli.delay_ms {
        config.simulation.delay_ms = delay;
    }
    if cli.bloom {
        config.dedup.use_bloom = true;
    }
    if cli.no_dns_cache {
        config.dns.use_dns_cache = false;
    }
}

fn print_banner(config: &Config) {
    let mode = if config.simulation.enabled {
        "SIMULATION"
    } else {
        "REAL"
    };
    println!("=== Driftnet ({mode}) ===");
    println!("Seeds: {}", config.seeds.len());
    println!(
        "Workers: {}, MaxPerHost: {}, MinInterval: {}ms",
        config.crawler.num_workers,
        config.crawler.max_per_host,
        config.crawler.min_interval_per_host_ms
    );
    println!("MaxPages: {}", config.crawler.max_pages);
    println!(
        "Options: bloom={}, dns-cache={}",
        config.dedup.use_bloom, config.dns.use_dns_cache
    );
    println!();
}

fn print_summary(summary: &CrawlSummary) {
    println!("\n=== Done ===");
    println!(
        "Crawled: {} pages in {:.1}s ({:.1} pages/s)",
        summary.pages_fetched,
        summary.elapsed.as_secs_f64(),
        summary.pages_per_second()
    );
    println!(
        "Errors: {} (dns={}, net={}, http={}, cancelled={})",
        summary.fetch_errors,
        summary.dns_errors,
        summary.net_errors,
        summary.http_errors,
        summary.cancelled_fetches
    );
    println!(
        "Discovered: {} URLs across {} hosts ({} rejected links)",
        summary.urls_discovered, summary.hosts_seen, summary.rejected_links
    );
    println!("Queue remaining: {}", summary.queued_remaining);
}
