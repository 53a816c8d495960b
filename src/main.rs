//! lolcrawler main entry point
//!
//! This is the command-line interface for the lolcrawler match crawler.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use lolcrawler::config::{load_config_with_hash, Config};
use lolcrawler::crawler::{run_random_walk, run_snapshot, Shutdown, Snapshot};
use lolcrawler::output::{load_statistics, print_session, print_statistics};
use lolcrawler::remote::TimeWindow;
use lolcrawler::storage::open_store;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// How players to crawl are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Follow match participants from the seed player, indefinitely
    RandomWalk,
    /// Crawl top-tier league rosters within a time window, then exit
    Snapshot,
}

/// lolcrawler: a resumable League of Legends match crawler
///
/// lolcrawler alternates between players and the matches they played,
/// storing every matchlist and match it fetches so that a stopped crawl
/// resumes where it left off.
#[derive(Parser, Debug)]
#[command(name = "lolcrawler")]
#[command(version = "1.0.0")]
#[command(about = "A resumable League of Legends match crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Traversal strategy
    #[arg(long, value_enum, default_value_t = Mode::RandomWalk)]
    mode: Mode,

    /// Stop the random walk after visiting this many players
    #[arg(long, value_name = "N")]
    max_players: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config, cli.mode);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(&config, cli.mode, cli.max_players).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lolcrawler=info,warn"),
            1 => EnvFilter::new("lolcrawler=debug,info"),
            2 => EnvFilter::new("lolcrawler=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, mode: Mode) {
    println!("=== lolcrawler Dry Run ===\n");

    println!("API:");
    println!(
        "  Base URL: {}",
        config
            .api
            .base_url
            .as_deref()
            .unwrap_or("https://{region}.api.riotgames.com")
    );
    println!("  Timeout: {}s", config.api.timeout_secs);
    println!("  Max matchlist pages: {}", config.api.max_matchlist_pages);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    match mode {
        Mode::RandomWalk => {
            println!("\nRandom Walk:");
            println!("  Region: {}", config.crawler.region);
            println!("  Seed player: {}", config.crawler.seed_player);
            println!("  Resume lookback: {} players", config.crawler.lookback);
        }
        Mode::Snapshot => {
            let window = TimeWindow::last_days(config.snapshot.window_days, Utc::now());
            let snapshot = Snapshot::from_config(&config.snapshot, window);
            println!("\nSnapshot ({} pairs):", snapshot.pairs().len());
            for (region, tier) in snapshot.pairs() {
                println!("  - {} {}", region, tier.as_str());
            }
            println!("  Window: {}", window);
        }
    }

    println!("\nRetries:");
    println!("  Backoff: {}ms", config.crawler.retry_backoff_ms);
    println!("  Give up on a match after {} failures", config.crawler.max_failures);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let store = open_store(Path::new(&config.storage.database_path))
        .context("failed to open the database")?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, mode: Mode, max_players: Option<u64>) -> anyhow::Result<()> {
    let shutdown = Shutdown::new();

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing the current item");
            signal.request();
        }
    });

    let result = match mode {
        Mode::RandomWalk => run_random_walk(config, max_players, &shutdown).await,
        Mode::Snapshot => run_snapshot(config, &shutdown).await,
    };

    match result {
        Ok(stats) => {
            print_session(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
