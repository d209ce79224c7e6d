//! Site-Atlas main entry point
//!
//! This is the command-line interface for the Site-Atlas crawler.

use anyhow::Context;
use clap::Parser;
use site_atlas::config::{load_config_with_hash, Config};
use site_atlas::output::{format_task_report, write_site_tree_json};
use site_atlas::storage::{open_record_sink, FsObjectStore};
use site_atlas::url::normalize_url;
use site_atlas::{HttpCrawlRunner, Orchestrator, TaskStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Interval between status polls while waiting for tasks
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Site-Atlas: crawl websites and rebuild their navigation trees
///
/// Each target is crawled breadth-first within its own origin. Crawls run
/// one at a time and are retried on failure; every finished site tree is
/// written as JSON and recorded in the crawl history database.
#[derive(Parser, Debug)]
#[command(name = "site-atlas")]
#[command(version)]
#[command(about = "Crawl websites and rebuild their navigation trees", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Sites to crawl
    #[arg(value_name = "TARGETS")]
    targets: Vec<String>,

    /// Owner recorded on every submitted crawl
    #[arg(long, value_name = "ID", default_value = "local")]
    owner: String,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "history")]
    dry_run: bool,

    /// List crawls recorded in the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    history: bool,

    /// Number of history entries to show
    #[arg(long, default_value_t = 20, requires = "history")]
    limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.targets)
    } else if cli.history {
        handle_history(&config, cli.limit)
    } else {
        handle_crawl(config, &cli.owner, &cli.targets).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_atlas=info,warn"),
            1 => EnvFilter::new("site_atlas=debug,info"),
            2 => EnvFilter::new("site_atlas=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration and targets
fn handle_dry_run(config: &Config, targets: &[String]) -> anyhow::Result<()> {
    println!("=== Site-Atlas Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Page timeout: {}s", config.crawler.page_timeout_secs);
    println!("  Crawl timeout: {}s", config.crawler.crawl_timeout_secs);
    println!(
        "  Excluded extensions: {}",
        config.crawler.excluded_extensions.join(", ")
    );

    println!("\nOrchestrator:");
    println!("  Max attempts: {}", config.orchestrator.max_attempts);
    println!("  Retry delay: {}ms", config.orchestrator.retry_delay_ms);
    println!("  Retention: {}s", config.orchestrator.retention_secs);
    println!("  Sweep interval: {}s", config.orchestrator.sweep_interval_secs);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Snapshots: {}", config.output.snapshot_dir);
    println!("  Site trees: {}", config.output.site_tree_dir);

    println!("\nTargets ({}):", targets.len());
    let mut valid = 0;
    for target in targets {
        match normalize_url(target) {
            Ok(url) => {
                valid += 1;
                println!("  - {}", url);
            }
            Err(e) => println!("  - {} (invalid: {})", target, e),
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} of {} targets", valid, targets.len());

    Ok(())
}

/// Handles the --history mode: lists persisted crawls
fn handle_history(config: &Config, limit: usize) -> anyhow::Result<()> {
    let database = Path::new(&config.output.database_path);
    println!("Database: {}\n", database.display());

    let sink = open_record_sink(database).context("failed to open crawl database")?;
    let crawls = sink.list_crawls(limit)?;

    if crawls.is_empty() {
        println!("No crawls recorded yet");
        return Ok(());
    }

    println!("| ID | Created | Owner | Site | Thumbnail |");
    println!("|----|---------|-------|------|-----------|");
    for crawl in &crawls {
        println!(
            "| {} | {} | {} | {} | {} |",
            crawl.id,
            crawl.created_at,
            crawl.user_id,
            crawl.site_url,
            crawl.thumbnail_path.as_deref().unwrap_or("-")
        );
    }
    println!("\nShowing {} of {} crawls", crawls.len(), sink.count_crawls()?);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, owner: &str, targets: &[String]) -> anyhow::Result<()> {
    if targets.is_empty() {
        anyhow::bail!("no targets given; pass one or more site URLs after the config path");
    }

    let database = Path::new(&config.output.database_path);
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let sink = open_record_sink(database).context("failed to open crawl database")?;

    let object_store = Arc::new(FsObjectStore::new(&config.output.snapshot_dir));
    let runner = HttpCrawlRunner::new(&config, object_store).context("failed to build HTTP client")?;

    let orchestrator = Orchestrator::builder(Arc::new(runner))
        .settings(config.orchestrator.clone())
        .record_sink(Arc::new(sink))
        .start();

    let mut task_ids = Vec::with_capacity(targets.len());
    for target in targets {
        match orchestrator.submit(owner, target) {
            Ok(id) => task_ids.push(id),
            Err(e) => tracing::error!("Skipping {}: {}", target, e),
        }
    }

    let site_tree_dir = Path::new(&config.output.site_tree_dir);
    let mut failed = 0;

    for id in &task_ids {
        let task = orchestrator.wait_for(id, POLL_INTERVAL).await?;

        if let (TaskStatus::Completed, Some(tree)) = (task.status, &task.result) {
            let path = write_site_tree_json(site_tree_dir, &task.id, tree)?;
            tracing::info!("Site tree for {} written to {}", task.target_url, path.display());
        } else {
            failed += 1;
        }

        println!("{}", format_task_report(&task));
    }

    orchestrator.shutdown().await;

    tracing::info!(
        "Finished {} crawls ({} failed)",
        task_ids.len(),
        failed
    );

    if failed > 0 || task_ids.len() < targets.len() {
        anyhow::bail!(
            "{} of {} targets did not complete",
            targets.len() - task_ids.len() + failed,
            targets.len()
        );
    }

    Ok(())
}
