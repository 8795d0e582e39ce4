//! Edge-Warmer main entry point
//!
//! This is the command-line interface for the Edge-Warmer CDN cache warmer.

use anyhow::{bail, Context};
use clap::Parser;
use edge_warmer::config::{load_config, Config, SiteMode};
use edge_warmer::output::{print_statistics, FlushOutcome};
use edge_warmer::Coordinator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Edge-Warmer: a sitemap-driven CDN cache warmer
///
/// Edge-Warmer reads each site's sitemap, requests every listed page
/// through the site's proxy to populate edge caches, purges pages the
/// origin served cold, and exports one row per outcome to a webhook.
#[derive(Parser, Debug)]
#[command(name = "edge-warmer")]
#[command(version = "1.0.0")]
#[command(about = "A sitemap-driven CDN cache warmer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be warmed without making requests
    #[arg(long)]
    dry_run: bool,

    /// Only warm the sites with these codes (repeatable)
    #[arg(long = "site", value_name = "CODE")]
    sites: Vec<String>,

    /// Override how sites are processed: sequential or concurrent
    #[arg(long, value_name = "MODE")]
    site_mode: Option<SiteMode>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully");

    select_sites(&mut config, &cli.sites)?;
    if let Some(mode) = cli.site_mode {
        config.warmer.site_mode = mode;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_warm(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("edge_warmer=info,warn"),
            1 => EnvFilter::new("edge_warmer=debug,info"),
            2 => EnvFilter::new("edge_warmer=trace,debug"),
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

/// Keeps only the sites named on the command line
fn select_sites(config: &mut Config, codes: &[String]) -> anyhow::Result<()> {
    if codes.is_empty() {
        return Ok(());
    }

    for code in codes {
        if config.site(code).is_none() {
            bail!("Unknown site code '{}'", code);
        }
    }
    config.sites.retain(|site| codes.contains(&site.code));
    Ok(())
}

/// Handles the --dry-run mode: validates config and shows what would be warmed
fn handle_dry_run(config: &Config) {
    println!("=== Edge-Warmer Dry Run ===\n");

    let warmer = &config.warmer;
    println!("Warmer Configuration:");
    println!("  Batch size: {}", warmer.batch_size);
    println!("  Batch delay: {}ms", warmer.batch_delay_ms);
    println!(
        "  Attempts: {} ({}ms apart)",
        warmer.max_attempts, warmer.retry_delay_ms
    );
    println!(
        "  Timeouts: sitemap {}s, warm {}s",
        warmer.sitemap_timeout_secs, warmer.warm_timeout_secs
    );
    println!("  Site mode: {:?}", warmer.site_mode);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} ({})", site.code, site.base_url);
        println!("    * Sitemap: {}", site.sitemap_url());
        println!("    * User-Agent: {}", site.user_agent);
    }

    let purge_enabled = config
        .purge
        .as_ref()
        .and_then(|p| p.credentials())
        .is_some();
    println!("\nPurge: {}", if purge_enabled { "enabled" } else { "disabled" });

    let webhook = config.export.as_ref().and_then(|e| e.webhook());
    println!("Export: {}", webhook.unwrap_or("disabled"));

    println!("\n✓ Configuration is valid");
    println!("✓ Would warm {} sites", config.sites.len());
}

/// Handles the main warming run
async fn handle_warm(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Sites: {}",
        config
            .sites
            .iter()
            .map(|s| s.code.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut coordinator = Coordinator::new(config).context("Failed to set up warming run")?;
    let report = coordinator.run().await;

    match &report.export {
        FlushOutcome::Failed { retained, error } => {
            tracing::error!("{} rows were not exported: {}", retained, error);
        }
        FlushOutcome::Exported { rows, .. } => {
            tracing::info!("Exported {} rows to {}", rows, report.sheet_name);
        }
        FlushOutcome::Disabled | FlushOutcome::Empty => {}
    }

    println!();
    print_statistics(&report.statistics);

    tracing::info!("Warming completed");
    Ok(())
}
