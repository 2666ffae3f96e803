//! Site-Sage main entry point
//!
//! This is the command-line interface for the Site-Sage website assistant.

use anyhow::Context;
use clap::Parser;
use site_sage::api::create_router;
use site_sage::config::{load_config_with_hash, Config};
use site_sage::context::build_engine;
use site_sage::output::{
    load_cache_statistics, print_cache_statistics, print_statistics, CrawlStatistics,
};
use site_sage::{AppContext, PageCache, SqliteCache};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Site-Sage: answers questions about one website
///
/// Site-Sage crawls a single site politely (robots.txt, a shared rate limit,
/// bounded concurrency), caches the page text, and serves a small JSON API
/// that answers questions from that text with a hosted language model.
#[derive(Parser, Debug)]
#[command(name = "site-sage")]
#[command(version)]
#[command(about = "A question-answering assistant for one website", long_about = None)]
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

    /// Crawl the site once, print the extracted text and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "clear_cache"])]
    crawl: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["crawl", "stats", "clear_cache"])]
    dry_run: bool,

    /// Show page cache statistics and exit
    #[arg(long, conflicts_with_all = ["crawl", "dry_run", "clear_cache"])]
    stats: bool,

    /// Delete every cached page and exit
    #[arg(long, conflicts_with_all = ["crawl", "dry_run", "stats"])]
    clear_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config).map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.clear_cache {
        handle_clear_cache(&config)?;
    } else if cli.crawl {
        handle_crawl(&config, cli.verbose > 0).await?;
    } else {
        handle_serve(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG`, when set, overrides the verbosity flags.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("site_sage=info,warn"),
                1 => EnvFilter::new("site_sage=debug,info"),
                2 => EnvFilter::new("site_sage=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_cache(config: &Config) -> anyhow::Result<SqliteCache> {
    SqliteCache::new(Path::new(&config.cache.database_path)).with_context(|| {
        format!(
            "failed to open page cache at {}",
            config.cache.database_path
        )
    })
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Site-Sage Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Crawl delay: {}ms", config.crawler.crawl_delay_ms);
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!("  Crawl timeout: {}s", config.crawler.crawl_timeout_secs);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.crawler.max_retries, config.crawler.retry_backoff_ms
    );
    println!("  robots.txt policy: {:?}", config.crawler.robots_policy);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.value);

    println!("\nCache:");
    println!("  Database: {}", config.cache.database_path);

    println!("\nModel:");
    println!("  API base: {}", config.model.api_base);
    println!("  Model: {}", config.model.model);
    println!("  API key variable: {}", config.model.api_key_env);
    println!("  Max output tokens: {}", config.model.max_output_tokens);
    println!("  Context chars: {}", config.model.context_chars);
    println!("  Safety threshold: {}", config.model.safety_threshold);

    println!("\nServer:");
    println!("  Bind: {}", config.server.bind);

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {}", config.crawler.seed_url);
}

/// Handles the --stats mode: shows what the page cache holds
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let cache = open_cache(config)?;
    let stats = load_cache_statistics(&cache, &config.cache.database_path)?;
    print_cache_statistics(&stats);
    Ok(())
}

/// Handles the --clear-cache mode
fn handle_clear_cache(config: &Config) -> anyhow::Result<()> {
    let cache = open_cache(config)?;
    let removed = cache.clear()?;
    tracing::info!("Removed {} cached pages", removed);
    println!("✓ Removed {} cached pages from {}", removed, config.cache.database_path);
    Ok(())
}

/// Handles the --crawl mode: one crawl, text to stdout
///
/// With `show_stats` the crawl statistics follow the text.
async fn handle_crawl(config: &Config, show_stats: bool) -> anyhow::Result<()> {
    let cache: Arc<dyn PageCache> = Arc::new(open_cache(config)?);
    let engine = build_engine(config, cache)?;

    let result = engine.crawl_site().await.map_err(|e| {
        tracing::error!("Crawl failed: {}", e);
        e
    })?;

    println!("{}", result.text);
    let stats = CrawlStatistics::from_result(&result);
    tracing::info!(
        "Crawled {} pages ({:.1}% with text)",
        stats.total_pages,
        stats.success_rate()
    );
    if show_stats {
        println!();
        print_statistics(&stats);
    }

    Ok(())
}

/// Handles the default mode: serve the HTTP API
async fn handle_serve(config: Config) -> anyhow::Result<()> {
    let bind = config.server.bind.clone();
    let ctx = AppContext::from_config(config).context("failed to initialize application")?;
    let app = create_router(Arc::new(ctx));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    tracing::info!("Listening on http://{}", bind);

    axum::serve(listener, app).await?;
    Ok(())
}
