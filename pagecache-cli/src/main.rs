//! pagecache CLI
//!
//! Fetches pages through the expiring page cache and reports access counts.

mod config;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pagecache_cache::PageCache;
use pagecache_http::HttpFetcher;

use crate::config::AppConfig;

const DEMO_URL: &str = "http://slowwly.robertomurray.co.uk/delay/1000/url/https://www.example.com";

/// pagecache - fetch pages through a TTL cache
#[derive(Parser)]
#[command(name = "pagecache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Cache TTL in seconds (overrides PAGECACHE_TTL_SECONDS)
    #[arg(long, global = true)]
    ttl_secs: Option<u64>,

    /// Print the final report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL one or more times through the cache
    Get {
        /// URL to fetch
        url: String,
        /// Number of requests
        #[arg(short = 'n', long, default_value = "1")]
        times: u32,
        /// Seconds to wait between requests
        #[arg(short, long, default_value = "0")]
        interval_secs: u64,
        /// Print page bodies
        #[arg(long)]
        show_body: bool,
    },

    /// Three cached requests, wait out the TTL, one fresh request
    Demo {
        /// URL to fetch
        #[arg(default_value = DEMO_URL)]
        url: String,
    },
}

#[derive(serde::Serialize)]
struct Report {
    access_counts: Vec<pagecache_core::AccessCount>,
    stats: pagecache_core::CacheStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "pagecache=debug,info"
    } else {
        "pagecache=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(ttl) = cli.ttl_secs {
        config.cache.ttl_seconds = ttl;
    }

    let fetcher = HttpFetcher::with_config(config.http.clone())
        .context("Failed to create HTTP client")?;
    let cache = PageCache::new(fetcher, config.cache.clone());
    info!(
        ttl_seconds = config.cache.ttl_seconds,
        timeout_seconds = config.http.timeout_seconds,
        "Page cache ready"
    );

    match cli.command {
        Commands::Get { url, times, interval_secs, show_body } => {
            cmd_get(&cache, &url, times, interval_secs, show_body).await?
        }
        Commands::Demo { url } => cmd_demo(&cache, &url).await?,
    }

    print_report(&cache, cli.json)
}

/// Fetch a URL repeatedly
async fn cmd_get(
    cache: &PageCache<HttpFetcher>,
    url: &str,
    times: u32,
    interval_secs: u64,
    show_body: bool,
) -> Result<()> {
    println!("{} {}", "🌐 Fetching:".cyan().bold(), url);

    for i in 0..times {
        if i > 0 && interval_secs > 0 {
            wait(interval_secs, "Waiting").await?;
        }
        fetch_once(cache, url, show_body).await?;
    }

    Ok(())
}

/// Reproduce the cache expiry walkthrough
async fn cmd_demo(cache: &PageCache<HttpFetcher>, url: &str) -> Result<()> {
    let ttl = cache.memoizer().ttl().as_secs();
    println!("{} {}", "🧪 Demo against:".cyan().bold(), url);

    println!("\n{}", "1. Three requests within the TTL...".dimmed());
    for _ in 0..3 {
        fetch_once(cache, url, true).await?;
    }

    println!("\n{}", format!("2. Waiting {}s for the cache to expire...", ttl + 1).dimmed());
    wait(ttl + 1, "Expiring").await?;

    println!("\n{}", "3. One more request, fetched fresh...".dimmed());
    fetch_once(cache, url, true).await?;

    Ok(())
}

async fn fetch_once(cache: &PageCache<HttpFetcher>, url: &str, show_body: bool) -> Result<()> {
    let misses_before = cache.stats().misses;
    let started = std::time::Instant::now();

    let body = cache
        .get_page(url)
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    let source = if cache.stats().misses > misses_before {
        "fetched".yellow()
    } else {
        "cached".green()
    };
    println!(
        "   ✓ #{} {} ({} bytes, {:?})",
        cache.access_count(url),
        source,
        body.len(),
        started.elapsed()
    );
    if show_body {
        println!("{}", body);
    }

    Ok(())
}

async fn wait(seconds: u64, label: &str) -> Result<()> {
    let pb = ProgressBar::new(seconds);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   {msg} [{bar:40.cyan/blue}] {pos}/{len}s")?
            .progress_chars("#>-"),
    );
    pb.set_message(label.to_string());

    for _ in 0..seconds {
        tokio::time::sleep(Duration::from_secs(1)).await;
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(())
}

fn print_report(cache: &PageCache<HttpFetcher>, json: bool) -> Result<()> {
    let report = Report {
        access_counts: cache.access_counts(),
        stats: cache.stats(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{}", "📈 Access counts:".green().bold());
    for count in &report.access_counts {
        println!("   {} {}", format!("{:>4}", count.count).yellow(), count.key);
    }
    println!(
        "   {} {} hits, {} misses ({:.0}% hit ratio)",
        "Cache:".dimmed(),
        report.stats.hits,
        report.stats.misses,
        report.stats.hit_ratio() * 100.0
    );

    Ok(())
}
