//! CLI entry point for the Benzinga news downloader.

use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use benzinga_core::{DailyDownloadCoordinator, DateRangeDriver, PageFetcher, RateLimiter};
use chrono::Utc;
use clap::Parser;
use tracing::{debug, info, warn};

mod cli;
mod config;
mod settings;

use cli::Args;
use settings::{API_KEY_ENV, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let loaded = config::load_config(args.config.as_deref())?;
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "loaded config file");
    }

    let env_api_key = env::var(API_KEY_ENV).ok();
    let settings = Settings::resolve(&args, &loaded.config, env_api_key, Utc::now().date_naive())?;
    info!(
        start = %settings.start,
        end = %settings.end,
        output_dir = %settings.output_dir.display(),
        force_overwrite = settings.force_overwrite,
        "Benzinga downloader starting"
    );

    let rate_limiter = if settings.rate_limit.is_zero() {
        debug!("rate limiting disabled");
        Arc::new(RateLimiter::disabled())
    } else {
        debug!(rate_limit_ms = settings.rate_limit.as_millis(), "rate limiting enabled");
        Arc::new(RateLimiter::new(settings.rate_limit))
    };

    let fetcher = PageFetcher::new(settings.api_key.as_str(), rate_limiter, &settings.fetcher)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping (press Ctrl-C again to exit immediately)");
            interrupted_signal.store(true, Ordering::SeqCst);
        }
        // The handler above replaced the default SIGINT behavior
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    let coordinator = DailyDownloadCoordinator::new(fetcher, settings.download_options());
    let driver = DateRangeDriver::new(coordinator, interrupted);

    let summary = driver
        .run(settings.start, settings.end)
        .await
        .with_context(|| {
            format!(
                "Failed to download news for {} to {}",
                settings.start, settings.end
            )
        })?;

    info!(
        days = summary.days.len(),
        pages = summary.total_pages(),
        records = summary.total_records(),
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "Download complete"
    );

    Ok(())
}
