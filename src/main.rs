//! CLI entry point for the TorBox watch-folder uploader.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use torbox_watch::{Config, Pipeline, RequestPacer, RetryPolicy, UploadClient};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
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

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let config = Config::from_env().context("startup configuration")?;

    info!(
        folder = %config.watch_folder.display(),
        delete_after_upload = config.delete_after_upload,
        "🚀 starting TorBox watch-folder uploader"
    );

    let client = UploadClient::new(config.api_base.clone(), config.api_key.clone());
    let retry_policy = RetryPolicy::with_max_attempts(u32::from(args.max_retries));

    let pacer = if args.rate_limit == 0 {
        debug!("request pacing disabled");
        Arc::new(RequestPacer::disabled())
    } else {
        debug!(rate_limit_ms = args.rate_limit, "request pacing enabled");
        Arc::new(RequestPacer::new(Duration::from_millis(args.rate_limit)))
    };

    let pipeline = Pipeline::new(
        config,
        client,
        retry_policy,
        pacer,
        usize::from(args.workers),
        Duration::from_secs(args.scan_interval_secs),
    )?;

    // Ctrl-C stops the scan loop; queued and in-flight uploads still drain.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(error = %error, "failed to listen for shutdown signal");
            return;
        }
        info!("shutdown signal received, draining in-flight uploads");
        signal_cancel.cancel();
    });

    pipeline.run(cancel).await;

    info!(
        processed = pipeline.history().processed_count(),
        failed = pipeline.history().failed_count(),
        "shutdown complete"
    );

    Ok(())
}
