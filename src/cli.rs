//! CLI argument definitions using clap derive macros.

use clap::Parser;

use torbox_watch::{DEFAULT_MAX_RETRIES, DEFAULT_WORKERS};

/// Watch a folder for torrent/magnet/NZB files and upload them to TorBox.
///
/// Configuration (watch folder, API key, delete-after-upload) comes from the
/// environment; these flags tune logging and pipeline behavior.
#[derive(Parser, Debug)]
#[command(name = "torbox-watch")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Number of concurrent upload workers (1-100)
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub workers: u8,

    /// Seconds between watch-folder scans (1-3600)
    #[arg(short = 's', long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub scan_interval_secs: u64,

    /// Maximum upload attempts per file for transient failures (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES as u8, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_retries: u8,

    /// Minimum delay between API requests in milliseconds (0 to disable, max 60000)
    #[arg(short = 'l', long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub rate_limit: u64,
}
