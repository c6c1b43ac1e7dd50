//! TorBox Watch-Folder Library
//!
//! This library implements a watch-folder ingestion pipeline: it scans a
//! directory for download-descriptor files (`.torrent`, `.magnet`, `.nzb`),
//! uploads each to the TorBox API, and reconciles local state based on the
//! upload outcome.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Startup configuration from the environment
//! - [`scanner`] - Watch-folder scanning and extension filtering
//! - [`pipeline`] - Bounded queue, worker pool, and shutdown draining
//! - [`upload`] - HTTP upload client with retry and request pacing
//! - [`pause`] - Global error-triggered pause gate
//! - [`reconcile`] - Post-upload file handling (move/delete)
//! - [`history`] - In-memory upload history for observability

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod history;
pub mod pause;
pub mod pipeline;
pub mod reconcile;
pub mod scanner;
pub mod upload;
pub mod watched;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use history::UploadHistory;
pub use pause::{PAUSE_DURATION, PauseGate};
pub use pipeline::{
    DEFAULT_SCAN_INTERVAL, DEFAULT_WORKERS, InFlight, Pipeline, PipelineError, QUEUE_CAPACITY,
};
pub use upload::{
    DEFAULT_MAX_RETRIES, FailureType, RequestPacer, RetryDecision, RetryPolicy, UploadClient,
    UploadError, classify_error,
};
pub use watched::{FileKind, WatchedFile};
