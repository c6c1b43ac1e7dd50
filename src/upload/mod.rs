//! Upload client for the TorBox API with retry and request pacing.
//!
//! # Features
//!
//! - In-memory multipart form for magnet links
//! - Streamed multipart bodies for torrent/NZB files (bounded memory)
//! - Bearer-token auth over a shared connection-pooled client
//! - Bounded retries with exponential backoff and jitter
//! - Minimum-interval pacing of requests to the remote API

mod client;
pub mod constants;
mod error;
mod pacer;
mod retry;

pub use client::UploadClient;
pub use error::UploadError;
pub use pacer::{RequestPacer, parse_retry_after};
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
