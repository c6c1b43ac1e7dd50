//! Error types for the upload module.
//!
//! Structured errors for every way an upload can fail, with enough context
//! (endpoint, path, detail) for the worker logs to be actionable.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while uploading a file or magnet link.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error uploading to {url}: {source}")]
    Network {
        /// The endpoint that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout uploading to {url}")]
    Timeout {
        /// The endpoint that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The endpoint that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if present (for 429 responses).
        retry_after: Option<String>,
    },

    /// The API returned a 2xx status but reported `success: false`.
    #[error("API error: {detail}")]
    Api {
        /// The `detail` string from the response body.
        detail: String,
    },

    /// A 2xx response body that did not decode as the expected JSON contract.
    #[error("undecodable response from {url}: {source}")]
    InvalidResponse {
        /// The endpoint that returned the body.
        url: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// File system error reading the source file.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error carrying a Retry-After header value.
    pub fn http_status_with_retry_after(
        url: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after,
        }
    }

    /// Creates an API-reported failure.
    pub fn api(detail: impl Into<String>) -> Self {
        Self::Api {
            detail: detail.into(),
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures originating at or beyond the remote API.
    ///
    /// These trip the global pause gate; local read errors do not, since the
    /// remote side is healthy and other files can still be uploaded.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}

// Note on From trait implementations: we intentionally do NOT implement
// `From<reqwest::Error>` or `From<std::io::Error>` because the variants
// require context (url, path) that the source errors don't carry. The helper
// constructors are the pattern here.
