//! Startup configuration from the environment.
//!
//! Loaded once in `main`; a missing watch folder or API key is fatal. The
//! API base URL is overridable for tests and self-hosted gateways.

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::upload::constants::DEFAULT_API_BASE;

/// Environment variable naming the folder to watch.
pub const ENV_WATCH_FOLDER: &str = "TORBOX_WATCH_FOLDER";

/// Environment variable holding the API bearer token.
pub const ENV_API_KEY: &str = "TORBOX_API_KEY";

/// Environment variable enabling delete-after-upload (`"true"`, case-insensitive).
pub const ENV_DELETE_AFTER_UPLOAD: &str = "DELETE_AFTER_UPLOAD";

/// Environment variable overriding the API base URL.
pub const ENV_API_BASE: &str = "TORBOX_API_BASE";

/// Errors raised while resolving startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("{name} must be set")]
    MissingEnv {
        /// Name of the missing variable.
        name: &'static str,
    },

    /// The API base override is not a valid URL.
    #[error("invalid API base URL {value:?}: {source}")]
    InvalidApiBase {
        /// The rejected value.
        value: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
}

/// Resolved startup configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Folder scanned for descriptor files.
    pub watch_folder: PathBuf,
    /// Bearer token sent with every API request.
    pub api_key: String,
    /// Whether torrent/magnet sources are deleted after a successful upload.
    pub delete_after_upload: bool,
    /// Base URL of the TorBox API.
    pub api_base: Url,
}

impl Config {
    /// Resolves configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] when the watch folder or API key
    /// is absent or empty, and [`ConfigError::InvalidApiBase`] for a
    /// malformed base-URL override.
    pub fn from_env() -> Result<Self, ConfigError> {
        let watch_folder = required_env(ENV_WATCH_FOLDER)?;
        let api_key = required_env(ENV_API_KEY)?;
        let delete_after_upload = parse_delete_flag(std::env::var(ENV_DELETE_AFTER_UPLOAD).ok());
        let api_base = parse_api_base(std::env::var(ENV_API_BASE).ok())?;

        Ok(Self {
            watch_folder: PathBuf::from(watch_folder),
            api_key,
            delete_after_upload,
            api_base,
        })
    }
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingEnv { name })
}

/// `"true"` (any case) enables the flag; everything else, including unset,
/// leaves it off.
fn parse_delete_flag(value: Option<String>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn parse_api_base(value: Option<String>) -> Result<Url, ConfigError> {
    let value = value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    Url::parse(value.trim()).map_err(|source| ConfigError::InvalidApiBase { value, source })
}
