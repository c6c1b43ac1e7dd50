//! Constants for the upload module (timeouts, endpoints, fixed form values).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default total request timeout (5 minutes, covers large streamed bodies).
pub const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Idle connections kept per host in the shared pool.
pub const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 100;

/// Idle connection timeout for the shared pool (90 seconds).
pub const IDLE_CONNECTION_TIMEOUT_SECS: u64 = 90;

/// Default TorBox API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.torbox.app";

/// API version path segment.
pub const API_VERSION: &str = "v1";

/// Fixed password form field sent with usenet uploads.
pub const NZB_PASSWORD: &str = "vietnzb.club";
