//! Request pacing for the TorBox API.
//!
//! Every request in this process targets the same remote host, so pacing is
//! a single slot: a minimum interval enforced between consecutive requests,
//! shared across all workers. This spaces out bursts after a scan tick drops
//! many files into the queue at once.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Maximum Retry-After value (1 hour) to prevent excessive delays.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Minimum-interval pacer shared by all upload workers.
///
/// Wrapped in `Arc` and cloned into worker tasks. The inner mutex is held
/// across the delay on purpose: that is what serializes request starts.
#[derive(Debug)]
pub struct RequestPacer {
    /// Minimum time between consecutive requests.
    min_interval: Duration,

    /// Whether pacing is disabled (`--rate-limit 0`).
    disabled: bool,

    /// Time the last request was released.
    /// `None` means no request has been made yet (first request is immediate).
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    /// Creates a pacer enforcing the given minimum interval between requests.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            disabled: false,
            last_request: Mutex::new(None),
        }
    }

    /// Creates a disabled pacer that applies no delays.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            min_interval: Duration::ZERO,
            disabled: true,
            last_request: Mutex::new(None),
        }
    }

    /// Returns whether pacing is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the configured minimum interval.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the minimum interval since the previous request has
    /// elapsed, then claims the slot for the caller's request.
    ///
    /// The first request proceeds immediately.
    #[instrument(level = "debug", skip(self))]
    pub async fn acquire(&self) {
        if self.disabled {
            return;
        }

        let mut last_request = self.last_request.lock().await;

        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let delay = self.min_interval.saturating_sub(elapsed);
                debug!(delay_ms = delay.as_millis(), "pacing API request");
                tokio::time::sleep(delay).await;
            }
        } else {
            debug!("first API request, no pacing delay");
        }

        *last_request = Some(Instant::now());
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports both RFC 7231 formats: integer seconds and HTTP-date. Returns
/// `None` for unparseable values; caps excessive values at 1 hour.
#[must_use]
#[instrument]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }

        #[allow(clippy::cast_sign_loss)]
        let duration = Duration::from_secs(seconds as u64);

        if duration > MAX_RETRY_AFTER {
            warn!(
                seconds,
                max_seconds = MAX_RETRY_AFTER.as_secs(),
                "Retry-After exceeds maximum, capping at 1 hour"
            );
            return Some(MAX_RETRY_AFTER);
        }

        return Some(duration);
    }

    if let Ok(datetime) = httpdate::parse_http_date(header_value) {
        let now = std::time::SystemTime::now();
        if let Ok(duration) = datetime.duration_since(now) {
            if duration > MAX_RETRY_AFTER {
                warn!(
                    delay_secs = duration.as_secs(),
                    max_secs = MAX_RETRY_AFTER.as_secs(),
                    "Retry-After date exceeds maximum, capping at 1 hour"
                );
                return Some(MAX_RETRY_AFTER);
            }
            Some(duration)
        } else {
            debug!(header_value, "Retry-After date is in the past, returning zero");
            Some(Duration::ZERO)
        }
    } else {
        debug!(header_value, "unparseable Retry-After value");
        None
    }
}
