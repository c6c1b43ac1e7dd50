//! Process-wide pause gate tripped by upload failures.
//!
//! A single remote-side failure (rate limiting, outage) likely affects all
//! concurrent attempts, so any failure pauses the whole pipeline for a fixed
//! cool-down window instead of letting every worker hammer the API.

use std::sync::{Mutex, PoisonError};

use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Fixed cool-down applied on every trigger (5 minutes).
pub const PAUSE_DURATION: Duration = Duration::from_secs(5 * 60);

/// Shared paused-until state consulted by every worker before each upload.
///
/// Wrapped in `Arc` and cloned into worker tasks. The mutex is held only for
/// the read/write itself, never across the wait.
#[derive(Debug, Default)]
pub struct PauseGate {
    paused_until: Mutex<Option<Instant>>,
}

impl PauseGate {
    /// Creates a gate in the not-paused state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instant until which uploads are paused, if any.
    #[must_use]
    pub fn paused_until(&self) -> Option<Instant> {
        *self
            .paused_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true while the pause window is still in the future.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused_until().is_some_and(|until| until > Instant::now())
    }

    /// Unconditionally sets paused-until to now + [`PAUSE_DURATION`].
    ///
    /// Overwrites any existing pause, so re-triggering never extends beyond
    /// the fixed offset from the latest failure.
    pub fn trigger(&self) {
        let until = Instant::now() + PAUSE_DURATION;
        *self
            .paused_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(until);
        warn!(
            pause_secs = PAUSE_DURATION.as_secs(),
            "⚠️ upload error, pausing ALL uploads"
        );
    }

    /// Blocks until the pause window elapses or shutdown is cancelled.
    ///
    /// Returns immediately when not paused. The pause is cleared implicitly
    /// once the timestamp is in the past; no state is mutated here.
    pub async fn check_and_wait(&self, cancel: &CancellationToken) {
        let Some(until) = self.paused_until() else {
            return;
        };
        let now = Instant::now();
        if until <= now {
            return;
        }

        info!(
            wait_secs = (until - now).as_secs(),
            "⏸ paused due to previous error"
        );
        tokio::select! {
            () = tokio::time::sleep_until(until) => {}
            () = cancel.cancelled() => {}
        }
    }
}
