//! Dispatch pipeline: scan ticker, bounded queue, and the upload worker pool.
//!
//! # Concurrency Model
//!
//! - One scan loop on a fixed-interval timer feeds a bounded mpsc queue
//! - A fixed pool of long-lived worker tasks drains the queue; the single
//!   receiver endpoint is shared behind an async mutex
//! - Workers consult the [`PauseGate`] before each file and trip it when an
//!   upload fails against the remote API
//! - Shutdown: cancelling the token stops the ticker, the queue sender is
//!   dropped (closing the queue), and workers exit once it is drained
//!
//! No ordering is guaranteed across files; the queue is FIFO but several
//! workers drain it concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::history::UploadHistory;
use crate::pause::PauseGate;
use crate::reconcile;
use crate::scanner;
use crate::upload::{
    FailureType, RequestPacer, RetryDecision, RetryPolicy, UploadClient, UploadError,
    classify_error, parse_retry_after,
};
use crate::watched::{FileKind, WatchedFile};

/// Default number of upload workers.
pub const DEFAULT_WORKERS: usize = 5;

/// Capacity of the dispatch queue between scanner and workers.
pub const QUEUE_CAPACITY: usize = 100;

/// Default interval between watch-folder scans.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(20);

/// Minimum allowed worker count.
const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
const MAX_WORKERS: usize = 100;

/// Error type for pipeline construction.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkerCount {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// Paths currently queued or mid-upload.
///
/// Consulted by the scanner before enqueueing so a slow upload is never
/// double-dispatched by a faster scan tick; released by the worker once the
/// file's outcome is settled.
#[derive(Debug, Default)]
pub struct InFlight {
    paths: DashMap<PathBuf, ()>,
}

impl InFlight {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a path for dispatch. Returns false if it is already claimed.
    #[must_use]
    pub fn try_claim(&self, path: &Path) -> bool {
        self.paths.insert(path.to_path_buf(), ()).is_none()
    }

    /// Releases a path once its upload attempt has settled.
    pub fn release(&self, path: &Path) {
        self.paths.remove(path);
    }

    /// Number of currently claimed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// True when nothing is queued or uploading.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Shared state cloned into each worker task.
#[derive(Clone)]
struct WorkerContext {
    config: Arc<Config>,
    client: UploadClient,
    retry_policy: RetryPolicy,
    pacer: Arc<RequestPacer>,
    pause: Arc<PauseGate>,
    history: Arc<UploadHistory>,
    in_flight: Arc<InFlight>,
    cancel: CancellationToken,
}

/// The watch-folder pipeline: scanner, queue, worker pool, and the shared
/// pause/history/in-flight state.
#[derive(Debug)]
pub struct Pipeline {
    config: Arc<Config>,
    client: UploadClient,
    retry_policy: RetryPolicy,
    pacer: Arc<RequestPacer>,
    pause: Arc<PauseGate>,
    history: Arc<UploadHistory>,
    in_flight: Arc<InFlight>,
    workers: usize,
    scan_interval: Duration,
}

impl Pipeline {
    /// Creates a pipeline over the given configuration and upload client.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidWorkerCount`] if `workers` is outside
    /// the valid range (1-100).
    pub fn new(
        config: Config,
        client: UploadClient,
        retry_policy: RetryPolicy,
        pacer: Arc<RequestPacer>,
        workers: usize,
        scan_interval: Duration,
    ) -> Result<Self, PipelineError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(PipelineError::InvalidWorkerCount { value: workers });
        }

        debug!(
            workers,
            scan_interval_secs = scan_interval.as_secs(),
            max_attempts = retry_policy.max_attempts(),
            pacing_disabled = pacer.is_disabled(),
            "creating pipeline"
        );

        Ok(Self {
            config: Arc::new(config),
            client,
            retry_policy,
            pacer,
            pause: Arc::new(PauseGate::new()),
            history: Arc::new(UploadHistory::new()),
            in_flight: Arc::new(InFlight::new()),
            workers,
            scan_interval,
        })
    }

    /// Upload history shared with the workers, for observability.
    #[must_use]
    pub fn history(&self) -> &Arc<UploadHistory> {
        &self.history
    }

    /// The pause gate shared with the workers.
    #[must_use]
    pub fn pause_gate(&self) -> &Arc<PauseGate> {
        &self.pause
    }

    /// Configured worker count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs the pipeline until the token is cancelled, then drains.
    ///
    /// The first scan happens immediately; subsequent scans follow the
    /// configured interval. On cancellation the queue is closed and all
    /// in-flight and already-queued paths are drained before returning.
    #[instrument(skip(self, cancel), fields(folder = %self.config.watch_folder.display()))]
    pub async fn run(&self, cancel: CancellationToken) {
        let (queue_tx, queue_rx) = mpsc::channel::<WatchedFile>(QUEUE_CAPACITY);
        let queue_rx = Arc::new(Mutex::new(queue_rx));

        let mut handles = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let context = WorkerContext {
                config: Arc::clone(&self.config),
                client: self.client.clone(),
                retry_policy: self.retry_policy.clone(),
                pacer: Arc::clone(&self.pacer),
                pause: Arc::clone(&self.pause),
                history: Arc::clone(&self.history),
                in_flight: Arc::clone(&self.in_flight),
                cancel: cancel.clone(),
            };
            let receiver = Arc::clone(&queue_rx);
            handles.push(tokio::spawn(worker_loop(worker_id, receiver, context)));
        }

        info!(
            workers = self.workers,
            scan_interval_secs = self.scan_interval.as_secs(),
            "watch loop started"
        );

        let mut ticker = tokio::time::interval(self.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    scanner::scan_directory(
                        &self.config.watch_folder,
                        &self.in_flight,
                        &queue_tx,
                        &cancel,
                    )
                    .await;
                }
            }
        }

        // Closing the queue lets workers exit once it is drained.
        drop(queue_tx);
        debug!(task_count = handles.len(), "waiting for workers to drain");
        for handle in handles {
            if let Err(error) = handle.await {
                warn!(error = %error, "upload worker panicked");
            }
        }

        info!(
            processed = self.history.processed_count(),
            failed = self.history.failed_count(),
            "pipeline drained"
        );
    }
}

/// One worker: dequeue, wait out any pause, upload with retry, reconcile.
async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<WatchedFile>>>,
    context: WorkerContext,
) {
    loop {
        let next = { queue.lock().await.recv().await };
        let Some(file) = next else { break };

        context.pause.check_and_wait(&context.cancel).await;

        match process_file(&context, &file).await {
            Ok(()) => {
                info!(
                    worker = worker_id,
                    path = %file.path.display(),
                    "✅ uploaded"
                );
                context.history.record_success(&file.path);
                reconcile::finalize_success(
                    &file,
                    &context.config.watch_folder,
                    context.config.delete_after_upload,
                )
                .await;
            }
            Err(error) => {
                warn!(
                    worker = worker_id,
                    path = %file.path.display(),
                    error = %error,
                    "upload failed"
                );
                context.history.record_failure(&file.path);
                // Local read errors leave the remote side healthy; only
                // remote failures pause the whole pipeline.
                if error.is_remote() {
                    context.pause.trigger();
                }
            }
        }

        context.in_flight.release(&file.path);
    }
    debug!(worker = worker_id, "worker exiting");
}

/// Uploads one file, retrying per the policy.
async fn process_file(context: &WorkerContext, file: &WatchedFile) -> Result<(), UploadError> {
    info!(path = %file.path.display(), kind = file.kind.label(), "processing");

    // Magnet content is read once; file uploads reopen the source per attempt.
    let magnet_link = match file.kind {
        FileKind::Magnet => Some(
            tokio::fs::read_to_string(&file.path)
                .await
                .map_err(|e| UploadError::io(&file.path, e))?,
        ),
        FileKind::Torrent | FileKind::Usenet => None,
    };

    upload_with_retry(context, file, magnet_link.as_deref()).await
}

/// Retry loop around a single file's upload attempts.
///
/// Rate pacing is applied before every attempt. A `Retry-After` value from a
/// 429 response replaces the computed backoff delay for that round.
async fn upload_with_retry(
    context: &WorkerContext,
    file: &WatchedFile,
    magnet_link: Option<&str>,
) -> Result<(), UploadError> {
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        context.pacer.acquire().await;

        let result = match file.kind {
            FileKind::Magnet => {
                context
                    .client
                    .create_magnet(magnet_link.unwrap_or_default())
                    .await
            }
            FileKind::Torrent => context.client.create_torrent(&file.path).await,
            FileKind::Usenet => context.client.create_usenet(&file.path).await,
        };

        let Err(error) = result else {
            return Ok(());
        };

        let failure_type = classify_error(&error);
        let retry_after_delay = if failure_type == FailureType::RateLimited {
            retry_after_from(&error)
        } else {
            None
        };

        match context.retry_policy.should_retry(failure_type, attempt) {
            RetryDecision::Retry {
                delay: backoff_delay,
                attempt: next_attempt,
            } => {
                let delay = retry_after_delay.unwrap_or(backoff_delay);
                info!(
                    path = %file.path.display(),
                    attempt = next_attempt,
                    max_attempts = context.retry_policy.max_attempts(),
                    delay_ms = delay.as_millis(),
                    using_retry_after = retry_after_delay.is_some(),
                    error = %error,
                    "retrying upload"
                );
                tokio::select! {
                    () = context.cancel.cancelled() => return Err(error),
                    () = tokio::time::sleep(delay) => {}
                }
            }
            RetryDecision::DoNotRetry { reason } => {
                debug!(path = %file.path.display(), %reason, "not retrying upload");
                return Err(error);
            }
        }
    }
}

/// Extracts a usable Retry-After delay from a rate-limited error.
fn retry_after_from(error: &UploadError) -> Option<Duration> {
    let UploadError::HttpStatus {
        retry_after: Some(header),
        ..
    } = error
    else {
        return None;
    };
    parse_retry_after(header)
}
