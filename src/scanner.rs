//! Watch-folder scanning.
//!
//! One pass per tick: list the immediate entries of the watch folder, keep
//! the recognized descriptor files, and push them onto the dispatch queue.
//! The push awaits when the queue is full, which is what backpressures the
//! scan loop.

use std::path::Path;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::pipeline::InFlight;
use crate::watched::WatchedFile;

/// Scans the watch folder once and enqueues candidate files.
///
/// Subdirectories are ignored; so are paths already claimed in the in-flight
/// set (still queued or mid-upload from an earlier tick). Directory-read
/// errors mean an empty scan: nothing to upload this tick, no escalation.
#[instrument(skip(in_flight, queue, cancel), fields(folder = %folder.display()))]
pub async fn scan_directory(
    folder: &Path,
    in_flight: &InFlight,
    queue: &mpsc::Sender<WatchedFile>,
    cancel: &CancellationToken,
) {
    let mut entries = match tokio::fs::read_dir(folder).await {
        Ok(entries) => entries,
        Err(error) => {
            debug!(error = %error, "watch folder could not be read, skipping tick");
            return;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(error) => {
                debug!(error = %error, "directory listing interrupted");
                break;
            }
        };

        match entry.file_type().await {
            Ok(file_type) if file_type.is_dir() => continue,
            Ok(_) => {}
            Err(_) => continue,
        }

        let Some(file) = WatchedFile::classify(entry.path()) else {
            continue;
        };

        if !in_flight.try_claim(&file.path) {
            debug!(path = %file.path.display(), "already queued or uploading, skipping");
            continue;
        }

        let path = file.path.clone();
        tokio::select! {
            () = cancel.cancelled() => {
                in_flight.release(&path);
                return;
            }
            sent = queue.send(file) => {
                if sent.is_err() {
                    // Queue closed: pipeline is shutting down.
                    in_flight.release(&path);
                    return;
                }
                debug!(path = %path.display(), "enqueued for upload");
            }
        }
    }
}
