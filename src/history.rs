//! In-memory upload history for observability.
//!
//! Tracks which paths failed or were processed and when. Owned by the
//! pipeline and shared into workers by `Arc`; entries live for the process
//! lifetime and are never consulted to schedule retries.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use dashmap::DashMap;

/// Failure and success records keyed by file path.
#[derive(Debug, Default)]
pub struct UploadHistory {
    failed: DashMap<PathBuf, SystemTime>,
    processed: DashMap<PathBuf, SystemTime>,
}

impl UploadHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the time of a path's most recent failed upload.
    pub fn record_failure(&self, path: &Path) {
        self.failed.insert(path.to_path_buf(), SystemTime::now());
    }

    /// Records the time a path was successfully processed.
    pub fn record_success(&self, path: &Path) {
        self.processed.insert(path.to_path_buf(), SystemTime::now());
    }

    /// Timestamp of the last recorded failure for a path.
    #[must_use]
    pub fn last_failure(&self, path: &Path) -> Option<SystemTime> {
        self.failed.get(path).map(|entry| *entry.value())
    }

    /// Timestamp of the last recorded success for a path.
    #[must_use]
    pub fn last_success(&self, path: &Path) -> Option<SystemTime> {
        self.processed.get(path).map(|entry| *entry.value())
    }

    /// Number of distinct paths with a recorded failure.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Number of distinct paths processed successfully.
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_history_is_empty() {
        let history = UploadHistory::new();
        assert_eq!(history.failed_count(), 0);
        assert_eq!(history.processed_count(), 0);
        assert!(history.last_failure(Path::new("/watch/a.nzb")).is_none());
    }

    #[test]
    fn test_record_failure_tracks_path_and_time() {
        let history = UploadHistory::new();
        let before = SystemTime::now();
        history.record_failure(Path::new("/watch/a.torrent"));

        let recorded = history.last_failure(Path::new("/watch/a.torrent")).unwrap();
        assert!(recorded >= before);
        assert_eq!(history.failed_count(), 1);
    }

    #[test]
    fn test_repeat_failure_overwrites_timestamp_not_count() {
        let history = UploadHistory::new();
        history.record_failure(Path::new("/watch/a.torrent"));
        let first = history.last_failure(Path::new("/watch/a.torrent")).unwrap();

        history.record_failure(Path::new("/watch/a.torrent"));
        let second = history.last_failure(Path::new("/watch/a.torrent")).unwrap();

        assert!(second >= first);
        assert_eq!(history.failed_count(), 1);
    }

    #[test]
    fn test_success_and_failure_tracked_independently() {
        let history = UploadHistory::new();
        history.record_success(Path::new("/watch/a.nzb"));
        history.record_failure(Path::new("/watch/b.magnet"));

        assert_eq!(history.processed_count(), 1);
        assert_eq!(history.failed_count(), 1);
        assert!(history.last_success(Path::new("/watch/a.nzb")).is_some());
        assert!(history.last_failure(Path::new("/watch/a.nzb")).is_none());
    }
}
