//! Post-upload reconciliation of the watch folder.
//!
//! Decides what happens to a source file once its upload succeeded: usenet
//! descriptors move into `uploaded/`, torrent and magnet files are deleted
//! when delete-after-upload is enabled, everything else stays put. All
//! filesystem errors here are warnings only; the upload itself already
//! succeeded and must not be reported as failed.

use std::path::Path;

use tracing::{info, warn};

use crate::watched::{FileKind, WatchedFile};

/// Name of the subdirectory completed usenet files are moved into.
pub const UPLOADED_DIR: &str = "uploaded";

/// Applies the per-kind success policy to a freshly uploaded file.
pub async fn finalize_success(file: &WatchedFile, watch_folder: &Path, delete_after_upload: bool) {
    match file.kind {
        FileKind::Usenet => move_to_uploaded(watch_folder, &file.path).await,
        FileKind::Torrent | FileKind::Magnet => {
            if delete_after_upload {
                delete_source(&file.path).await;
            }
        }
    }
}

/// Moves a completed usenet file into the `uploaded/` subdirectory,
/// creating it on demand.
pub async fn move_to_uploaded(watch_folder: &Path, path: &Path) {
    let uploaded_dir = watch_folder.join(UPLOADED_DIR);

    if let Err(error) = tokio::fs::create_dir_all(&uploaded_dir).await {
        warn!(
            dir = %uploaded_dir.display(),
            error = %error,
            "failed to create uploaded folder"
        );
        return;
    }

    let Some(file_name) = path.file_name() else {
        warn!(path = %path.display(), "path has no file name, leaving in place");
        return;
    };
    let destination = uploaded_dir.join(file_name);

    match tokio::fs::rename(path, &destination).await {
        Ok(()) => info!(to = %destination.display(), "✅ moved NZB into uploaded/"),
        Err(error) => warn!(
            from = %path.display(),
            to = %destination.display(),
            error = %error,
            "failed to move uploaded NZB"
        ),
    }
}

async fn delete_source(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!(path = %path.display(), "removed source file after upload"),
        Err(error) => warn!(
            path = %path.display(),
            error = %error,
            "failed to remove source file after upload"
        ),
    }
}
