//! Classification of watch-folder entries by file extension.

use std::path::{Path, PathBuf};

/// The kind of download descriptor a watched file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// A `.torrent` metainfo file, uploaded as a streamed multipart body.
    Torrent,
    /// A `.magnet` file containing a magnet URI, uploaded as an in-memory form.
    Magnet,
    /// A `.nzb` usenet descriptor, uploaded as a streamed multipart body.
    Usenet,
}

impl FileKind {
    /// Classifies a path by its extension.
    ///
    /// Matching is exact and lowercase (`.torrent`, `.magnet`, `.nzb`);
    /// anything else returns `None` and is ignored by the scanner.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "torrent" => Some(Self::Torrent),
            "magnet" => Some(Self::Magnet),
            "nzb" => Some(Self::Usenet),
            _ => None,
        }
    }

    /// Short label used in log lines.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Torrent => "torrent",
            Self::Magnet => "magnet",
            Self::Usenet => "nzb",
        }
    }
}

/// A file picked up by the scanner, identified by absolute path.
///
/// Ephemeral: exists only while flowing through the dispatch queue,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedFile {
    /// Full path inside the watch folder.
    pub path: PathBuf,
    /// Descriptor kind derived from the extension.
    pub kind: FileKind,
}

impl WatchedFile {
    /// Builds a `WatchedFile` if the path has a recognized extension.
    #[must_use]
    pub fn classify(path: PathBuf) -> Option<Self> {
        let kind = FileKind::from_path(&path)?;
        Some(Self { path, kind })
    }

    /// The filename stem, used as the `name` form field for usenet uploads
    /// (`example.nzb` → `example`).
    #[must_use]
    pub fn name_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_torrent() {
        assert_eq!(
            FileKind::from_path(Path::new("/watch/linux.torrent")),
            Some(FileKind::Torrent)
        );
    }

    #[test]
    fn test_from_path_magnet() {
        assert_eq!(
            FileKind::from_path(Path::new("/watch/movie.magnet")),
            Some(FileKind::Magnet)
        );
    }

    #[test]
    fn test_from_path_nzb() {
        assert_eq!(
            FileKind::from_path(Path::new("/watch/release.nzb")),
            Some(FileKind::Usenet)
        );
    }

    #[test]
    fn test_from_path_unrecognized() {
        assert_eq!(FileKind::from_path(Path::new("/watch/notes.txt")), None);
        assert_eq!(FileKind::from_path(Path::new("/watch/noext")), None);
    }

    #[test]
    fn test_from_path_uppercase_not_matched() {
        // Matching is exact; .TORRENT is not picked up.
        assert_eq!(FileKind::from_path(Path::new("/watch/a.TORRENT")), None);
    }

    #[test]
    fn test_classify_returns_watched_file() {
        let file = WatchedFile::classify(PathBuf::from("/watch/a.nzb")).unwrap();
        assert_eq!(file.kind, FileKind::Usenet);
        assert_eq!(file.path, PathBuf::from("/watch/a.nzb"));
    }

    #[test]
    fn test_classify_rejects_unknown_extension() {
        assert!(WatchedFile::classify(PathBuf::from("/watch/a.iso")).is_none());
    }

    #[test]
    fn test_name_stem_strips_extension() {
        let file = WatchedFile::classify(PathBuf::from("/watch/example.nzb")).unwrap();
        assert_eq!(file.name_stem(), "example");
    }

    #[test]
    fn test_name_stem_keeps_inner_dots() {
        let file = WatchedFile::classify(PathBuf::from("/watch/show.s01e02.nzb")).unwrap();
        assert_eq!(file.name_stem(), "show.s01e02");
    }
}
