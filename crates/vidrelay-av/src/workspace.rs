//! Per-source directory for segment files.
//!
//! A [`SegmentWorkspace`] names segment files by index
//! (`<stem>_<index>.<ext>`) inside a directory dedicated to one source file,
//! so every cut gets a unique output path. Only the segmenter writes here.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Directory holding the segments cut from one source file.
#[derive(Debug, Clone)]
pub struct SegmentWorkspace {
    dir: PathBuf,
    stem: String,
    extension: String,
}

impl SegmentWorkspace {
    /// Create (or reuse) `<root>/<source stem>.parts/` for segments of `source`.
    ///
    /// Segments keep the source's extension so the container is preserved.
    pub fn create(root: &Path, source: &Path) -> Result<Self> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "source".to_string());
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "mp4".to_string());

        let dir = root.join(format!("{stem}.parts"));
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create segment dir {}: {e}", dir.display()),
            ))
        })?;

        Ok(Self {
            dir,
            stem,
            extension,
        })
    }

    /// The workspace directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Output path for the segment with the given index.
    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", self.stem, index, self.extension))
    }

    /// Remove the first `count` segment files, ignoring ones that are
    /// already gone. Used to discard a partially segmented source.
    ///
    /// Returns the number of files actually removed.
    pub fn discard(&self, count: usize) -> usize {
        let mut removed = 0;
        for index in 0..count {
            let path = self.segment_path(index);
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("Failed to discard partial segment {}: {}", path.display(), e)
                }
            }
        }
        self.remove_if_empty();
        removed
    }

    /// Remove the directory if no files are left in it.
    pub fn remove_if_empty(&self) -> bool {
        std::fs::remove_dir(&self.dir).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn segment_paths_are_indexed() {
        let root = tempfile::tempdir().unwrap();
        let ws = SegmentWorkspace::create(root.path(), Path::new("/downloads/video.mp4")).unwrap();

        assert!(ws.dir().is_dir());
        assert!(ws.dir().starts_with(root.path()));
        assert_eq!(
            ws.segment_path(0).file_name().unwrap(),
            "video_0.mp4"
        );
        assert_eq!(
            ws.segment_path(12).file_name().unwrap(),
            "video_12.mp4"
        );
    }

    #[test]
    fn source_without_extension_defaults_to_mp4() {
        let root = tempfile::tempdir().unwrap();
        let ws = SegmentWorkspace::create(root.path(), Path::new("clip")).unwrap();
        assert_eq!(ws.segment_path(1).file_name().unwrap(), "clip_1.mp4");
    }

    #[test]
    fn discard_removes_partial_segments_and_dir() {
        let root = tempfile::tempdir().unwrap();
        let ws = SegmentWorkspace::create(root.path(), Path::new("movie.mkv")).unwrap();
        fs::write(ws.segment_path(0), b"a").unwrap();
        fs::write(ws.segment_path(1), b"b").unwrap();

        // Index 2 never got a file; discard must tolerate that.
        assert_eq!(ws.discard(3), 2);
        assert!(!ws.segment_path(0).exists());
        assert!(!ws.dir().exists());
    }

    #[test]
    fn remove_if_empty_keeps_non_empty_dir() {
        let root = tempfile::tempdir().unwrap();
        let ws = SegmentWorkspace::create(root.path(), Path::new("movie.mkv")).unwrap();
        fs::write(ws.segment_path(0), b"a").unwrap();
        assert!(!ws.remove_if_empty());
        assert!(ws.dir().exists());
    }
}
