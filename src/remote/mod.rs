//! Remote video collaborators: metadata lookup and download.

mod http;
mod ytdlp;

pub use http::download_file;
pub use ytdlp::YtDlp;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Called with `(bytes_downloaded, total_bytes)` as a download advances.
/// `total_bytes` is `None` while the size is unknown.
pub type DownloadProgress = Box<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Descriptive metadata of a remote video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub duration_seconds: u64,
    pub thumbnail_url: Option<String>,
    pub description: String,
    pub likes: Option<u64>,
    pub canonical_url: String,
    /// Upload date as reported by the source, `YYYYMMDD`.
    pub upload_date: Option<String>,
}

/// Resolves a video reference to its metadata.
#[async_trait]
pub trait RemoteMetadataFetcher: Send + Sync {
    /// # Errors
    ///
    /// [`crate::Error::NotFound`] for unavailable videos,
    /// [`crate::Error::RateLimit`] when the source throttles us.
    async fn fetch(&self, reference: &str) -> Result<VideoMetadata>;
}

/// Downloads a video reference to local disk.
#[async_trait]
pub trait RemoteDownloader: Send + Sync {
    /// Download into `dest_dir`, returning the path of the finished file.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Network`] when the transfer fails.
    async fn download(
        &self,
        reference: &str,
        dest_dir: &Path,
        progress: Option<&DownloadProgress>,
    ) -> Result<PathBuf>;
}
