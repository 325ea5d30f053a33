//! Relays every pending link: fetch, download, upload, record.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::caption;
use crate::error::{Error, Result};
use crate::remote::{
    download_file, DownloadProgress, RemoteDownloader, RemoteMetadataFetcher,
};
use crate::source::{LinkFile, PendingLink, ProgressLog};
use crate::upload::{RunSummary, UploadPipeline};

/// Outcome of one [`Relay::run`].
#[derive(Debug, Default)]
pub struct RelayReport {
    /// Links fully delivered and recorded in the progress log.
    pub completed: Vec<PendingLink>,
    /// Links that failed, with the reason.
    pub failed: Vec<(PendingLink, String)>,
    /// Links left untouched because the run stopped early.
    pub not_attempted: Vec<PendingLink>,
}

impl RelayReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.not_attempted.is_empty()
    }
}

pub struct Relay {
    fetcher: Arc<dyn RemoteMetadataFetcher>,
    downloader: Arc<dyn RemoteDownloader>,
    pipeline: UploadPipeline,
    http: reqwest::Client,
    links: LinkFile,
    progress: ProgressLog,
    download_dir: PathBuf,
}

impl Relay {
    pub fn new(
        fetcher: Arc<dyn RemoteMetadataFetcher>,
        downloader: Arc<dyn RemoteDownloader>,
        pipeline: UploadPipeline,
        links: LinkFile,
        progress: ProgressLog,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            downloader,
            pipeline,
            http: reqwest::Client::new(),
            links,
            progress,
            download_dir: download_dir.into(),
        }
    }

    /// Process every link not yet in the progress log, in list order.
    ///
    /// A failing link is logged and the next one is attempted. A rate limit
    /// stops the run, since every following request would be refused too.
    ///
    /// # Errors
    ///
    /// Only when the link list or progress log cannot be read.
    pub async fn run(&self) -> Result<RelayReport> {
        let completed = self.progress.completed()?;
        let pending = self.links.read_pending(&completed)?;
        tracing::info!(
            "{} links pending ({} already relayed)",
            pending.len(),
            completed.len()
        );

        let mut report = RelayReport::default();
        let mut remaining = pending.into_iter();

        while let Some(link) = remaining.next() {
            tracing::info!("Relaying #{}: {}", link.index, link.reference);
            match self.relay_one(&link).await {
                Ok(summary) if summary.is_complete() => {
                    if let Err(e) = self.progress.append(link.index, &link.reference) {
                        tracing::error!("Failed to record #{} as relayed: {}", link.index, e);
                    }
                    tracing::info!(
                        "Relayed #{} ({} item(s))",
                        link.index,
                        summary.segments_sent()
                    );
                    report.completed.push(link);
                }
                Ok(summary) => {
                    let reason = format!(
                        "items {:?} failed to upload",
                        summary.failed_indices()
                    );
                    tracing::warn!("#{} incomplete: {}", link.index, reason);
                    report.failed.push((link, reason));
                }
                Err(e @ Error::RateLimit { .. }) => {
                    tracing::error!("Stopping at #{}: {}", link.index, e);
                    report.failed.push((link, e.to_string()));
                    report.not_attempted.extend(remaining.by_ref());
                    break;
                }
                Err(e) => {
                    tracing::warn!("#{} failed: {}", link.index, e);
                    report.failed.push((link, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Relay a single link. Local downloads are removed afterwards whatever
    /// the outcome; segments that failed to upload stay in the work dir.
    pub async fn relay_one(&self, link: &PendingLink) -> Result<RunSummary> {
        let metadata = self.fetcher.fetch(&link.reference).await?;
        let progress = download_logger(link.index);
        let media_path = self
            .downloader
            .download(&link.reference, &self.download_dir, Some(&progress))
            .await?;

        let thumbnail = match metadata.thumbnail_url {
            Some(ref url) => self.fetch_thumbnail(url, &media_path).await,
            None => None,
        };

        let caption = caption::compose(link.index, &metadata);
        let result = self
            .pipeline
            .run(&media_path, Some(&caption), thumbnail.as_deref())
            .await;

        remove_if_present(&media_path).await;
        if let Some(ref thumb) = thumbnail {
            remove_if_present(thumb).await;
        }

        result
    }

    async fn fetch_thumbnail(&self, url: &str, media_path: &Path) -> Option<PathBuf> {
        let path = media_path.with_extension("thumb.jpg");
        match download_file(&self.http, url, &path).await {
            Ok(_) => Some(path),
            Err(e) => {
                tracing::warn!("Continuing without thumbnail: {}", e);
                None
            }
        }
    }
}

/// Log download progress at every 10% step.
fn download_logger(index: usize) -> DownloadProgress {
    let last_step = AtomicU64::new(0);
    Box::new(move |downloaded, total| {
        let Some(total) = total.filter(|t| *t > 0) else {
            return;
        };
        let step = downloaded.saturating_mul(10) / total;
        if step > last_step.fetch_max(step, Ordering::Relaxed) {
            tracing::info!(
                "#{} downloaded {}% ({} / {} bytes)",
                index,
                step * 10,
                downloaded,
                total
            );
        }
    })
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}
