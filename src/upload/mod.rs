//! Size check, conditional split, sequential transfer and cleanup.

mod channel;

pub use channel::{RemoteRef, TextNotifier, TransferChannel, TransferMetadata};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use vidrelay_av::{MediaProbe, SegmentWorkspace};

use crate::error::{Error, Result};
use crate::split::{Segment, Segmenter};

/// Progress callback type: percent done and a step description.
pub type ProgressCallback = Box<dyn Fn(f32, &str) + Send + Sync>;

/// Where an item ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    Uploading,
    Sent,
    Failed,
}

/// Result of one upload attempt. Only a successful record allows the local
/// file to be deleted.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub index: usize,
    pub remote: Option<RemoteRef>,
}

impl TransferRecord {
    pub fn is_success(&self) -> bool {
        self.remote.is_some()
    }
}

/// Final state of one transferred item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub segment: Segment,
    pub state: ItemState,
    pub remote: Option<RemoteRef>,
}

/// What a [`UploadPipeline::run`] achieved.
#[derive(Debug)]
pub struct RunSummary {
    pub source: PathBuf,
    /// Whether the source was split into segments.
    pub split: bool,
    /// Every item in index order.
    pub items: Vec<ItemReport>,
    /// Items whose transfer failed, in index order.
    pub failures: Vec<(usize, Error)>,
    /// Uploaded items whose local file could not be removed.
    pub cleanup_failures: Vec<(usize, Error)>,
}

impl RunSummary {
    pub fn segments_sent(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.state == ItemState::Sent)
            .count()
    }

    pub fn sent_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .filter(|i| i.state == ItemState::Sent)
            .map(|i| i.segment.index)
            .collect()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|(index, _)| *index).collect()
    }

    /// True when every item was delivered. Cleanup failures do not count.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.items.is_empty()
    }
}

/// Drives one media file from disk to the transfer channel.
pub struct UploadPipeline {
    probe: Arc<dyn MediaProbe>,
    segmenter: Segmenter,
    channel: Arc<dyn TransferChannel>,
    notifier: Arc<dyn TextNotifier>,
    destination: String,
    work_dir: PathBuf,
    progress_callback: Option<ProgressCallback>,
    keep_source: bool,
}

impl UploadPipeline {
    pub fn new(
        probe: Arc<dyn MediaProbe>,
        segmenter: Segmenter,
        channel: Arc<dyn TransferChannel>,
        notifier: Arc<dyn TextNotifier>,
        destination: impl Into<String>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            probe,
            segmenter,
            channel,
            notifier,
            destination: destination.into(),
            work_dir: work_dir.into(),
            progress_callback: None,
            keep_source: false,
        }
    }

    /// Leave an unsplit source on disk after it is uploaded. Segments are
    /// always removed once confirmed.
    pub fn keep_source(mut self, keep: bool) -> Self {
        self.keep_source = keep;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn report_progress(&self, progress: f32, step: &str) {
        if let Some(ref cb) = self.progress_callback {
            cb(progress, step);
        }
        tracing::info!("[{:.0}%] {}", progress, step);
    }

    /// Upload `media_path`, splitting it first if it exceeds the target size.
    ///
    /// The caption, if any, is posted once before the first transfer. Items
    /// are sent strictly in index order, each at most once; a failed transfer
    /// is recorded and the next item is still attempted. Every confirmed
    /// item's local file is removed, including an unsplit source unless
    /// [`UploadPipeline::keep_source`] is set.
    ///
    /// # Errors
    ///
    /// Probe, plan and segmentation failures abort the run before anything
    /// is uploaded; partially cut segments are discarded first.
    pub async fn run(
        &self,
        media_path: &Path,
        caption: Option<&str>,
        thumbnail: Option<&Path>,
    ) -> Result<RunSummary> {
        let media = self.probe.probe(media_path).await?;

        let (segments, workspace) = match self.segmenter.plan_for(&media)? {
            None => (vec![Segment::whole(&media)], None),
            Some(plan) => {
                let workspace = SegmentWorkspace::create(&self.work_dir, media_path)?;
                match self.segmenter.cut(&media, &plan, &workspace).await {
                    Ok(segments) => (segments, Some(workspace)),
                    Err(e) => {
                        let produced = match &e {
                            Error::Segmentation { index, .. } => index + 1,
                            _ => plan.max_iterations(),
                        };
                        let removed = workspace.discard(produced);
                        tracing::warn!(
                            "Segmentation of {} failed, discarded {} partial segments: {}",
                            media_path.display(),
                            removed,
                            e
                        );
                        return Err(e);
                    }
                }
            }
        };

        if let Some(text) = caption {
            if let Err(e) = self.notifier.post(&self.destination, text).await {
                tracing::warn!("Failed to post caption for {}: {}", media_path.display(), e);
            }
        }

        let (width, height) = media.resolution();
        let total = segments.len();
        let mut summary = RunSummary {
            source: media_path.to_path_buf(),
            split: workspace.is_some(),
            items: Vec::with_capacity(total),
            failures: Vec::new(),
            cleanup_failures: Vec::new(),
        };

        for mut segment in segments {
            let index = segment.index;
            let mut state = ItemState::Pending;
            let metadata = TransferMetadata {
                thumbnail: thumbnail.map(Path::to_path_buf),
                duration_seconds: segment.duration_seconds().round() as u64,
                width,
                height,
            };

            state = transition(index, state, ItemState::Uploading);
            self.report_progress(
                index as f32 / total as f32 * 100.0,
                &format!("Uploading {}/{}: {}", index + 1, total, segment.output_path.display()),
            );

            let record = match self
                .channel
                .send(&self.destination, &segment.output_path, &metadata)
                .await
            {
                Ok(remote) => TransferRecord {
                    index,
                    remote: Some(remote),
                },
                Err(e) => {
                    tracing::warn!("Upload of item {} via {} failed: {}", index, self.channel.name(), e);
                    summary.failures.push((index, e));
                    TransferRecord {
                        index,
                        remote: None,
                    }
                }
            };

            if record.is_success() {
                state = transition(index, state, ItemState::Sent);
                segment.uploaded = true;
                if workspace.is_none() && self.keep_source {
                    tracing::debug!("Keeping source {}", segment.output_path.display());
                } else {
                    match tokio::fs::remove_file(&segment.output_path).await {
                        Ok(()) => segment.deleted = true,
                        Err(source) => {
                            let err = Error::Cleanup {
                                path: segment.output_path.clone(),
                                source,
                            };
                            tracing::warn!("{}", err);
                            summary.cleanup_failures.push((index, err));
                        }
                    }
                }
            } else {
                state = transition(index, state, ItemState::Failed);
            }

            summary.items.push(ItemReport {
                segment,
                state,
                remote: record.remote,
            });
        }

        if let Some(workspace) = workspace {
            workspace.remove_if_empty();
        }

        self.report_progress(
            100.0,
            &format!(
                "Finished {}: {} sent, {} failed",
                media_path.display(),
                summary.segments_sent(),
                summary.failures.len()
            ),
        );

        Ok(summary)
    }
}

fn transition(index: usize, from: ItemState, to: ItemState) -> ItemState {
    tracing::debug!("item {}: {:?} -> {:?}", index, from, to);
    to
}
