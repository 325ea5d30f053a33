//! Splitting oversized media into stream-copied segments.
//!
//! [`SegmentPlan`] decides the ranges; [`Segmenter`] probes the source and
//! drives a [`Cutter`] over those ranges, one at a time, in order.

mod plan;

pub use plan::{chunk_duration, SegmentPlan};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use vidrelay_av::{Cutter, MediaDescriptor, MediaProbe, SegmentWorkspace, TimeRange};

use crate::config::SplitConfig;
use crate::error::{Error, Result};

/// One time-range extract of a source, stored as its own file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// Zero-based position in playback order.
    pub index: usize,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub output_path: PathBuf,
    /// Set once the transfer channel confirmed delivery.
    pub uploaded: bool,
    /// Set once the local file was removed after upload.
    pub deleted: bool,
}

impl Segment {
    fn new(index: usize, range: TimeRange, output_path: PathBuf) -> Self {
        Self {
            index,
            start_seconds: range.start,
            end_seconds: range.end,
            output_path,
            uploaded: false,
            deleted: false,
        }
    }

    /// The whole source as a single item, for files that need no split.
    pub fn whole(media: &MediaDescriptor) -> Self {
        Self::new(
            0,
            TimeRange::new(0.0, media.duration_seconds),
            media.source_path.clone(),
        )
    }

    pub fn duration_seconds(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Cuts a source into segments of roughly `target_max_bytes` each.
#[derive(Clone)]
pub struct Segmenter {
    probe: Arc<dyn MediaProbe>,
    cutter: Arc<dyn Cutter>,
    target_max_bytes: u64,
    overlap_seconds: u64,
}

impl Segmenter {
    pub fn new(
        probe: Arc<dyn MediaProbe>,
        cutter: Arc<dyn Cutter>,
        target_max_bytes: u64,
        overlap_seconds: u64,
    ) -> Self {
        Self {
            probe,
            cutter,
            target_max_bytes,
            overlap_seconds,
        }
    }

    pub fn from_config(
        config: &SplitConfig,
        probe: Arc<dyn MediaProbe>,
        cutter: Arc<dyn Cutter>,
    ) -> Self {
        Self::new(probe, cutter, config.target_max_bytes, config.overlap_seconds)
    }

    pub fn target_max_bytes(&self) -> u64 {
        self.target_max_bytes
    }

    /// Probe `source` and cut it if it exceeds the target size.
    ///
    /// Returns `Ok(None)` when no split is needed.
    ///
    /// # Errors
    ///
    /// - [`Error::Probe`] if the source cannot be probed.
    /// - [`Error::Plan`] if the chunk length would not exceed the overlap;
    ///   no cut is attempted.
    /// - [`Error::Segmentation`] if a cut fails. Segments cut before the
    ///   failure are left on disk; discarding them is the caller's job
    ///   (see [`SegmentWorkspace::discard`]).
    pub async fn plan(
        &self,
        source: &Path,
        workspace: &SegmentWorkspace,
    ) -> Result<Option<Vec<Segment>>> {
        let media = self.probe.probe(source).await?;
        self.plan_media(&media, workspace).await
    }

    /// Like [`Segmenter::plan`] for an already probed source.
    pub async fn plan_media(
        &self,
        media: &MediaDescriptor,
        workspace: &SegmentWorkspace,
    ) -> Result<Option<Vec<Segment>>> {
        let Some(plan) = self.plan_for(media)? else {
            tracing::debug!(
                "{} fits in {} bytes; no split needed",
                media.source_path.display(),
                self.target_max_bytes
            );
            return Ok(None);
        };

        self.cut(media, &plan, workspace).await.map(Some)
    }

    /// Compute the plan for `media` without cutting anything.
    pub fn plan_for(&self, media: &MediaDescriptor) -> Result<Option<SegmentPlan>> {
        SegmentPlan::for_media(media, self.target_max_bytes, self.overlap_seconds)
    }

    /// Cut every range of `plan`, in order, into `workspace`.
    pub async fn cut(
        &self,
        media: &MediaDescriptor,
        plan: &SegmentPlan,
        workspace: &SegmentWorkspace,
    ) -> Result<Vec<Segment>> {
        let ranges = plan.ranges();
        tracing::info!(
            "Splitting {} ({:.1}s, {} bytes) into {} segments of {}s with {}s overlap",
            media.source_path.display(),
            media.duration_seconds,
            media.size_bytes,
            ranges.len(),
            plan.chunk_duration_seconds(),
            plan.overlap_seconds()
        );

        let mut segments = Vec::with_capacity(ranges.len());
        for (index, range) in ranges.into_iter().enumerate() {
            range
                .check_within(media.duration_seconds)
                .map_err(|source| Error::Segmentation { index, source })?;

            let output = workspace.segment_path(index);
            self.cutter
                .cut(&media.source_path, range, &output)
                .await
                .map_err(|source| Error::Segmentation { index, source })?;

            tracing::debug!("Segment {} {} -> {}", index, range, output.display());
            segments.push(Segment::new(index, range, output));
        }

        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_duration() {
        let seg = Segment::new(1, TimeRange::new(162.0, 330.0), PathBuf::from("v_1.mp4"));
        assert_eq!(seg.duration_seconds(), 168.0);
        assert!(!seg.uploaded);
        assert!(!seg.deleted);
    }
}
