//! Chunk sizing and range computation.

use serde::Serialize;
use vidrelay_av::{MediaDescriptor, TimeRange};

use crate::error::{Error, Result};

/// How a source is cut: fixed chunk length, fixed overlap, known total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentPlan {
    chunk_duration_seconds: u64,
    overlap_seconds: u64,
    total_duration_seconds: f64,
}

impl SegmentPlan {
    /// Build a plan, rejecting chunk lengths that could never advance.
    ///
    /// `total_duration_seconds` is expected to come from a successful probe,
    /// which guarantees it is positive.
    ///
    /// # Errors
    ///
    /// [`Error::Plan`] when `chunk_duration_seconds <= overlap_seconds`.
    pub fn new(
        chunk_duration_seconds: u64,
        overlap_seconds: u64,
        total_duration_seconds: f64,
    ) -> Result<Self> {
        if chunk_duration_seconds <= overlap_seconds {
            return Err(Error::Plan {
                chunk_seconds: chunk_duration_seconds,
                overlap_seconds,
            });
        }
        Ok(Self {
            chunk_duration_seconds,
            overlap_seconds,
            total_duration_seconds,
        })
    }

    /// Plan a split of `media` into pieces of roughly `target_max_bytes`.
    ///
    /// Returns `Ok(None)` when the file already fits.
    pub fn for_media(
        media: &MediaDescriptor,
        target_max_bytes: u64,
        overlap_seconds: u64,
    ) -> Result<Option<Self>> {
        if media.size_bytes <= target_max_bytes {
            return Ok(None);
        }

        let chunk = chunk_duration(media.duration_seconds, media.size_bytes, target_max_bytes);
        Self::new(chunk, overlap_seconds, media.duration_seconds).map(Some)
    }

    pub fn chunk_duration_seconds(&self) -> u64 {
        self.chunk_duration_seconds
    }

    pub fn overlap_seconds(&self) -> u64 {
        self.overlap_seconds
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.total_duration_seconds
    }

    /// Upper bound on the number of ranges this plan produces.
    pub fn max_iterations(&self) -> usize {
        let step = (self.chunk_duration_seconds - self.overlap_seconds) as f64;
        (self.total_duration_seconds / step).ceil() as usize + 1
    }

    /// The ordered ranges covering `[0, total]`.
    ///
    /// Ends advance on the chunk grid (`chunk`, `2*chunk`, ...) clamped to the
    /// total; every range after the first starts `overlap` seconds before the
    /// previous end. The loop stops once a range ends exactly at the total.
    pub fn ranges(&self) -> Vec<TimeRange> {
        let chunk = self.chunk_duration_seconds as f64;
        let overlap = self.overlap_seconds as f64;
        let total = self.total_duration_seconds;
        let bound = self.max_iterations();

        let mut ranges = Vec::new();
        let mut start = 0.0_f64;
        let mut end = chunk.min(total);

        loop {
            ranges.push(TimeRange::new(start, end));
            if end >= total || ranges.len() >= bound {
                break;
            }
            start = (end - overlap).max(0.0);
            end = (end + chunk).min(total);
        }

        debug_assert_eq!(ranges.last().map(|r| r.end), Some(total));
        ranges
    }
}

/// Seconds of playback that fit in `target_max_bytes` at the file's average
/// byte rate: `floor(target / (size / duration))`.
///
/// Multiplying before dividing keeps exact boundaries exact
/// (`1e9 * 330 / 2e9` is 165, `1e9 / (2e9 / 330)` is 164.99...).
pub fn chunk_duration(duration_seconds: f64, size_bytes: u64, target_max_bytes: u64) -> u64 {
    let chunk = (target_max_bytes as f64 * duration_seconds / size_bytes as f64).floor();
    if chunk.is_finite() && chunk > 0.0 {
        chunk as u64
    } else {
        0
    }
}
