//! Media information types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Immutable facts about a media file, as needed to plan a split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Path the descriptor was computed from.
    pub source_path: PathBuf,
    /// Total duration in seconds (fractional).
    pub duration_seconds: f64,
    /// Exact size on disk in bytes.
    pub size_bytes: u64,
    /// Container format name as reported by the prober.
    pub container: String,
    /// First video stream, if any.
    pub video: Option<VideoStream>,
}

impl MediaDescriptor {
    /// Average bytes per second of playback.
    pub fn byte_rate(&self) -> f64 {
        self.size_bytes as f64 / self.duration_seconds
    }

    /// Resolution of the primary video stream, `(0, 0)` for audio-only files.
    pub fn resolution(&self) -> (u32, u32) {
        self.video
            .as_ref()
            .map(|v| (v.width, v.height))
            .unwrap_or((0, 0))
    }
}

/// Information about a video stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStream {
    /// Video codec (e.g. "h264").
    pub codec: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(video: Option<VideoStream>) -> MediaDescriptor {
        MediaDescriptor {
            source_path: PathBuf::from("video.mp4"),
            duration_seconds: 330.0,
            size_bytes: 2_000_000_000,
            container: "mov,mp4,m4a,3gp,3g2,mj2".into(),
            video,
        }
    }

    #[test]
    fn byte_rate_is_size_over_duration() {
        let d = descriptor(None);
        assert!((d.byte_rate() - 6_060_606.06).abs() < 0.01);
    }

    #[test]
    fn resolution_defaults_to_zero_without_video() {
        assert_eq!(descriptor(None).resolution(), (0, 0));
        let d = descriptor(Some(VideoStream {
            codec: "h264".into(),
            width: 1280,
            height: 720,
        }));
        assert_eq!(d.resolution(), (1280, 720));
    }
}
