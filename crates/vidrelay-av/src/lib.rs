//! # vidrelay-av
//!
//! External media tool layer for vidrelay.
//!
//! This crate provides:
//!
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support and line streaming for running external processes.
//! - **Tool discovery** ([`check_tools`], [`get_tool_path`]) -- find ffmpeg,
//!   ffprobe and yt-dlp.
//! - **Probing** ([`MediaProbe`], [`FfprobeProber`]) -- duration, exact size
//!   and resolution of a media file.
//! - **Cutting** ([`Cutter`], [`FfmpegCutter`]) -- stream-copy extraction of
//!   one time range into one file, no re-encoding.
//! - **Segment workspace** ([`SegmentWorkspace`]) -- index-named output paths
//!   for the segments of one source.
//!
//! ## Example
//!
//! ```no_run
//! use vidrelay_av::{FfprobeProber, MediaProbe};
//! use std::path::Path;
//!
//! # async fn example() -> vidrelay_av::Result<()> {
//! let prober = FfprobeProber::from_path().expect("ffprobe on PATH");
//! let media = prober.probe(Path::new("/path/to/video.mp4")).await?;
//! println!("{:.1}s, {} bytes", media.duration_seconds, media.size_bytes);
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod cut;
mod error;
pub mod probe;
pub mod tools;
pub mod workspace;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use cut::{Cutter, FfmpegCutter, TimeRange};
pub use error::{Error, Result};
pub use probe::{FfprobeProber, MediaDescriptor, MediaProbe, VideoStream};
pub use tools::{check_tool, check_tools, get_tool_path, require_tool, ToolInfo};
pub use workspace::SegmentWorkspace;
