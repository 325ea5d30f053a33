//! FFprobe-based media probing.

use super::types::*;
use super::MediaProbe;
use crate::command::{ToolCommand, DEFAULT_TIMEOUT};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self {
            ffprobe_path,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a prober that finds ffprobe on `PATH`.
    pub fn from_path() -> Option<Self> {
        which::which("ffprobe").ok().map(Self::new)
    }

    /// Override the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl MediaProbe for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> Result<MediaDescriptor> {
        // Exact byte size comes from the filesystem, not from ffprobe's
        // container-level estimate.
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| Error::probe(path, format!("cannot stat file: {e}")))?;
        if !metadata.is_file() {
            return Err(Error::probe(path, "not a regular file"));
        }

        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.timeout(self.timeout);
        cmd.args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());

        let output = match cmd.execute().await {
            Ok(output) => output,
            Err(e @ (Error::Timeout { .. } | Error::ToolNotFound { .. })) => return Err(e),
            Err(e) => return Err(Error::probe(path, e.to_string())),
        };

        let ff: FfprobeOutput = serde_json::from_str(&output.stdout)
            .map_err(|e| Error::probe(path, format!("ffprobe JSON parse error: {e}")))?;

        parse_ffprobe_output(path, metadata.len(), ff)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_ffprobe_output(path: &Path, size_bytes: u64, output: FfprobeOutput) -> Result<MediaDescriptor> {
    let media_streams: Vec<&FfprobeStream> = output
        .streams
        .iter()
        .filter(|s| matches!(s.codec_type.as_deref(), Some("video") | Some("audio")))
        .collect();

    if media_streams.is_empty() {
        return Err(Error::probe(path, "no audio or video stream found"));
    }

    // Container duration first; fall back to the longest stream.
    let duration = output
        .format
        .as_ref()
        .and_then(|f| parse_seconds(f.duration.as_deref()))
        .or_else(|| {
            media_streams
                .iter()
                .filter_map(|s| parse_seconds(s.duration.as_deref()))
                .reduce(f64::max)
        })
        .ok_or_else(|| Error::probe(path, "no positive duration reported"))?;

    if size_bytes == 0 {
        return Err(Error::probe(path, "file is empty"));
    }

    let video = media_streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .map(|s| VideoStream {
            codec: s.codec_name.clone().unwrap_or_default(),
            width: s.width.unwrap_or(0),
            height: s.height.unwrap_or(0),
        });

    Ok(MediaDescriptor {
        source_path: path.to_path_buf(),
        duration_seconds: duration,
        size_bytes,
        container: output
            .format
            .and_then(|f| f.format_name)
            .unwrap_or_default(),
        video,
    })
}

fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}
