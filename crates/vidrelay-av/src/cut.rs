//! Time-range extraction with ffmpeg stream copy.
//!
//! A [`Cutter`] turns one `[start, end)` range of an input file into one
//! output file without re-encoding. [`FfmpegCutter`] is the subprocess
//! backend; the trait lets a native binding replace it without touching the
//! segmentation algorithm.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::command::{ToolCommand, DEFAULT_TIMEOUT};
use crate::{Error, Result};

/// Tolerance when comparing a range end against the probed duration.
/// ffprobe reports durations to the microsecond.
const DURATION_EPSILON: f64 = 1e-6;

/// A half-open `[start, end)` range in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the range in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Validate the range against a source of `total` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cut`] carrying this range when it is empty, inverted,
    /// starts before zero or ends past the source.
    pub fn check_within(&self, total: f64) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(Error::cut(*self, "range bounds must be finite"));
        }
        if self.start < 0.0 {
            return Err(Error::cut(*self, "start is negative"));
        }
        if self.start >= self.end {
            return Err(Error::cut(*self, "start must be before end"));
        }
        if self.end > total + DURATION_EPSILON {
            return Err(Error::cut(
                *self,
                format!("end exceeds source duration {total:.3}s"),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s, {:.3}s)", self.start, self.end)
    }
}

/// A single stream-copy extraction of one time range into one file.
#[async_trait]
pub trait Cutter: Send + Sync {
    /// Backend name, used in logs.
    fn name(&self) -> &'static str;

    /// Extract `range` of `input` into `output`.
    ///
    /// On failure a partial file may exist at `output`; callers must not
    /// assume its absence.
    async fn cut(&self, input: &Path, range: TimeRange, output: &Path) -> Result<()>;
}

/// [`Cutter`] backed by the `ffmpeg` CLI with `-c copy`.
#[derive(Debug, Clone)]
pub struct FfmpegCutter {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl FfmpegCutter {
    /// Create a cutter using the given ffmpeg binary.
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a cutter that finds ffmpeg on `PATH`.
    pub fn from_path() -> Option<Self> {
        which::which("ffmpeg").ok().map(Self::new)
    }

    /// Override the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the ffmpeg invocation for one range.
    ///
    /// Seeking is done as an output option so the cut starts at the
    /// requested timestamp instead of the preceding keyframe of the input.
    pub fn command(&self, input: &Path, range: TimeRange, output: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.ffmpeg_path.clone());
        cmd.timeout(self.timeout);
        cmd.args(["-hide_banner", "-nostdin", "-y", "-i"]);
        cmd.arg(input.to_string_lossy().as_ref());
        cmd.args(["-ss", &format_seconds(range.start)]);
        cmd.args(["-to", &format_seconds(range.end)]);
        cmd.args(["-map", "0", "-c", "copy", "-avoid_negative_ts", "make_zero"]);
        cmd.arg(output.to_string_lossy().as_ref());
        cmd
    }
}

#[async_trait]
impl Cutter for FfmpegCutter {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn cut(&self, input: &Path, range: TimeRange, output: &Path) -> Result<()> {
        if range.start < 0.0 || range.start >= range.end {
            return Err(Error::cut(range, "start must be non-negative and before end"));
        }

        tracing::info!("cut {:?} {} -> {:?}", input, range, output);

        match self.command(input, range, output).execute().await {
            Ok(_) => Ok(()),
            Err(e @ Error::Timeout { .. }) => Err(e),
            Err(e) => Err(Error::cut(range, e.to_string())),
        }
    }
}

/// Format seconds the way ffmpeg's time parser accepts them.
fn format_seconds(secs: f64) -> String {
    format!("{secs:.3}")
}
