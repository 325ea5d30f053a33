//! Media file probing.
//!
//! [`MediaProbe`] is the seam the segmenter and upload pipeline depend on;
//! [`FfprobeProber`] implements it by shelling out to `ffprobe`.

mod ffprobe;
mod types;

pub use ffprobe::FfprobeProber;
pub use types::*;

use async_trait::async_trait;
use std::path::Path;

use crate::Result;

/// Inspects a local media file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Backend name, used in logs.
    fn name(&self) -> &'static str;

    /// Return the duration, exact byte size and primary video stream of `path`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Probe`] when the file is missing, unreadable or has no
    /// parseable stream with a positive duration.
    async fn probe(&self, path: &Path) -> Result<MediaDescriptor>;
}
