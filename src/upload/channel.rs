//! Seams to the outbound delivery service.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Opaque identifier the remote side assigned to a delivered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteRef(pub String);

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Playback metadata attached to every transferred file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferMetadata {
    pub thumbnail: Option<PathBuf>,
    pub duration_seconds: u64,
    pub width: u32,
    pub height: u32,
}

/// A single sequential connection that delivers files to a destination.
#[async_trait]
pub trait TransferChannel: Send + Sync {
    /// Channel name, used in logs.
    fn name(&self) -> &'static str;

    /// Deliver `path` to `destination`, returning the remote reference on
    /// confirmed success.
    async fn send(
        &self,
        destination: &str,
        path: &Path,
        metadata: &TransferMetadata,
    ) -> Result<RemoteRef>;
}

/// Posts plain text to a destination, independent of file transfers.
#[async_trait]
pub trait TextNotifier: Send + Sync {
    async fn post(&self, destination: &str, text: &str) -> Result<()>;
}
