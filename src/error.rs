//! Error taxonomy for splitting and relaying media.
//!
//! Tool-level failures from `vidrelay-av` are folded in through
//! [`From<vidrelay_av::Error>`], which keeps timeouts and probe failures
//! distinguishable from generic tool errors.

use std::path::PathBuf;
use std::time::Duration;

/// Unified error type for the relay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source could not be probed.
    #[error("Probe error: {0}")]
    Probe(#[source] vidrelay_av::Error),

    /// Chunk sizing is degenerate and would never advance.
    #[error("Plan error: chunk duration {chunk_seconds}s does not exceed overlap {overlap_seconds}s")]
    Plan {
        chunk_seconds: u64,
        overlap_seconds: u64,
    },

    /// A cut failed part-way through segmenting a source.
    #[error("Segmentation aborted at segment {index}: {source}")]
    Segmentation {
        /// Index of the segment whose cut failed.
        index: usize,
        /// The underlying cut failure, with its range.
        #[source]
        source: vidrelay_av::Error,
    },

    /// The transfer channel rejected or failed to deliver a file.
    #[error("Transfer error [{}]: {message}", path.display())]
    Transfer { path: PathBuf, message: String },

    /// An external operation did not finish in time.
    #[error("Timeout: {operation} exceeded {after:?}")]
    Timeout { operation: String, after: Duration },

    /// An uploaded local file could not be removed. Never fatal.
    #[error("Cleanup error [{}]: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A remote video does not exist or is not available.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A remote service asked us to slow down.
    #[error("Rate limited{}", retry_after.map(|s| format!(" (retry after {s}s)")).unwrap_or_default())]
    RateLimit { retry_after: Option<u64> },

    /// A network operation failed.
    #[error("Network error: {0}")]
    Network(String),

    /// An external tool failed outside of probing or cutting.
    #[error("Tool error: {0}")]
    Tool(#[source] vidrelay_av::Error),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convenience constructor for [`Error::Transfer`].
    pub fn transfer(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Transfer {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Timeout`].
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Error::Timeout {
            operation: operation.into(),
            after,
        }
    }

    /// Convenience constructor for [`Error::Network`].
    pub fn network(message: impl Into<String>) -> Self {
        Error::Network(message.into())
    }

    /// Whether the failure happened before any upload was attempted.
    pub fn is_planning_failure(&self) -> bool {
        matches!(
            self,
            Error::Probe(_) | Error::Plan { .. } | Error::Segmentation { .. }
        )
    }
}

impl From<vidrelay_av::Error> for Error {
    fn from(err: vidrelay_av::Error) -> Self {
        match err {
            vidrelay_av::Error::Timeout { tool, after } => Error::Timeout {
                operation: tool,
                after,
            },
            e @ vidrelay_av::Error::Probe { .. } => Error::Probe(e),
            vidrelay_av::Error::Io(e) => Error::Io(e),
            e => Error::Tool(e),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
