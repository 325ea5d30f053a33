//! Locating ffmpeg, ffprobe and yt-dlp.
//!
//! Every tool may be pinned to an explicit path in config; otherwise it is
//! looked up on `PATH`. A pinned path that does not exist falls back to
//! `PATH` with a warning rather than failing outright.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Tools vidrelay shells out to.
pub const KNOWN_TOOLS: &[&str] = &["ffmpeg", "ffprobe", "yt-dlp"];

/// Where a tool was found and what it reports about itself.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    /// Resolved executable, `None` when the tool could not be located.
    pub path: Option<PathBuf>,
    /// First line of the tool's version banner.
    pub version: Option<String>,
    /// Whether `path` came from config rather than `PATH`.
    pub configured: bool,
}

impl ToolInfo {
    /// Located and answered the version query.
    pub fn is_available(&self) -> bool {
        self.path.is_some() && self.version.is_some()
    }
}

/// Inspect `name`, preferring `configured` over a `PATH` lookup.
///
/// # Example
///
/// ```no_run
/// use vidrelay_av::check_tool;
///
/// let info = check_tool("ffprobe", None);
/// if info.is_available() {
///     println!("ffprobe: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str, configured: Option<&Path>) -> ToolInfo {
    let pinned = configured.filter(|p| p.exists());
    let path = match pinned {
        Some(p) => Some(p.to_path_buf()),
        None => which::which(name).ok(),
    };
    let version = path.as_deref().and_then(|p| version_banner(name, p));

    ToolInfo {
        name: name.to_string(),
        path,
        version,
        configured: pinned.is_some(),
    }
}

fn version_banner(name: &str, program: &Path) -> Option<String> {
    // ffmpeg and ffprobe take a single dash
    let arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    let output = Command::new(program).arg(arg).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.trim().to_string())
}

/// Inspect every tool in [`KNOWN_TOOLS`]. `configured` maps a tool name to
/// its pinned path, if any.
pub fn check_tools<'a, F>(configured: F) -> Vec<ToolInfo>
where
    F: Fn(&str) -> Option<&'a Path>,
{
    KNOWN_TOOLS
        .iter()
        .map(|name| check_tool(name, configured(name)))
        .collect()
}

/// Resolve `name` on `PATH`.
///
/// # Errors
///
/// [`Error::ToolNotFound`] if it is not installed.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Resolve a tool, preferring a configured path over `PATH`.
///
/// # Errors
///
/// [`Error::ToolNotFound`] when neither location has it.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            "Configured path for {} does not exist: {}; falling back to PATH",
            name,
            path.display()
        );
    }

    require_tool(name)
}
