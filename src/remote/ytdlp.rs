//! `yt-dlp` backed metadata lookup and download.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use vidrelay_av::{get_tool_path, ToolCommand};

use super::{DownloadProgress, RemoteDownloader, RemoteMetadataFetcher, VideoMetadata};
use crate::config::ToolsConfig;
use crate::error::{Error, Result};

/// Marker prefixed to our progress template so progress lines are easy to
/// tell apart from yt-dlp's own output.
const PROGRESS_MARKER: &str = "vidrelay-progress";

/// Prefer a single mp4 or mp4+m4a that merges without re-encoding.
const FORMAT_SELECTOR: &str = "bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]/b";

#[derive(Debug, Clone)]
pub struct YtDlp {
    path: PathBuf,
    cookies_file: Option<PathBuf>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    description: Option<String>,
    like_count: Option<u64>,
    webpage_url: Option<String>,
    upload_date: Option<String>,
}

/// One classified line of `yt-dlp` download output.
#[derive(Debug, PartialEq)]
enum OutputLine {
    Progress { downloaded: u64, total: Option<u64> },
    Destination(PathBuf),
    Other,
}

impl YtDlp {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cookies_file: None,
            timeout: vidrelay_av::command::DEFAULT_TIMEOUT,
        }
    }

    /// Locate yt-dlp from config (or `PATH`) and apply cookies and timeout.
    pub fn from_config(config: &ToolsConfig) -> Result<Self> {
        let path = get_tool_path("yt-dlp", config.yt_dlp_path.as_deref())?;
        Ok(Self {
            path,
            cookies_file: config.cookies_file.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn with_cookies(mut self, cookies_file: PathBuf) -> Self {
        self.cookies_file = Some(cookies_file);
        self
    }

    fn base_command(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.path.clone());
        cmd.timeout(self.timeout);
        cmd.args(["--no-warnings", "--no-playlist"]);
        if let Some(ref cookies) = self.cookies_file {
            cmd.arg("--cookies");
            cmd.arg(cookies.to_string_lossy().as_ref());
        }
        cmd
    }

    fn metadata_command(&self, reference: &str) -> ToolCommand {
        let mut cmd = self.base_command();
        cmd.args(["--dump-single-json", "--skip-download", "--"]);
        cmd.arg(reference);
        cmd
    }

    fn download_command(&self, reference: &str, dest_dir: &Path) -> ToolCommand {
        let template = dest_dir.join("%(id)s.%(ext)s");
        let mut cmd = self.base_command();
        cmd.args(["-f", FORMAT_SELECTOR, "--merge-output-format", "mp4"]);
        cmd.args(["--newline", "--progress-template"]);
        cmd.arg(format!(
            "download:{PROGRESS_MARKER} %(progress.downloaded_bytes)s \
             %(progress.total_bytes)s %(progress.total_bytes_estimate)s"
        ));
        cmd.arg("-o");
        cmd.arg(template.to_string_lossy().as_ref());
        cmd.arg("--");
        cmd.arg(reference);
        cmd
    }
}

#[async_trait]
impl RemoteMetadataFetcher for YtDlp {
    async fn fetch(&self, reference: &str) -> Result<VideoMetadata> {
        let output = self
            .metadata_command(reference)
            .execute()
            .await
            .map_err(|e| classify_failure(reference, e))?;

        parse_info(&output.stdout)
    }
}

#[async_trait]
impl RemoteDownloader for YtDlp {
    async fn download(
        &self,
        reference: &str,
        dest_dir: &Path,
        progress: Option<&DownloadProgress>,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dest_dir).await?;

        let mut destination: Option<PathBuf> = None;
        self.download_command(reference, dest_dir)
            .execute_streaming(|line| match parse_output_line(line) {
                OutputLine::Progress { downloaded, total } => {
                    if let Some(cb) = progress {
                        cb(downloaded, total);
                    }
                }
                OutputLine::Destination(path) => destination = Some(path),
                OutputLine::Other => {}
            })
            .await
            .map_err(|e| match classify_failure(reference, e) {
                Error::Tool(inner) => Error::network(inner.to_string()),
                other => other,
            })?;

        let path = destination.ok_or_else(|| {
            Error::network(format!("yt-dlp did not report an output file for {reference}"))
        })?;
        tracing::info!("Downloaded {} -> {}", reference, path.display());
        Ok(path)
    }
}

fn classify_failure(reference: &str, err: vidrelay_av::Error) -> Error {
    if let vidrelay_av::Error::ToolFailed { ref message, .. } = err {
        if message.contains("HTTP Error 429") || message.contains("Too Many Requests") {
            return Error::RateLimit { retry_after: None };
        }
        let unavailable = [
            "Video unavailable",
            "HTTP Error 404",
            "Private video",
            "This video is not available",
            "does not exist",
        ];
        if unavailable.iter().any(|m| message.contains(m)) {
            return Error::NotFound(reference.to_string());
        }
    }
    Error::from(err)
}

fn parse_info(json: &str) -> Result<VideoMetadata> {
    let info: YtDlpInfo = serde_json::from_str(json).map_err(|e| {
        Error::Tool(vidrelay_av::Error::tool_failed(
            "yt-dlp",
            format!("invalid metadata JSON: {e}"),
        ))
    })?;

    Ok(VideoMetadata {
        title: info.title.unwrap_or_default(),
        duration_seconds: info.duration.map(|d| d.round() as u64).unwrap_or(0),
        thumbnail_url: info.thumbnail,
        description: info.description.unwrap_or_default(),
        likes: info.like_count,
        canonical_url: info.webpage_url.unwrap_or_default(),
        upload_date: info.upload_date,
    })
}

fn parse_output_line(line: &str) -> OutputLine {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(PROGRESS_MARKER) {
        let mut fields = rest.split_whitespace().map(|f| {
            // yt-dlp prints "NA" for unknown values and floats for estimates.
            f.parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| v as u64)
        });
        let downloaded = fields.next().flatten();
        let total = fields.next().flatten();
        let estimate = fields.next().flatten();
        return match downloaded {
            Some(downloaded) => OutputLine::Progress {
                downloaded,
                total: total.or(estimate),
            },
            None => OutputLine::Other,
        };
    }

    if let Some(path) = line.strip_prefix("[download] Destination: ") {
        return OutputLine::Destination(PathBuf::from(path));
    }
    if let Some(rest) = line.strip_prefix("[Merger] Merging formats into ") {
        return OutputLine::Destination(PathBuf::from(rest.trim_matches('"')));
    }
    if let Some(rest) = line.strip_prefix("[download] ") {
        if let Some(path) = rest.strip_suffix(" has already been downloaded") {
            return OutputLine::Destination(PathBuf::from(path));
        }
    }

    OutputLine::Other
}
