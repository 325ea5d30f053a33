use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable consulted when `telegram.bot_token` is empty.
pub const BOT_TOKEN_ENV: &str = "VIDRELAY_BOT_TOKEN";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub split: SplitConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub links: LinksConfig,
}

impl Config {
    /// Non-fatal issues worth surfacing to the operator.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.telegram.bot_token.is_empty() {
            warnings.push(format!(
                "telegram.bot_token is empty and {BOT_TOKEN_ENV} is not set; uploads will fail"
            ));
        }
        if self.telegram.chat_id.is_empty() {
            warnings.push("telegram.chat_id is empty; uploads have no destination".into());
        }
        if self.telegram.uses_public_api()
            && self.split.target_max_bytes > TELEGRAM_PUBLIC_API_LIMIT
        {
            warnings.push(format!(
                "split.target_max_bytes {} exceeds the 50 MB upload limit of {}; \
                 set telegram.api_url to a local Bot API server or lower the target",
                self.split.target_max_bytes, self.telegram.api_url
            ));
        } else if self.split.target_max_bytes > TELEGRAM_LOCAL_SERVER_LIMIT {
            warnings.push(format!(
                "split.target_max_bytes {} exceeds the 2000 MB Bot API limit",
                self.split.target_max_bytes
            ));
        }

        warnings
    }
}

/// Largest file a self-hosted Bot API server accepts.
const TELEGRAM_LOCAL_SERVER_LIMIT: u64 = 2_000 * 1024 * 1024;

/// Largest file `api.telegram.org` accepts from a bot.
const TELEGRAM_PUBLIC_API_LIMIT: u64 = 50 * 1024 * 1024;

const TELEGRAM_PUBLIC_API_HOST: &str = "api.telegram.org";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot API base URL. Point this at a local Bot API server to lift the
    /// 50 MB upload limit of the public endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bot token (credentials)
    #[serde(default)]
    pub bot_token: String,

    /// Destination chat or channel id, e.g. `@mychannel` or `-1001234567890`
    #[serde(default)]
    pub chat_id: String,

    /// Request timeout for a single API call, in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}
fn default_http_timeout() -> u64 {
    1800
}

impl TelegramConfig {
    /// Whether `api_url` points at Telegram's hosted Bot API.
    pub fn uses_public_api(&self) -> bool {
        reqwest::Url::parse(&self.api_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
            .is_some_and(|host| host == TELEGRAM_PUBLIC_API_HOST)
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            bot_token: String::new(),
            chat_id: String::new(),
            timeout_secs: default_http_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SplitConfig {
    /// Files larger than this are split; segments are sized to roughly this
    #[serde(default = "default_target_max_bytes")]
    pub target_max_bytes: u64,

    /// Seconds repeated at the start of each segment after the first
    #[serde(default = "default_overlap")]
    pub overlap_seconds: u64,

    /// Where segment directories are created (default: system temp dir)
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

fn default_target_max_bytes() -> u64 {
    1_900_000_000
}
fn default_overlap() -> u64 {
    3
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            target_max_bytes: default_target_max_bytes(),
            overlap_seconds: default_overlap(),
            work_dir: None,
        }
    }
}

impl SplitConfig {
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("vidrelay"))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    #[serde(default)]
    pub yt_dlp_path: Option<PathBuf>,

    /// Cookies file handed to yt-dlp for age- or region-gated videos
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,

    /// Maximum run time of a single tool invocation, in seconds
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_tool_timeout() -> u64 {
    1800
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            yt_dlp_path: None,
            cookies_file: None,
            timeout_secs: default_tool_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinksConfig {
    /// Line-delimited list of video links to relay
    #[serde(default = "default_links_file")]
    pub links_file: PathBuf,

    /// Append-only log of relayed links, used to resume
    #[serde(default = "default_progress_file")]
    pub progress_file: PathBuf,

    /// Where downloads land before splitting
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Process the list bottom-up (oldest first for newest-first exports)
    #[serde(default)]
    pub reverse: bool,
}

fn default_links_file() -> PathBuf {
    PathBuf::from("links.txt")
}
fn default_progress_file() -> PathBuf {
    PathBuf::from("progress.log")
}
fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            links_file: default_links_file(),
            progress_file: default_progress_file(),
            download_dir: default_download_dir(),
            reverse: false,
        }
    }
}
