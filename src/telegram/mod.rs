//! Telegram Bot API client.
//!
//! Implements [`TransferChannel`] with `sendVideo` (multipart, streamed from
//! disk) and [`TextNotifier`] with `sendMessage`. One client, and so one
//! connection pool, is shared for the whole run.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use crate::config::TelegramConfig;
use crate::error::{Error, Result};
use crate::upload::{RemoteRef, TextNotifier, TransferChannel, TransferMetadata};

/// Longest text `sendMessage` accepts, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

pub struct TelegramClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: i64,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    link_preview_options: LinkPreviewOptions,
}

#[derive(Serialize)]
struct LinkPreviewOptions {
    is_disabled: bool,
}

/// Why an API call did not produce a result.
enum CallError {
    Timeout,
    Http(reqwest::Error),
    RateLimited(Option<u64>),
    Rejected(String),
}

impl TelegramClient {
    /// Build a client from config.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when no bot token is configured.
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.is_empty() {
            return Err(Error::Config("telegram.bot_token is not set".into()));
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.bot_token
            ),
            timeout,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Request URLs carry the bot token, so transport errors are stripped of
    /// their URL before they can reach a log line.
    async fn call<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<T, CallError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CallError::Timeout
            } else {
                CallError::Http(e.without_url())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CallError::Http(e.without_url()))?;
        let parsed: ApiResponse<T> = serde_json::from_str(&body).map_err(|_| {
            CallError::Rejected(format!("unexpected response ({status}): {}", body.trim()))
        })?;

        if parsed.error_code == Some(429) || status.as_u16() == 429 {
            return Err(CallError::RateLimited(
                parsed.parameters.and_then(|p| p.retry_after),
            ));
        }

        match (parsed.ok, parsed.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(CallError::Rejected(
                parsed
                    .description
                    .unwrap_or_else(|| format!("request failed with status {status}")),
            )),
        }
    }

    async fn video_part(path: &Path) -> Result<Part> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| Error::transfer(path, format!("cannot open file: {e}")))?;
        let len = file
            .metadata()
            .await
            .map_err(|e| Error::transfer(path, format!("cannot stat file: {e}")))?
            .len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video.mp4".to_string());

        Part::stream_with_length(reqwest::Body::wrap_stream(ReaderStream::new(file)), len)
            .file_name(file_name)
            .mime_str(video_mime(path))
            .map_err(|e| Error::transfer(path, e.to_string()))
    }

    async fn thumbnail_part(path: &Path) -> Option<Part> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Part::bytes(bytes)
                .file_name("thumbnail.jpg")
                .mime_str("image/jpeg")
                .ok(),
            Err(e) => {
                tracing::warn!("Skipping thumbnail {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[async_trait]
impl TransferChannel for TelegramClient {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(
        &self,
        destination: &str,
        path: &Path,
        metadata: &TransferMetadata,
    ) -> Result<RemoteRef> {
        let mut form = Form::new()
            .text("chat_id", destination.to_string())
            .text("supports_streaming", "true")
            .text("duration", metadata.duration_seconds.to_string())
            .text("width", metadata.width.to_string())
            .text("height", metadata.height.to_string())
            .part("video", Self::video_part(path).await?);

        if let Some(ref thumb) = metadata.thumbnail {
            if let Some(part) = Self::thumbnail_part(thumb).await {
                form = form.part("thumbnail", part);
            }
        }

        tracing::debug!("sendVideo {} -> {}", path.display(), destination);

        let request = self.client.post(self.url("sendVideo")).multipart(form);
        match self.call::<Message>(request).await {
            Ok(message) => Ok(RemoteRef(message.message_id.to_string())),
            Err(CallError::Timeout) => Err(Error::timeout("sendVideo", self.timeout)),
            Err(CallError::RateLimited(retry_after)) => Err(Error::RateLimit { retry_after }),
            Err(CallError::Http(e)) => Err(Error::transfer(path, e.to_string())),
            Err(CallError::Rejected(message)) => Err(Error::transfer(path, message)),
        }
    }
}

#[async_trait]
impl TextNotifier for TelegramClient {
    async fn post(&self, destination: &str, text: &str) -> Result<()> {
        let text = truncate_chars(text, MAX_MESSAGE_CHARS);
        let body = SendMessage {
            chat_id: destination,
            text: &text,
            link_preview_options: LinkPreviewOptions { is_disabled: true },
        };

        let request = self.client.post(self.url("sendMessage")).json(&body);
        match self.call::<Message>(request).await {
            Ok(_) => Ok(()),
            Err(CallError::Timeout) => Err(Error::timeout("sendMessage", self.timeout)),
            Err(CallError::RateLimited(retry_after)) => Err(Error::RateLimit { retry_after }),
            Err(CallError::Http(e)) => Err(Error::network(e.to_string())),
            Err(CallError::Rejected(message)) => Err(Error::network(message)),
        }
    }
}

fn video_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Cut `text` to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
