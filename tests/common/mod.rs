//! Shared fakes for integration tests.
//!
//! [`FakeProbe`] and [`FakeCutter`] stand in for ffprobe/ffmpeg,
//! [`RecordingChannel`] and [`RecordingNotifier`] for the Bot API, and
//! [`FakeRemote`] for yt-dlp. The
//! channel and notifier share an [`EventLog`] so tests can assert ordering.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vidrelay::error::{Error, Result};
use vidrelay::remote::{DownloadProgress, RemoteDownloader, RemoteMetadataFetcher, VideoMetadata};
use vidrelay::split::Segmenter;
use vidrelay::upload::{RemoteRef, TextNotifier, TransferChannel, TransferMetadata, UploadPipeline};
use vidrelay_av::{Cutter, MediaDescriptor, MediaProbe, TimeRange, VideoStream};

/// Ordered record of everything sent to the remote side.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Reports fixed duration and size for whatever path it is given.
pub struct FakeProbe {
    pub duration_seconds: f64,
    pub size_bytes: u64,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeProbe {
    pub fn new(duration_seconds: f64, size_bytes: u64) -> Self {
        Self {
            duration_seconds,
            size_bytes,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0.0, 0)
        }
    }
}

#[async_trait]
impl MediaProbe for FakeProbe {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe(&self, path: &Path) -> vidrelay_av::Result<MediaDescriptor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(vidrelay_av::Error::probe(path, "not a media file"));
        }
        Ok(MediaDescriptor {
            source_path: path.to_path_buf(),
            duration_seconds: self.duration_seconds,
            size_bytes: self.size_bytes,
            container: "mov,mp4,m4a,3gp,3g2,mj2".into(),
            video: Some(VideoStream {
                codec: "h264".into(),
                width: 1920,
                height: 1080,
            }),
        })
    }
}

/// Writes a small file per cut and records the requested ranges.
///
/// With `fail_at`, the cut with that call index writes a partial file and
/// then fails, like an ffmpeg run killed mid-way.
#[derive(Default)]
pub struct FakeCutter {
    pub fail_at: Option<usize>,
    pub cuts: Mutex<Vec<(TimeRange, PathBuf)>>,
}

impl FakeCutter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    pub fn ranges(&self) -> Vec<TimeRange> {
        self.cuts.lock().unwrap().iter().map(|(r, _)| *r).collect()
    }

    pub fn call_count(&self) -> usize {
        self.cuts.lock().unwrap().len()
    }
}

#[async_trait]
impl Cutter for FakeCutter {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn cut(&self, _input: &Path, range: TimeRange, output: &Path) -> vidrelay_av::Result<()> {
        let index = {
            let mut cuts = self.cuts.lock().unwrap();
            cuts.push((range, output.to_path_buf()));
            cuts.len() - 1
        };

        std::fs::write(output, format!("{range}"))?;
        if self.fail_at == Some(index) {
            return Err(vidrelay_av::Error::cut(range, "ffmpeg exited with status 1"));
        }
        Ok(())
    }
}

/// One recorded `send` call.
#[derive(Debug, Clone)]
pub struct SentFile {
    pub destination: String,
    pub path: PathBuf,
    pub metadata: TransferMetadata,
    /// Whether the file was on disk when the channel received it.
    pub existed: bool,
}

/// Records sends; fails the calls whose (zero-based) number is in `fail_on`.
pub struct RecordingChannel {
    pub log: EventLog,
    pub fail_on: HashSet<usize>,
    /// Remove the file on receipt so the pipeline's own delete fails.
    pub remove_on_send: bool,
    pub sent: Mutex<Vec<SentFile>>,
}

impl RecordingChannel {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            fail_on: HashSet::new(),
            remove_on_send: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(log: EventLog, calls: &[usize]) -> Self {
        Self {
            fail_on: calls.iter().copied().collect(),
            ..Self::new(log)
        }
    }

    pub fn sent(&self) -> Vec<SentFile> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(
        &self,
        destination: &str,
        path: &Path,
        metadata: &TransferMetadata,
    ) -> Result<RemoteRef> {
        let call = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(SentFile {
                destination: destination.to_string(),
                path: path.to_path_buf(),
                metadata: metadata.clone(),
                existed: path.exists(),
            });
            sent.len() - 1
        };
        self.log
            .lock()
            .unwrap()
            .push(format!("send {}", path.display()));

        if self.fail_on.contains(&call) {
            return Err(Error::transfer(path, "Bad Request: connection reset"));
        }
        if self.remove_on_send {
            let _ = std::fs::remove_file(path);
        }
        Ok(RemoteRef(format!("msg-{call}")))
    }
}

/// Records posted text; optionally fails every post.
pub struct RecordingNotifier {
    pub log: EventLog,
    pub fail: bool,
    pub posts: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            fail: false,
            posts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(log: EventLog) -> Self {
        Self {
            fail: true,
            ..Self::new(log)
        }
    }

    pub fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextNotifier for RecordingNotifier {
    async fn post(&self, destination: &str, text: &str) -> Result<()> {
        self.posts
            .lock()
            .unwrap()
            .push((destination.to_string(), text.to_string()));
        self.log.lock().unwrap().push(format!("post {text}"));
        if self.fail {
            return Err(Error::network("sendMessage refused"));
        }
        Ok(())
    }
}

/// Create a small stand-in source file; its reported size comes from the probe.
pub fn source_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"not really a video").unwrap();
    path
}

/// Wire a pipeline from fakes.
pub fn pipeline(
    probe: Arc<FakeProbe>,
    cutter: Arc<FakeCutter>,
    channel: Arc<RecordingChannel>,
    notifier: Arc<RecordingNotifier>,
    work_dir: &Path,
    target_max_bytes: u64,
) -> UploadPipeline {
    let segmenter = Segmenter::new(probe.clone(), cutter, target_max_bytes, 3);
    UploadPipeline::new(probe, segmenter, channel, notifier, "@archive", work_dir)
}

/// Serves canned metadata and "downloads" by writing a file named after the
/// reference. References listed in `unavailable` or `throttled` fail.
pub struct FakeRemote {
    pub thumbnail_url: Option<String>,
    pub unavailable: HashSet<String>,
    pub throttled: HashSet<String>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            thumbnail_url: None,
            unavailable: HashSet::new(),
            throttled: HashSet::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteMetadataFetcher for FakeRemote {
    async fn fetch(&self, reference: &str) -> Result<VideoMetadata> {
        self.fetched.lock().unwrap().push(reference.to_string());
        if self.throttled.contains(reference) {
            return Err(Error::RateLimit { retry_after: None });
        }
        if self.unavailable.contains(reference) {
            return Err(Error::NotFound(reference.to_string()));
        }
        Ok(VideoMetadata {
            title: format!("Title of {reference}"),
            duration_seconds: 60,
            thumbnail_url: self.thumbnail_url.clone(),
            description: "desc".into(),
            likes: Some(1),
            canonical_url: reference.to_string(),
            upload_date: Some("20240101".into()),
        })
    }
}

#[async_trait]
impl RemoteDownloader for FakeRemote {
    async fn download(
        &self,
        reference: &str,
        dest_dir: &Path,
        progress: Option<&DownloadProgress>,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(dest_dir)?;
        let name: String = reference
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let path = dest_dir.join(format!("{name}.mp4"));
        std::fs::write(&path, b"video")?;
        if let Some(cb) = progress {
            cb(5, Some(5));
        }
        Ok(path)
    }
}
