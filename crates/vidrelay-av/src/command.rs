//! Builder for executing external tool commands with timeout support.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::{Error, Result};

/// Default command timeout: 30 minutes. Stream-copying a multi-gigabyte file
/// is disk bound and can take a while.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1800);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use vidrelay_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> vidrelay_av::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .args(["-v", "error", "-print_format", "json", "-show_format"])
///     .arg("/path/to/video.mp4")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// The arguments collected so far.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Short program name used in errors and logs.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    fn spawn(&self) -> Result<Child> {
        tracing::debug!(tool = %self.program_name(), args = ?self.args, "spawning");

        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out child is killed when its handle is dropped.
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found(self.program_name())
                } else {
                    Error::tool_failed(self.program_name(), format!("failed to spawn: {e}"))
                }
            })
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if the process does not exit in time; the child is killed.
    /// - [`Error::ToolFailed`] if the process exits with a non-zero status
    ///   (message includes stderr).
    /// - [`Error::ToolNotFound`] if the program does not exist.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let child = self.spawn()?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => self.finish(
                output.status,
                String::from_utf8_lossy(&output.stdout).to_string(),
                String::from_utf8_lossy(&output.stderr).to_string(),
            ),
            Ok(Err(e)) => Err(Error::tool_failed(
                self.program_name(),
                format!("I/O error waiting for process: {e}"),
            )),
            Err(_elapsed) => Err(Error::Timeout {
                tool: self.program_name(),
                after: self.timeout,
            }),
        }
    }

    /// Execute the command, handing every stdout line to `on_line` as soon as
    /// it is read. Used for tools that report progress on stdout.
    ///
    /// The full stdout is still returned in [`ToolOutput::stdout`].
    pub async fn execute_streaming<F>(&self, mut on_line: F) -> Result<ToolOutput>
    where
        F: FnMut(&str) + Send,
    {
        let mut child = self.spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let run = async {
            let stderr_task = tokio::spawn(async move {
                let mut buf = String::new();
                if let Some(mut err) = stderr {
                    let _ = err.read_to_string(&mut buf).await;
                }
                buf
            });

            let mut collected = String::new();
            if let Some(out) = stdout {
                let mut lines = BufReader::new(out).lines();
                while let Some(line) = lines.next_line().await? {
                    on_line(&line);
                    collected.push_str(&line);
                    collected.push('\n');
                }
            }

            let status = child.wait().await?;
            let stderr = stderr_task.await.unwrap_or_default();
            Ok::<_, std::io::Error>((status, collected, stderr))
        };

        match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok((status, stdout, stderr))) => self.finish(status, stdout, stderr),
            Ok(Err(e)) => Err(Error::tool_failed(
                self.program_name(),
                format!("I/O error reading process output: {e}"),
            )),
            Err(_elapsed) => Err(Error::Timeout {
                tool: self.program_name(),
                after: self.timeout,
            }),
        }
    }

    fn finish(&self, status: ExitStatus, stdout: String, stderr: String) -> Result<ToolOutput> {
        if !status.success() {
            return Err(Error::tool_failed(
                self.program_name(),
                format!("exited with status {status}: {}", stderr.trim()),
            ));
        }

        Ok(ToolOutput {
            status,
            stdout,
            stderr,
        })
    }
}
