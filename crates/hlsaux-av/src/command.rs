//! Builder for executing external tool commands with timeout and
//! cancellation support.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use hlsaux_core::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

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
/// The child is killed when the timeout expires or the cancellation token
/// fires.
///
/// # Example
///
/// ```no_run
/// use hlsaux_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> hlsaux_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .args(["-hide_banner", "-show_packets"])
///     .args(["-print_format", "json"])
///     .arg("/path/to/segment.ts")
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
    stdin_data: Option<Vec<u8>>,
    cancel: Option<CancellationToken>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            stdin_data: None,
            cancel: None,
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

    /// Provide data to be written to the process's stdin.
    ///
    /// The data is written concurrently with reading the output, so tools
    /// that stream results while still consuming input cannot deadlock.
    pub fn stdin(&mut self, data: Vec<u8>) -> &mut Self {
        self.stdin_data = Some(data);
        self
    }

    /// Abort the execution when `token` is cancelled.
    pub fn cancel_on(&mut self, token: CancellationToken) -> &mut Self {
        self.cancel = Some(token);
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if the cancellation token fired.
    /// - [`Error::Tool`] if spawning fails, the process times out, exits
    ///   with a non-zero status (message includes stderr) or its stdin
    ///   could not be written.
    pub async fn execute(&self) -> hlsaux_core::Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(if self.stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::trace!(tool = %program_name, args = ?self.args, "spawning");

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::tool(&program_name, format!("failed to spawn: {e}")))?;

        let writer = match (self.stdin_data.clone(), child.stdin.take()) {
            (Some(data), Some(mut stdin)) => Some(tokio::spawn(async move {
                stdin.write_all(&data).await?;
                stdin.shutdown().await
            })),
            _ => None,
        };

        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        // Dropping the wait future drops the child, which kills it.
        let waited = tokio::select! {
            _ = cancelled => None,
            r = tokio::time::timeout(self.timeout, child.wait_with_output()) => Some(r),
        };
        let Some(result) = waited else {
            if let Some(handle) = writer {
                handle.abort();
            }
            return Err(Error::Cancelled);
        };

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(Error::tool(
                    program_name,
                    format!("I/O error waiting for process: {e}"),
                ))
            }
            Err(_elapsed) => {
                if let Some(handle) = writer {
                    handle.abort();
                }
                return Err(Error::tool(
                    program_name,
                    format!("timed out after {:?}", self.timeout),
                ));
            }
        };

        let tool_output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            return Err(Error::tool(
                program_name,
                format!(
                    "exited with status {}: {}",
                    output.status,
                    tool_output.stderr.trim()
                ),
            ));
        }

        if let Some(handle) = writer {
            match handle.await {
                Ok(Ok(())) => {}
                // The tool may legitimately stop reading once it has what it needs.
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!(tool = %program_name, "stdin closed early by tool");
                }
                Ok(Err(e)) => {
                    return Err(Error::tool(program_name, format!("failed to write stdin: {e}")))
                }
                Err(e) => {
                    return Err(Error::tool(program_name, format!("stdin writer failed: {e}")))
                }
            }
        }

        Ok(tool_output)
    }
}
