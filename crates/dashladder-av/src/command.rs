//! Builder for executing external tool commands with timeout and
//! cancellation support.
//!
//! Arguments are passed to the process as a list of OS strings; nothing goes
//! through a shell, so paths with spaces, quotes or non-UTF-8 bytes reach the
//! tool unchanged.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Default command timeout: 5 minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// How much detail a failing command puts into its error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verbosity {
    /// Include the full command line in errors.
    pub verbose: bool,
    /// Include the command line and captured stderr in errors, and let the
    /// tools print their own diagnostics.
    pub debug: bool,
}

impl Verbosity {
    /// Whether errors should carry the command line.
    pub fn show_command(&self) -> bool {
        self.verbose || self.debug
    }
}

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
/// use dashladder_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> dashladder_av::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .args(["-of", "json", "-show_format", "-show_streams"])
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
    args: Vec<OsString>,
    timeout: Duration,
    cancel: Option<CancellationToken>,
    verbosity: Verbosity,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            cancel: None,
            verbosity: Verbosity::default(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(s.as_ref().to_os_string());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl AsRef<OsStr>>) -> &mut Self {
        self.args
            .extend(iter.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Kill the process when `token` is cancelled.
    pub fn cancel_on(&mut self, token: CancellationToken) -> &mut Self {
        self.cancel = Some(token);
        self
    }

    /// Control how much detail goes into errors.
    pub fn verbosity(&mut self, verbosity: Verbosity) -> &mut Self {
        self.verbosity = verbosity;
        self
    }

    /// The arguments passed after the program name.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Short tool name used in errors and logs.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// The full command line, quoted for display.
    ///
    /// Non-UTF-8 bytes are shown lossily; the process itself gets the raw
    /// arguments.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| quote_for_display(&part.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// The child is killed if the timeout expires or the cancellation token
    /// fires.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the program does not exist.
    /// - [`Error::ToolFailed`] if spawning fails or the exit status is non-zero.
    /// - [`Error::ToolTimeout`] if the timeout expires.
    /// - [`Error::Cancelled`] if the cancellation token fires.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let program_name = self.program_name();

        #[cfg(feature = "tracing")]
        tracing::debug!("COMMAND: {}", self.command_line());

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(&program_name)
            } else {
                self.failure(&program_name, None, format!("failed to spawn: {e}"), None)
            }
        })?;

        // Dropping the wait future drops the child, and kill_on_drop
        // terminates it.
        let wait = tokio::time::timeout(self.timeout, child.wait_with_output());
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        let result = tokio::select! {
            result = wait => result,
            _ = cancelled => {
                #[cfg(feature = "tracing")]
                tracing::warn!("{program_name} cancelled, process killed");
                return Err(Error::Cancelled);
            }
        };

        match result {
            Ok(Ok(output)) => {
                let tool_output = ToolOutput {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                #[cfg(feature = "tracing")]
                {
                    let stderr = tool_output.stderr.trim();
                    if !stderr.is_empty() {
                        tracing::trace!("{program_name} stderr: {stderr}");
                    }
                }

                if !output.status.success() {
                    return Err(self.failure(
                        &program_name,
                        output.status.code(),
                        String::new(),
                        Some(tool_output.stderr),
                    ));
                }

                Ok(tool_output)
            }
            Ok(Err(e)) => Err(self.failure(
                &program_name,
                None,
                format!("I/O error waiting for process: {e}"),
                None,
            )),
            Err(_elapsed) => Err(Error::ToolTimeout {
                tool: program_name,
                timeout: self.timeout,
            }),
        }
    }

    fn failure(
        &self,
        tool: &str,
        code: Option<i32>,
        message: String,
        stderr: Option<String>,
    ) -> Error {
        Error::ToolFailed {
            tool: tool.to_string(),
            code,
            message,
            command: self.verbosity.show_command().then(|| self.command_line()),
            stderr: stderr.filter(|_| self.verbosity.debug),
        }
    }
}

fn quote_for_display(part: &str) -> String {
    if !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c))
    {
        part.to_string()
    } else {
        format!("'{}'", part.replace('\'', r"'\''"))
    }
}
