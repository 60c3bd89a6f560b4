//! Error types for dashladder-av.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while probing, encoding or fragmenting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The ladder or run configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The source could not be probed into usable stream information.
    #[error("probe failed: {0}")]
    Probe(String),

    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool could not be started or exited unsuccessfully.
    #[error("{}", tool_failure_message(tool, *code, message, command.as_deref(), stderr.as_deref()))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        message: String,
        command: Option<String>,
        stderr: Option<String>,
    },

    /// An external tool ran past its deadline and was killed.
    #[error("{tool} timed out after {}s", timeout.as_secs())]
    ToolTimeout { tool: String, timeout: Duration },

    /// The output file exists and overwriting was not requested.
    #[error("output file already exists: {} (use --force to overwrite)", path.display())]
    Exists { path: PathBuf },

    /// The operation was interrupted.
    #[error("cancelled")]
    Cancelled,

    /// Temp workspace failure.
    #[error("workspace error: {0}")]
    Workspace(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`Error`], used for reporting and exit handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid ladder spec or configuration.
    Config,
    /// Unusable probe result.
    Probe,
    /// Probe, encoder or fragmenter failure.
    ExternalTool,
    /// Output collision without force.
    Exists,
    /// User interrupt.
    Cancelled,
    /// Filesystem failure.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Config => write!(f, "ConfigError"),
            ErrorKind::Probe => write!(f, "ProbeError"),
            ErrorKind::ExternalTool => write!(f, "ExternalToolError"),
            ErrorKind::Exists => write!(f, "ExistsError"),
            ErrorKind::Cancelled => write!(f, "Cancelled"),
            ErrorKind::Io => write!(f, "IoError"),
        }
    }
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a probe error.
    pub fn probe(message: impl Into<String>) -> Self {
        Self::Probe(message.into())
    }

    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error without exit details.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            code: None,
            message: message.into(),
            command: None,
            stderr: None,
        }
    }

    /// Create an output collision error.
    pub fn exists(path: impl Into<PathBuf>) -> Self {
        Self::Exists { path: path.into() }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Probe(_) => ErrorKind::Probe,
            Error::ToolNotFound { .. } | Error::ToolFailed { .. } | Error::ToolTimeout { .. } => {
                ErrorKind::ExternalTool
            }
            Error::Exists { .. } => ErrorKind::Exists,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Workspace(_) | Error::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<dashladder_plan::Error> for Error {
    fn from(err: dashladder_plan::Error) -> Self {
        match err {
            dashladder_plan::Error::InvalidFrameRate(_) => Error::Probe(err.to_string()),
            other => Error::Config(other.to_string()),
        }
    }
}

fn tool_failure_message(
    tool: &str,
    code: Option<i32>,
    message: &str,
    command: Option<&str>,
    stderr: Option<&str>,
) -> String {
    let mut out = match code {
        Some(code) => format!("{tool} failed with error {code}"),
        None => format!("{tool} failed"),
    };
    if !message.is_empty() {
        out.push_str(": ");
        out.push_str(message);
    }
    if let Some(command) = command {
        out.push_str(" - ");
        out.push_str(command);
    }
    if let Some(stderr) = stderr.map(str::trim).filter(|s| !s.is_empty()) {
        out.push('\n');
        out.push_str(stderr);
    }
    out
}
