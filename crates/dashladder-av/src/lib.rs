//! # dashladder-av
//!
//! External tool plumbing for encoding an adaptive bitrate ladder.
//!
//! This crate provides functionality for:
//! - Locating ffprobe, ffmpeg and mp4fragment
//! - Probing a source for its resolution and frame rate
//! - Encoding one rung with ffmpeg/libx264
//! - Fragmenting the encoded file with mp4fragment
//! - Per-rung temp workspaces that never leave partial outputs behind
//!
//! Every tool runs as a child process with a timeout and an optional
//! cancellation token; cancelling kills the child.
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use dashladder_av::{FfprobeProber, ToolPaths, ToolRegistry, FFPROBE};
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> dashladder_av::Result<()> {
//! let tools = ToolRegistry::discover(&ToolPaths::default());
//! let prober = FfprobeProber::new(tools.require(FFPROBE)?);
//! let info = prober.probe(Path::new("movie.mov"), &CancellationToken::new()).await?;
//! println!("{} at {:.3} fps", info.resolution(), info.frame_rate());
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod command;
mod error;
pub mod probe;
pub mod tools;
pub mod workspace;

// Re-exports
pub use actions::{EncodeRequest, EncodeSettings, FragmentSettings};
pub use command::{ToolCommand, ToolOutput, Verbosity};
pub use error::{Error, ErrorKind, Result};
pub use probe::{FfprobeProber, MediaInfo, VideoStream};
pub use tools::{ToolInfo, ToolPaths, ToolRegistry, FFMPEG, FFPROBE, MP4FRAGMENT};
pub use workspace::Workspace;
