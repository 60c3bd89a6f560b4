//! Media information types.

use dashladder_plan::Resolution;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What the planner needs to know about a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path to the media file.
    pub file_path: PathBuf,
    /// Container format name as reported by the probe (e.g. "mov,mp4,m4a,3gp,3g2,mj2").
    pub container: String,
    /// Duration of the media.
    pub duration: Option<Duration>,
    /// The video stream used for planning.
    pub video: VideoStream,
}

/// The video stream selected from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStream {
    /// Stream index within the container.
    pub index: u32,
    /// Codec name (e.g. "h264").
    pub codec: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Average frame rate in frames per second.
    pub frame_rate: f64,
}

impl MediaInfo {
    /// Source resolution of the video stream.
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.video.width,
            height: self.video.height,
        }
    }

    /// Average frame rate of the video stream.
    pub fn frame_rate(&self) -> f64 {
        self.video.frame_rate
    }
}
