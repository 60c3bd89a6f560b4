//! GOP and VBV parameters derived from the ladder.

use crate::ladder::Rung;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Segment duration in seconds used to derive the default GOP length.
pub const DEFAULT_SEGMENT_SECONDS: f64 = 3.0;

/// VBV max-rate as a multiple of the rung bitrate.
pub const VBV_MAXRATE_FACTOR: f64 = 1.5;

/// Default segment size in frames: `round(3 * frame_rate)`.
pub fn default_segment_size(frame_rate: f64) -> Result<u32> {
    if !frame_rate.is_finite() || frame_rate <= 0.0 {
        return Err(Error::InvalidFrameRate(frame_rate));
    }
    let frames = (DEFAULT_SEGMENT_SECONDS * frame_rate).round();
    if frames < 1.0 || frames > f64::from(u32::MAX) {
        return Err(Error::InvalidFrameRate(frame_rate));
    }
    Ok(frames as u32)
}

/// Encoder settings that depend on the rung and the segment size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderParams {
    /// Keyframe interval, minimum keyframe interval and lookahead, in frames.
    pub segment_size_frames: u32,
    /// VBV buffer size in kbps.
    pub vbv_bufsize_kbps: u32,
    /// VBV maximum rate in kbps.
    pub vbv_maxrate_kbps: u32,
}

impl EncoderParams {
    /// Derive the parameters for `rung`.
    ///
    /// The buffer equals the rung bitrate and the max-rate is 1.5 times it,
    /// both truncated to whole kbps.
    pub fn for_rung(rung: &Rung, segment_size_frames: u32) -> Result<Self> {
        if segment_size_frames == 0 {
            return Err(Error::SegmentSize);
        }
        Ok(Self {
            segment_size_frames,
            vbv_bufsize_kbps: rung.bitrate_kbps as u32,
            vbv_maxrate_kbps: (rung.bitrate_kbps * VBV_MAXRATE_FACTOR) as u32,
        })
    }
}
