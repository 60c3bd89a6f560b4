//! Source probing.
//!
//! Only ffprobe is supported. The probe runs when the source resolution or
//! the segment size has to be derived from the file.

mod ffprobe;
mod types;

pub use ffprobe::{parse_ffprobe_json, parse_frame_rate, FfprobeProber, DEFAULT_PROBE_TIMEOUT};
pub use types::*;
