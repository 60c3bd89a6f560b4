//! Per-rung media operations.
//!
//! - Encoding a rung from the source with ffmpeg
//! - Fragmenting the encoded file with mp4fragment

mod encode;
mod fragment;

pub use encode::{
    encode, encoder_args, EncodeRequest, EncodeSettings, DEFAULT_AUDIO_CODEC,
    DEFAULT_ENCODE_TIMEOUT, DEFAULT_PRESET, DEFAULT_VIDEO_PROFILE,
};
pub use fragment::{fragment, fragment_args, FragmentSettings, DEFAULT_FRAGMENT_TIMEOUT};
