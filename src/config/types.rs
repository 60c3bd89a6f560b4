use dashladder_av::actions::{
    DEFAULT_AUDIO_CODEC, DEFAULT_ENCODE_TIMEOUT, DEFAULT_FRAGMENT_TIMEOUT, DEFAULT_PRESET,
    DEFAULT_VIDEO_PROFILE,
};
use dashladder_av::probe::DEFAULT_PROBE_TIMEOUT;
use dashladder_av::ToolPaths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolPaths,

    #[serde(default)]
    pub encoder: EncoderConfig,

    #[serde(default)]
    pub fragmenter: FragmenterConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub run: RunDefaults,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EncoderConfig {
    /// ffmpeg audio encoder (default: libfdk_aac)
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// H.264 profile (default: baseline)
    #[serde(default = "default_video_profile")]
    pub video_profile: String,

    /// x264 preset (default: slow)
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Per-rung encode timeout in seconds (default: 24 hours)
    #[serde(default = "default_encode_timeout")]
    pub timeout_secs: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            audio_codec: default_audio_codec(),
            video_profile: default_video_profile(),
            preset: default_preset(),
            timeout_secs: default_encode_timeout(),
        }
    }
}

fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}

fn default_video_profile() -> String {
    DEFAULT_VIDEO_PROFILE.to_string()
}

fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}

fn default_encode_timeout() -> u64 {
    DEFAULT_ENCODE_TIMEOUT.as_secs()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FragmenterConfig {
    /// Fragment duration in milliseconds; unset fragments at every sync sample
    #[serde(default)]
    pub fragment_duration_ms: Option<u32>,

    /// Timescale for the fragmented tracks
    #[serde(default)]
    pub timescale: Option<u32>,

    /// Per-rung fragmenter timeout in seconds (default: 1 hour)
    #[serde(default = "default_fragment_timeout")]
    pub timeout_secs: u64,
}

impl Default for FragmenterConfig {
    fn default() -> Self {
        Self {
            fragment_duration_ms: None,
            timescale: None,
            timeout_secs: default_fragment_timeout(),
        }
    }
}

fn default_fragment_timeout() -> u64 {
    DEFAULT_FRAGMENT_TIMEOUT.as_secs()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// ffprobe timeout in seconds (default: 60)
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_probe_timeout(),
        }
    }
}

fn default_probe_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT.as_secs()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunDefaults {
    /// Number of rungs encoded at the same time (default: 1)
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Directory receiving the fragmented files (default: ./output)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_jobs() -> usize {
    1
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
