//! Encode one rung with ffmpeg and libx264.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dashladder_plan::{EncoderParams, Rung};
use tokio_util::sync::CancellationToken;

use crate::command::{ToolCommand, Verbosity};
use crate::tools::{ToolRegistry, FFMPEG};
use crate::Result;

/// Default audio codec.
pub const DEFAULT_AUDIO_CODEC: &str = "libfdk_aac";
/// Default H.264 profile.
pub const DEFAULT_VIDEO_PROFILE: &str = "baseline";
/// Default x264 preset.
pub const DEFAULT_PRESET: &str = "slow";
/// Default encoder timeout: 24 hours.
pub const DEFAULT_ENCODE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Encoder options shared by every rung.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSettings {
    pub audio_codec: String,
    pub video_profile: String,
    pub preset: String,
    pub timeout: Duration,
    /// Pass `-y` to the encoder.
    pub force: bool,
    pub verbosity: Verbosity,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            video_profile: DEFAULT_VIDEO_PROFILE.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            timeout: DEFAULT_ENCODE_TIMEOUT,
            force: false,
            verbosity: Verbosity::default(),
        }
    }
}

/// Everything that varies per rung.
#[derive(Debug, Clone)]
pub struct EncodeRequest<'a> {
    pub source: &'a Path,
    pub rung: &'a Rung,
    pub params: EncoderParams,
    pub audio_bitrate_kbps: u32,
    /// Unfragmented output file.
    pub output: PathBuf,
}

/// Build the ffmpeg argument list for `request`.
pub fn encoder_args(request: &EncodeRequest<'_>, settings: &EncodeSettings) -> Vec<OsString> {
    let params = &request.params;
    let segment = params.segment_size_frames;

    let mut args: Vec<OsString> = vec![
        "-i".into(),
        request.source.into(),
        "-strict".into(),
        "experimental".into(),
        "-acodec".into(),
        settings.audio_codec.as_str().into(),
        "-ac".into(),
        "2".into(),
        "-ab".into(),
        format!("{}k", request.audio_bitrate_kbps).into(),
        "-profile:v".into(),
        settings.video_profile.as_str().into(),
        "-preset".into(),
        settings.preset.as_str().into(),
        "-vcodec".into(),
        "libx264".into(),
    ];

    if !settings.verbosity.debug {
        args.extend(["-v", "quiet"].map(OsString::from));
    }
    if settings.force {
        args.push("-y".into());
    }

    let tail: [OsString; 9] = [
        "-b:v".into(),
        format!("{}k", request.rung.bitrate_label()).into(),
        "-x264opts".into(),
        format!(
            "keyint={segment}:min-keyint={segment}:scenecut=0:rc-lookahead={segment}:vbv-bufsize={}:vbv-maxrate={}",
            params.vbv_bufsize_kbps, params.vbv_maxrate_kbps
        )
        .into(),
        "-s".into(),
        request.rung.resolution.to_string().into(),
        "-f".into(),
        "mp4".into(),
        request.output.as_os_str().to_os_string(),
    ];
    args.extend(tail);

    args
}

/// Run the encoder for one rung.
///
/// # Errors
///
/// Tool errors from ffmpeg, including [`crate::Error::Cancelled`] when
/// `cancel` fires.
pub async fn encode(
    tools: &ToolRegistry,
    request: &EncodeRequest<'_>,
    settings: &EncodeSettings,
    cancel: &CancellationToken,
) -> Result<()> {
    let ffmpeg = tools.require(FFMPEG)?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        "encoding rung {} at {}kbps, {}",
        request.rung.index,
        request.rung.bitrate_label(),
        request.rung.resolution
    );

    let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
    cmd.args(encoder_args(request, settings))
        .timeout(settings.timeout)
        .verbosity(settings.verbosity)
        .cancel_on(cancel.clone());
    cmd.execute().await?;

    Ok(())
}
