//! FFprobe-based media probing.

use super::types::*;
use crate::command::{ToolCommand, Verbosity};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    format_name: String,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
}

/// Runs ffprobe against a source and extracts the planning inputs.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    path: PathBuf,
    timeout: Duration,
    verbosity: Verbosity,
}

impl FfprobeProber {
    /// Create a prober for the ffprobe binary at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: DEFAULT_PROBE_TIMEOUT,
            verbosity: Verbosity::default(),
        }
    }

    /// Set the maximum time ffprobe may run.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Control ffprobe's own logging and error detail.
    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Build the ffprobe invocation for `source`.
    pub fn command(&self, source: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.path.clone());
        cmd.args(["-of", "json", "-show_format", "-show_streams"]);
        if !self.verbosity.debug {
            cmd.args(["-v", "quiet"]);
        }
        cmd.arg(source)
            .timeout(self.timeout)
            .verbosity(self.verbosity);
        cmd
    }

    /// Probe `source`.
    ///
    /// # Errors
    ///
    /// Tool errors from running ffprobe, or [`Error::Probe`] when the output
    /// has no usable video stream or frame rate.
    pub async fn probe(&self, source: &Path, cancel: &CancellationToken) -> Result<MediaInfo> {
        let output = self
            .command(source)
            .cancel_on(cancel.clone())
            .execute()
            .await?;

        let info = parse_ffprobe_json(source, &output.stdout)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "probed {}: {}x{} @ {:.3} fps ({})",
            source.display(),
            info.video.width,
            info.video.height,
            info.video.frame_rate,
            info.video.codec
        );

        Ok(info)
    }
}

/// Parse ffprobe's JSON report into [`MediaInfo`].
///
/// The first stream with `codec_type` "video" is used.
pub fn parse_ffprobe_json(path: &Path, json: &str) -> Result<MediaInfo> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::probe(format!("unparseable ffprobe output: {e}")))?;
    parse_ffprobe_output(path, output)
}

fn parse_ffprobe_output(path: &Path, output: FfprobeOutput) -> Result<MediaInfo> {
    let stream = output
        .streams
        .into_iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| Error::probe(format!("no video stream found in {}", path.display())))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(Error::probe(format!(
                "video stream {} has no dimensions",
                stream.index
            )))
        }
    };

    let rate = stream
        .avg_frame_rate
        .as_deref()
        .ok_or_else(|| Error::probe(format!("video stream {} has no frame rate", stream.index)))?;
    let frame_rate = parse_frame_rate(rate)?;

    let (container, duration) = match output.format {
        Some(format) => (
            format.format_name,
            format
                .duration
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|d| d.is_finite() && *d >= 0.0)
                .map(Duration::from_secs_f64),
        ),
        None => (String::new(), None),
    };

    Ok(MediaInfo {
        file_path: path.to_path_buf(),
        container,
        duration,
        video: VideoStream {
            index: stream.index,
            codec: stream.codec_name.unwrap_or_default(),
            width,
            height,
            frame_rate,
        },
    })
}

/// Parse a frame rate given as `num/den` or as a decimal.
///
/// # Errors
///
/// [`Error::Probe`] for a zero denominator, unparseable text or a
/// non-positive rate.
pub fn parse_frame_rate(rate: &str) -> Result<f64> {
    let rate = rate.trim();
    let invalid = || Error::probe(format!("invalid frame rate: {rate:?}"));

    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().map_err(|_| invalid())?;
            let den: f64 = den.trim().parse().map_err(|_| invalid())?;
            if den == 0.0 {
                return Err(invalid());
            }
            num / den
        }
        None => rate.parse().map_err(|_| invalid())?,
    };

    if fps.is_finite() && fps > 0.0 {
        Ok(fps)
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MP4_REPORT: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "aac",
                "codec_type": "audio",
                "sample_rate": "48000",
                "channels": 2,
                "avg_frame_rate": "0/0"
            },
            {
                "index": 1,
                "codec_name": "h264",
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "r_frame_rate": "24000/1001",
                "avg_frame_rate": "24000/1001"
            },
            {
                "index": 2,
                "codec_name": "hevc",
                "codec_type": "video",
                "width": 640,
                "height": 360,
                "avg_frame_rate": "30/1"
            }
        ],
        "format": {
            "filename": "movie.mp4",
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
            "duration": "596.474195",
            "size": "158008374"
        }
    }"#;

    #[test]
    fn test_parse_report_uses_first_video_stream() {
        let info = parse_ffprobe_json(Path::new("movie.mp4"), MP4_REPORT).unwrap();
        assert_eq!(info.video.index, 1);
        assert_eq!(info.video.codec, "h264");
        assert_eq!(info.resolution().to_string(), "1920x1080");
        assert!((info.frame_rate() - 23.976).abs() < 0.001);
        assert_eq!(info.container, "mov,mp4,m4a,3gp,3g2,mj2");
        assert_eq!(info.duration.unwrap().as_secs(), 596);
    }

    #[test]
    fn test_parse_report_without_video() {
        let json = r#"{"streams": [{"index": 0, "codec_type": "audio"}], "format": {"format_name": "mp3"}}"#;
        let err = parse_ffprobe_json(Path::new("song.mp3"), json).unwrap_err();
        assert!(matches!(err, Error::Probe(_)));
        assert!(err.to_string().contains("no video stream"));
    }

    #[test]
    fn test_parse_report_with_zero_frame_rate() {
        let json = r#"{"streams": [{"index": 0, "codec_type": "video", "width": 1280, "height": 720, "avg_frame_rate": "0/0"}]}"#;
        let err = parse_ffprobe_json(Path::new("still.mp4"), json).unwrap_err();
        assert!(matches!(err, Error::Probe(_)));
    }

    #[test]
    fn test_parse_report_missing_dimensions() {
        let json = r#"{"streams": [{"index": 0, "codec_type": "video", "avg_frame_rate": "25/1"}]}"#;
        assert!(matches!(
            parse_ffprobe_json(Path::new("broken.mp4"), json),
            Err(Error::Probe(_))
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_ffprobe_json(Path::new("x.mp4"), "not json"),
            Err(Error::Probe(_))
        ));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25/1").unwrap(), 25.0);
        assert_eq!(parse_frame_rate("30000/1001").unwrap(), 30000.0 / 1001.0);
        assert_eq!(parse_frame_rate("29.97").unwrap(), 29.97);
        assert!(parse_frame_rate("24/0").is_err());
        assert!(parse_frame_rate("0/1").is_err());
        assert!(parse_frame_rate("-25").is_err());
        assert!(parse_frame_rate("abc").is_err());
        assert!(parse_frame_rate("").is_err());
    }

    #[test]
    fn test_command_args() {
        let prober = FfprobeProber::new("/usr/bin/ffprobe");
        let cmd = prober.command(Path::new("in.mov"));
        assert_eq!(
            cmd.get_args(),
            ["-of", "json", "-show_format", "-show_streams", "-v", "quiet", "in.mov"]
        );

        let prober = prober.verbosity(Verbosity {
            verbose: false,
            debug: true,
        });
        let cmd = prober.command(Path::new("in.mov"));
        assert!(!cmd.get_args().iter().any(|a| a == "quiet"));
    }
}
