//! Command-line interface.

use clap::Parser;
use dashladder_plan::ladder::{
    DEFAULT_AUDIO_BITRATE_KBPS, DEFAULT_MAX_BITRATE_KBPS, DEFAULT_MIN_BITRATE_KBPS,
    DEFAULT_RUNG_COUNT,
};
use dashladder_plan::{LadderSpec, Resolution};
use std::path::PathBuf;

use dashladder::config::RunOverrides;

#[derive(Parser, Debug)]
#[command(name = "dashladder")]
#[command(author, version, about = "Encode a video into an adaptive bitrate ladder of fragmented MP4 files")]
pub struct Cli {
    /// Source media file
    #[arg(required_unless_present = "check_tools")]
    pub source: Option<PathBuf>,

    /// Be verbose
    #[arg(short, long)]
    pub verbose: bool,

    /// Print out debugging information
    #[arg(short, long)]
    pub debug: bool,

    /// Output directory [default: output, or run.output_dir from the config file]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Number of bitrates
    #[arg(short = 'b', long = "bitrates", value_name = "N", default_value_t = DEFAULT_RUNG_COUNT)]
    pub bitrates: u32,

    /// Source resolution, used instead of the probed one
    #[arg(short, long, value_name = "WxH")]
    pub resolution: Option<Resolution>,

    /// Minimum video bitrate in kbps
    #[arg(short = 'm', long = "min-video-bitrate", value_name = "KBPS", default_value_t = DEFAULT_MIN_BITRATE_KBPS)]
    pub min_video_bitrate: f64,

    /// Maximum video bitrate in kbps
    #[arg(short = 'n', long = "max-video-bitrate", value_name = "KBPS", default_value_t = DEFAULT_MAX_BITRATE_KBPS)]
    pub max_video_bitrate: f64,

    /// Audio bitrate in kbps
    #[arg(short = 'a', long = "audio-bitrate", value_name = "KBPS", default_value_t = DEFAULT_AUDIO_BITRATE_KBPS)]
    pub audio_bitrate: u32,

    /// Video segment size in frames [default: 3 seconds worth of frames]
    #[arg(short = 's', long = "segment-size", value_name = "FRAMES")]
    pub segment_size: Option<u32>,

    /// Allow output to overwrite existing files
    #[arg(short, long)]
    pub force: bool,

    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of rungs to encode concurrently [default: 1, or run.jobs from the config file]
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Plan the ladder and print it without encoding
    #[arg(long)]
    pub dry_run: bool,

    /// Print the planned ladder as JSON (with --dry-run)
    #[arg(long, requires = "dry_run")]
    pub json: bool,

    /// Check that the external tools are available and exit
    #[arg(long)]
    pub check_tools: bool,
}

impl Cli {
    /// Ladder spec and run overrides from the parsed flags.
    pub fn overrides(&self) -> RunOverrides {
        let mut ladder = LadderSpec::new(self.bitrates, self.min_video_bitrate, self.max_video_bitrate)
            .with_audio_bitrate(self.audio_bitrate);
        if let Some(resolution) = self.resolution {
            ladder = ladder.with_source_resolution(resolution);
        }
        if let Some(frames) = self.segment_size {
            ladder = ladder.with_segment_size(frames);
        }

        RunOverrides {
            source: self.source.clone().unwrap_or_default(),
            output_dir: self.output_dir.clone(),
            ladder,
            jobs: self.jobs,
            force: self.force,
            verbose: self.verbose,
            debug: self.debug,
            dry_run: self.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["dashladder", "in.mov"]).unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.source, PathBuf::from("in.mov"));
        assert_eq!(overrides.ladder, LadderSpec::default());
        assert_eq!(overrides.jobs, None);
        assert_eq!(overrides.output_dir, None);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "dashladder", "-v", "-d", "-o", "dash", "-b", "3", "-r", "1920x1080", "-m", "300",
            "-n", "3000", "-a", "96", "-s", "48", "-f", "-j", "2", "in.mov",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert!(overrides.verbose && overrides.debug && overrides.force);
        assert_eq!(overrides.output_dir, Some(PathBuf::from("dash")));
        assert_eq!(overrides.ladder.rung_count, 3);
        assert_eq!(
            overrides.ladder.source_resolution,
            Some(Resolution {
                width: 1920,
                height: 1080
            })
        );
        assert_eq!(overrides.ladder.min_bitrate_kbps, 300.0);
        assert_eq!(overrides.ladder.max_bitrate_kbps, 3000.0);
        assert_eq!(overrides.ladder.audio_bitrate_kbps, 96);
        assert_eq!(overrides.ladder.segment_size_frames, Some(48));
        assert_eq!(overrides.jobs, Some(2));
    }

    #[test]
    fn test_bad_resolution_rejected() {
        assert!(Cli::try_parse_from(["dashladder", "-r", "1920-1080", "in.mov"]).is_err());
    }

    #[test]
    fn test_source_required() {
        assert!(Cli::try_parse_from(["dashladder"]).is_err());
        assert!(Cli::try_parse_from(["dashladder", "--check-tools"]).is_ok());
    }

    #[test]
    fn test_json_requires_dry_run() {
        assert!(Cli::try_parse_from(["dashladder", "--json", "in.mov"]).is_err());
    }
}
