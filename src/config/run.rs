//! Settings for a single run, merged from the config file and the command line.

use super::Config;
use dashladder_av::{EncodeSettings, FragmentSettings, ToolPaths, Verbosity};
use dashladder_plan::LadderSpec;
use std::path::PathBuf;
use std::time::Duration;

/// Values supplied on the command line.
///
/// `None` means "not given"; the config file or the built-in default applies.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub source: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub ladder: LadderSpec,
    pub jobs: Option<usize>,
    pub force: bool,
    pub verbose: bool,
    pub debug: bool,
    pub dry_run: bool,
}

/// Everything the driver needs, built once and passed by reference.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub ladder: LadderSpec,
    pub jobs: usize,
    pub force: bool,
    pub dry_run: bool,
    pub verbosity: Verbosity,
    pub tools: ToolPaths,
    pub encode: EncodeSettings,
    pub fragment: FragmentSettings,
    pub probe_timeout: Duration,
}

impl RunConfig {
    /// Merge command-line values over the config file.
    pub fn resolve(config: &Config, overrides: RunOverrides) -> anyhow::Result<Self> {
        let jobs = overrides.jobs.unwrap_or(config.run.jobs);
        if jobs == 0 {
            anyhow::bail!("--jobs must be at least 1");
        }

        let verbosity = Verbosity {
            verbose: overrides.verbose,
            debug: overrides.debug,
        };

        let encode = EncodeSettings {
            audio_codec: config.encoder.audio_codec.clone(),
            video_profile: config.encoder.video_profile.clone(),
            preset: config.encoder.preset.clone(),
            timeout: Duration::from_secs(config.encoder.timeout_secs),
            force: overrides.force,
            verbosity,
        };

        let fragment = FragmentSettings {
            fragment_duration_ms: config.fragmenter.fragment_duration_ms,
            timescale: config.fragmenter.timescale,
            timeout: Duration::from_secs(config.fragmenter.timeout_secs),
            verbosity,
        };

        Ok(Self {
            source: overrides.source,
            output_dir: overrides
                .output_dir
                .unwrap_or_else(|| config.run.output_dir.clone()),
            ladder: overrides.ladder,
            jobs,
            force: overrides.force,
            dry_run: overrides.dry_run,
            verbosity,
            tools: config.tools.clone(),
            encode,
            fragment,
            probe_timeout: Duration::from_secs(config.probe.timeout_secs),
        })
    }

    /// Whether the source has to be probed before planning.
    pub fn needs_probe(&self) -> bool {
        self.ladder.source_resolution.is_none() || self.ladder.segment_size_frames.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashladder_plan::Resolution;

    fn overrides() -> RunOverrides {
        RunOverrides {
            source: PathBuf::from("in.mov"),
            ..RunOverrides::default()
        }
    }

    #[test]
    fn test_config_values_apply() {
        let mut config = Config::default();
        config.run.jobs = 3;
        config.run.output_dir = PathBuf::from("/srv/renditions");
        config.encoder.preset = "fast".to_string();
        config.fragmenter.timescale = Some(90000);

        let run = RunConfig::resolve(&config, overrides()).unwrap();
        assert_eq!(run.jobs, 3);
        assert_eq!(run.output_dir, PathBuf::from("/srv/renditions"));
        assert_eq!(run.encode.preset, "fast");
        assert_eq!(run.fragment.timescale, Some(90000));
        assert_eq!(run.probe_timeout, Duration::from_secs(60));
        assert!(run.needs_probe());
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = Config::default();
        config.run.jobs = 3;

        let run = RunConfig::resolve(
            &config,
            RunOverrides {
                output_dir: Some(PathBuf::from("out")),
                jobs: Some(2),
                force: true,
                debug: true,
                ladder: LadderSpec::default()
                    .with_source_resolution(Resolution {
                        width: 1280,
                        height: 720,
                    })
                    .with_segment_size(48),
                ..overrides()
            },
        )
        .unwrap();

        assert_eq!(run.jobs, 2);
        assert_eq!(run.output_dir, PathBuf::from("out"));
        assert!(run.encode.force);
        assert!(run.fragment.verbosity.debug);
        assert!(!run.needs_probe());
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let result = RunConfig::resolve(
            &Config::default(),
            RunOverrides {
                jobs: Some(0),
                ..overrides()
            },
        );
        assert!(result.is_err());
    }
}
