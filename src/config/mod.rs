mod run;
mod types;

pub use run::*;
pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Default config locations, searched in order when no path is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./dashladder.toml",
    "~/.config/dashladder/config.toml",
    "/etc/dashladder/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config).with_context(|| format!("Invalid config file: {:?}", path))?;

    tracing::debug!("Loaded config from {:?}", path);
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_CONFIG_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.run.jobs == 0 {
        anyhow::bail!("run.jobs must be at least 1");
    }

    if config.encoder.timeout_secs == 0 {
        anyhow::bail!("encoder.timeout_secs cannot be 0");
    }
    if config.fragmenter.timeout_secs == 0 {
        anyhow::bail!("fragmenter.timeout_secs cannot be 0");
    }
    if config.probe.timeout_secs == 0 {
        anyhow::bail!("probe.timeout_secs cannot be 0");
    }

    for (name, value) in [
        ("encoder.audio_codec", &config.encoder.audio_codec),
        ("encoder.video_profile", &config.encoder.video_profile),
        ("encoder.preset", &config.encoder.preset),
    ] {
        if value.trim().is_empty() {
            anyhow::bail!("{name} cannot be empty");
        }
    }

    if config.fragmenter.fragment_duration_ms == Some(0) {
        anyhow::bail!("fragmenter.fragment_duration_ms cannot be 0");
    }
    if config.fragmenter.timescale == Some(0) {
        anyhow::bail!("fragmenter.timescale cannot be 0");
    }

    for (name, path) in [
        ("ffmpeg", &config.tools.ffmpeg_path),
        ("ffprobe", &config.tools.ffprobe_path),
        ("mp4fragment", &config.tools.mp4fragment_path),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                tracing::warn!("Configured {} path does not exist: {:?}", name, path);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        validate_config(&config).unwrap();
        assert_eq!(config.run.jobs, 1);
        assert_eq!(config.run.output_dir, Path::new("output"));
        assert_eq!(config.encoder.audio_codec, "libfdk_aac");
        assert_eq!(config.encoder.timeout_secs, 86_400);
        assert_eq!(config.fragmenter.timeout_secs, 3_600);
        assert_eq!(config.probe.timeout_secs, 60);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [encoder]
            preset = "veryfast"

            [run]
            jobs = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.encoder.preset, "veryfast");
        assert_eq!(config.encoder.video_profile, "baseline");
        assert_eq!(config.run.jobs, 4);
        assert_eq!(config.run.output_dir, Path::new("output"));
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = Config::default();
        config.run.jobs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.encoder.timeout_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.fragmenter.fragment_duration_ms = Some(0);
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.encoder.preset = " ".to_string();
        assert!(validate_config(&config).is_err());
    }
}
