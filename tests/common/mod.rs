//! Shared helpers for integration tests.
//!
//! Provides [`FakeTools`], a temp directory of shell scripts standing in for
//! ffprobe, ffmpeg and mp4fragment. Every script appends its command line to
//! a log so tests can check what ran.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use dashladder::config::{Config, RunConfig, RunOverrides};
use dashladder_av::ToolPaths;
use dashladder_plan::LadderSpec;
use tempfile::TempDir;

/// ffprobe report for a 1280x720, 25 fps source.
pub const PROBE_720P_25FPS: &str = r#"{"streams":[{"index":0,"codec_type":"audio","codec_name":"aac","avg_frame_rate":"0/0"},{"index":1,"codec_type":"video","codec_name":"h264","width":1280,"height":720,"avg_frame_rate":"25/1"}],"format":{"format_name":"mov,mp4,m4a,3gp,3g2,mj2","duration":"10.000000"}}"#;

/// Writes the last argument, like an encoder producing its output file.
pub const FFMPEG_OK: &str = r#"for last; do :; done
printf 'encoded' > "$last""#;

/// Fails the way ffmpeg does on a bad input.
pub const FFMPEG_FAIL: &str = r#"echo "in.mov: Invalid data found when processing input" >&2
exit 1"#;

/// Runs long enough to be cancelled.
pub const FFMPEG_SLOW: &str = "exec sleep 30";

/// Copies the second-to-last argument to the last one.
pub const MP4FRAGMENT_OK: &str = r#"for arg; do input=$output; output=$arg; done
cp "$input" "$output""#;

/// Fails the way mp4fragment does on an input without a moov box.
pub const MP4FRAGMENT_FAIL: &str = r#"echo "ERROR: no moov found in the input file" >&2
exit 2"#;

pub struct FakeTools {
    pub dir: TempDir,
    pub log: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub mp4fragment: PathBuf,
}

impl FakeTools {
    /// Tools that all succeed.
    pub fn new() -> Self {
        Self::with_ffmpeg(FFMPEG_OK)
    }

    /// Working probe and fragmenter, custom encoder body.
    pub fn with_ffmpeg(ffmpeg_body: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("invocations.log");

        let ffprobe_body = format!("cat <<'JSON'\n{PROBE_720P_25FPS}\nJSON");
        let ffmpeg = write_script(dir.path(), &log, "ffmpeg", ffmpeg_body);
        let ffprobe = write_script(dir.path(), &log, "ffprobe", &ffprobe_body);
        let mp4fragment = write_script(dir.path(), &log, "mp4fragment", MP4FRAGMENT_OK);

        Self {
            dir,
            log,
            ffmpeg,
            ffprobe,
            mp4fragment,
        }
    }

    /// Replace the fragmenter with a custom body.
    pub fn with_mp4fragment(self, body: &str) -> Self {
        write_script(self.dir.path(), &self.log, "mp4fragment", body);
        self
    }

    /// Replace the probe with one that prints `json`.
    pub fn with_probe_output(self, json: &str) -> Self {
        let body = format!("cat <<'JSON'\n{json}\nJSON");
        write_script(self.dir.path(), &self.log, "ffprobe", &body);
        self
    }

    pub fn tool_paths(&self) -> ToolPaths {
        ToolPaths {
            ffmpeg_path: Some(self.ffmpeg.clone()),
            ffprobe_path: Some(self.ffprobe.clone()),
            mp4fragment_path: Some(self.mp4fragment.clone()),
        }
    }

    /// Logged command lines, one per invocation, e.g. `ffmpeg -i in.mov ...`.
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn invocations_of(&self, tool: &str) -> Vec<String> {
        let prefix = format!("{tool} ");
        self.invocations()
            .into_iter()
            .filter(|line| line.starts_with(&prefix))
            .collect()
    }

    /// A `[tools]` section pointing at the fake scripts.
    pub fn config_toml(&self) -> String {
        format!(
            "[tools]\nffmpeg_path = {:?}\nffprobe_path = {:?}\nmp4fragment_path = {:?}\n",
            self.ffmpeg.display().to_string(),
            self.ffprobe.display().to_string(),
            self.mp4fragment.display().to_string(),
        )
    }
}

fn write_script(dir: &Path, log: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\necho \"{name} $*\" >> '{}'\n{body}\n",
        log.display()
    );
    fs::write(&path, script).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    path
}

/// A source file and an output directory inside one temp directory.
pub struct Workdir {
    pub dir: TempDir,
    pub source: PathBuf,
    pub output_dir: PathBuf,
}

impl Workdir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.mov");
        fs::write(&source, b"not really a movie").unwrap();
        let output_dir = dir.path().join("output");
        Self {
            dir,
            source,
            output_dir,
        }
    }

    /// Names of the entries in the output directory, sorted.
    pub fn outputs(&self) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(&self.output_dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Run settings using `tools` and `ladder`.
    pub fn run_config(&self, tools: &FakeTools, ladder: LadderSpec) -> RunConfig {
        let config = Config {
            tools: tools.tool_paths(),
            ..Config::default()
        };
        RunConfig::resolve(
            &config,
            RunOverrides {
                source: self.source.clone(),
                output_dir: Some(self.output_dir.clone()),
                ladder,
                ..RunOverrides::default()
            },
        )
        .unwrap()
    }
}
