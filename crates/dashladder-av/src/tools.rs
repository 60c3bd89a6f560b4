//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers the locations of the probe, encoder and
//! fragmenter binaries once per run and hands out their paths.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Media probe binary.
pub const FFPROBE: &str = "ffprobe";
/// Encoder binary.
pub const FFMPEG: &str = "ffmpeg";
/// Fragmenter binary.
pub const MP4FRAGMENT: &str = "mp4fragment";

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &[FFMPEG, FFPROBE, MP4FRAGMENT];

/// Optional explicit paths for the external tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    #[serde(default)]
    pub mp4fragment_path: Option<PathBuf>,
}

impl ToolPaths {
    fn get(&self, name: &str) -> Option<&Path> {
        match name {
            FFMPEG => self.ffmpeg_path.as_deref(),
            FFPROBE => self.ffprobe_path.as_deref(),
            MP4FRAGMENT => self.mp4fragment_path.as_deref(),
            _ => None,
        }
    }
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of the version output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool paths.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, PathBuf>,
}

impl ToolRegistry {
    /// Discover tools, preferring configured paths over `PATH` lookup.
    ///
    /// A configured path is used only if it exists; otherwise
    /// [`which::which`] searches `PATH`. Tools that are not found are left
    /// out of the registry.
    pub fn discover(paths: &ToolPaths) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let resolved = match paths.get(name) {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(_p) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        "configured {name} path {} does not exist, searching PATH",
                        _p.display()
                    );
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            if let Some(path) = resolved {
                tools.insert(name.to_string(), path);
            }
        }

        Self { tools }
    }

    /// Path of the given tool, or [`Error::ToolNotFound`].
    pub fn require(&self, name: &str) -> Result<&Path> {
        self.tools
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::tool_not_found(name))
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(path) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(name, path),
                    path: Some(path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// First line of `<tool> -version` for the ffmpeg family. mp4fragment has no
/// version flag and prints its banner as the first line of its usage text.
fn detect_version(name: &str, path: &Path) -> Option<String> {
    let mut cmd = std::process::Command::new(path);
    if name != MP4FRAGMENT {
        cmd.arg("-version");
    }

    let output = cmd.output().ok()?;
    let text = if name == MP4FRAGMENT {
        output.stderr
    } else if output.status.success() {
        output.stdout
    } else {
        return None;
    };

    String::from_utf8_lossy(&text)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
