//! Per-rung scratch space.
//!
//! A [`Workspace`] owns a hidden temporary directory next to the final
//! output. The encoder writes its unfragmented file there and the
//! fragmenter writes its result there too; only [`Workspace::finalize`]
//! moves the fragmented file to its final name. The directory and anything
//! left in it are removed when the workspace is dropped, whether the rung
//! succeeded, failed or was cancelled.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scoped temp directory for one rung.
///
/// # Example
///
/// ```no_run
/// use dashladder_av::Workspace;
/// use std::path::Path;
///
/// let workspace = Workspace::new(Path::new("output/video_00500.mp4"))?;
/// // encoder writes workspace.encoded(), fragmenter writes workspace.fragmented()
/// workspace.finalize(false)?;
/// # Ok::<(), dashladder_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
    output_path: PathBuf,
}

impl Workspace {
    /// Create a workspace for producing `output`.
    ///
    /// The temp directory is created in the output's parent directory so the
    /// final move is a same-filesystem rename.
    pub fn new(output: &Path) -> Result<Self> {
        let file_name = output
            .file_name()
            .ok_or_else(|| Error::Workspace(format!("invalid output path: {}", output.display())))?;
        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let temp_dir = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name.to_string_lossy()))
            .tempdir_in(parent)
            .map_err(|e| Error::Workspace(format!("failed to create temp dir: {e}")))?;

        Ok(Self {
            temp_dir,
            output_path: output.to_path_buf(),
        })
    }

    /// Final output path.
    pub fn output(&self) -> &Path {
        &self.output_path
    }

    /// Path to the temporary directory.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a path for a named temporary file inside the workspace.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Where the encoder writes: the output name with a trailing `_`.
    pub fn encoded(&self) -> PathBuf {
        let name = self.output_file_name();
        self.temp_file(&format!("{name}_"))
    }

    /// Where the fragmenter writes before finalization.
    pub fn fragmented(&self) -> PathBuf {
        self.temp_file(&self.output_file_name())
    }

    fn output_file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "output.mp4".to_string())
    }

    /// Move the fragmented file to the output path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exists`] if the output appeared in the meantime and
    /// `overwrite` is false, or a workspace error if the fragmented file is
    /// missing or cannot be moved.
    pub fn finalize(self, overwrite: bool) -> Result<PathBuf> {
        let fragmented = self.fragmented();
        let dest = self.output_path.clone();

        if !fragmented.exists() {
            return Err(Error::Workspace(format!(
                "fragmented file does not exist: {}",
                fragmented.display()
            )));
        }

        if dest.exists() && !overwrite {
            return Err(Error::exists(dest));
        }

        // Same directory tree, so rename normally succeeds; fall back to copy.
        if let Err(_rename_err) = std::fs::rename(&fragmented, &dest) {
            std::fs::copy(&fragmented, &dest).map_err(|e| {
                Error::Workspace(format!("failed to copy output to destination: {e}"))
            })?;
        }

        Ok(dest)
    }
}
