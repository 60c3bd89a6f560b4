//! Fragment an encoded file with mp4fragment.

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::command::{ToolCommand, Verbosity};
use crate::tools::{ToolRegistry, MP4FRAGMENT};
use crate::Result;

/// Default fragmenter timeout: 1 hour.
pub const DEFAULT_FRAGMENT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Fragmenter options.
///
/// Without a fragment duration mp4fragment cuts at every sync sample, which
/// lines up with the fixed GOP the encoder produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSettings {
    pub fragment_duration_ms: Option<u32>,
    pub timescale: Option<u32>,
    pub timeout: Duration,
    pub verbosity: Verbosity,
}

impl Default for FragmentSettings {
    fn default() -> Self {
        Self {
            fragment_duration_ms: None,
            timescale: None,
            timeout: DEFAULT_FRAGMENT_TIMEOUT,
            verbosity: Verbosity::default(),
        }
    }
}

/// Build the mp4fragment argument list.
pub fn fragment_args(input: &Path, output: &Path, settings: &FragmentSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    if settings.verbosity.debug {
        args.push("--debug".into());
    }
    if let Some(ms) = settings.fragment_duration_ms {
        args.push("--fragment-duration".into());
        args.push(ms.to_string().into());
    }
    if let Some(timescale) = settings.timescale {
        args.push("--timescale".into());
        args.push(timescale.to_string().into());
    }
    args.push(input.into());
    args.push(output.into());
    args
}

/// Fragment `input` into `output`.
///
/// # Errors
///
/// Tool errors from mp4fragment, including [`crate::Error::Cancelled`].
pub async fn fragment(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    settings: &FragmentSettings,
    cancel: &CancellationToken,
) -> Result<()> {
    let mp4fragment = tools.require(MP4FRAGMENT)?;

    #[cfg(feature = "tracing")]
    tracing::info!("fragmenting {:?} -> {:?}", input, output);

    let mut cmd = ToolCommand::new(mp4fragment.to_path_buf());
    cmd.args(fragment_args(input, output, settings))
        .timeout(settings.timeout)
        .verbosity(settings.verbosity)
        .cancel_on(cancel.clone());
    cmd.execute().await?;

    Ok(())
}
