//! One rung's encode and fragment pass.

use super::report::RungReport;
use super::state::RungState;
use dashladder_av::actions::{encode, fragment};
use dashladder_av::{
    EncodeRequest, EncodeSettings, Error, FragmentSettings, Result, ToolRegistry, Workspace,
};
use dashladder_plan::{EncoderParams, Rung};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// File name of the fragmented output for a bitrate: `video_00500.mp4`.
pub fn output_file_name(bitrate_kbps: u32) -> String {
    format!("video_{bitrate_kbps:05}.mp4")
}

/// Settings shared by every job of a run.
#[derive(Debug)]
pub struct JobContext {
    pub source: PathBuf,
    pub audio_bitrate_kbps: u32,
    pub tools: ToolRegistry,
    pub encode: EncodeSettings,
    pub fragment: FragmentSettings,
    pub force: bool,
}

/// A planned rung plus where its output goes.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub rung: Rung,
    pub params: EncoderParams,
    pub output: PathBuf,
    state: RungState,
}

impl EncodeJob {
    pub fn new(rung: Rung, params: EncoderParams, output_dir: &Path) -> Self {
        let output = output_dir.join(output_file_name(rung.bitrate_label()));
        Self {
            rung,
            params,
            output,
            state: RungState::Planned,
        }
    }

    pub fn state(&self) -> RungState {
        self.state
    }

    /// Report for this job in its current state.
    pub fn report(&self) -> RungReport {
        RungReport {
            index: self.rung.index,
            bitrate_kbps: self.rung.bitrate_kbps,
            resolution: self.rung.resolution,
            pixels: self.rung.pixels,
            bits_per_pixel: self.rung.bits_per_pixel,
            output: self.output.clone(),
            state: self.state,
            error: None,
            error_kind: None,
        }
    }

    /// Encode, fragment and move the result into place.
    ///
    /// Never returns an error; failures end up in the report. The rung's temp
    /// directory is gone by the time this returns.
    pub async fn run(mut self, ctx: &JobContext, cancel: &CancellationToken) -> RungReport {
        match self.execute(ctx, cancel).await {
            Ok(()) => {
                tracing::info!(
                    "rung {} done: {}",
                    self.rung.index,
                    self.output.display()
                );
                self.report()
            }
            Err(e) => {
                if let Err(state_err) = self.state.transition(RungState::Failed) {
                    tracing::warn!("{state_err}");
                }
                if matches!(e, Error::Cancelled) {
                    tracing::warn!("rung {} cancelled", self.rung.index);
                } else {
                    tracing::error!("rung {} failed: {e}", self.rung.index);
                }
                RungReport {
                    error: Some(e.to_string()),
                    error_kind: Some(e.kind()),
                    ..self.report()
                }
            }
        }
    }

    async fn execute(&mut self, ctx: &JobContext, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.output.exists() && !ctx.force {
            return Err(Error::exists(&self.output));
        }

        let workspace = Workspace::new(&self.output)?;
        tracing::debug!(
            "rung {} workspace: {}",
            self.rung.index,
            workspace.temp_dir().display()
        );

        self.state.transition(RungState::Encoding)?;
        let request = EncodeRequest {
            source: &ctx.source,
            rung: &self.rung,
            params: self.params,
            audio_bitrate_kbps: ctx.audio_bitrate_kbps,
            output: workspace.encoded(),
        };
        encode(&ctx.tools, &request, &ctx.encode, cancel).await?;
        self.state.transition(RungState::Encoded)?;

        self.state.transition(RungState::Fragmenting)?;
        fragment(
            &ctx.tools,
            &workspace.encoded(),
            &workspace.fragmented(),
            &ctx.fragment,
            cancel,
        )
        .await?;
        workspace.finalize(ctx.force)?;
        self.state.transition(RungState::Done)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashladder_plan::Resolution;

    fn job(output_dir: &Path) -> EncodeJob {
        let rung = Rung {
            index: 0,
            bitrate_kbps: 500.0,
            pixels: 331_776.0,
            resolution: Resolution {
                width: 768,
                height: 432,
            },
            bits_per_pixel: 0.0628,
        };
        let params = EncoderParams::for_rung(&rung, 72).unwrap();
        EncodeJob::new(rung, params, output_dir)
    }

    fn context(force: bool) -> JobContext {
        JobContext {
            source: PathBuf::from("in.mov"),
            audio_bitrate_kbps: 128,
            tools: ToolRegistry::default(),
            encode: EncodeSettings::default(),
            fragment: FragmentSettings::default(),
            force,
        }
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(500), "video_00500.mp4");
        assert_eq!(output_file_name(1250), "video_01250.mp4");
        assert_eq!(output_file_name(123456), "video_123456.mp4");
    }

    #[test]
    fn test_new_job_is_planned() {
        let job = job(Path::new("output"));
        assert_eq!(job.state(), RungState::Planned);
        assert_eq!(job.output, Path::new("output/video_00500.mp4"));
        assert_eq!(job.report().error, None);
    }

    #[tokio::test]
    async fn test_existing_output_fails_before_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        std::fs::write(&job.output, b"old").unwrap();

        let report = job.run(&context(false), &CancellationToken::new()).await;
        assert_eq!(report.state, RungState::Failed);
        assert_eq!(report.error_kind, Some(dashladder_av::ErrorKind::Exists));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_missing_encoder_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let report = job(dir.path())
            .run(&context(false), &CancellationToken::new())
            .await;
        assert_eq!(report.state, RungState::Failed);
        assert_eq!(report.error_kind, Some(dashladder_av::ErrorKind::ExternalTool));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = job(dir.path()).run(&context(false), &cancel).await;
        assert_eq!(report.error_kind, Some(dashladder_av::ErrorKind::Cancelled));
    }
}
