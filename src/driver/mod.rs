//! Encode driver: probe, plan, then encode and fragment every rung.

mod job;
mod report;
mod state;

pub use job::{output_file_name, EncodeJob, JobContext};
pub use report::{RunReport, RungReport};
pub use state::{RungState, StateError};

use crate::config::RunConfig;
use dashladder_av::{Error, FfprobeProber, Result, ToolRegistry, FFPROBE};
use dashladder_plan::{default_segment_size, plan, EncoderParams, Resolution, Rung};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// What the planner needs from the source, either given or probed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceParams {
    pub resolution: Resolution,
    pub segment_size_frames: u32,
    pub frame_rate: Option<f64>,
}

/// Run the whole ladder.
///
/// Errors that prevent planning (invalid ladder, probe failure) are
/// returned as `Err`. Per-rung failures are recorded in the report.
pub async fn run(config: &RunConfig, cancel: CancellationToken) -> Result<RunReport> {
    config.ladder.validate()?;

    tracing::info!(
        "Encoding {} bitrates, min bitrate = {}, max bitrate = {}",
        config.ladder.rung_count,
        config.ladder.min_bitrate_kbps,
        config.ladder.max_bitrate_kbps
    );

    if (config.needs_probe() || !config.dry_run) && !config.source.exists() {
        return Err(Error::config(format!(
            "source file does not exist: {}",
            config.source.display()
        )));
    }

    let tools = ToolRegistry::discover(&config.tools);
    let source = resolve_source(config, &tools, &cancel).await?;
    tracing::info!(
        "Source resolution = {}, segment size = {} frames",
        source.resolution,
        source.segment_size_frames
    );

    let rungs = plan(&config.ladder, source.resolution)?;
    log_ladder(&rungs);

    let jobs = rungs
        .into_iter()
        .map(|rung| {
            let params = EncoderParams::for_rung(&rung, source.segment_size_frames)?;
            Ok(EncodeJob::new(rung, params, &config.output_dir))
        })
        .collect::<Result<Vec<_>>>()?;
    check_unique_outputs(&jobs)?;

    let mut report = RunReport {
        source: config.source.clone(),
        source_resolution: source.resolution,
        frame_rate: source.frame_rate,
        segment_size_frames: source.segment_size_frames,
        audio_bitrate_kbps: config.ladder.audio_bitrate_kbps,
        dry_run: config.dry_run,
        cancelled: false,
        rungs: jobs.iter().map(EncodeJob::report).collect(),
    };

    if config.dry_run {
        return Ok(report);
    }

    tokio::fs::create_dir_all(&config.output_dir).await?;

    let ctx = Arc::new(JobContext {
        source: config.source.clone(),
        audio_bitrate_kbps: config.ladder.audio_bitrate_kbps,
        tools,
        encode: config.encode.clone(),
        fragment: config.fragment.clone(),
        force: config.force,
    });

    execute(jobs, ctx, config.jobs, &cancel, &mut report.rungs).await;
    report.cancelled = cancel.is_cancelled();

    Ok(report)
}

/// Take resolution and segment size from the ladder spec, probing the
/// source only for what is missing.
pub async fn resolve_source(
    config: &RunConfig,
    tools: &ToolRegistry,
    cancel: &CancellationToken,
) -> Result<SourceParams> {
    let given_resolution = config.ladder.source_resolution;
    let given_segment = config.ladder.segment_size_frames;

    if let (Some(resolution), Some(segment_size_frames)) = (given_resolution, given_segment) {
        return Ok(SourceParams {
            resolution,
            segment_size_frames,
            frame_rate: None,
        });
    }

    let prober = FfprobeProber::new(tools.require(FFPROBE)?)
        .timeout(config.probe_timeout)
        .verbosity(config.verbosity);
    let info = prober.probe(&config.source, cancel).await?;

    let resolution = match given_resolution {
        Some(resolution) => resolution,
        None => Resolution::new(info.video.width, info.video.height)?,
    };
    let segment_size_frames = match given_segment {
        Some(frames) => frames,
        None => default_segment_size(info.frame_rate())?,
    };

    Ok(SourceParams {
        resolution,
        segment_size_frames,
        frame_rate: Some(info.frame_rate()),
    })
}

/// Rungs whose bitrates truncate to the same kbps would share an output
/// file; reject the ladder before anything runs.
fn check_unique_outputs(jobs: &[EncodeJob]) -> Result<()> {
    let mut seen = HashMap::new();
    for job in jobs {
        if let Some(first) = seen.insert(job.output.as_path(), job.rung.index) {
            return Err(Error::config(format!(
                "rungs {first} and {} both map to {}; widen the bitrate range or use fewer rungs",
                job.rung.index,
                job.output.display()
            )));
        }
    }
    Ok(())
}

fn log_ladder(rungs: &[Rung]) {
    for rung in rungs {
        tracing::debug!(
            "rung {}: bitrate = {:.1}kbps, pixels = {:.0}, resolution = {}, bpp = {:.4}",
            rung.index,
            rung.bitrate_kbps,
            rung.pixels,
            rung.resolution,
            rung.bits_per_pixel
        );
    }
}

/// Run jobs with at most `workers` in flight.
///
/// Jobs start in ladder order. Once any job fails or `cancel` fires no new
/// job starts; jobs already running finish (or are killed on cancel).
async fn execute(
    jobs: Vec<EncodeJob>,
    ctx: Arc<JobContext>,
    workers: usize,
    cancel: &CancellationToken,
    reports: &mut [RungReport],
) {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let failed = Arc::new(AtomicBool::new(false));
    let mut tasks = JoinSet::new();

    for job in jobs {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        if failed.load(Ordering::SeqCst) {
            tracing::warn!("skipping remaining rungs after a failure");
            break;
        }

        tracing::info!(
            "starting rung {} ({}kbps, {})",
            job.rung.index,
            job.rung.bitrate_label(),
            job.rung.resolution
        );

        let ctx = Arc::clone(&ctx);
        let cancel = cancel.clone();
        let failed = Arc::clone(&failed);
        tasks.spawn(async move {
            let _permit = permit;
            let report = job.run(&ctx, &cancel).await;
            if report.state == RungState::Failed {
                failed.store(true, Ordering::SeqCst);
            }
            report
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => {
                let index = report.index;
                if let Some(slot) = reports.get_mut(index) {
                    *slot = report;
                }
            }
            Err(e) => tracing::error!("rung task failed to complete: {e}"),
        }
    }
}
