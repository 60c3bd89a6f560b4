//! Per-rung and per-run results, serialized for `--dry-run --json`.

use super::state::RungState;
use dashladder_av::ErrorKind;
use dashladder_plan::Resolution;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one rung.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RungReport {
    pub index: usize,
    pub bitrate_kbps: f64,
    pub resolution: Resolution,
    pub pixels: f64,
    pub bits_per_pixel: f64,
    pub output: PathBuf,
    pub state: RungState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

/// Outcome of a whole run, or the plan when nothing was executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub source: PathBuf,
    pub source_resolution: Resolution,
    /// Frame rate reported by the probe, when the source was probed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    pub segment_size_frames: u32,
    pub audio_bitrate_kbps: u32,
    pub dry_run: bool,
    pub cancelled: bool,
    pub rungs: Vec<RungReport>,
}

impl RunReport {
    /// A dry run always succeeds; a real run succeeds when every rung is done.
    pub fn is_success(&self) -> bool {
        self.dry_run || (!self.cancelled && self.rungs.iter().all(|r| r.state == RungState::Done))
    }

    pub fn failures(&self) -> impl Iterator<Item = &RungReport> {
        self.rungs.iter().filter(|r| r.state == RungState::Failed)
    }

    /// Rungs that never started because the run stopped early.
    pub fn skipped(&self) -> impl Iterator<Item = &RungReport> {
        self.rungs.iter().filter(|r| r.state == RungState::Planned)
    }

    /// One-line summary of why the run did not succeed.
    pub fn error_message(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        if let Some(failure) = self
            .failures()
            .find(|r| r.error_kind != Some(ErrorKind::Cancelled))
        {
            return Some(
                failure
                    .error
                    .clone()
                    .unwrap_or_else(|| format!("rung {} failed", failure.index)),
            );
        }
        if self.cancelled || self.failures().next().is_some() {
            return Some("cancelled".to_string());
        }
        Some(format!(
            "{} of {} rungs were not encoded",
            self.skipped().count(),
            self.rungs.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rung(index: usize, state: RungState) -> RungReport {
        RungReport {
            index,
            bitrate_kbps: 500.0 * (index + 1) as f64,
            resolution: Resolution {
                width: 640,
                height: 368,
            },
            pixels: 230_400.0,
            bits_per_pixel: 0.09,
            output: PathBuf::from(format!("output/video_{:05}.mp4", 500 * (index + 1))),
            state,
            error: None,
            error_kind: None,
        }
    }

    fn report(rungs: Vec<RungReport>) -> RunReport {
        RunReport {
            source: PathBuf::from("in.mov"),
            source_resolution: Resolution {
                width: 640,
                height: 360,
            },
            frame_rate: None,
            segment_size_frames: 72,
            audio_bitrate_kbps: 128,
            dry_run: false,
            cancelled: false,
            rungs,
        }
    }

    #[test]
    fn test_all_done_is_success() {
        let report = report(vec![rung(0, RungState::Done), rung(1, RungState::Done)]);
        assert!(report.is_success());
        assert_eq!(report.error_message(), None);
    }

    #[test]
    fn test_failure_message_comes_from_rung() {
        let mut failed = rung(1, RungState::Failed);
        failed.error = Some("ffmpeg failed with error 1".to_string());
        failed.error_kind = Some(ErrorKind::ExternalTool);
        let report = report(vec![rung(0, RungState::Done), failed, rung(2, RungState::Planned)]);

        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.skipped().count(), 1);
        assert_eq!(
            report.error_message().as_deref(),
            Some("ffmpeg failed with error 1")
        );
    }

    #[test]
    fn test_cancelled_run() {
        let mut report = report(vec![rung(0, RungState::Planned)]);
        report.cancelled = true;
        assert_eq!(report.error_message().as_deref(), Some("cancelled"));
    }

    #[test]
    fn test_dry_run_serializes_without_errors() {
        let mut report = report(vec![rung(0, RungState::Planned)]);
        report.dry_run = true;
        assert!(report.is_success());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rungs"][0]["state"], "planned");
        assert_eq!(json["rungs"][0]["resolution"]["width"], 640);
        assert!(json["rungs"][0].get("error").is_none());
        assert!(json.get("frame_rate").is_none());
    }
}
