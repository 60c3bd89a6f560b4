//! Bitrate/resolution ladder planning.
//!
//! Bitrates are spread linearly between the configured minimum and maximum.
//! Each rung gets a pixel budget that shrinks with bitrate following
//! `(bitrate / max_bitrate)^(4/3)`, and the budget is turned back into a
//! macroblock-aligned resolution with the source aspect ratio.

use crate::resolution::{align_to_macroblock, Resolution};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Exponent applied to the bitrate ratio when scaling the pixel area.
pub const PIXEL_SCALING_EXPONENT: f64 = 4.0 / 3.0;

/// Frame rate assumed when reporting bits per pixel.
pub const REFERENCE_FPS: f64 = 24.0;

/// Default rung count.
pub const DEFAULT_RUNG_COUNT: u32 = 1;
/// Default minimum video bitrate in kbps.
pub const DEFAULT_MIN_BITRATE_KBPS: f64 = 500.0;
/// Default maximum video bitrate in kbps.
pub const DEFAULT_MAX_BITRATE_KBPS: f64 = 2000.0;
/// Default audio bitrate in kbps.
pub const DEFAULT_AUDIO_BITRATE_KBPS: u32 = 128;

/// Input to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderSpec {
    /// Source resolution override. When unset the caller probes the source.
    pub source_resolution: Option<Resolution>,
    /// Lowest video bitrate in kbps.
    pub min_bitrate_kbps: f64,
    /// Highest video bitrate in kbps.
    pub max_bitrate_kbps: f64,
    /// Number of rungs to produce.
    pub rung_count: u32,
    /// Audio bitrate in kbps, shared by every rung.
    pub audio_bitrate_kbps: u32,
    /// GOP / segment length in frames. Derived from the frame rate when unset.
    pub segment_size_frames: Option<u32>,
}

impl Default for LadderSpec {
    fn default() -> Self {
        Self {
            source_resolution: None,
            min_bitrate_kbps: DEFAULT_MIN_BITRATE_KBPS,
            max_bitrate_kbps: DEFAULT_MAX_BITRATE_KBPS,
            rung_count: DEFAULT_RUNG_COUNT,
            audio_bitrate_kbps: DEFAULT_AUDIO_BITRATE_KBPS,
            segment_size_frames: None,
        }
    }
}

impl LadderSpec {
    /// Create a spec for `rung_count` rungs between `min` and `max` kbps.
    pub fn new(rung_count: u32, min_bitrate_kbps: f64, max_bitrate_kbps: f64) -> Self {
        Self {
            rung_count,
            min_bitrate_kbps,
            max_bitrate_kbps,
            ..Self::default()
        }
    }

    /// Set the source resolution override.
    pub fn with_source_resolution(mut self, resolution: Resolution) -> Self {
        self.source_resolution = Some(resolution);
        self
    }

    /// Set the audio bitrate.
    pub fn with_audio_bitrate(mut self, kbps: u32) -> Self {
        self.audio_bitrate_kbps = kbps;
        self
    }

    /// Set an explicit segment size.
    pub fn with_segment_size(mut self, frames: u32) -> Self {
        self.segment_size_frames = Some(frames);
        self
    }

    /// Check the spec invariants.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero rung count, a non-positive bitrate, an
    /// inverted bitrate range, or a zero segment size.
    pub fn validate(&self) -> Result<()> {
        if self.rung_count < 1 {
            return Err(Error::RungCount(self.rung_count));
        }
        for bitrate in [self.min_bitrate_kbps, self.max_bitrate_kbps] {
            if !bitrate.is_finite() || bitrate <= 0.0 {
                return Err(Error::InvalidBitrate(bitrate));
            }
        }
        if self.min_bitrate_kbps > self.max_bitrate_kbps {
            return Err(Error::BitrateRange {
                min: self.min_bitrate_kbps,
                max: self.max_bitrate_kbps,
            });
        }
        if self.segment_size_frames == Some(0) {
            return Err(Error::SegmentSize);
        }
        Ok(())
    }

    /// The effective minimum bitrate: a single-rung ladder sits at the maximum.
    pub fn effective_min_bitrate(&self) -> f64 {
        if self.rung_count == 1 {
            self.max_bitrate_kbps
        } else {
            self.min_bitrate_kbps
        }
    }

    /// Evenly spaced bitrates from the effective minimum to the maximum.
    pub fn bitrates(&self) -> Vec<f64> {
        let min = self.effective_min_bitrate();
        let delta = if self.rung_count > 1 {
            (self.max_bitrate_kbps - min) / f64::from(self.rung_count - 1)
        } else {
            0.0
        };
        (0..self.rung_count)
            .map(|i| min + delta * f64::from(i))
            .collect()
    }
}

/// One entry of the ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rung {
    /// Position in the ladder, 0 being the lowest bitrate.
    pub index: usize,
    /// Video bitrate in kbps.
    pub bitrate_kbps: f64,
    /// Target pixel area before macroblock alignment.
    pub pixels: f64,
    /// Encoded frame size, both dimensions multiples of 16.
    pub resolution: Resolution,
    /// Diagnostic bits per pixel at the reference frame rate.
    pub bits_per_pixel: f64,
}

impl Rung {
    /// Bitrate truncated to whole kbps, as used in file names.
    pub fn bitrate_label(&self) -> u32 {
        self.bitrate_kbps as u32
    }
}

/// Plan the ladder for a source of the given resolution.
///
/// The result holds exactly `spec.rung_count` rungs in increasing bitrate
/// order. Calling it twice with the same input yields the same ladder.
///
/// # Errors
///
/// Returns an error when the spec is invalid or a rung's pixel area collapses.
pub fn plan(spec: &LadderSpec, source: Resolution) -> Result<Vec<Rung>> {
    spec.validate()?;
    Resolution::new(source.width, source.height)?;

    let max_pixels = source.pixels();

    spec.bitrates()
        .into_iter()
        .enumerate()
        .map(|(index, bitrate_kbps)| {
            let ratio = bitrate_kbps / spec.max_bitrate_kbps;
            let pixels = max_pixels * ratio.powf(PIXEL_SCALING_EXPONENT);
            let resolution = scale_resolution(pixels, source)
                .map_err(|_| Error::DegenerateArea { bitrate_kbps })?;

            Ok(Rung {
                index,
                bitrate_kbps,
                pixels,
                resolution,
                bits_per_pixel: 1000.0 * bitrate_kbps / (REFERENCE_FPS * pixels),
            })
        })
        .collect()
}

/// Turn a pixel budget into a macroblock-aligned resolution with the aspect
/// ratio of `source`.
///
/// The width is `align(ceil(sqrt(pixels * ar)))` and the height is
/// `align(ceil(width / ar))`. The aspect ratio is applied as `* w / h`
/// rather than through a rounded quotient so exact sources stay exact.
pub fn scale_resolution(pixels: f64, source: Resolution) -> Result<Resolution> {
    let (sw, sh) = (f64::from(source.width), f64::from(source.height));

    let area = pixels * sw / sh;
    if !area.is_finite() || area <= 0.0 {
        return Err(Error::invalid_resolution(format!(
            "pixel area {pixels} cannot be scaled"
        )));
    }
    let width = align_to_macroblock(area.sqrt().ceil() as u64);

    let height_exact = width as f64 * sh / sw;
    if !height_exact.is_finite() || height_exact <= 0.0 {
        return Err(Error::invalid_resolution(format!(
            "width {width} cannot be scaled to {source}"
        )));
    }
    let height = align_to_macroblock(height_exact.ceil() as u64);

    let width = u32::try_from(width)
        .map_err(|_| Error::invalid_resolution(format!("width {width} out of range")))?;
    let height = u32::try_from(height)
        .map_err(|_| Error::invalid_resolution(format!("height {height} out of range")))?;

    Resolution::new(width, height)
}
