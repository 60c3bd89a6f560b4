//! Frame dimensions and macroblock alignment.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macroblock edge length most encoders require dimensions to be aligned to.
pub const MACROBLOCK_SIZE: u32 = 16;

/// Width and height of a video frame in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a resolution, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_resolution(format!(
                "{width}x{height} has a zero dimension"
            )));
        }
        Ok(Self { width, height })
    }

    /// Total pixel count as a float.
    pub fn pixels(&self) -> f64 {
        f64::from(self.width) * f64::from(self.height)
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Whether both dimensions are multiples of [`MACROBLOCK_SIZE`].
    pub fn is_macroblock_aligned(&self) -> bool {
        self.width % MACROBLOCK_SIZE == 0 && self.height % MACROBLOCK_SIZE == 0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = Error;

    /// Parse the `WxH` form, e.g. `1920x1080`.
    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .trim()
            .split_once('x')
            .ok_or_else(|| Error::invalid_resolution(format!("'{s}' is not of the form WxH")))?;

        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| Error::invalid_resolution(format!("'{s}' is not of the form WxH")))
        };

        Resolution::new(parse(w)?, parse(h)?)
    }
}

/// Smallest multiple of [`MACROBLOCK_SIZE`] that is `>= value`.
pub fn align_to_macroblock(value: u64) -> u64 {
    let mb = u64::from(MACROBLOCK_SIZE);
    (value + mb - 1) / mb * mb
}
