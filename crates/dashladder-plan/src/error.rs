//! Error types for dashladder-plan.

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when a ladder cannot be planned from the given input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The ladder must contain at least one rung.
    #[error("rung count must be at least 1 (got {0})")]
    RungCount(u32),

    /// The minimum bitrate is above the maximum.
    #[error("max bitrate must be >= min bitrate (min {min} kbps, max {max} kbps)")]
    BitrateRange { min: f64, max: f64 },

    /// A bitrate is zero, negative or not a number.
    #[error("invalid bitrate: {0} kbps")]
    InvalidBitrate(f64),

    /// A resolution string or value could not be used.
    #[error("invalid resolution: {0}")]
    InvalidResolution(String),

    /// The scaled pixel area collapsed to zero for a rung.
    #[error("derived pixel area is not positive for {bitrate_kbps} kbps")]
    DegenerateArea { bitrate_kbps: f64 },

    /// A frame rate that cannot yield a segment size.
    #[error("invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    /// A segment size of zero frames.
    #[error("segment size must be at least 1 frame")]
    SegmentSize,
}

impl Error {
    /// Create an invalid resolution error.
    pub fn invalid_resolution(message: impl Into<String>) -> Self {
        Self::InvalidResolution(message.into())
    }
}
