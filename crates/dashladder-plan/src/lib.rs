//! # dashladder-plan
//!
//! Adaptive-bitrate ladder planning.
//!
//! Given a source resolution, a bitrate range and a rung count, this crate
//! derives the per-rung bitrates, macroblock-aligned resolutions that keep
//! the source aspect ratio, and the GOP/VBV settings an encoder needs for
//! each rung. Everything here is pure: no I/O, no global state.
//!
//! ## Example
//!
//! ```
//! use dashladder_plan::{plan, LadderSpec, Resolution};
//!
//! let spec = LadderSpec::new(3, 500.0, 2000.0);
//! let rungs = plan(&spec, "1280x720".parse()?)?;
//!
//! assert_eq!(rungs.len(), 3);
//! assert_eq!(rungs[2].resolution, Resolution::new(1280, 720)?);
//! # Ok::<(), dashladder_plan::Error>(())
//! ```

mod error;
pub mod ladder;
pub mod params;
pub mod resolution;

// Re-exports
pub use error::{Error, Result};
pub use ladder::{plan, scale_resolution, LadderSpec, Rung};
pub use params::{default_segment_size, EncoderParams};
pub use resolution::{align_to_macroblock, Resolution, MACROBLOCK_SIZE};
