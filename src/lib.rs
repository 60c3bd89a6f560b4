//! dashladder - adaptive bitrate ladder encoder
//!
//! This library crate exposes the configuration and driver for integration testing.

pub mod config;
pub mod driver;
pub mod logging;
