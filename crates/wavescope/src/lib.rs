//! Wavescope — Music Player Engine
//!
//! Audio playback with a real-time visualization pipeline: a shared signal
//! tap, per-frame sampling, geometric model evaluation, and two independent
//! renderer backends (vector paths and raster drawing).
//!
//! ## Quick start
//!
//! ```no_run
//! use wavescope::audio::AudioEngine;
//! use wavescope::viz::{RasterView, VectorView};
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod library;
pub mod viz;
