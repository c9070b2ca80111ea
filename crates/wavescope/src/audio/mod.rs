//! Audio playback and analysis
//!
//! The [`AudioEngine`] owns a dedicated playback thread and accepts
//! commands over a channel. Decoded samples flow through a [`TapSource`]
//! into the shared [`SignalTap`], where the visualization side pulls
//! time- and frequency-domain snapshots via a [`Sampler`]. Track routing
//! is handled by an [`AudioGraph`], which connects a replacement track
//! before disconnecting the old one.

pub mod decoder;
pub mod engine;
pub mod graph;
pub mod sampler;
pub mod tap;
pub mod types;

pub use decoder::SymphoniaSource;
pub use engine::AudioEngine;
pub use graph::{AudioGraph, RouteState, SourcePort};
pub use sampler::Sampler;
pub use tap::{SignalTap, TapSource};
pub use types::{
    new_shared_status, AudioCommand, AudioEvent, PlaybackState, PlayerStatus, ReadSeek,
    SharedStatus, TrackInfo,
};
