//! Renderer tick harnesses
//!
//! Each live visualizer owns its own sampler, previous-frame buffer and
//! frame clock, so the two backends advance independently and never share
//! mutable frame state. A tick samples the tap, evaluates the selected
//! model and hands the descriptors to the backend; ticks are idempotent
//! per frame and carry no state across frames beyond the previous
//! frequency buffer.

use std::time::{Duration, Instant};

use crate::audio::sampler::Sampler;
use crate::audio::tap::SignalTap;
use crate::config::viz::FRAME_RATE;

use super::model::{evaluate, Viewport, VizModel};
use super::raster::{Canvas, RasterRenderer};
use super::vector::{VectorRenderer, VectorShape};

/// Fixed-interval frame scheduler
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: Duration,
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new(frames_per_second: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / frames_per_second.max(1),
            last: None,
        }
    }

    /// True when a frame is due at `now`, arming the next deadline
    pub fn due(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Vector backend view: retains the latest rendered paths
pub struct VectorView {
    renderer: VectorRenderer,
    sampler: Sampler,
    prev: Vec<u8>,
    shapes: Vec<VectorShape>,
    clock: FrameClock,
}

impl VectorView {
    pub fn new(view: Viewport) -> Self {
        let sampler = Sampler::new();
        Self {
            renderer: VectorRenderer::new(view),
            prev: vec![0; sampler.len()],
            sampler,
            shapes: Vec::new(),
            clock: FrameClock::new(FRAME_RATE),
        }
    }

    /// Paths from the most recent frame
    pub fn shapes(&self) -> &[VectorShape] {
        &self.shapes
    }

    pub fn viewport(&self) -> Viewport {
        self.renderer.viewport()
    }

    /// Advance one frame if one is due. Returns whether a frame was
    /// rendered.
    pub fn tick(&mut self, tap: &SignalTap, model: VizModel, now: Instant) -> bool {
        if !self.clock.due(now) {
            return false;
        }
        self.sampler.sample(tap);
        let shapes = evaluate(
            model,
            self.sampler.time_domain(),
            self.sampler.frequency_domain(),
            &self.prev,
            self.renderer.viewport(),
        );
        self.shapes = self.renderer.render(&shapes);
        self.prev.copy_from_slice(self.sampler.frequency_domain());
        true
    }
}

/// Raster backend view: draws into an attached canvas
pub struct RasterView {
    renderer: RasterRenderer,
    canvas: Option<Canvas>,
    sampler: Sampler,
    prev: Vec<u8>,
    clock: FrameClock,
}

impl RasterView {
    pub fn new(view: Viewport) -> Self {
        let sampler = Sampler::new();
        Self {
            renderer: RasterRenderer::new(view),
            canvas: None,
            prev: vec![0; sampler.len()],
            sampler,
            clock: FrameClock::new(FRAME_RATE),
        }
    }

    /// Attach a drawing surface sized to the viewport
    pub fn attach(&mut self) {
        self.canvas = Some(self.renderer.new_canvas());
    }

    /// Release the drawing surface; later ticks become no-ops
    pub fn detach(&mut self) -> Option<Canvas> {
        self.canvas.take()
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.renderer.viewport()
    }

    /// Advance one frame if one is due. Without an attached canvas the
    /// tick is a no-op, retried on the next one.
    pub fn tick(&mut self, tap: &SignalTap, model: VizModel, now: Instant) -> bool {
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };
        if !self.clock.due(now) {
            return false;
        }
        self.sampler.sample(tap);
        let shapes = evaluate(
            model,
            self.sampler.time_domain(),
            self.sampler.frequency_domain(),
            &self.prev,
            self.renderer.viewport(),
        );
        self.renderer.render(canvas, &shapes);
        self.prev.copy_from_slice(self.sampler.frequency_domain());
        true
    }
}
