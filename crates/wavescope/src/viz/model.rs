//! Visualization models
//!
//! `evaluate` maps freshly sampled time/frequency buffers onto geometric
//! shape descriptors according to the selected model. Descriptors are
//! renderer-agnostic; both backends consume the same list and must trace
//! the same point sequence from it.

use std::fmt;

use crate::config::viz::{VIEW_HEIGHT, VIEW_WIDTH};

/// Selectable visualization model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VizModel {
    /// Draw nothing
    #[default]
    Empty,
    /// Time-domain trace centered on the mid value
    Oscilloscope,
    /// Frequency magnitudes, inverted so louder bins rise
    Waveform,
    /// Frame-over-frame frequency delta around a mid bias
    DiffWave,
    /// Frequency magnitudes wrapped around a circle
    WaveCircle,
}

impl VizModel {
    /// All models in selection order
    pub const ALL: [VizModel; 5] = [
        VizModel::Empty,
        VizModel::Oscilloscope,
        VizModel::Waveform,
        VizModel::DiffWave,
        VizModel::WaveCircle,
    ];

    /// Next model in selection order, wrapping at the end
    pub fn next(self) -> Self {
        match self {
            VizModel::Empty => VizModel::Oscilloscope,
            VizModel::Oscilloscope => VizModel::Waveform,
            VizModel::Waveform => VizModel::DiffWave,
            VizModel::DiffWave => VizModel::WaveCircle,
            VizModel::WaveCircle => VizModel::Empty,
        }
    }
}

impl fmt::Display for VizModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VizModel::Empty => "No visualizer",
            VizModel::Oscilloscope => "Oscilloscope",
            VizModel::Waveform => "Waveform",
            VizModel::DiffWave => "Difference Waveform",
            VizModel::WaveCircle => "Circular Waveform",
        };
        write!(f, "{name}")
    }
}

/// Logical drawing area shared by both renderer backends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: VIEW_WIDTH,
            height: VIEW_HEIGHT,
        }
    }
}

/// Value extraction used by a [`Line`] descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Oscilloscope,
    Waveform,
    Diff,
}

/// Line descriptor: a value extraction composed with a vertical mapping,
/// evaluated across every buffer index. The horizontal coordinate is the
/// renderer's business.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    kind: LineKind,
    data: &'a [u8],
    prev: &'a [u8],
    height: f32,
}

impl Line<'_> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Extracted value at index `i`
    pub fn value_at(&self, i: usize) -> f32 {
        match self.kind {
            LineKind::Oscilloscope => self.data[i] as f32 / 128.0,
            LineKind::Waveform => self.data[i] as f32 / 256.0,
            LineKind::Diff => (self.prev[i] as f32 - self.data[i] as f32 + 128.0) / 128.0,
        }
    }

    /// Vertical coordinate for an extracted value
    pub fn y_at(&self, value: f32) -> f32 {
        match self.kind {
            LineKind::Oscilloscope | LineKind::Diff => value * self.height / 2.0,
            LineKind::Waveform => self.height - value * self.height,
        }
    }

    /// Vertical coordinate at index `i`
    pub fn y(&self, i: usize) -> f32 {
        self.y_at(self.value_at(i))
    }
}

/// Circle descriptor: an index-to-radius mapping around a fixed center
#[derive(Debug, Clone, Copy)]
pub struct Circle<'a> {
    data: &'a [u8],
    center: (f32, f32),
    height: f32,
}

impl Circle<'_> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn center(&self) -> (f32, f32) {
        self.center
    }

    /// Radius at index `i`, floored so a silent signal still draws a ring
    pub fn radius_at(&self, i: usize) -> f32 {
        self.data[i] as f32 / 256.0 * self.height / 4.0 + self.height / 8.0
    }
}

/// Renderer-agnostic shape descriptor
#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    Line(Line<'a>),
    Circle(Circle<'a>),
}

/// Map sampled buffers onto the shape descriptors for `model`.
///
/// Returns descriptors in draw order. `prev` is the frequency buffer captured
/// on the previous tick; callers start from an all-zero buffer so the first
/// diff frame is well defined.
pub fn evaluate<'a>(
    model: VizModel,
    time: &'a [u8],
    freq: &'a [u8],
    prev: &'a [u8],
    view: Viewport,
) -> Vec<Shape<'a>> {
    match model {
        VizModel::Empty => Vec::new(),
        VizModel::Oscilloscope => vec![Shape::Line(Line {
            kind: LineKind::Oscilloscope,
            data: time,
            prev,
            height: view.height,
        })],
        VizModel::Waveform => vec![Shape::Line(Line {
            kind: LineKind::Waveform,
            data: freq,
            prev,
            height: view.height,
        })],
        VizModel::DiffWave => vec![Shape::Line(Line {
            kind: LineKind::Diff,
            data: freq,
            prev,
            height: view.height,
        })],
        VizModel::WaveCircle => vec![Shape::Circle(Circle {
            data: freq,
            center: (view.width / 2.0, view.height / 2.0),
            height: view.height,
        })],
    }
}
