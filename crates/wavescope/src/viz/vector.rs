//! Vector renderer backend
//!
//! Builds declarative path output from shape descriptors. The renderer owns
//! no drawing surface; each tick's output replaces the previous one
//! wholesale. Line paths visit one point per buffer index at a fixed
//! horizontal step, circle paths sweep a full turn with angle zero pointing
//! up.

use std::f32::consts::PI;

use crate::config::viz::{STROKE_COLOR, STROKE_WIDTH};

use super::model::{Circle, Line, Shape, Viewport};

/// One rendered path: the SVG-style `d` data plus the raw point sequence
/// it visits
#[derive(Debug, Clone, PartialEq)]
pub struct VectorShape {
    /// Path data: `M` followed by `x,y` pairs, with `Z` appended when the
    /// path closes back onto its first point
    pub d: String,
    /// Points in trace order
    pub points: Vec<(f32, f32)>,
    /// Whether the path is closed
    pub closed: bool,
    /// Stroke color, fixed across all shapes
    pub stroke: &'static str,
    /// Stroke width in pixels
    pub stroke_width: f32,
}

/// Stateless path builder over shape descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorRenderer {
    view: Viewport,
}

impl VectorRenderer {
    pub fn new(view: Viewport) -> Self {
        Self { view }
    }

    pub fn viewport(&self) -> Viewport {
        self.view
    }

    /// Render every descriptor to a path, preserving draw order
    pub fn render(&self, shapes: &[Shape<'_>]) -> Vec<VectorShape> {
        shapes
            .iter()
            .map(|shape| match shape {
                Shape::Line(line) => self.render_line(line),
                Shape::Circle(circle) => self.render_circle(circle),
            })
            .collect()
    }

    fn render_line(&self, line: &Line<'_>) -> VectorShape {
        let len = line.len();
        let step = self.view.width / len as f32;
        let mut d = String::from("M");
        let mut points = Vec::with_capacity(len);
        let mut x = 0.0f32;
        for i in 0..len {
            let y = line.y(i);
            d.push_str(&format!("{x},{y} "));
            points.push((x, y));
            x += step;
        }
        VectorShape {
            d,
            points,
            closed: false,
            stroke: STROKE_COLOR,
            stroke_width: STROKE_WIDTH,
        }
    }

    fn render_circle(&self, circle: &Circle<'_>) -> VectorShape {
        let len = circle.len();
        let (cx, cy) = circle.center();
        let step = 2.0 * PI / len as f32;
        let mut d = String::from("M");
        let mut points = Vec::with_capacity(len);
        let mut a = 0.0f32;
        for i in 0..len {
            let r = circle.radius_at(i);
            let x = cx + a.sin() * r;
            let y = cy - a.cos() * r;
            d.push_str(&format!("{x},{y} "));
            points.push((x, y));
            a += step;
        }
        d.push('Z');
        VectorShape {
            d,
            points,
            closed: true,
            stroke: STROKE_COLOR,
            stroke_width: STROKE_WIDTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::model::{evaluate, VizModel};

    fn render(model: VizModel, time: &[u8], freq: &[u8], prev: &[u8]) -> Vec<VectorShape> {
        let view = Viewport::default();
        let shapes = evaluate(model, time, freq, prev, view);
        VectorRenderer::new(view).render(&shapes)
    }

    /// Parse a `d` string back into the point list it encodes
    fn parse_path(d: &str, closed: bool) -> Vec<(f32, f32)> {
        let body = d.strip_prefix('M').unwrap();
        let body = if closed {
            body.strip_suffix('Z').unwrap()
        } else {
            body
        };
        body.split_whitespace()
            .map(|pair| {
                let (x, y) = pair.split_once(',').unwrap();
                (x.parse().unwrap(), y.parse().unwrap())
            })
            .collect()
    }

    // --- Line paths ---

    #[test]
    fn line_path_visits_every_index_at_fixed_step() {
        let time = [128u8; 8];
        let freq = [0u8; 8];
        let out = render(VizModel::Oscilloscope, &time, &freq, &freq);
        assert_eq!(out.len(), 1);
        let shape = &out[0];
        assert!(!shape.closed);
        assert_eq!(shape.points.len(), 8);
        for (i, &(x, y)) in shape.points.iter().enumerate() {
            assert_eq!(x, i as f32 * (960.0 / 8.0));
            assert_eq!(y, 270.0);
        }
    }

    #[test]
    fn flat_waveform_renders_exact_path_data() {
        let time = [128u8; 4];
        let freq = [0u8; 4];
        let out = render(VizModel::Waveform, &time, &freq, &freq);
        assert_eq!(out[0].d, "M0,540 240,540 480,540 720,540 ");
    }

    #[test]
    fn every_path_carries_the_fixed_stroke() {
        let time = [128u8; 8];
        let freq = [40u8; 8];
        for model in [VizModel::Oscilloscope, VizModel::WaveCircle] {
            let out = render(model, &time, &freq, &freq);
            assert_eq!(out[0].stroke, "rgba(255,255,255,0.4)");
            assert_eq!(out[0].stroke_width, 1.0);
        }
    }

    #[test]
    fn path_data_round_trips_to_points() {
        let time: Vec<u8> = (0..64).map(|i| (i * 4) as u8).collect();
        let freq: Vec<u8> = (0..64).map(|i| 255 - (i * 3) as u8).collect();
        let prev = vec![81u8; 64];
        for model in [
            VizModel::Oscilloscope,
            VizModel::Waveform,
            VizModel::DiffWave,
            VizModel::WaveCircle,
        ] {
            let out = render(model, &time, &freq, &prev);
            let shape = &out[0];
            assert_eq!(
                parse_path(&shape.d, shape.closed),
                shape.points,
                "model {model}"
            );
        }
    }

    // --- Circle paths ---

    #[test]
    fn circle_path_is_closed_and_starts_at_the_top() {
        let time = [128u8; 4];
        let freq = [0u8; 4];
        let out = render(VizModel::WaveCircle, &time, &freq, &freq);
        let shape = &out[0];
        assert!(shape.closed);
        assert!(shape.d.starts_with('M'));
        assert!(shape.d.ends_with('Z'));
        // Angle zero points straight up from the center
        assert_eq!(shape.points[0], (480.0, 270.0 - 67.5));
    }

    #[test]
    fn circle_points_keep_the_minimum_radius_for_silence() {
        let time = [128u8; 32];
        let freq = [0u8; 32];
        let out = render(VizModel::WaveCircle, &time, &freq, &freq);
        for &(x, y) in &out[0].points {
            let dx = x - 480.0;
            let dy = y - 270.0;
            let r = (dx * dx + dy * dy).sqrt();
            assert!((r - 67.5).abs() < 1e-3, "radius {r} should be on the floor");
        }
    }

    // --- Empty output ---

    #[test]
    fn empty_model_renders_nothing() {
        let time = [255u8; 8];
        let freq = [255u8; 8];
        let out = render(VizModel::Empty, &time, &freq, &freq);
        assert!(out.is_empty());
    }
}
