//! Raster renderer backend
//!
//! `Canvas` is a persistent RGBA surface driven by immediate commands:
//! clear, begin a path, extend it point by point, optionally close it, then
//! stroke. Stroking rasterizes the traced sequence as hairline Bresenham
//! segments blended src-over, so the translucent stroke accumulates where
//! segments overlap. `RasterRenderer` replays shape descriptors onto a
//! canvas one frame at a time.

use std::f32::consts::PI;

use crate::config::viz::STROKE_RGBA;

use super::model::{Circle, Line, Shape, Viewport};

/// Fixed-size RGBA drawing surface with a current-path cursor
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    path: Vec<(f32, f32)>,
    closed: bool,
    stroke: [u8; 4],
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            path: Vec::new(),
            closed: false,
            stroke: [255, 255, 255, 255],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA pixel data, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value at the given pixel
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Points traced since the last `begin_path`
    pub fn path(&self) -> &[(f32, f32)] {
        &self.path
    }

    /// Reset every pixel to transparent black
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn set_stroke(&mut self, rgba: [u8; 4]) {
        self.stroke = rgba;
    }

    pub fn begin_path(&mut self) {
        self.path.clear();
        self.closed = false;
    }

    /// Extend the current path. On an empty path this sets the start point.
    pub fn line_to(&mut self, x: f32, y: f32) {
        self.path.push((x, y));
    }

    /// Mark the current path as closing back onto its first point
    pub fn close_path(&mut self) {
        self.closed = true;
    }

    /// Rasterize the current path. A path with fewer than two points draws
    /// nothing. The path stays available for inspection until the next
    /// `begin_path`.
    pub fn stroke(&mut self) {
        if self.path.len() < 2 {
            return;
        }
        for i in 1..self.path.len() {
            let (x1, y1) = self.path[i - 1];
            let (x2, y2) = self.path[i];
            self.stroke_segment(x1, y1, x2, y2);
        }
        if self.closed {
            let (x1, y1) = self.path[self.path.len() - 1];
            let (x2, y2) = self.path[0];
            self.stroke_segment(x1, y1, x2, y2);
        }
    }

    fn stroke_segment(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let x1 = x1.round() as i32;
        let y1 = y1.round() as i32;
        let x2 = x2.round() as i32;
        let y2 = y2.round() as i32;
        let w = self.width as i32;
        let h = self.height as i32;

        // Skip segments entirely outside the surface
        if (x1 < 0 && x2 < 0)
            || (x1 >= w && x2 >= w)
            || (y1 < 0 && y2 < 0)
            || (y1 >= h && y2 >= h)
        {
            return;
        }

        let mut x0 = x1;
        let mut y0 = y1;
        let dx = (x2 - x1).abs();
        let dy = (y2 - y1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let sy = if y1 < y2 { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            if x0 >= 0 && x0 < w && y0 >= 0 && y0 < h {
                self.blend_pixel(x0 as usize, y0 as usize);
            }
            if x0 == x2 && y0 == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x0 += sx;
            }
            if e2 < dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn blend_pixel(&mut self, x: usize, y: usize) {
        let i = (y * self.width as usize + x) * 4;
        let [sr, sg, sb, sa] = self.stroke;
        let a = sa as u32;
        let inv = 255 - a;
        let px = &mut self.pixels[i..i + 4];
        px[0] = ((sr as u32 * a + px[0] as u32 * inv) / 255) as u8;
        px[1] = ((sg as u32 * a + px[1] as u32 * inv) / 255) as u8;
        px[2] = ((sb as u32 * a + px[2] as u32 * inv) / 255) as u8;
        px[3] = ((a * 255 + px[3] as u32 * inv) / 255) as u8;
    }
}

/// Immediate-mode renderer replaying shape descriptors onto a [`Canvas`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterRenderer {
    view: Viewport,
}

impl RasterRenderer {
    pub fn new(view: Viewport) -> Self {
        Self { view }
    }

    pub fn viewport(&self) -> Viewport {
        self.view
    }

    /// Allocate a surface matching the renderer's viewport
    pub fn new_canvas(&self) -> Canvas {
        Canvas::new(self.view.width as u32, self.view.height as u32)
    }

    /// Draw one frame: clear the surface, then trace and stroke every
    /// descriptor in draw order. The traced point sequence is identical to
    /// the one the vector backend emits for the same descriptors.
    pub fn render(&self, canvas: &mut Canvas, shapes: &[Shape<'_>]) {
        canvas.clear();
        canvas.set_stroke(STROKE_RGBA);
        for shape in shapes {
            match shape {
                Shape::Line(line) => self.trace_line(canvas, line),
                Shape::Circle(circle) => self.trace_circle(canvas, circle),
            }
        }
    }

    fn trace_line(&self, canvas: &mut Canvas, line: &Line<'_>) {
        let len = line.len();
        let step = self.view.width / len as f32;
        canvas.begin_path();
        let mut x = 0.0f32;
        for i in 0..len {
            canvas.line_to(x, line.y(i));
            x += step;
        }
        canvas.stroke();
    }

    fn trace_circle(&self, canvas: &mut Canvas, circle: &Circle<'_>) {
        let len = circle.len();
        let (cx, cy) = circle.center();
        let step = 2.0 * PI / len as f32;
        canvas.begin_path();
        let mut a = 0.0f32;
        for i in 0..len {
            let r = circle.radius_at(i);
            canvas.line_to(cx + a.sin() * r, cy - a.cos() * r);
            a += step;
        }
        canvas.close_path();
        canvas.stroke();
    }
}
