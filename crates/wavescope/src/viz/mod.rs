//! Visualization subsystem
//!
//! Turns sampled audio buffers into renderer-agnostic shape descriptors
//! and draws them through two independent backends: retained vector paths
//! and an immediate-mode raster surface.

pub mod model;
pub mod raster;
pub mod vector;
pub mod view;

pub use model::{evaluate, Circle, Line, LineKind, Shape, Viewport, VizModel};
pub use raster::{Canvas, RasterRenderer};
pub use vector::{VectorRenderer, VectorShape};
pub use view::{FrameClock, RasterView, VectorView};
