//! Configuration constants for the wavescope engine

/// Visualization pipeline configuration
pub mod viz {
    /// FFT window size for the analysis tap (must be a power of two)
    pub const FFT_SIZE: usize = 2048;

    /// Length of the pulled time/frequency byte buffers (half the window)
    pub const TAP_LENGTH: usize = FFT_SIZE / 2;

    /// Renderer tick rate in frames per second
    pub const FRAME_RATE: u32 = 30;

    /// Drawing surface width in pixels
    pub const VIEW_WIDTH: f32 = 960.0;

    /// Drawing surface height in pixels
    pub const VIEW_HEIGHT: f32 = 540.0;

    /// Stroke width shared by both renderer backends
    pub const STROKE_WIDTH: f32 = 1.0;

    /// Stroke color as written into vector output
    pub const STROKE_COLOR: &str = "rgba(255,255,255,0.4)";

    /// Stroke color as blended into the raster surface (RGBA, alpha 0.4)
    pub const STROKE_RGBA: [u8; 4] = [255, 255, 255, 102];

    /// Lower bound of the frequency byte scale, in decibels
    pub const MIN_DECIBELS: f32 = -100.0;

    /// Upper bound of the frequency byte scale, in decibels
    pub const MAX_DECIBELS: f32 = -30.0;

    /// Time-smoothing factor for spectrum magnitudes (0.0-1.0, higher = slower)
    pub const SMOOTHING: f32 = 0.8;
}

/// Audio engine configuration
pub mod audio {
    /// Samples the tap source accumulates locally before taking the tap lock
    pub const TAP_FLUSH_SAMPLES: usize = 256;

    /// Interval of the engine loop's progress tick in milliseconds
    pub const ENGINE_TICK_MS: u64 = 200;
}

/// Timeout configuration
pub mod timeouts {
    /// Maximum time to wait for the format probe (symphonia) in seconds
    pub const PROBE_TIMEOUT_SECS: u64 = 10;
}

/// Song library configuration
pub mod library {
    /// Manifest file listing the songs of a library directory, one per line
    pub const MANIFEST_FILE: &str = "list.txt";
}
