//! Configuration constants for wavescope app services

/// Application metadata
pub mod app {
    /// Application name (used for the config directory)
    pub const NAME: &str = "wavescope";
}

/// Transport key-step configuration
pub mod transport {
    /// Volume change per plain arrow press (0-100 scale)
    pub const VOLUME_STEP: f32 = 1.0;

    /// Volume change with shift held
    pub const VOLUME_STEP_LARGE: f32 = 5.0;

    /// Volume change with ctrl held
    pub const VOLUME_STEP_FINE: f32 = 0.1;

    /// Relative seek distance in seconds
    pub const SEEK_STEP_SECS: f32 = 5.0;

    /// Shift+back restarts the song instead once playback has passed this
    /// many seconds
    pub const RESTART_THRESHOLD_SECS: f32 = 10.0;
}
