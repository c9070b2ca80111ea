//! Error types for wavescope app services
//!
//! Application-level errors that wrap engine errors and add app-specific
//! variants.

use thiserror::Error;
use wavescope::error::WaveError;

/// Errors surfaced by the app services layer
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] WaveError),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Engine(WaveError::Io(e))
    }
}

/// Result type alias for wavescope app services
pub type Result<T> = std::result::Result<T, AppError>;
