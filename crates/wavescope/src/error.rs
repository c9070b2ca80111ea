//! Error types for wavescope
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for the wavescope engine
#[derive(Error, Debug)]
pub enum WaveError {
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Library error: {0}")]
    Library(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Result type alias for wavescope
pub type Result<T> = std::result::Result<T, WaveError>;
