//! Data persistence
//!
//! Player settings stored as JSON in the platform config directory.

pub mod settings;
pub mod storage;

pub use settings::Settings;
pub use storage::{config_dir, data_path, load, save};
