//! JSON persistence for app data files
//!
//! Consistent file I/O for every data file the app keeps.

use crate::config::app::NAME;
use crate::error::{AppError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Application config directory, platform-specific
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir().map(|p| p.join(NAME)).ok_or_else(|| {
        AppError::Config(
            "Could not determine config directory. HOME environment variable may not be set."
                .to_string(),
        )
    })
}

/// Get path to a data file in the default config directory
pub fn data_path(filename: &str) -> Result<PathBuf> {
    Ok(config_dir()?.join(filename))
}

/// User-facing description of a filesystem failure
fn io_message(action: &str, path: &Path, e: &std::io::Error) -> String {
    match e.kind() {
        ErrorKind::PermissionDenied => {
            format!("Permission denied: cannot {} {}", action, path.display())
        }
        _ => format!("Failed to {} {}: {}", action, path.display(), e),
    }
}

fn create_dir_if_needed(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| AppError::Config(io_message("create directory", path, &e)))
}

/// Load data from a JSON file at a specific path.
///
/// Returns `None` if the file doesn't exist or is empty. Returns an error
/// if it exists but can't be read or parsed.
pub fn load_from<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AppError::Config(io_message("read", path, &e))),
    };

    if content.trim().is_empty() {
        return Ok(None);
    }

    let data = serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    Ok(Some(data))
}

/// Save data as pretty-printed JSON at a specific path, creating parent
/// directories as needed.
pub fn save_to<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_if_needed(parent)?;
    }

    let content = serde_json::to_string_pretty(data)
        .map_err(|e| AppError::Config(format!("Failed to serialize data: {}", e)))?;

    fs::write(path, &content).map_err(|e| {
        let msg = if e.kind() == ErrorKind::NotFound {
            format!(
                "Cannot write {}: parent directory does not exist",
                path.display()
            )
        } else {
            io_message("write", path, &e)
        };
        AppError::Config(msg)
    })
}

/// Load a JSON data file from the config directory
pub fn load<T: DeserializeOwned>(filename: &str) -> Result<Option<T>> {
    let path = data_path(filename)?;
    load_from(&path)
}

/// Save a JSON data file into the config directory
pub fn save<T: Serialize>(filename: &str, data: &T) -> Result<()> {
    let path = data_path(filename)?;
    save_to(&path, data)
}
