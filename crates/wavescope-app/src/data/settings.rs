//! Player settings
//!
//! Persisted user preferences: volume (with mute), auto-start and
//! autoplay flags. Stored as camelCase JSON in the platform config
//! directory.

use crate::data::storage;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// File name for the persisted settings
const SETTINGS_FILE: &str = "options.json";

/// Volume used until the user changes it (0-100 scale)
const DEFAULT_VOLUME: f32 = 30.0;

/// Player settings
///
/// `volume` is `null` in the JSON while muted; `volBank` holds the level
/// to restore on unmute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Volume on a 0-100 scale, `None` while muted
    #[serde(default = "default_volume")]
    pub volume: Option<f32>,

    /// Volume to restore when unmuting
    #[serde(default = "default_vol_bank")]
    pub vol_bank: f32,

    /// Play the first song as soon as the player starts
    #[serde(default)]
    pub auto_start: bool,

    /// Advance to the next song when one finishes
    #[serde(default)]
    pub autoplay: bool,
}

fn default_volume() -> Option<f32> {
    Some(DEFAULT_VOLUME)
}

fn default_vol_bank() -> f32 {
    DEFAULT_VOLUME
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            vol_bank: default_vol_bank(),
            auto_start: false,
            autoplay: false,
        }
    }
}

impl Settings {
    /// Fresh settings with stock values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from the default storage location
    pub fn load() -> Result<Self> {
        let mut settings = match storage::load::<Settings>(SETTINGS_FILE)? {
            Some(settings) => settings,
            None => Self::default(),
        };
        settings.clamp();
        Ok(settings)
    }

    /// Read settings from an explicit path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let mut settings = match storage::load_from::<Settings>(path)? {
            Some(settings) => settings,
            None => Self::default(),
        };
        settings.clamp();
        Ok(settings)
    }

    /// Save settings to the default storage location
    pub fn save(&self) -> Result<()> {
        storage::save(SETTINGS_FILE, self)
    }

    /// Write settings to an explicit path
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        storage::save_to(path, self)
    }

    /// Pull loaded values back onto the 0-100 scale
    fn clamp(&mut self) {
        self.volume = self.volume.map(|v| v.clamp(0.0, 100.0));
        self.vol_bank = self.vol_bank.clamp(0.0, 100.0);
    }

    /// Whether playback is muted
    pub fn is_muted(&self) -> bool {
        self.volume.is_none()
    }

    /// Playback gain on the 0.0-1.0 scale (0.0 while muted)
    pub fn gain(&self) -> f32 {
        self.volume.unwrap_or(0.0) / 100.0
    }

    /// Set volume (clamped to 0-100); unmutes
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = Some(volume.clamp(0.0, 100.0));
    }

    /// Step the volume by a signed delta; a muted player steps up from 0
    pub fn adjust_volume(&mut self, delta: f32) {
        let current = self.volume.unwrap_or(0.0);
        self.set_volume(current + delta);
    }

    /// Toggle mute, banking the current volume so unmute restores it
    pub fn toggle_mute(&mut self) {
        match self.volume.take() {
            Some(volume) => self.vol_bank = volume,
            None => self.volume = Some(self.vol_bank),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};

    static NEXT_ID: AtomicU32 = AtomicU32::new(0);

    fn temp_path() -> std::path::PathBuf {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        temp_dir().join(format!("wavescope_settings_test_{}.json", id))
    }

    // --- Defaults and domain methods ---

    #[test]
    fn default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.volume, Some(30.0));
        assert_eq!(settings.vol_bank, 30.0);
        assert!(!settings.auto_start);
        assert!(!settings.autoplay);
        assert!(!settings.is_muted());
    }

    #[test]
    fn gain_scales_to_unit_range() {
        let mut settings = Settings::new();
        settings.set_volume(42.0);
        assert!((settings.gain() - 0.42).abs() < 1e-6);

        settings.volume = None;
        assert_eq!(settings.gain(), 0.0);
    }

    #[test]
    fn set_volume_clamps() {
        let mut settings = Settings::new();

        settings.set_volume(150.0);
        assert_eq!(settings.volume, Some(100.0));

        settings.set_volume(-3.0);
        assert_eq!(settings.volume, Some(0.0));
    }

    #[test]
    fn adjust_volume_steps_from_the_current_level() {
        let mut settings = Settings::new();
        settings.set_volume(30.0);

        settings.adjust_volume(5.0);
        assert_eq!(settings.volume, Some(35.0));

        settings.adjust_volume(-0.1);
        assert_eq!(settings.volume, Some(34.9));
    }

    #[test]
    fn adjust_volume_while_muted_steps_up_from_zero() {
        let mut settings = Settings::new();
        settings.volume = None;

        settings.adjust_volume(1.0);
        assert_eq!(settings.volume, Some(1.0));
        assert!(!settings.is_muted());
    }

    #[test]
    fn toggle_mute_banks_and_restores_the_volume() {
        let mut settings = Settings::new();
        settings.set_volume(70.0);

        settings.toggle_mute();
        assert!(settings.is_muted());
        assert_eq!(settings.vol_bank, 70.0);
        assert_eq!(settings.gain(), 0.0);

        settings.toggle_mute();
        assert_eq!(settings.volume, Some(70.0));
    }

    // --- Persistence ---

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path();

        {
            let settings = Settings {
                volume: Some(42.0),
                vol_bank: 30.0,
                auto_start: true,
                autoplay: false,
            };
            settings.save_to(&path).unwrap();
        }

        {
            let settings = Settings::load_from(&path).unwrap();
            assert_eq!(settings.volume, Some(42.0));
            assert_eq!(settings.vol_bank, 30.0);
            assert!(settings.auto_start);
            assert!(!settings.autoplay);
        }

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let path = temp_path();

        Settings::default().save_to(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"volBank\""));
        assert!(content.contains("\"autoStart\""));
        assert!(content.contains("\"autoplay\""));
        assert!(!content.contains("vol_bank"));
        assert!(!content.contains("auto_start"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn muted_round_trips_as_null() {
        let path = temp_path();

        let mut settings = Settings::new();
        settings.set_volume(55.0);
        settings.toggle_mute();
        settings.save_to(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"volume\": null"));

        let loaded = Settings::load_from(&path).unwrap();
        assert!(loaded.is_muted());
        assert_eq!(loaded.vol_bank, 55.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_clamps_out_of_range_values() {
        let path = temp_path();
        fs::write(&path, r#"{"volume": 250.0, "volBank": -10.0}"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.volume, Some(100.0));
        assert_eq!(settings.vol_bank, 0.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let path = temp_path();
        fs::write(&path, r#"{"autoplay": true}"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.volume, Some(30.0));
        assert_eq!(settings.vol_bank, 30.0);
        assert!(!settings.auto_start);
        assert!(settings.autoplay);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let path = temp_path();
        fs::write(
            &path,
            r#"{"volume": 12.0, "someFutureKnob": "ignored", "other": 5}"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.volume, Some(12.0));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let path = temp_path();
        fs::write(&path, "{ volume: oops").unwrap();

        assert!(Settings::load_from(&path).is_err());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn empty_file_returns_defaults() {
        let path = temp_path();
        fs::write(&path, "").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.volume, Some(30.0));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_nonexistent_returns_defaults() {
        let path = temp_path();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
