// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player settings, stored as RON.

use crate::error::{PlayerError, PlayerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "dsaudio.ron";

/// Playback and captioning settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Settings format version
    pub version: u32,
    /// Gain applied on start and when unmuting
    pub default_volume: f32,
    /// Highest gain the volume control allows
    pub max_volume: f32,
    /// Spacing of position-changed ticks
    pub time_update_interval_ms: u64,
    /// Extension of the caption document next to each media file
    pub caption_extension: String,
    /// Playback speed multiplier
    pub playback_speed: f64,
    /// Start playing as soon as a source is set
    pub autoplay: bool,
    /// Restart from the beginning at the end
    pub looping: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            default_volume: 0.4,
            max_volume: 2.0,
            time_update_interval_ms: 250,
            caption_extension: "json".to_string(),
            playback_speed: 1.0,
            autoplay: true,
            looping: false,
        }
    }
}

impl PlayerSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> PlayerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Parse settings from RON text
    pub fn from_ron(content: &str) -> PlayerResult<Self> {
        let settings: PlayerSettings =
            ron::from_str(content).map_err(|e| PlayerError::Settings(e.to_string()))?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(PlayerError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> PlayerResult<()> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)
            .map_err(|e| PlayerError::Settings(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Spacing of position-changed ticks
    pub fn time_update_interval(&self) -> Duration {
        Duration::from_millis(self.time_update_interval_ms.max(1))
    }

    /// Default volume limited to the allowed range
    pub fn clamped_default_volume(&self) -> f32 {
        self.default_volume.clamp(0.0, self.max_volume.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PlayerSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.default_volume, 0.4);
        assert_eq!(settings.max_volume, 2.0);
        assert_eq!(settings.time_update_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);

        let settings = PlayerSettings {
            playback_speed: 1.5,
            looping: true,
            ..Default::default()
        };
        settings.save(&path).unwrap();

        let loaded = PlayerSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = PlayerSettings::from_ron("(default_volume: 0.8)").unwrap();
        assert_eq!(settings.default_volume, 0.8);
        assert_eq!(settings.caption_extension, "json");
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = PlayerSettings::from_ron("(version: 99)").unwrap_err();
        assert!(matches!(
            err,
            PlayerError::UnsupportedVersion { found: 99, .. }
        ));
    }

    #[test]
    fn test_default_volume_clamped() {
        let settings = PlayerSettings {
            default_volume: 5.0,
            ..Default::default()
        };
        assert_eq!(settings.clamped_default_volume(), 2.0);
    }
}
