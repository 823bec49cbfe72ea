// Player configuration - RON file under the user config directory
//
// Only device/output concerns are configurable. The musical timing of a
// progression (four beats per chord, lead-in, envelope shape) is fixed.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::export::ExportSettings;
use crate::error::PlaybackError;

const CONFIG_DIR_NAME: &str = "progression_player";
const CONFIG_FILE_NAME: &str = "config.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Output device name; `None` uses the system default
    pub output_device: Option<String>,
    /// Tempo used when the caller does not pick one
    pub default_tempo_bpm: f64,
    /// Master output level in [0, 1]
    pub master_volume: f32,
    pub export: ExportSettings,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            output_device: None,
            default_tempo_bpm: 120.0,
            master_volume: 1.0,
            export: ExportSettings::default(),
        }
    }
}

impl PlayerConfig {
    /// `<config dir>/progression_player/config.ron`, if the platform has a
    /// config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, PlaybackError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let config: Self = ron::from_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the default location, or defaults when there is none
    pub fn load_or_default() -> Result<Self, PlaybackError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PlaybackError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.output_device, None);
        assert_eq!(config.default_tempo_bpm, 120.0);
        assert_eq!(config.master_volume, 1.0);
        assert_eq!(config.export.sample_rate, 44100);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = PlayerConfig::load(&dir.path().join("absent.ron")).unwrap();
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ron");

        let config = PlayerConfig {
            output_device: Some("Speakers".to_string()),
            default_tempo_bpm: 90.0,
            ..PlayerConfig::default()
        };
        config.save(&path).unwrap();

        assert_eq!(PlayerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.ron");
        fs::write(&path, "(default_tempo_bpm: 72.0)").unwrap();

        let config = PlayerConfig::load(&path).unwrap();
        assert_eq!(config.default_tempo_bpm, 72.0);
        assert_eq!(config.master_volume, 1.0);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.ron");
        fs::write(&path, "(default_tempo_bpm: \"fast\")").unwrap();

        assert!(matches!(
            PlayerConfig::load(&path),
            Err(PlaybackError::ConfigParse(_))
        ));
    }
}
