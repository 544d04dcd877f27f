//! Game settings and preferences
//!
//! Persisted as a small JSON file next to the high score.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_EXPLOSIONS, MAX_POWERUPS, MAX_PROJECTILES};
use crate::error::ConfigError;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,

    // === Run rules ===
    /// Starting lives; -1 is unlimited
    pub lives: i32,
    /// Delay between losing a ship and the respawn
    pub lives_cooldown_ms: f64,
    /// Invulnerability window after a respawn
    pub respawn_protection_ms: f64,

    // === Capacities ===
    pub max_projectiles: usize,
    pub max_explosions: usize,
    pub max_powerups: usize,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,
    /// Show enemy HP bars after hits
    pub show_hp_bars: bool,

    /// Fixed RNG seed; random when unset
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Audio
            master_volume: 0.1,
            sfx_volume: 0.5,
            music_volume: 0.3,
            muted: false,

            // Run rules
            lives: -1,
            lives_cooldown_ms: 1000.0,
            respawn_protection_ms: 3000.0,

            // Capacities
            max_projectiles: MAX_PROJECTILES,
            max_explosions: MAX_EXPLOSIONS,
            max_powerups: MAX_POWERUPS,

            // HUD
            show_fps: false,
            show_hp_bars: true,

            seed: None,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, volume) in [
            ("master_volume", self.master_volume),
            ("sfx_volume", self.sfx_volume),
            ("music_volume", self.music_volume),
        ] {
            if !(0.0..=1.0).contains(&volume) {
                return Err(ConfigError::invalid(
                    "settings",
                    field,
                    format!("{volume} is outside 0.0 - 1.0"),
                ));
            }
        }
        if self.lives == 0 || self.lives < -1 {
            return Err(ConfigError::invalid(
                "settings",
                "lives",
                format!("{} (use -1 for unlimited)", self.lives),
            ));
        }
        if self.lives_cooldown_ms < 0.0 || self.respawn_protection_ms < 0.0 {
            return Err(ConfigError::invalid(
                "settings",
                "lives_cooldown_ms",
                "timers must not be negative",
            ));
        }
        if self.max_projectiles == 0 || self.max_explosions == 0 {
            return Err(ConfigError::invalid(
                "settings",
                "max_projectiles",
                "capacities must be positive",
            ));
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults when missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("Using default settings");
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Ignoring settings file {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        log::info!("Settings saved");
        Ok(())
    }

    pub fn has_unlimited_lives(&self) -> bool {
        self.lives < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.lives, -1);
        assert!(s.has_unlimited_lives());
        assert_eq!(s.respawn_protection_ms, 3000.0);
        assert_eq!(s.max_projectiles, 2000);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = Settings::from_json(r#"{"lives": 3, "seed": 7}"#).unwrap();
        assert_eq!(s.lives, 3);
        assert_eq!(s.seed, Some(7));
        assert_eq!(s.sfx_volume, 0.5);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Settings::from_json(r#"{"lives": 0}"#),
            Err(ConfigError::InvalidValue { field: "lives", .. })
        ));
        assert!(Settings::from_json(r#"{"master_volume": 2.0}"#).is_err());
        assert!(matches!(
            Settings::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("star_invaders_settings_{}.json", std::process::id()));
        let mut s = Settings::default();
        s.lives = 5;
        s.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), s);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let s = Settings::load_or_default("/nonexistent/star_invaders/settings.json");
        assert_eq!(s, Settings::default());
    }
}
