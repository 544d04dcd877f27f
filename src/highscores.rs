//! Best score persistence
//!
//! Stored as `{"highscore": N}`. A missing or unreadable file starts fresh.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HighScore {
    pub highscore: u64,
}

impl HighScore {
    pub fn new(highscore: u64) -> Self {
        Self { highscore }
    }

    /// Keep `score` if it beats the best; true when it did
    pub fn record(&mut self, score: u64) -> bool {
        if score > self.highscore {
            self.highscore = score;
            true
        } else {
            false
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => {
                log::info!("No high score found, starting fresh");
                return Self::default();
            }
        };
        match serde_json::from_str::<HighScore>(&json) {
            Ok(score) => {
                log::info!("Loaded high score {}", score.highscore);
                score
            }
            Err(err) => {
                log::warn!("Corrupt high score file {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, serde_json::to_string(self)?)?;
        log::info!("High score saved ({})", self.highscore);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("star_invaders_{name}_{}.json", std::process::id()))
    }

    #[test]
    fn test_record_keeps_max() {
        let mut best = HighScore::new(100);
        assert!(!best.record(50));
        assert!(!best.record(100));
        assert!(best.record(150));
        assert_eq!(best.highscore, 150);
    }

    #[test]
    fn test_file_format() {
        let json = serde_json::to_string(&HighScore::new(4200)).unwrap();
        assert_eq!(json, r#"{"highscore":4200}"#);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("hs");
        HighScore::new(777).save(&path).unwrap();
        assert_eq!(HighScore::load(&path).highscore, 777);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let path = temp_path("hs_corrupt");
        fs::write(&path, "not json").unwrap();
        assert_eq!(HighScore::load(&path), HighScore::default());
        let _ = fs::remove_file(&path);
        assert_eq!(HighScore::load(&path).highscore, 0);
    }
}
