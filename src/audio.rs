//! Sound cues and the volume-aware audio front end
//!
//! The simulation only emits `SoundEffect` cues. Mixing and playback belong
//! to whatever `AudioBackend` the host plugs in.

use serde::{Deserialize, Serialize};

use crate::sim::ProjectileKind;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Player weapon fired
    Fire(ProjectileKind),
    /// Shot connected with something
    Impact(ProjectileKind),
    /// Hostile destroyed
    Explosion,
    /// Hull damage taken
    PlayerHit,
    PlayerDestroyed,
    ShieldUp,
    /// Shield absorbed a hit (throttled per shield)
    ShieldHit,
    ShieldDown,
    PowerUpCollected,
    EmpPulse,
    WaveStart,
    /// Game over
    GameOver,
    /// New high score
    HighScore,
}

impl SoundEffect {
    /// Asset key the backend resolves to a sample
    pub fn key(self) -> &'static str {
        match self {
            SoundEffect::Fire(kind) => match kind {
                ProjectileKind::Laser | ProjectileKind::DoubleLaser => "laser",
                ProjectileKind::Rocket | ProjectileKind::HomingRocket => "rocket",
                ProjectileKind::Blaster => "blaster",
                ProjectileKind::Nuke => "nuke",
            },
            SoundEffect::Impact(kind) if kind.is_explosive() => "explosion_large",
            SoundEffect::Impact(_) => "impact",
            SoundEffect::Explosion => "explosion",
            SoundEffect::PlayerHit => "player_hit",
            SoundEffect::PlayerDestroyed => "player_explosion",
            SoundEffect::ShieldUp => "shield_up",
            SoundEffect::ShieldHit => "shield_hit",
            SoundEffect::ShieldDown => "shield_down",
            SoundEffect::PowerUpCollected => "powerup",
            SoundEffect::EmpPulse => "emp",
            SoundEffect::WaveStart => "wave_start",
            SoundEffect::GameOver => "game_over",
            SoundEffect::HighScore => "high_score",
        }
    }

    /// Per-cue gain before master/sfx volume
    fn base_gain(self) -> f32 {
        match self {
            SoundEffect::Fire(ProjectileKind::Laser | ProjectileKind::DoubleLaser) => 0.4,
            SoundEffect::Impact(_) => 0.6,
            SoundEffect::ShieldHit => 0.5,
            SoundEffect::Fire(ProjectileKind::Nuke) | SoundEffect::PlayerDestroyed => 1.0,
            _ => 0.8,
        }
    }
}

/// Playback sink. `volume` is already scaled and in 0.0 - 1.0.
pub trait AudioBackend {
    fn play(&mut self, effect: SoundEffect, volume: f32);
}

/// Discards every cue
#[derive(Debug, Default)]
pub struct SilentBackend;

impl AudioBackend for SilentBackend {
    fn play(&mut self, _effect: SoundEffect, _volume: f32) {}
}

/// Traces cues through the log facade (headless runs)
#[derive(Debug, Default)]
pub struct LogBackend {
    pub played: u64,
}

impl AudioBackend for LogBackend {
    fn play(&mut self, effect: SoundEffect, volume: f32) {
        self.played += 1;
        log::trace!("sfx {} at {:.2}", effect.key(), volume);
    }
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Box<dyn AudioBackend>,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(Box::new(SilentBackend))
    }
}

impl AudioManager {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 1.0,
            muted: false,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Volume a music player should use
    pub fn music_level(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume() * effect.base_gain();
        if vol <= 0.0 {
            return;
        }
        self.backend.play(effect, vol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder(Rc<RefCell<Vec<(SoundEffect, f32)>>>);

    impl AudioBackend for Recorder {
        fn play(&mut self, effect: SoundEffect, volume: f32) {
            self.0.borrow_mut().push((effect, volume));
        }
    }

    #[test]
    fn test_volume_scaling() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut audio = AudioManager::new(Box::new(Recorder(Rc::clone(&log))));
        audio.set_master_volume(0.5);
        audio.set_sfx_volume(0.5);
        audio.play(SoundEffect::Explosion);
        let played = log.borrow();
        assert_eq!(played.len(), 1);
        assert!((played[0].1 - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_muted_plays_nothing() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut audio = AudioManager::new(Box::new(Recorder(Rc::clone(&log))));
        audio.set_muted(true);
        audio.play(SoundEffect::GameOver);
        assert!(log.borrow().is_empty());
        assert_eq!(audio.music_level(), 0.0);
    }

    #[test]
    fn test_volume_clamped() {
        let mut audio = AudioManager::default();
        audio.set_master_volume(3.0);
        audio.set_music_volume(-1.0);
        assert_eq!(audio.music_level(), 0.0);
        audio.set_music_volume(1.0);
        assert_eq!(audio.music_level(), 1.0);
    }

    #[test]
    fn test_sound_keys() {
        assert_eq!(SoundEffect::Fire(ProjectileKind::DoubleLaser).key(), "laser");
        assert_eq!(SoundEffect::Impact(ProjectileKind::Nuke).key(), "explosion_large");
        assert_eq!(SoundEffect::Impact(ProjectileKind::Laser).key(), "impact");
    }
}
