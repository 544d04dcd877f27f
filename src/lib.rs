//! Star Invaders - A wave-based arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (projectiles, enemies, combat, shields)
//! - `tuning`: Data-driven weapon/enemy/shield/power-up tables
//! - `renderer`: Asset handles and the draw-call walker
//! - `platform`: Input snapshots and the fixed-timestep accumulator
//! - `game`: Phase machine driving the loop

pub mod audio;
pub mod error;
pub mod game;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::ConfigError;
pub use game::Game;
pub use highscores::HighScore;
pub use settings::Settings;
pub use tuning::{Catalog, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed physics timestep (60 Hz, projectile speeds are px per tick)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Fixed physics timestep in game-clock milliseconds
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum physics substeps per rendered frame
    pub const MAX_SUBSTEPS: u32 = 5;
    /// Longest wall-clock frame we accept before treating it as a stall
    pub const MAX_FRAME_DT: f32 = 0.25;

    /// Playfield dimensions (screen space, y grows downward)
    pub const PLAYFIELD_WIDTH: f32 = 1920.0;
    pub const PLAYFIELD_HEIGHT: f32 = 1080.0;
    /// Extra culling margin for guided projectiles on long pursuits
    pub const HOMING_OFFSCREEN_MARGIN: f32 = 200.0;

    /// Default manager capacities
    pub const MAX_PROJECTILES: usize = 2000;
    pub const MAX_EXPLOSIONS: usize = 256;
    pub const MAX_POWERUPS: usize = 64;
    /// Queued drop rolls resolved per frame
    pub const DROP_BATCH_PER_FRAME: usize = 10;
    /// Minimum game time between two capacity warnings from one manager
    pub const CAPACITY_WARNING_INTERVAL_MS: f64 = 5000.0;

    /// Enemy HP bar stays visible this long after a hit
    pub const HP_BAR_SHOW_MS: f64 = 800.0;
    /// Pause between a cleared wave and the next one
    pub const WAVE_BREATHER_MS: f64 = 2000.0;
}

/// Unit heading for a firing angle in degrees (0 = straight ahead).
///
/// `forward_sign` is -1 for shots travelling up the screen, +1 for down.
#[inline]
pub fn heading_from_angle(angle_deg: f32, forward_sign: f32) -> Vec2 {
    let rad = angle_deg.to_radians();
    Vec2::new(rad.sin(), forward_sign * rad.cos())
}

/// Normalize `v`, falling back to `fallback` when `v` has no usable length
#[inline]
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    v.try_normalize().unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_straight_up_and_down() {
        let up = heading_from_angle(0.0, -1.0);
        assert!((up - Vec2::new(0.0, -1.0)).length() < 1e-6);
        let down = heading_from_angle(0.0, 1.0);
        assert!((down - Vec2::new(0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_heading_is_unit_length() {
        for angle in [-45.0, -10.0, 5.0, 30.0, 90.0] {
            assert!((heading_from_angle(angle, -1.0).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_normalize_or_degenerate() {
        let fallback = Vec2::new(0.0, -1.0);
        assert_eq!(normalize_or(Vec2::ZERO, fallback), fallback);
        assert_eq!(normalize_or(Vec2::new(3.0, 0.0), fallback), Vec2::X);
    }
}
