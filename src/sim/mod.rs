//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Game time only advances in fixed physics steps
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies beyond asset handles

pub mod clock;
pub mod collision;
pub mod combat;
pub mod drops;
pub mod emp;
pub mod enemy;
pub mod explosion;
pub mod player;
pub mod powerup;
pub mod projectile;
pub mod shield;
pub mod state;
pub mod tick;
pub mod wave;

/// Stable identifier for hostiles; allocated in increasing order per run
pub type EntityId = u32;

pub use clock::GameClock;
pub use collision::{HitMask, Rect};
pub use combat::{Kill, apply_aoe, falloff_damage};
pub use drops::DropCalculator;
pub use emp::{EmpAbility, EmpWave};
pub use enemy::{Enemy, EnemyKind, Movement};
pub use explosion::{Explosion, ExplosionManager};
pub use player::Player;
pub use powerup::{PowerUp, PowerUpKind, PowerUpManager};
pub use projectile::{Owner, Projectile, ProjectileKind, ProjectileManager};
pub use shield::{Shield, ShieldAbility, ShieldKind, ShieldStatus};
pub use state::{GameEvent, GamePhase, GameState, RunRules};
pub use tick::{TickInput, frame_update, physics_tick};
pub use wave::{FlyInSpawner, WaveController};
