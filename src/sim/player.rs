//! The player ship

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::projectile::{Owner, Projectile, ProjectileKind};
use crate::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH, SIM_DT};
use crate::tuning::{ShipTemplate, Tuning};

/// Horizontal spread of the two bolts a double laser muzzle fires
const DOUBLE_LASER_SPREAD: f32 = 6.0;
/// Maximum visual bank angle while strafing
const MAX_TILT_DEG: f32 = 12.0;
/// Distance from the bottom edge the ship spawns at
const SPAWN_MARGIN_Y: f32 = 100.0;

/// Timed pickup effects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerEffects {
    pub double_laser_until_ms: f64,
    pub speed_boost_until_ms: f64,
    pub speed_multiplier: f32,
}

impl PlayerEffects {
    pub fn double_laser(&self, now_ms: f64) -> bool {
        now_ms < self.double_laser_until_ms
    }

    pub fn speed_factor(&self, now_ms: f64) -> f32 {
        if now_ms < self.speed_boost_until_ms {
            self.speed_multiplier.max(1.0)
        } else {
            1.0
        }
    }
}

/// Movement intent for one frame, each axis in -1..=1
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveIntent {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub stage: u8,
    pub size: Vec2,
    pub base_speed: f32,
    pub max_health: i32,
    pub health: i32,
    pub alive: bool,
    /// Remaining lives; negative means unlimited
    pub lives: i32,
    pub respawn_at_ms: Option<f64>,
    pub invulnerable_until_ms: f64,
    pub effects: PlayerEffects,
    /// Visual bank angle in degrees
    pub tilt_deg: f32,
    loadout: ShipTemplate,
    last_shots: BTreeMap<ProjectileKind, f64>,
}

impl Player {
    pub fn new(tuning: &Tuning, lives: i32) -> Self {
        let ship = tuning.base_ship().clone();
        Self {
            pos: Self::spawn_point(),
            stage: ship.stage,
            size: ship.size,
            base_speed: ship.speed,
            max_health: ship.health,
            health: ship.health,
            alive: true,
            lives,
            respawn_at_ms: None,
            invulnerable_until_ms: 0.0,
            effects: PlayerEffects::default(),
            tilt_deg: 0.0,
            loadout: ship,
            last_shots: BTreeMap::new(),
        }
    }

    pub fn spawn_point() -> Vec2 {
        Vec2::new(PLAYFIELD_WIDTH * 0.5, PLAYFIELD_HEIGHT - SPAWN_MARGIN_Y)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, self.size)
    }

    pub fn loadout(&self) -> &ShipTemplate {
        &self.loadout
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            0.0
        } else {
            self.health as f32 / self.max_health as f32
        }
    }

    pub fn is_invulnerable(&self, now_ms: f64) -> bool {
        now_ms < self.invulnerable_until_ms
    }

    pub fn has_unlimited_lives(&self) -> bool {
        self.lives < 0
    }

    /// Switch ship stage, keeping the current health percentage.
    /// Unknown stages are ignored.
    pub fn set_stage(&mut self, tuning: &Tuning, stage: u8) -> bool {
        let ship = match tuning.ship(stage) {
            Ok(ship) => ship.clone(),
            Err(err) => {
                log::warn!("Ignoring stage change: {err}");
                return false;
            }
        };
        let fraction = self.health_fraction();
        self.stage = stage;
        self.size = ship.size;
        self.base_speed = ship.speed;
        self.max_health = ship.health;
        self.health = ((ship.health as f32 * fraction).round() as i32).clamp(1, ship.health);
        self.loadout = ship;
        log::info!("Ship upgraded to stage {stage}");
        true
    }

    pub fn speed(&self, now_ms: f64) -> f32 {
        self.base_speed * self.effects.speed_factor(now_ms)
    }

    /// Move by intent for one frame and keep the ship inside the playfield
    pub fn steer(&mut self, intent: MoveIntent, dt: f32, now_ms: f64) {
        let frame_scale = dt / SIM_DT;
        let step = Vec2::new(intent.x, intent.y).clamp_length_max(1.0) * self.speed(now_ms);
        self.pos += step * frame_scale;
        let half = self.size * 0.5;
        self.pos = self.pos.clamp(
            half,
            Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT) - half,
        );

        let target_tilt = intent.x.clamp(-1.0, 1.0) * MAX_TILT_DEG;
        let blend = (10.0 * dt).min(1.0);
        self.tilt_deg += (target_tilt - self.tilt_deg) * blend;
    }

    /// Fire `kind` if this stage carries it and it is off cooldown
    pub fn shoot_weapon(
        &mut self,
        tuning: &Tuning,
        kind: ProjectileKind,
        now_ms: f64,
    ) -> Vec<Projectile> {
        if !self.alive {
            return Vec::new();
        }
        // The double laser borrows the laser hardpoints
        let mount = match kind {
            ProjectileKind::DoubleLaser => ProjectileKind::Laser,
            other => other,
        };
        let count = self.loadout.weapon_count(mount);
        if count == 0 {
            return Vec::new();
        }
        let cfg = tuning.weapon(kind);
        if let Some(last) = self.last_shots.get(&kind) {
            if now_ms - last < cfg.cooldown_ms {
                return Vec::new();
            }
        }
        self.last_shots.insert(kind, now_ms);

        let muzzles = self
            .loadout
            .muzzles
            .get(&mount)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let angles = self
            .loadout
            .angles
            .get(&mount)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let nose = Vec2::new(0.0, -self.size.y * 0.5);

        let mut shots = Vec::new();
        for i in 0..count as usize {
            let offset = if muzzles.is_empty() {
                nose
            } else {
                muzzles[i % muzzles.len()]
            };
            let angle = if angles.is_empty() {
                0.0
            } else {
                angles[i % angles.len()]
            };
            let origin = self.pos + offset;
            if kind == ProjectileKind::DoubleLaser {
                for side in [-1.0, 1.0] {
                    let bolt = origin + Vec2::new(side * DOUBLE_LASER_SPREAD, 0.0);
                    shots.push(Projectile::create(kind, cfg, bolt, Owner::Player, angle, now_ms));
                }
            } else {
                shots.push(Projectile::create(kind, cfg, origin, Owner::Player, angle, now_ms));
            }
        }
        shots
    }

    /// Main gun: double laser while that effect is active, laser otherwise
    pub fn fire_primary(&mut self, tuning: &Tuning, now_ms: f64) -> Vec<Projectile> {
        if self.effects.double_laser(now_ms) {
            self.shoot_weapon(tuning, ProjectileKind::DoubleLaser, now_ms)
        } else {
            self.shoot_weapon(tuning, ProjectileKind::Laser, now_ms)
        }
    }

    /// Subtract damage; true only on the alive-to-dead transition
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if !self.alive {
            return false;
        }
        self.health = (self.health - amount.max(0)).max(0);
        if self.health == 0 {
            self.alive = false;
            return true;
        }
        false
    }

    pub fn heal_fraction(&mut self, fraction: f32) -> i32 {
        let before = self.health;
        let amount = (self.max_health as f32 * fraction).round() as i32;
        self.health = (self.health + amount).min(self.max_health);
        self.health - before
    }

    /// Consume a life and schedule the respawn. Returns false when the run is over.
    pub fn begin_respawn(&mut self, now_ms: f64, cooldown_ms: f64) -> bool {
        if !self.has_unlimited_lives() {
            self.lives = (self.lives - 1).max(0);
            if self.lives == 0 {
                self.respawn_at_ms = None;
                return false;
            }
        }
        self.respawn_at_ms = Some(now_ms + cooldown_ms);
        true
    }

    /// Respawn if the timer elapsed; returns true on the frame it happens
    pub fn try_respawn(&mut self, now_ms: f64, protection_ms: f64) -> bool {
        match self.respawn_at_ms {
            Some(at) if !self.alive && now_ms >= at => {
                self.alive = true;
                self.health = self.max_health;
                self.pos = Self::spawn_point();
                self.tilt_deg = 0.0;
                self.respawn_at_ms = None;
                self.invulnerable_until_ms = now_ms + protection_ms;
                self.effects = PlayerEffects::default();
                true
            }
            _ => false,
        }
    }
}
