//! Enemies: grid formations, the floating boss and fly-in interceptors

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::collision::Rect;
use super::projectile::{Owner, Projectile, ProjectileKind};
use crate::consts::{HP_BAR_SHOW_MS, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH, SIM_DT};
use crate::tuning::{EmpConfig, EnemyTemplate, FlyInPath, MovementConfig, Tuning};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Alien,
    Drone,
    Tank,
    Sniper,
    Boss,
    Interceptor,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 6] = [
        EnemyKind::Alien,
        EnemyKind::Drone,
        EnemyKind::Tank,
        EnemyKind::Sniper,
        EnemyKind::Boss,
        EnemyKind::Interceptor,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_key(self) -> &'static str {
        match self {
            EnemyKind::Alien => "alien",
            EnemyKind::Drone => "drone",
            EnemyKind::Tank => "tank",
            EnemyKind::Sniper => "sniper",
            EnemyKind::Boss => "boss",
            EnemyKind::Interceptor => "interceptor",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "alien" => Some(EnemyKind::Alien),
            "drone" => Some(EnemyKind::Drone),
            "tank" => Some(EnemyKind::Tank),
            "sniper" => Some(EnemyKind::Sniper),
            "boss" => Some(EnemyKind::Boss),
            "interceptor" => Some(EnemyKind::Interceptor),
            _ => None,
        }
    }
}

/// EMP after-effects; all timers count down in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmpStatus {
    pub weapons_disabled_s: f32,
    pub movement_slowed_s: f32,
    pub visual_s: f32,
    pub speed_factor: f32,
}

impl EmpStatus {
    pub fn apply(&mut self, cfg: &EmpConfig) {
        self.weapons_disabled_s = cfg.weapon_disable_s;
        self.movement_slowed_s = cfg.movement_disable_s;
        self.visual_s = cfg.visual_effect_s;
        self.speed_factor = cfg.movement_speed_factor;
    }

    pub fn can_shoot(&self) -> bool {
        self.weapons_disabled_s <= 0.0
    }

    pub fn movement_factor(&self) -> f32 {
        if self.movement_slowed_s > 0.0 {
            self.speed_factor
        } else {
            1.0
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visual_s > 0.0
    }

    pub fn tick(&mut self, dt: f32) {
        self.weapons_disabled_s = (self.weapons_disabled_s - dt).max(0.0);
        self.movement_slowed_s = (self.movement_slowed_s - dt).max(0.0);
        self.visual_s = (self.visual_s - dt).max(0.0);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlyIn {
    pub target_y: f32,
    pub speed: f32,
    pub path: FlyInPath,
    pub amplitude: f32,
    pub frequency: f32,
    pub radius: f32,
    pub phase: f32,
    /// Center of the holding pattern, fixed on arrival
    pub anchor: Vec2,
    pub elapsed: f32,
    pub arrived: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Movement {
    /// Moved by the wave controller
    Grid,
    Float {
        amplitude: f32,
        hz: f32,
        phase: f32,
        elapsed: f32,
    },
    FlyIn(FlyIn),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub hp: i32,
    pub max_hp: i32,
    pub points: u32,
    pub movement: Movement,
    pub weapons: Vec<(ProjectileKind, u32)>,
    pub shoot_prob: f32,
    pub weapon_probs: BTreeMap<ProjectileKind, f32>,
    pub angles: BTreeMap<ProjectileKind, Vec<f32>>,
    last_fired: BTreeMap<ProjectileKind, f64>,
    /// HP bar is drawn until this game time
    pub show_hp_until_ms: f64,
    pub emp: EmpStatus,
}

impl Enemy {
    /// Build an enemy centered at `pos`; float/fly-in state takes `rng` for phase
    pub fn new(id: EntityId, template: &EnemyTemplate, pos: Vec2, rng: &mut impl Rng) -> Self {
        let movement = match &template.movement {
            MovementConfig::Grid { .. } => Movement::Grid,
            MovementConfig::Float { amp_frac, hz } => Movement::Float {
                amplitude: amp_frac * PLAYFIELD_WIDTH * 0.5,
                hz: *hz,
                phase: rng.random_range(0.0..std::f32::consts::TAU),
                elapsed: 0.0,
            },
            MovementConfig::FlyIn {
                target_y,
                path,
                speed,
                amplitude,
                frequency,
                radius,
            } => Movement::FlyIn(FlyIn {
                target_y: *target_y,
                speed: *speed,
                path: *path,
                amplitude: *amplitude,
                frequency: *frequency,
                radius: *radius,
                phase: rng.random_range(0.0..std::f32::consts::TAU),
                anchor: pos,
                elapsed: 0.0,
                arrived: false,
            }),
        };
        Self {
            id,
            kind: template.kind,
            pos,
            size: template.size,
            hp: template.hp,
            max_hp: template.hp,
            points: template.points,
            movement,
            weapons: template.weapons.clone(),
            shoot_prob: template.shoot_prob,
            weapon_probs: template.weapon_probs.clone(),
            angles: template.angles.clone(),
            last_fired: BTreeMap::new(),
            show_hp_until_ms: 0.0,
            emp: EmpStatus::default(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, self.size)
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp <= 0 {
            0.0
        } else {
            self.hp as f32 / self.max_hp as f32
        }
    }

    pub fn shows_hp_bar(&self, now_ms: f64) -> bool {
        now_ms < self.show_hp_until_ms
    }

    /// Subtract `amount` (clamped at 0); true only on the alive-to-dead transition
    pub fn take_damage(&mut self, amount: i32, now_ms: f64) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.hp = (self.hp - amount.max(0)).max(0);
        self.show_hp_until_ms = now_ms + HP_BAR_SHOW_MS;
        !self.is_alive()
    }

    pub fn apply_emp(&mut self, cfg: &EmpConfig) {
        self.emp.apply(cfg);
    }

    /// Move one frame. `dx` is the wave controller's grid step.
    pub fn update(&mut self, dx: f32, dt: f32) {
        let factor = self.emp.movement_factor();
        let frame_scale = dt / SIM_DT;
        match &mut self.movement {
            Movement::Grid => {
                self.pos.x += dx * factor;
            }
            Movement::Float {
                amplitude,
                hz,
                phase,
                elapsed,
            } => {
                *elapsed += dt * factor;
                let angle = std::f32::consts::TAU * *hz * *elapsed + *phase;
                self.pos.x = PLAYFIELD_WIDTH * 0.5 + angle.sin() * *amplitude;
            }
            Movement::FlyIn(fly) => {
                if !fly.arrived {
                    self.pos.y += fly.speed * frame_scale * factor;
                    if self.pos.y >= fly.target_y {
                        self.pos.y = fly.target_y;
                        fly.arrived = true;
                        fly.anchor = self.pos;
                    }
                } else {
                    fly.elapsed += dt * factor;
                    let t = std::f32::consts::TAU * fly.frequency * fly.elapsed + fly.phase;
                    self.pos = match fly.path {
                        FlyInPath::Straight => {
                            Vec2::new(fly.anchor.x, fly.anchor.y + fly.elapsed * fly.speed * 20.0)
                        }
                        FlyInPath::Sine => Vec2::new(
                            fly.anchor.x + t.sin() * fly.amplitude,
                            fly.anchor.y + fly.elapsed * fly.speed * 4.0,
                        ),
                        FlyInPath::Circle => {
                            fly.anchor + Vec2::new(t.cos(), t.sin()) * fly.radius
                        }
                    };
                }
            }
        }
        self.emp.tick(dt);
    }

    /// Shift down one formation row
    pub fn drop_down(&mut self, dy: f32) {
        self.pos.y += dy;
    }

    /// Entirely below the playfield
    pub fn below_playfield(&self) -> bool {
        self.rect().top() > PLAYFIELD_HEIGHT
    }

    /// Try to fire `amount` shots of `kind`. Empty when cooling down,
    /// EMP-disabled or the probability roll fails.
    pub fn shoot_weapon(
        &mut self,
        kind: ProjectileKind,
        amount: u32,
        tuning: &Tuning,
        now_ms: f64,
        rng: &mut impl Rng,
    ) -> Vec<Projectile> {
        if !self.emp.can_shoot() || amount == 0 {
            return Vec::new();
        }
        let cfg = tuning.weapon(kind);
        if let Some(last) = self.last_fired.get(&kind) {
            if now_ms - last < cfg.cooldown_ms {
                return Vec::new();
            }
        }
        let prob = self
            .weapon_probs
            .get(&kind)
            .copied()
            .unwrap_or(self.shoot_prob);
        if rng.random::<f32>() >= prob {
            return Vec::new();
        }
        self.last_fired.insert(kind, now_ms);

        let origin = self.rect().mid_bottom();
        let angles = self.angles.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
        // Every volley restarts at the first angle
        (0..amount as usize)
            .map(|i| {
                let angle = if angles.is_empty() {
                    0.0
                } else {
                    angles[i % angles.len()]
                };
                Projectile::create(kind, cfg, origin, Owner::Enemy, angle, now_ms)
            })
            .collect()
    }

    /// Roll every configured weapon once
    pub fn fire(&mut self, tuning: &Tuning, now_ms: f64, rng: &mut impl Rng) -> Vec<Projectile> {
        let weapons = self.weapons.clone();
        weapons
            .into_iter()
            .flat_map(|(kind, amount)| self.shoot_weapon(kind, amount, tuning, now_ms, &mut *rng))
            .collect()
    }
}
