//! Wave progression, grid formation drift and fly-in spawning

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::enemy::{Enemy, EnemyKind};
use crate::consts::{PLAYFIELD_WIDTH, SIM_DT};
use crate::tuning::{FlyInPath, MovementConfig, Tuning};

/// Order formation waves cycle through
pub const WAVE_ORDER: [EnemyKind; 5] = [
    EnemyKind::Alien,
    EnemyKind::Drone,
    EnemyKind::Tank,
    EnemyKind::Sniper,
    EnemyKind::Boss,
];

/// Kind for a 1-based wave number
pub fn kind_for_wave(number: u32) -> EnemyKind {
    WAVE_ORDER[(number.saturating_sub(1) as usize) % WAVE_ORDER.len()]
}

/// Lay out a formation of `kind` (or a single boss) with fresh ids
pub fn build_formation(
    tuning: &Tuning,
    kind: EnemyKind,
    rng: &mut impl Rng,
    mut next_id: impl FnMut() -> EntityId,
) -> Vec<Enemy> {
    let template = tuning.enemy(kind);
    let f = &template.formation;
    let mut enemies = Vec::with_capacity((f.cols * f.rows) as usize);
    for row in 0..f.rows {
        for col in 0..f.cols {
            let top_left = match template.movement {
                MovementConfig::Float { .. } => Vec2::new(
                    (PLAYFIELD_WIDTH - template.size.x) * 0.5,
                    f.margin_y,
                ),
                _ => Vec2::new(
                    f.margin_x + col as f32 * f.h_spacing,
                    f.margin_y + row as f32 * f.v_spacing,
                ),
            };
            let center = top_left + template.size * 0.5;
            enemies.push(Enemy::new(next_id(), template, center, rng));
        }
    }
    log::debug!("Built {} formation of {}", kind.as_key(), enemies.len());
    enemies
}

/// Horizontal drift of the grid formation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveController {
    pub number: u32,
    pub kind: Option<EnemyKind>,
    pub direction: f32,
    pub speed: f32,
    pub drop_px: f32,
    /// Next wave starts at this game time
    pub next_wave_at_ms: Option<f64>,
}

impl Default for WaveController {
    fn default() -> Self {
        Self {
            number: 0,
            kind: None,
            direction: 1.0,
            speed: 0.0,
            drop_px: 0.0,
            next_wave_at_ms: Some(0.0),
        }
    }
}

impl WaveController {
    /// Configure drift for wave `number` of `kind`
    pub fn begin(&mut self, tuning: &Tuning, number: u32, kind: EnemyKind) {
        self.number = number;
        self.kind = Some(kind);
        self.direction = 1.0;
        self.next_wave_at_ms = None;
        let (drop_px, speed_start) = match tuning.enemy(kind).movement {
            MovementConfig::Grid {
                drop_px,
                speed_start,
            } => (drop_px, speed_start),
            _ => (0.0, 0.0),
        };
        self.drop_px = drop_px;
        // Wave 1 drifts at the base speed
        self.speed = speed_start + number.saturating_sub(1) as f32 * tuning.waves.speed_add;
    }

    /// Drift the grid one frame. Reverses and drops every member when the
    /// formation would cross a side edge.
    pub fn step(&mut self, enemies: &mut [Enemy], dt: f32) {
        let frame_scale = dt / SIM_DT;
        let (left, right) = enemies
            .iter()
            .map(|e| e.rect())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(l, r), rect| {
                (l.min(rect.left()), r.max(rect.right()))
            });
        let dx = self.direction * self.speed.max(1.0) * frame_scale;
        let hit_edge = if enemies.is_empty() {
            false
        } else if self.direction > 0.0 {
            right + dx >= PLAYFIELD_WIDTH
        } else {
            left + dx <= 0.0
        };

        if hit_edge {
            self.direction = -self.direction;
            for enemy in enemies.iter_mut() {
                enemy.drop_down(self.drop_px);
                enemy.update(0.0, dt);
            }
        } else {
            for enemy in enemies.iter_mut() {
                enemy.update(dx, dt);
            }
        }
    }
}

/// Periodic fly-in interceptor spawns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlyInSpawner {
    pub interval_ms: f64,
    pub max_alive: usize,
    pub from_wave: u32,
    last_spawn_ms: Option<f64>,
}

impl FlyInSpawner {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            interval_ms: tuning.waves.fly_in_interval_ms,
            max_alive: tuning.waves.fly_in_max_alive,
            from_wave: tuning.waves.fly_in_from_wave,
            last_spawn_ms: None,
        }
    }

    pub fn reset(&mut self) {
        self.last_spawn_ms = None;
    }

    /// Spawn one interceptor when due
    pub fn maybe_spawn(
        &mut self,
        tuning: &Tuning,
        wave: u32,
        alive: usize,
        now_ms: f64,
        rng: &mut impl Rng,
        id: EntityId,
    ) -> Option<Enemy> {
        if wave < self.from_wave || alive >= self.max_alive {
            return None;
        }
        match self.last_spawn_ms {
            Some(t) if now_ms - t < self.interval_ms => return None,
            None => {
                self.last_spawn_ms = Some(now_ms);
                return None;
            }
            _ => {}
        }
        self.last_spawn_ms = Some(now_ms);
        Some(spawn_fly_in(tuning, id, rng))
    }
}

/// One interceptor with randomized entry column and path parameters
pub fn spawn_fly_in(tuning: &Tuning, id: EntityId, rng: &mut impl Rng) -> Enemy {
    let template = tuning.enemy(EnemyKind::Interceptor);
    let margin = template.formation.margin_x.max(template.size.x);
    let x = rng.random_range(margin..(PLAYFIELD_WIDTH - margin).max(margin + 1.0));
    let y = template.spawn_y.unwrap_or(-template.size.y);
    let mut enemy = Enemy::new(id, template, Vec2::new(x, y), rng);
    if let super::enemy::Movement::FlyIn(fly) = &mut enemy.movement {
        fly.path = FlyInPath::ALL[rng.random_range(0..FlyInPath::ALL.len())];
        fly.amplitude *= rng.random_range(0.7..1.3);
        fly.frequency *= rng.random_range(0.8..1.2);
    }
    enemy
}
