//! Power-up pickups and their manager
//!
//! Kills don't spawn pickups directly. They queue a drop roll at the kill
//! position, and the manager resolves a bounded batch of rolls per frame.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::drops::DropCalculator;
use crate::consts::{
    CAPACITY_WARNING_INTERVAL_MS, DROP_BATCH_PER_FRAME, MAX_POWERUPS, PLAYFIELD_HEIGHT, SIM_DT,
};
use crate::tuning::{PowerUpConfig, Tuning};

/// Vertical bob amplitude in pixels
const FLOAT_AMPLITUDE: f32 = 2.0;
/// Fraction of lifetime after which the pickup starts fading
const FADE_START: f32 = 0.7;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    Health,
    Repair,
    Shield,
    DoubleLaser,
    SpeedBoost,
    Emp,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 6] = [
        PowerUpKind::Health,
        PowerUpKind::Repair,
        PowerUpKind::Shield,
        PowerUpKind::DoubleLaser,
        PowerUpKind::SpeedBoost,
        PowerUpKind::Emp,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_key(self) -> &'static str {
        match self {
            PowerUpKind::Health => "health",
            PowerUpKind::Repair => "repair",
            PowerUpKind::Shield => "shield",
            PowerUpKind::DoubleLaser => "double_laser",
            PowerUpKind::SpeedBoost => "speed_boost",
            PowerUpKind::Emp => "emp",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "health" => Some(PowerUpKind::Health),
            "repair" => Some(PowerUpKind::Repair),
            "shield" => Some(PowerUpKind::Shield),
            "double_laser" => Some(PowerUpKind::DoubleLaser),
            "speed_boost" | "speed" => Some(PowerUpKind::SpeedBoost),
            "emp" => Some(PowerUpKind::Emp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub size: Vec2,
    base_y: f32,
    fall_speed: f32,
    age_s: f32,
    pub spawn_ms: f64,
    pub duration_ms: f64,
    pub points: u32,
    /// Draw opacity, fades out late in life
    pub alpha: f32,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind, cfg: &PowerUpConfig, pos: Vec2, now_ms: f64) -> Self {
        Self {
            kind,
            pos,
            size: Vec2::new(cfg.size.0, cfg.size.1),
            base_y: pos.y,
            fall_speed: cfg.fall_speed,
            age_s: 0.0,
            spawn_ms: now_ms,
            duration_ms: cfg.duration_ms,
            points: cfg.points,
            alpha: 1.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, self.size)
    }

    pub fn life_fraction(&self, now_ms: f64) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.spawn_ms) / self.duration_ms).clamp(0.0, 1.0) as f32
    }

    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms - self.spawn_ms >= self.duration_ms
    }

    pub fn offscreen(&self) -> bool {
        self.rect().top() > PLAYFIELD_HEIGHT
    }

    /// Fall, bob and fade for one frame
    pub fn update(&mut self, dt: f32, now_ms: f64) {
        self.age_s += dt;
        self.base_y += self.fall_speed * (dt / SIM_DT);
        self.pos.y = self.base_y + (self.age_s * std::f32::consts::TAU).sin() * FLOAT_AMPLITUDE;

        let life = self.life_fraction(now_ms);
        self.alpha = if life > FADE_START {
            (1.0 - (life - FADE_START) / (1.0 - FADE_START)).clamp(0.0, 1.0)
        } else {
            1.0
        };
    }
}

#[derive(Debug, Clone)]
pub struct PowerUpManager {
    pub powerups: Vec<PowerUp>,
    queue: VecDeque<Vec2>,
    calculator: DropCalculator,
    batch_size: usize,
    capacity: usize,
    last_limit_warning_ms: Option<f64>,
}

impl PowerUpManager {
    pub fn new(tuning: &Tuning, capacity: usize) -> Self {
        Self {
            powerups: Vec::new(),
            queue: VecDeque::new(),
            calculator: DropCalculator::from_tuning(tuning),
            batch_size: DROP_BATCH_PER_FRAME,
            capacity,
            last_limit_warning_ms: None,
        }
    }

    pub fn with_default_capacity(tuning: &Tuning) -> Self {
        Self::new(tuning, MAX_POWERUPS)
    }

    pub fn calculator(&self) -> &DropCalculator {
        &self.calculator
    }

    pub fn len(&self) -> usize {
        self.powerups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.powerups.is_empty()
    }

    pub fn pending_drops(&self) -> usize {
        self.queue.len()
    }

    /// Queue a drop roll at `pos`
    pub fn queue_drop(&mut self, pos: Vec2) {
        self.queue.push_back(pos);
    }

    /// Place a specific power-up, respecting capacity
    pub fn spawn(&mut self, kind: PowerUpKind, tuning: &Tuning, pos: Vec2, now_ms: f64) -> bool {
        if self.powerups.len() >= self.capacity {
            let due = self
                .last_limit_warning_ms
                .is_none_or(|t| now_ms - t >= CAPACITY_WARNING_INTERVAL_MS);
            if due {
                log::warn!("Power-up limit reached ({}), dropping spawns", self.capacity);
                self.last_limit_warning_ms = Some(now_ms);
            }
            return false;
        }
        self.powerups
            .push(PowerUp::new(kind, tuning.powerup(kind), pos, now_ms));
        log::debug!("Spawned {} power-up", kind.as_key());
        true
    }

    /// Resolve up to one batch of queued rolls; returns how many spawned
    pub fn process_queue(&mut self, tuning: &Tuning, rng: &mut impl Rng, now_ms: f64) -> usize {
        let mut spawned = 0;
        for _ in 0..self.batch_size {
            let Some(pos) = self.queue.pop_front() else {
                break;
            };
            if let Some(kind) = self.calculator.roll(rng) {
                if self.spawn(kind, tuning, pos, now_ms) {
                    spawned += 1;
                }
            }
        }
        spawned
    }

    pub fn update(&mut self, tuning: &Tuning, rng: &mut impl Rng, dt: f32, now_ms: f64) {
        self.process_queue(tuning, rng, now_ms);
        for powerup in &mut self.powerups {
            powerup.update(dt, now_ms);
        }
        self.powerups
            .retain(|p| !p.is_expired(now_ms) && !p.offscreen());
    }

    /// Remove and return every pickup overlapping `rect`
    pub fn take_colliding(&mut self, rect: &Rect) -> Vec<PowerUp> {
        let mut taken = Vec::new();
        let mut i = 0;
        while i < self.powerups.len() {
            if self.powerups[i].rect().overlaps(rect) {
                taken.push(self.powerups.remove(i));
            } else {
                i += 1;
            }
        }
        taken
    }

    pub fn clear(&mut self) {
        self.powerups.clear();
        self.queue.clear();
    }
}
