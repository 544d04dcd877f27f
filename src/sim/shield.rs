//! Shields: the activatable ability shield and the power-up shield
//!
//! Both are the same entity with different tuning. The ability shield only
//! takes `damage_reduction` of each hit and lets the rest through; the
//! power-up shield soaks whole hits until it breaks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{HitMask, circle_contains};
use crate::tuning::ShieldConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShieldKind {
    Ability,
    PowerUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShieldStatus {
    Active,
    /// Health reached zero
    Depleted,
    /// Lifetime ran out with health left
    Expired,
    /// A non-looping animation played its last frame
    Finished,
}

/// Outcome of routing one hit through a shield
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Absorption {
    pub absorbed: f32,
    pub passthrough: f32,
    /// Hit sound is off cooldown
    pub play_sound: bool,
}

#[derive(Debug, Clone)]
pub struct Shield {
    pub kind: ShieldKind,
    pub center: Vec2,
    pub radius: f32,
    max_health: f32,
    health: f32,
    damage_reduction: f32,
    regen_rate: f32,
    activated_ms: f64,
    duration_ms: f64,
    hit_sound_cooldown_ms: f64,
    last_hit_sound_ms: Option<f64>,
    frame: usize,
    frame_count: usize,
    fps: f32,
    anim_elapsed: f32,
    looping: bool,
    mask: Option<HitMask>,
}

impl Shield {
    /// `initial_fraction` is the share of the shield's max it starts with
    pub fn new(
        kind: ShieldKind,
        cfg: &ShieldConfig,
        owner_max_health: f32,
        initial_fraction: f32,
        center: Vec2,
        now_ms: f64,
        duration_ms: f64,
    ) -> Self {
        let max_health = owner_max_health * cfg.health_percentage;
        Self {
            kind,
            center,
            radius: cfg.radius,
            max_health,
            health: max_health * initial_fraction.clamp(0.0, 1.0),
            damage_reduction: cfg.damage_reduction,
            regen_rate: cfg.regen_rate,
            activated_ms: now_ms,
            duration_ms,
            hit_sound_cooldown_ms: cfg.hit_sound_cooldown_ms,
            last_hit_sound_ms: None,
            frame: 0,
            frame_count: (cfg.cols * cfg.rows).max(1) as usize,
            fps: cfg.fps,
            anim_elapsed: 0.0,
            looping: cfg.looping,
            mask: None,
        }
    }

    pub fn with_mask(mut self, mask: HitMask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            self.health / self.max_health
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.health <= 0.0
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Remaining lifetime as 0..=1
    pub fn time_left_fraction(&self, now_ms: f64) -> f32 {
        if self.duration_ms <= 0.0 {
            return 0.0;
        }
        (1.0 - (now_ms - self.activated_ms) / self.duration_ms).clamp(0.0, 1.0) as f32
    }

    /// Route `incoming` damage through the shield
    pub fn absorb(&mut self, incoming: f32, now_ms: f64) -> Absorption {
        if incoming <= 0.0 || self.is_depleted() {
            return Absorption {
                absorbed: 0.0,
                passthrough: incoming.max(0.0),
                play_sound: false,
            };
        }
        let share = match self.kind {
            ShieldKind::Ability => incoming * self.damage_reduction,
            ShieldKind::PowerUp => incoming,
        };
        let absorbed = share.min(self.health);
        self.health = (self.health - absorbed).max(0.0);
        let passthrough = match self.kind {
            ShieldKind::Ability => incoming - absorbed,
            ShieldKind::PowerUp => 0.0,
        };

        let play_sound = self
            .last_hit_sound_ms
            .is_none_or(|t| now_ms - t >= self.hit_sound_cooldown_ms);
        if play_sound {
            self.last_hit_sound_ms = Some(now_ms);
        }
        Absorption {
            absorbed,
            passthrough,
            play_sound,
        }
    }

    /// Regenerate, animate and report whether the shield is still up
    pub fn update(&mut self, dt: f32, now_ms: f64) -> ShieldStatus {
        if self.is_depleted() {
            return ShieldStatus::Depleted;
        }
        if now_ms - self.activated_ms >= self.duration_ms {
            return ShieldStatus::Expired;
        }
        self.health = (self.health + self.regen_rate * self.max_health * dt).min(self.max_health);

        self.anim_elapsed += dt;
        let step = 1.0 / self.fps.max(1.0);
        while self.anim_elapsed >= step {
            self.anim_elapsed -= step;
            if self.frame + 1 < self.frame_count {
                self.frame += 1;
            } else if self.looping {
                self.frame = 0;
            } else {
                return ShieldStatus::Finished;
            }
        }
        ShieldStatus::Active
    }

    /// Whether `point` lies on the shield
    pub fn hit_test(&self, point: Vec2) -> bool {
        match &self.mask {
            Some(mask) => mask.hit(self.center, Vec2::splat(self.radius * 2.0), point),
            None => circle_contains(self.center, self.radius, point),
        }
    }
}

/// Cooldown and recharge bookkeeping for the ability shield
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShieldAbility {
    last_activated_ms: Option<f64>,
    last_destroyed_ms: Option<f64>,
}

impl ShieldAbility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready(&self, cfg: &ShieldConfig, now_ms: f64) -> bool {
        self.last_activated_ms
            .is_none_or(|t| now_ms - t >= cfg.cooldown_ms)
    }

    /// Cooldown progress as 0..=1 (1 = ready)
    pub fn cooldown_progress(&self, cfg: &ShieldConfig, now_ms: f64) -> f32 {
        match self.last_activated_ms {
            None => 1.0,
            Some(_) if cfg.cooldown_ms <= 0.0 => 1.0,
            Some(t) => ((now_ms - t) / cfg.cooldown_ms).clamp(0.0, 1.0) as f32,
        }
    }

    /// Starting health fraction: full when fresh, otherwise the time-weighted
    /// recharge since the last break, floored at the configured minimum
    pub fn initial_fraction(&self, cfg: &ShieldConfig, now_ms: f64) -> f32 {
        match self.last_destroyed_ms {
            None => 1.0,
            Some(t) => {
                let recharged = cfg.regen_rate * ((now_ms - t) / 1000.0) as f32;
                recharged.max(cfg.min_health_percentage).min(1.0)
            }
        }
    }

    /// Raise the shield if off cooldown
    pub fn activate(
        &mut self,
        cfg: &ShieldConfig,
        owner_max_health: f32,
        center: Vec2,
        now_ms: f64,
    ) -> Option<Shield> {
        if !self.ready(cfg, now_ms) {
            return None;
        }
        let fraction = self.initial_fraction(cfg, now_ms);
        self.last_activated_ms = Some(now_ms);
        self.last_destroyed_ms = None;
        log::debug!("Ability shield up at {:.0}% charge", fraction * 100.0);
        Some(Shield::new(
            ShieldKind::Ability,
            cfg,
            owner_max_health,
            fraction,
            center,
            now_ms,
            cfg.duration_ms,
        ))
    }

    pub fn record_destroyed(&mut self, now_ms: f64) {
        self.last_destroyed_ms = Some(now_ms);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::tuning::Tuning;

    fn ability_cfg() -> ShieldConfig {
        Tuning::builtin().unwrap().ability_shield().clone()
    }

    fn powerup_cfg() -> ShieldConfig {
        Tuning::builtin().unwrap().powerup_shield().clone()
    }

    #[test]
    fn test_ability_shield_passes_remainder() {
        let cfg = ability_cfg();
        let mut shield = Shield::new(ShieldKind::Ability, &cfg, 1000.0, 1.0, Vec2::ZERO, 0.0, 5000.0);
        assert_eq!(shield.max_health(), 500.0);
        let hit = shield.absorb(100.0, 0.0);
        assert!((hit.absorbed - 90.0).abs() < 1e-4);
        assert!((hit.passthrough - 10.0).abs() < 1e-4);
        assert!((shield.health() - 410.0).abs() < 1e-4);
    }

    #[test]
    fn test_ability_shield_breaks_on_big_hit() {
        let cfg = ability_cfg();
        let mut shield = Shield::new(ShieldKind::Ability, &cfg, 1000.0, 0.1, Vec2::ZERO, 0.0, 5000.0);
        let hit = shield.absorb(200.0, 0.0);
        assert!((hit.absorbed - 50.0).abs() < 1e-4);
        assert!((hit.passthrough - 150.0).abs() < 1e-4);
        assert!(shield.is_depleted());
        assert_eq!(shield.update(SIM_DT, 16.0), ShieldStatus::Depleted);
    }

    #[test]
    fn test_powerup_shield_soaks_whole_hit() {
        let cfg = powerup_cfg();
        let mut shield = Shield::new(ShieldKind::PowerUp, &cfg, 1000.0, 1.0, Vec2::ZERO, 0.0, 6000.0);
        let hit = shield.absorb(1500.0, 0.0);
        assert_eq!(hit.absorbed, 1000.0);
        assert_eq!(hit.passthrough, 0.0);
        assert!(shield.is_depleted());
    }

    #[test]
    fn test_hit_sound_cooldown() {
        let cfg = ability_cfg();
        let mut shield = Shield::new(ShieldKind::Ability, &cfg, 1000.0, 1.0, Vec2::ZERO, 0.0, 5000.0);
        assert!(shield.absorb(1.0, 0.0).play_sound);
        assert!(!shield.absorb(1.0, 100.0).play_sound);
        assert!(shield.absorb(1.0, 150.0).play_sound);
    }

    #[test]
    fn test_regen_caps_at_max() {
        let cfg = ability_cfg();
        let mut shield = Shield::new(ShieldKind::Ability, &cfg, 1000.0, 0.5, Vec2::ZERO, 0.0, 5000.0);
        // 10% of 500 per second
        shield.update(1.0, 1000.0);
        assert!((shield.health() - 300.0).abs() < 1e-3);
        for i in 0..10 {
            shield.update(1.0, 1000.0 + i as f64);
        }
        assert_eq!(shield.health(), shield.max_health());
    }

    #[test]
    fn test_expires_after_duration() {
        let cfg = ability_cfg();
        let mut shield = Shield::new(ShieldKind::Ability, &cfg, 1000.0, 1.0, Vec2::ZERO, 0.0, 5000.0);
        assert_eq!(shield.update(SIM_DT, 4999.0), ShieldStatus::Active);
        assert_eq!(shield.update(SIM_DT, 5000.0), ShieldStatus::Expired);
    }

    #[test]
    fn test_non_looping_animation_ends_shield() {
        let cfg = ShieldConfig {
            cols: 2,
            rows: 1,
            fps: 10.0,
            looping: false,
            ..powerup_cfg()
        };
        let mut shield = Shield::new(ShieldKind::PowerUp, &cfg, 1000.0, 1.0, Vec2::ZERO, 0.0, 60_000.0);
        assert_eq!(shield.update(0.1, 100.0), ShieldStatus::Active);
        assert_eq!(shield.frame(), 1);
        assert_eq!(shield.update(0.1, 200.0), ShieldStatus::Finished);
    }

    #[test]
    fn test_looping_animation_wraps() {
        let cfg = ShieldConfig {
            cols: 2,
            rows: 1,
            fps: 10.0,
            ..powerup_cfg()
        };
        let mut shield = Shield::new(ShieldKind::PowerUp, &cfg, 1000.0, 1.0, Vec2::ZERO, 0.0, 60_000.0);
        shield.update(0.1, 100.0);
        assert_eq!(shield.update(0.1, 200.0), ShieldStatus::Active);
        assert_eq!(shield.frame(), 0);
    }

    #[test]
    fn test_recharge_floor_after_break() {
        let cfg = ability_cfg();
        let mut ability = ShieldAbility::new();
        let first = ability.activate(&cfg, 1000.0, Vec2::ZERO, 0.0).unwrap();
        assert_eq!(first.health(), first.max_health());
        ability.record_destroyed(1000.0);

        // 1 s after the break at 0.1/s would be 10%, floor is 30%
        assert!(ability.activate(&cfg, 1000.0, Vec2::ZERO, 2000.0).is_none());
        assert!((ability.initial_fraction(&cfg, 2000.0) - 0.3).abs() < 1e-6);
        let second = ability.activate(&cfg, 1000.0, Vec2::ZERO, 7000.0).unwrap();
        assert!((second.health() - 0.6 * 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_fresh_after_expiry() {
        let cfg = ability_cfg();
        let mut ability = ShieldAbility::new();
        ability.activate(&cfg, 1000.0, Vec2::ZERO, 0.0).unwrap();
        let again = ability.activate(&cfg, 1000.0, Vec2::ZERO, 8000.0).unwrap();
        assert_eq!(again.health_fraction(), 1.0);
    }

    #[test]
    fn test_hit_test_circle() {
        let cfg = ability_cfg();
        let shield = Shield::new(
            ShieldKind::Ability,
            &cfg,
            1000.0,
            1.0,
            Vec2::new(100.0, 100.0),
            0.0,
            5000.0,
        );
        assert!(shield.hit_test(Vec2::new(150.0, 100.0)));
        assert!(!shield.hit_test(Vec2::new(180.0, 100.0)));
    }
}
