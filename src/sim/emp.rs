//! EMP ability and the expanding pulse it releases

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use crate::tuning::EmpConfig;

/// Charges and cooldown for the EMP ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmpAbility {
    pub charges: u32,
    max_charges: u32,
    cooldown_ms: f64,
    last_used_ms: Option<f64>,
}

impl EmpAbility {
    pub fn new(cfg: &EmpConfig) -> Self {
        Self {
            charges: cfg.start_charges.min(cfg.max_charges),
            max_charges: cfg.max_charges,
            cooldown_ms: cfg.cooldown_ms,
            last_used_ms: None,
        }
    }

    pub fn max_charges(&self) -> u32 {
        self.max_charges
    }

    pub fn can_use(&self, now_ms: f64) -> bool {
        self.charges > 0
            && self
                .last_used_ms
                .is_none_or(|t| now_ms - t >= self.cooldown_ms)
    }

    /// Spend a charge if possible
    pub fn try_use(&mut self, now_ms: f64) -> bool {
        if !self.can_use(now_ms) {
            return false;
        }
        self.charges -= 1;
        self.last_used_ms = Some(now_ms);
        true
    }

    pub fn add_charges(&mut self, n: u32) {
        self.charges = self.charges.saturating_add(n).min(self.max_charges);
    }

    pub fn cooldown_progress(&self, now_ms: f64) -> f32 {
        match self.last_used_ms {
            None => 1.0,
            Some(_) if self.cooldown_ms <= 0.0 => 1.0,
            Some(t) => ((now_ms - t) / self.cooldown_ms).clamp(0.0, 1.0) as f32,
        }
    }
}

/// Expanding pulse; each entity is affected at most once per wave
#[derive(Debug, Clone, PartialEq)]
pub struct EmpWave {
    pub center: Vec2,
    start_diameter: f32,
    max_diameter: f32,
    duration_s: f32,
    elapsed_s: f32,
    frame: usize,
    frame_count: usize,
    affected: BTreeSet<EntityId>,
}

impl EmpWave {
    pub fn new(center: Vec2, cfg: &EmpConfig) -> Self {
        Self {
            center,
            start_diameter: cfg.start_diameter,
            max_diameter: cfg.max_diameter,
            duration_s: cfg.expand_duration_s,
            elapsed_s: 0.0,
            frame: 0,
            frame_count: (cfg.cols * cfg.rows).max(1) as usize,
            affected: BTreeSet::new(),
        }
    }

    /// Expansion progress as 0..=1
    pub fn progress(&self) -> f32 {
        if self.duration_s <= 0.0 {
            1.0
        } else {
            (self.elapsed_s / self.duration_s).clamp(0.0, 1.0)
        }
    }

    pub fn diameter(&self) -> f32 {
        self.start_diameter + (self.max_diameter - self.start_diameter) * self.progress()
    }

    pub fn radius(&self) -> f32 {
        self.diameter() * 0.5
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.center.distance(point) <= self.radius()
    }

    /// Record `id` as hit; false if this wave already hit it
    pub fn mark_affected(&mut self, id: EntityId) -> bool {
        self.affected.insert(id)
    }

    /// Grow for one frame; false once fully expanded
    pub fn update(&mut self, dt: f32) -> bool {
        self.elapsed_s += dt;
        self.frame = ((self.progress() * self.frame_count as f32) as usize)
            .min(self.frame_count - 1);
        self.elapsed_s < self.duration_s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    fn cfg() -> EmpConfig {
        Tuning::builtin().unwrap().emp
    }

    #[test]
    fn test_huge_charge_grant_clamps() {
        let cfg = cfg();
        let mut emp = EmpAbility::new(&cfg);
        emp.add_charges(u32::MAX);
        assert_eq!(emp.charges, cfg.max_charges);
        emp.add_charges(u32::MAX);
        assert_eq!(emp.charges, cfg.max_charges);
    }

    #[test]
    fn test_ability_needs_charges_and_cooldown() {
        let cfg = cfg();
        let mut emp = EmpAbility::new(&cfg);
        assert!(!emp.try_use(0.0), "starts empty");
        emp.add_charges(2);
        assert!(emp.try_use(0.0));
        assert!(!emp.try_use(1000.0), "cooling down");
        assert!(emp.try_use(5000.0));
        assert_eq!(emp.charges, 0);
    }

    #[test]
    fn test_charges_capped() {
        let cfg = cfg();
        let mut emp = EmpAbility::new(&cfg);
        emp.add_charges(500);
        assert_eq!(emp.charges, cfg.max_charges);
    }

    #[test]
    fn test_wave_expands_to_max() {
        let cfg = cfg();
        let mut wave = EmpWave::new(Vec2::ZERO, &cfg);
        assert_eq!(wave.diameter(), 64.0);
        assert!(wave.update(0.25));
        assert!((wave.diameter() - 432.0).abs() < 1e-3);
        assert!(!wave.update(0.25));
        assert_eq!(wave.radius(), 400.0);
        assert!(wave.contains(Vec2::new(399.0, 0.0)));
    }

    #[test]
    fn test_wave_hits_each_entity_once() {
        let mut wave = EmpWave::new(Vec2::ZERO, &cfg());
        assert!(wave.mark_affected(4));
        assert!(!wave.mark_affected(4));
        assert!(wave.mark_affected(5));
    }
}
