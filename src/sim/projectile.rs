//! Projectiles and their manager
//!
//! A projectile keeps a unit heading and a scalar speed separately, so
//! acceleration only ever scales the speed and steering only ever rotates
//! the heading. `vel` is always `dir * speed`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::collision::Rect;
use crate::consts::{CAPACITY_WARNING_INTERVAL_MS, HOMING_OFFSCREEN_MARGIN, MAX_PROJECTILES};
use crate::tuning::{HomingConfig, WeaponConfig};
use crate::{heading_from_angle, normalize_or};

/// Who fired a shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

impl Owner {
    /// Vertical sign of "straight ahead" for this owner
    pub fn forward_sign(self) -> f32 {
        match self {
            Owner::Player => -1.0,
            Owner::Enemy => 1.0,
        }
    }

    pub fn forward(self) -> Vec2 {
        Vec2::new(0.0, self.forward_sign())
    }
}

/// Weapon/projectile types
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    Laser,
    DoubleLaser,
    Rocket,
    HomingRocket,
    Blaster,
    Nuke,
}

impl ProjectileKind {
    pub const ALL: [ProjectileKind; 6] = [
        ProjectileKind::Laser,
        ProjectileKind::DoubleLaser,
        ProjectileKind::Rocket,
        ProjectileKind::HomingRocket,
        ProjectileKind::Blaster,
        ProjectileKind::Nuke,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_key(self) -> &'static str {
        match self {
            ProjectileKind::Laser => "laser",
            ProjectileKind::DoubleLaser => "double_laser",
            ProjectileKind::Rocket => "rocket",
            ProjectileKind::HomingRocket => "homing_rocket",
            ProjectileKind::Blaster => "blaster",
            ProjectileKind::Nuke => "nuke",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "laser" => Some(ProjectileKind::Laser),
            "double_laser" => Some(ProjectileKind::DoubleLaser),
            "rocket" => Some(ProjectileKind::Rocket),
            "homing_rocket" | "homing" => Some(ProjectileKind::HomingRocket),
            "blaster" => Some(ProjectileKind::Blaster),
            "nuke" => Some(ProjectileKind::Nuke),
            _ => None,
        }
    }

    /// Kinds that can carry homing guidance
    pub fn is_guided(self) -> bool {
        matches!(self, ProjectileKind::HomingRocket | ProjectileKind::Blaster)
    }

    /// Kinds an EMP wave detonates instead of erasing
    pub fn is_explosive(self) -> bool {
        matches!(
            self,
            ProjectileKind::Rocket | ProjectileKind::HomingRocket | ProjectileKind::Nuke
        )
    }
}

/// Something a homing shot may chase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    Enemy(EntityId),
    Player,
}

/// A live target position handed to guidance each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub target: TargetRef,
    pub pos: Vec2,
}

/// Runtime homing state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Homing {
    pub target: Option<TargetRef>,
    pub launched_ms: f64,
    pub delay_ms: f64,
    pub strength: f32,
    pub max_turn_rate: f32,
    pub expires_ms: Option<f64>,
    pub corrections: u32,
    pub max_corrections: Option<u32>,
    pub correction_interval_ms: f64,
    pub last_correction_ms: Option<f64>,
}

impl Homing {
    pub fn from_config(cfg: &HomingConfig, now_ms: f64) -> Self {
        Self {
            target: None,
            launched_ms: now_ms,
            delay_ms: cfg.delay_ms,
            strength: cfg.strength,
            max_turn_rate: cfg.max_turn_rate,
            expires_ms: cfg.duration_ms.map(|d| now_ms + d),
            corrections: 0,
            max_corrections: cfg.max_corrections,
            correction_interval_ms: cfg.correction_interval_ms,
            last_correction_ms: None,
        }
    }

    pub fn is_armed(&self, now_ms: f64) -> bool {
        now_ms - self.launched_ms >= self.delay_ms
    }

    pub fn is_spent(&self, now_ms: f64) -> bool {
        self.expires_ms.is_some_and(|t| now_ms >= t)
            || self.max_corrections.is_some_and(|max| self.corrections >= max)
    }

    fn correction_due(&self, now_ms: f64) -> bool {
        self.last_correction_ms
            .is_none_or(|last| now_ms - last >= self.correction_interval_ms)
    }

    /// Blend factor per correction
    pub fn turn_factor(&self) -> f32 {
        self.strength.min(self.max_turn_rate).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Guidance {
    Ballistic,
    Homing(Homing),
}

fn nearest(pos: Vec2, candidates: &[Candidate]) -> Option<Candidate> {
    candidates
        .iter()
        .min_by(|a, b| {
            a.pos
                .distance_squared(pos)
                .total_cmp(&b.pos.distance_squared(pos))
        })
        .copied()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub owner: Owner,
    pub pos: Vec2,
    pub vel: Vec2,
    dir: Vec2,
    speed: f32,
    pub accel: f32,
    pub damage: i32,
    /// Area-of-effect radius, 0 for point damage
    pub radius: f32,
    pub size: Vec2,
    pub guidance: Guidance,
    /// Frame the shot was fired on; collisions start the frame after
    pub spawned_frame: u64,
}

impl Projectile {
    /// Fire a shot from `origin` at `angle_deg` off the owner's forward axis
    pub fn create(
        kind: ProjectileKind,
        cfg: &WeaponConfig,
        origin: Vec2,
        owner: Owner,
        angle_deg: f32,
        now_ms: f64,
    ) -> Self {
        let speed = cfg.speed_for(owner);
        let vel = heading_from_angle(angle_deg, owner.forward_sign()) * speed;
        let mut shot = Self::from_velocity(
            kind,
            owner,
            origin,
            vel,
            cfg.damage,
            cfg.radius,
            cfg.accel_for(owner),
            cfg.size_vec(),
        );
        if let Some(homing) = cfg.homing_for(owner) {
            shot.guidance = Guidance::Homing(Homing::from_config(homing, now_ms));
        }
        shot
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_velocity(
        kind: ProjectileKind,
        owner: Owner,
        pos: Vec2,
        vel: Vec2,
        damage: i32,
        radius: f32,
        accel: f32,
        size: Vec2,
    ) -> Self {
        let speed = vel.length();
        let dir = normalize_or(vel, owner.forward());
        Self {
            kind,
            owner,
            pos,
            vel: dir * speed,
            dir,
            speed,
            accel,
            damage,
            radius,
            size,
            guidance: Guidance::Ballistic,
            spawned_frame: 0,
        }
    }

    pub fn direction(&self) -> Vec2 {
        self.dir
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_area(&self) -> bool {
        self.radius > 0.0
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, self.size)
    }

    /// Heading in degrees, 0 = up the screen, for sprite rotation
    pub fn heading_deg(&self) -> f32 {
        self.dir.x.atan2(-self.dir.y).to_degrees()
    }

    /// Whether collision checks apply on `frame`
    pub fn can_collide(&self, frame: u64) -> bool {
        self.spawned_frame < frame
    }

    pub fn homing_target(&self) -> Option<TargetRef> {
        match &self.guidance {
            Guidance::Homing(h) => h.target,
            Guidance::Ballistic => None,
        }
    }

    /// One fixed physics step: steer, accelerate, move
    pub fn physics_update(&mut self, now_ms: f64, candidates: &[Candidate]) {
        self.steer(now_ms, candidates);
        if self.accel != 1.0 {
            self.speed *= self.accel;
        }
        self.vel = self.dir * self.speed;
        self.pos += self.vel;
    }

    fn steer(&mut self, now_ms: f64, candidates: &[Candidate]) {
        let Guidance::Homing(homing) = &mut self.guidance else {
            return;
        };
        if !homing.is_armed(now_ms) {
            return;
        }
        if homing.is_spent(now_ms) {
            log::trace!("{} guidance spent", self.kind.as_key());
            self.guidance = Guidance::Ballistic;
            return;
        }

        // Keep the current target while it is alive, otherwise reacquire
        let locked = homing
            .target
            .and_then(|t| candidates.iter().find(|c| c.target == t).copied());
        let chosen = locked.or_else(|| nearest(self.pos, candidates));
        homing.target = chosen.map(|c| c.target);

        let Some(target) = chosen else { return };
        if !homing.correction_due(now_ms) {
            return;
        }
        let Some(desired) = (target.pos - self.pos).try_normalize() else {
            return;
        };
        let blended = self.dir.lerp(desired, homing.turn_factor());
        self.dir = normalize_or(blended, self.dir);
        homing.corrections += 1;
        homing.last_correction_ms = Some(now_ms);
    }

    pub fn offscreen(&self) -> bool {
        let margin = if self.kind.is_guided() {
            HOMING_OFFSCREEN_MARGIN
        } else {
            0.0
        };
        self.rect().outside_playfield(margin)
    }
}

/// Owns every live shot, split by owner, under one shared capacity
#[derive(Debug, Clone)]
pub struct ProjectileManager {
    pub player_shots: Vec<Projectile>,
    pub enemy_shots: Vec<Projectile>,
    capacity: usize,
    last_limit_warning_ms: Option<f64>,
    rejected: u64,
}

impl Default for ProjectileManager {
    fn default() -> Self {
        Self::new(MAX_PROJECTILES)
    }
}

impl ProjectileManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            player_shots: Vec::new(),
            enemy_shots: Vec::new(),
            capacity,
            last_limit_warning_ms: None,
            rejected: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.player_shots.len() + self.enemy_shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shots refused because the manager was full
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Add a shot; returns false (and drops it) when at capacity
    pub fn add(&mut self, shot: Projectile, now_ms: f64) -> bool {
        if self.len() >= self.capacity {
            self.rejected += 1;
            let due = self
                .last_limit_warning_ms
                .is_none_or(|t| now_ms - t >= CAPACITY_WARNING_INTERVAL_MS);
            if due {
                log::warn!(
                    "Projectile limit reached ({}), dropping new shots",
                    self.capacity
                );
                self.last_limit_warning_ms = Some(now_ms);
            }
            return false;
        }
        match shot.owner {
            Owner::Player => self.player_shots.push(shot),
            Owner::Enemy => self.enemy_shots.push(shot),
        }
        true
    }

    /// Step every shot and cull the ones that left the playfield
    pub fn physics_update(
        &mut self,
        now_ms: f64,
        enemy_targets: &[Candidate],
        player_targets: &[Candidate],
    ) {
        for shot in &mut self.player_shots {
            shot.physics_update(now_ms, enemy_targets);
        }
        for shot in &mut self.enemy_shots {
            shot.physics_update(now_ms, player_targets);
        }
        self.player_shots.retain(|s| !s.offscreen());
        self.enemy_shots.retain(|s| !s.offscreen());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.player_shots.iter().chain(self.enemy_shots.iter())
    }

    pub fn clear(&mut self) {
        self.player_shots.clear();
        self.enemy_shots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    fn tuning() -> Tuning {
        Tuning::builtin().unwrap()
    }

    fn fire(kind: ProjectileKind, owner: Owner, angle: f32) -> Projectile {
        let tuning = tuning();
        Projectile::create(
            kind,
            tuning.weapon(kind),
            Vec2::new(960.0, 900.0),
            owner,
            angle,
            0.0,
        )
    }

    #[test]
    fn test_player_laser_goes_up() {
        let mut shot = fire(ProjectileKind::Laser, Owner::Player, 0.0);
        assert_eq!(shot.speed(), 15.0);
        shot.physics_update(16.0, &[]);
        assert!((shot.pos - Vec2::new(960.0, 885.0)).length() < 1e-4);
    }

    #[test]
    fn test_enemy_blaster_uses_enemy_speed() {
        let shot = fire(ProjectileKind::Blaster, Owner::Enemy, 0.0);
        assert_eq!(shot.speed(), 11.0);
        assert!(shot.vel.y > 0.0);
    }

    #[test]
    fn test_zero_speed_falls_back_to_forward() {
        let shot = Projectile::from_velocity(
            ProjectileKind::Laser,
            Owner::Player,
            Vec2::ZERO,
            Vec2::ZERO,
            10,
            0.0,
            1.0,
            Vec2::splat(4.0),
        );
        assert_eq!(shot.direction(), Vec2::new(0.0, -1.0));
        assert_eq!(shot.vel, Vec2::ZERO);
    }

    #[test]
    fn test_accel_scales_speed_not_heading() {
        let mut shot = fire(ProjectileKind::Rocket, Owner::Player, 10.0);
        let dir = shot.direction();
        for tick in 0..10 {
            shot.physics_update(tick as f64 * 16.0, &[]);
        }
        assert!((shot.speed() - 5.0 * 1.03f32.powi(10)).abs() < 1e-3);
        assert!((shot.direction() - dir).length() < 1e-6);
    }

    #[test]
    fn test_homing_waits_for_delay() {
        let mut shot = fire(ProjectileKind::HomingRocket, Owner::Player, 0.0);
        let target = [Candidate {
            target: TargetRef::Enemy(7),
            pos: Vec2::new(1500.0, 900.0),
        }];
        let start_dir = shot.direction();
        shot.physics_update(100.0, &target);
        assert_eq!(shot.direction(), start_dir);
        assert_eq!(shot.homing_target(), None);

        shot.physics_update(350.0, &target);
        assert_eq!(shot.homing_target(), Some(TargetRef::Enemy(7)));
        assert!(shot.direction().x > 0.0, "should turn toward the target");
        assert!((shot.direction().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_homing_reacquires_when_target_gone() {
        let mut shot = fire(ProjectileKind::HomingRocket, Owner::Player, 0.0);
        let both = [
            Candidate {
                target: TargetRef::Enemy(1),
                pos: Vec2::new(900.0, 500.0),
            },
            Candidate {
                target: TargetRef::Enemy(2),
                pos: Vec2::new(1400.0, 500.0),
            },
        ];
        shot.physics_update(400.0, &both);
        assert_eq!(shot.homing_target(), Some(TargetRef::Enemy(1)));
        shot.physics_update(420.0, &both[1..]);
        assert_eq!(shot.homing_target(), Some(TargetRef::Enemy(2)));
        shot.physics_update(440.0, &[]);
        assert_eq!(shot.homing_target(), None);
    }

    #[test]
    fn test_enemy_blaster_correction_budget() {
        let mut shot = fire(ProjectileKind::Blaster, Owner::Enemy, 0.0);
        let player = [Candidate {
            target: TargetRef::Player,
            pos: Vec2::new(200.0, 1000.0),
        }];
        let mut now = 0.0;
        while now < 1400.0 {
            shot.physics_update(now, &player);
            now += 1000.0 / 60.0;
        }
        match &shot.guidance {
            Guidance::Homing(h) => assert!(h.corrections <= 6),
            Guidance::Ballistic => {}
        }
        shot.physics_update(1600.0, &player);
        assert_eq!(shot.guidance, Guidance::Ballistic);
    }

    #[test]
    fn test_offscreen_margin_for_guided() {
        let mut laser = fire(ProjectileKind::Laser, Owner::Player, 0.0);
        laser.pos = Vec2::new(960.0, -100.0);
        assert!(laser.offscreen());
        let mut homing = fire(ProjectileKind::HomingRocket, Owner::Player, 0.0);
        homing.pos = Vec2::new(960.0, -100.0);
        assert!(!homing.offscreen());
    }

    #[test]
    fn test_manager_capacity() {
        let tuning = tuning();
        let cfg = tuning.weapon(ProjectileKind::Laser);
        let mut manager = ProjectileManager::new(3);
        for i in 0..5 {
            let owner = if i % 2 == 0 { Owner::Player } else { Owner::Enemy };
            let shot = Projectile::create(
                ProjectileKind::Laser,
                cfg,
                Vec2::new(500.0, 500.0),
                owner,
                0.0,
                0.0,
            );
            let accepted = manager.add(shot, i as f64);
            assert_eq!(accepted, i < 3);
        }
        assert_eq!(manager.len(), 3);
        assert_eq!(manager.rejected(), 2);
    }

    #[test]
    fn test_manager_culls_offscreen() {
        let tuning = tuning();
        let cfg = tuning.weapon(ProjectileKind::Laser);
        let mut manager = ProjectileManager::default();
        let shot = Projectile::create(
            ProjectileKind::Laser,
            cfg,
            Vec2::new(500.0, 5.0),
            Owner::Player,
            0.0,
            0.0,
        );
        manager.add(shot, 0.0);
        for _ in 0..5 {
            manager.physics_update(0.0, &[], &[]);
        }
        assert!(manager.is_empty());
    }

    #[test]
    fn test_kind_keys() {
        for kind in ProjectileKind::ALL {
            assert_eq!(ProjectileKind::from_key(kind.as_key()), Some(kind));
        }
        assert_eq!(ProjectileKind::from_key("plasma"), None);
    }
}
