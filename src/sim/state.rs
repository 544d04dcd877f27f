//! Game state and events
//!
//! Everything one run needs lives in `GameState`: the clock, the seeded RNG,
//! every entity list and the managers. Sim code mutates it directly; the
//! outer game loop drains `events` to drive audio and bookkeeping.

use std::rc::Rc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::clock::GameClock;
use super::collision::Rect;
use super::emp::{EmpAbility, EmpWave};
use super::enemy::{Enemy, EnemyKind};
use super::explosion::ExplosionManager;
use super::player::Player;
use super::powerup::{PowerUpKind, PowerUpManager};
use super::projectile::{Candidate, Projectile, ProjectileManager, TargetRef};
use super::shield::{Shield, ShieldAbility, ShieldKind, ShieldStatus};
use super::wave::{FlyInSpawner, WaveController, build_formation, kind_for_wave};
use crate::audio::SoundEffect;
use crate::renderer::assets::AssetRegistry;
use crate::settings::Settings;
use crate::tuning::{ExplosionStyle, Tuning};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, nothing simulates
    Menu,
    /// Active gameplay
    Playing,
    /// Frozen; the game clock does not advance
    Paused,
    /// Run ended
    GameOver,
}

/// Something the outer loop may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(SoundEffect),
    EnemyKilled {
        id: EntityId,
        kind: EnemyKind,
        points: u32,
    },
    PlayerDamaged {
        amount: i32,
    },
    PlayerDestroyed {
        lives_left: i32,
    },
    PlayerRespawned,
    ShieldRaised(ShieldKind),
    ShieldDropped(ShieldKind, ShieldStatus),
    PowerUpCollected(PowerUpKind),
    EmpReleased,
    WaveStarted {
        number: u32,
        kind: EnemyKind,
    },
    NewHighScore(u64),
    GameOver {
        score: u64,
    },
}

/// Lives and respawn timing for a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunRules {
    /// Starting lives; negative means unlimited
    pub lives: i32,
    pub lives_cooldown_ms: f64,
    pub respawn_protection_ms: f64,
}

impl From<&Settings> for RunRules {
    fn from(settings: &Settings) -> Self {
        Self {
            lives: settings.lives,
            lives_cooldown_ms: settings.lives_cooldown_ms,
            respawn_protection_ms: settings.respawn_protection_ms,
        }
    }
}

pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub clock: GameClock,
    /// Rendered-frame counter (collision gating)
    pub frame: u64,
    pub phase: GamePhase,
    pub tuning: Rc<Tuning>,
    pub assets: Rc<AssetRegistry>,
    pub rules: RunRules,
    settings: Settings,

    pub player: Player,
    pub shield_ability: ShieldAbility,
    /// Ability shield
    pub shield: Option<Shield>,
    pub powerup_shield: Option<Shield>,
    pub emp: EmpAbility,
    pub emp_waves: Vec<EmpWave>,

    /// Grid formation (sorted by id)
    pub enemies: Vec<Enemy>,
    /// Fly-in interceptors (sorted by id)
    pub fly_ins: Vec<Enemy>,
    pub boss: Option<Enemy>,
    pub wave: WaveController,
    pub fly_in_spawner: FlyInSpawner,

    pub projectiles: ProjectileManager,
    pub explosions: ExplosionManager,
    pub powerups: PowerUpManager,

    pub score: u64,
    pub highscore: u64,
    pub kills: u32,
    new_highscore_announced: bool,

    pub events: Vec<GameEvent>,
    next_id: EntityId,
}

impl GameState {
    pub fn new(
        tuning: Rc<Tuning>,
        assets: Rc<AssetRegistry>,
        settings: &Settings,
        seed: u64,
    ) -> Self {
        let rules = RunRules::from(settings);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            clock: GameClock::new(),
            frame: 0,
            phase: GamePhase::Menu,
            player: Player::new(&tuning, rules.lives),
            shield_ability: ShieldAbility::new(),
            shield: None,
            powerup_shield: None,
            emp: EmpAbility::new(&tuning.emp),
            emp_waves: Vec::new(),
            enemies: Vec::new(),
            fly_ins: Vec::new(),
            boss: None,
            wave: WaveController::default(),
            fly_in_spawner: FlyInSpawner::new(&tuning),
            projectiles: ProjectileManager::new(settings.max_projectiles),
            explosions: ExplosionManager::new(settings.max_explosions),
            powerups: PowerUpManager::new(&tuning, settings.max_powerups),
            score: 0,
            highscore: 0,
            kills: 0,
            new_highscore_announced: false,
            events: Vec::new(),
            next_id: 1,
            tuning,
            assets,
            rules,
            settings: settings.clone(),
        }
    }

    /// Fresh run with the same tables, seed and best score
    pub fn restart(&mut self) {
        self.restart_with_seed(self.seed);
    }

    pub fn restart_with_seed(&mut self, seed: u64) {
        let highscore = self.highscore;
        *self = Self::new(
            Rc::clone(&self.tuning),
            Rc::clone(&self.assets),
            &self.settings.clone(),
            seed,
        );
        self.highscore = highscore;
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The ID `next_entity_id` will hand out next
    pub fn peek_entity_id(&self) -> EntityId {
        self.next_id
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn play(&mut self, effect: SoundEffect) {
        self.events.push(GameEvent::Sound(effect));
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Add the score and track the best
    pub fn add_score(&mut self, points: u64) {
        self.score += points;
        if self.score > self.highscore {
            self.highscore = self.score;
            if !self.new_highscore_announced && self.highscore > 0 {
                self.new_highscore_announced = true;
                self.emit(GameEvent::NewHighScore(self.highscore));
            }
        }
    }

    /// Queue fresh shots, gating their collisions to start next frame
    pub fn add_shots(&mut self, shots: Vec<Projectile>) {
        let now = self.now_ms();
        for mut shot in shots {
            shot.spawned_frame = self.frame;
            self.projectiles.add(shot, now);
        }
    }

    pub fn spawn_explosion(&mut self, pos: Vec2, style: &ExplosionStyle) {
        let set = self.assets.frames(&style.sheet);
        self.explosions
            .spawn(pos, set, style.scale, style.fps, style.keep);
    }

    /// Every hostile ship in stable order: grid, fly-ins, boss
    pub fn hostiles(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies
            .iter()
            .chain(self.fly_ins.iter())
            .chain(self.boss.iter())
    }

    pub fn hostiles_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.enemies
            .iter_mut()
            .chain(self.fly_ins.iter_mut())
            .chain(self.boss.iter_mut())
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.hostiles().find(|e| e.id == id)
    }

    pub fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.hostiles_mut().find(|e| e.id == id)
    }

    /// Live enemies that block wave completion (fly-ins don't)
    pub fn wave_remaining(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_alive()).count()
            + self.boss.iter().filter(|e| e.is_alive()).count()
    }

    /// First live hostile whose box overlaps `rect`
    pub fn first_enemy_hit(&self, rect: &Rect) -> Option<(EntityId, Vec2)> {
        self.hostiles()
            .filter(|e| e.is_alive())
            .find(|e| e.rect().overlaps(rect))
            .map(|e| (e.id, e.pos))
    }

    /// Homing targets for player shots
    pub fn enemy_candidates(&self) -> Vec<Candidate> {
        self.hostiles()
            .filter(|e| e.is_alive())
            .map(|e| Candidate {
                target: TargetRef::Enemy(e.id),
                pos: e.pos,
            })
            .collect()
    }

    /// Homing targets for enemy shots
    pub fn player_candidates(&self) -> Vec<Candidate> {
        if self.player.alive {
            vec![Candidate {
                target: TargetRef::Player,
                pos: self.player.pos,
            }]
        } else {
            Vec::new()
        }
    }

    /// Drop dead hostiles from every list
    pub fn remove_dead(&mut self) {
        self.enemies.retain(Enemy::is_alive);
        self.fly_ins.retain(Enemy::is_alive);
        if self.boss.as_ref().is_some_and(|b| !b.is_alive()) {
            self.boss = None;
        }
    }

    /// Build wave `number` and point the controller at it
    pub fn start_wave(&mut self, number: u32) {
        self.spawn_wave(number, kind_for_wave(number));
    }

    /// Replace the current formation with one of `kind` (debug keys)
    pub fn force_wave(&mut self, kind: EnemyKind) {
        self.enemies.clear();
        self.boss = None;
        let number = self.wave.number.max(1);
        self.spawn_wave(number, kind);
    }

    fn spawn_wave(&mut self, number: u32, kind: EnemyKind) {
        let tuning = Rc::clone(&self.tuning);
        let mut next_id = self.next_id;
        let mut formation = build_formation(&tuning, kind, &mut self.rng, || {
            let id = next_id;
            next_id += 1;
            id
        });
        self.next_id = next_id;

        if kind == EnemyKind::Boss {
            self.boss = formation.pop();
        } else {
            self.enemies.append(&mut formation);
        }
        self.wave.begin(&tuning, number, kind);
        log::info!("Wave {number} started: {}", kind.as_key());
        self.emit(GameEvent::WaveStarted { number, kind });
        self.play(SoundEffect::WaveStart);
    }

    /// Ensure entity lists are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.fly_ins.sort_by_key(|e| e.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        let tuning = Rc::new(Tuning::builtin().unwrap());
        let assets = Rc::new(AssetRegistry::headless(&tuning));
        GameState::new(tuning, assets, &Settings::default(), 42)
    }

    #[test]
    fn test_entity_ids_increase() {
        let mut s = state();
        let a = s.next_entity_id();
        let b = s.next_entity_id();
        assert!(b > a);
    }

    #[test]
    fn test_start_wave_assigns_unique_ids() {
        let mut s = state();
        s.start_wave(1);
        assert_eq!(s.enemies.len(), 32);
        let mut ids: Vec<EntityId> = s.enemies.iter().map(|e| e.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 32);
        let next = s.next_entity_id();
        assert!(ids.iter().all(|id| *id < next));
        assert!(matches!(
            s.events.first(),
            Some(GameEvent::WaveStarted { number: 1, .. })
        ));
    }

    #[test]
    fn test_boss_wave_fills_boss_slot() {
        let mut s = state();
        s.start_wave(5);
        assert!(s.enemies.is_empty());
        assert!(s.boss.is_some());
        assert_eq!(s.wave_remaining(), 1);
    }

    #[test]
    fn test_force_wave_replaces_formation() {
        let mut s = state();
        s.start_wave(2);
        s.force_wave(EnemyKind::Tank);
        assert_eq!(s.wave.number, 2);
        assert_eq!(s.wave.kind, Some(EnemyKind::Tank));
        assert!(s.enemies.iter().all(|e| e.kind == EnemyKind::Tank));
    }

    #[test]
    fn test_highscore_tracks_score() {
        let mut s = state();
        s.highscore = 100;
        s.add_score(50);
        assert_eq!(s.highscore, 100);
        s.add_score(60);
        assert_eq!(s.highscore, 110);
        s.add_score(10);
        let announcements = s
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::NewHighScore(_)))
            .count();
        assert_eq!(announcements, 1);
    }

    #[test]
    fn test_restart_keeps_best() {
        let mut s = state();
        s.start_wave(1);
        s.add_score(500);
        s.restart();
        assert_eq!(s.score, 0);
        assert_eq!(s.highscore, 500);
        assert!(s.enemies.is_empty());
    }
}
