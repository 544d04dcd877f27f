//! Combat resolution: hits, area damage, kills, player damage, EMP pulses
//! and pickups
//!
//! Kill rewards are paid exactly once. `Enemy::take_damage` only reports
//! the alive-to-dead transition and dead hostiles are skipped until
//! `remove_dead` clears them.

use std::rc::Rc;

use glam::Vec2;

use super::EntityId;
use super::enemy::EnemyKind;
use super::emp::EmpWave;
use super::powerup::{PowerUp, PowerUpKind};
use super::projectile::{Owner, Projectile, ProjectileKind};
use super::shield::{Shield, ShieldKind, ShieldStatus};
use super::state::{GameEvent, GamePhase, GameState};
use crate::audio::SoundEffect;

/// Linear falloff: full damage at the center, zero at `radius` and beyond
pub fn falloff_damage(max_damage: i32, distance: f32, radius: f32) -> i32 {
    if radius <= 0.0 || distance > radius {
        return 0;
    }
    (max_damage as f32 * (1.0 - distance / radius)) as i32
}

/// A hostile that just died
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kill {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitOutcome {
    /// Target no longer exists (or is already dead)
    Missing,
    Survived,
    Killed(Kill),
}

/// Point damage against one hostile by id
pub fn damage_enemy(state: &mut GameState, id: EntityId, amount: i32) -> HitOutcome {
    let now = state.now_ms();
    let Some(enemy) = state.enemy_mut(id) else {
        return HitOutcome::Missing;
    };
    if !enemy.is_alive() {
        return HitOutcome::Missing;
    }
    if enemy.take_damage(amount, now) {
        HitOutcome::Killed(Kill {
            id: enemy.id,
            kind: enemy.kind,
            pos: enemy.pos,
            points: enemy.points,
        })
    } else {
        HitOutcome::Survived
    }
}

/// Score, drop roll, death explosion and events for one kill
pub fn reward_kill(state: &mut GameState, kill: &Kill) {
    let tuning = Rc::clone(&state.tuning);
    state.add_score(kill.points as u64);
    state.kills += 1;
    state.powerups.queue_drop(kill.pos);
    state.spawn_explosion(kill.pos, &tuning.effects.enemy_death);
    state.play(SoundEffect::Explosion);
    state.emit(GameEvent::EnemyKilled {
        id: kill.id,
        kind: kill.kind,
        points: kill.points,
    });
    log::debug!("{} #{} destroyed (+{})", kill.kind.as_key(), kill.id, kill.points);
}

/// Area damage around `center` against every live hostile. Kills are
/// rewarded and removed before returning.
pub fn apply_aoe(state: &mut GameState, center: Vec2, radius: f32, max_damage: i32) -> Vec<Kill> {
    let now = state.now_ms();
    let mut kills = Vec::new();
    for enemy in state.hostiles_mut() {
        if !enemy.is_alive() {
            continue;
        }
        let damage = falloff_damage(max_damage, enemy.pos.distance(center), radius);
        if damage > 0 && enemy.take_damage(damage, now) {
            kills.push(Kill {
                id: enemy.id,
                kind: enemy.kind,
                pos: enemy.pos,
                points: enemy.points,
            });
        }
    }
    for kill in &kills {
        reward_kill(state, kill);
    }
    state.remove_dead();
    kills
}

/// Visual and area effects of an explosive shot going off at `impact`.
/// Only player-owned shots deal area damage to hostiles.
pub fn detonate(state: &mut GameState, shot: &Projectile, impact: Vec2) -> Vec<Kill> {
    let tuning = Rc::clone(&state.tuning);
    let cfg = tuning.weapon(shot.kind);
    state.spawn_explosion(impact, &cfg.explosion);
    if shot.kind == ProjectileKind::Nuke {
        let ring = tuning.effects.nuke_ring_count.max(1);
        let ring_radius = shot.radius * 0.4;
        for i in 0..ring {
            let angle = i as f32 / ring as f32 * std::f32::consts::TAU;
            let offset = Vec2::new(angle.cos(), angle.sin()) * ring_radius;
            state.spawn_explosion(impact + offset, &cfg.explosion);
        }
    }
    state.play(SoundEffect::Impact(shot.kind));
    if shot.owner == Owner::Player && shot.is_area() {
        apply_aoe(state, impact, shot.radius, shot.damage)
    } else {
        Vec::new()
    }
}

/// A player shot connected with hostile `target`. Effects center on the
/// struck hostile, so it always takes the full splash.
pub fn on_player_hit(state: &mut GameState, shot: &Projectile, target: EntityId) {
    let impact = state.enemy(target).map_or(shot.pos, |e| e.pos);
    if shot.is_area() {
        // Area kinds deal no separate direct damage
        detonate(state, shot, impact);
        return;
    }
    state.play(SoundEffect::Impact(shot.kind));
    match damage_enemy(state, target, shot.damage) {
        HitOutcome::Killed(kill) => {
            reward_kill(state, &kill);
            state.remove_dead();
        }
        HitOutcome::Survived | HitOutcome::Missing => {
            let tuning = Rc::clone(&state.tuning);
            state.spawn_explosion(impact, &tuning.weapon(shot.kind).explosion);
        }
    }
}

/// Player shots against hostiles. The first hostile a shot overlaps takes it.
pub fn resolve_player_shots(state: &mut GameState) {
    let frame = state.frame;
    let mut i = 0;
    while i < state.projectiles.player_shots.len() {
        let shot = &state.projectiles.player_shots[i];
        if !shot.can_collide(frame) {
            i += 1;
            continue;
        }
        let rect = shot.rect();
        let Some((target, _)) = state.first_enemy_hit(&rect) else {
            i += 1;
            continue;
        };
        let shot = state.projectiles.player_shots.remove(i);
        on_player_hit(state, &shot, target);
    }
}

/// Enemy shots against the player and any shield around them
pub fn resolve_enemy_shots(state: &mut GameState) {
    if !state.player.alive {
        return;
    }
    let tuning = Rc::clone(&state.tuning);
    let frame = state.frame;
    let mut i = 0;
    while i < state.projectiles.enemy_shots.len() {
        if !state.player.alive {
            break;
        }
        let shot = &state.projectiles.enemy_shots[i];
        let shielded = state
            .powerup_shield
            .iter()
            .chain(state.shield.iter())
            .any(|s| s.hit_test(shot.pos));
        let hit = shot.can_collide(frame) && (shielded || shot.rect().overlaps(&state.player.rect()));
        if !hit {
            i += 1;
            continue;
        }
        let shot = state.projectiles.enemy_shots.remove(i);
        state.spawn_explosion(shot.pos, &tuning.weapon(shot.kind).explosion);
        state.play(SoundEffect::Impact(shot.kind));
        damage_player(state, shot.damage);
    }
}

/// Route damage through the power-up shield, then the ability shield,
/// then the hull. Invulnerable players take nothing.
pub fn damage_player(state: &mut GameState, amount: i32) {
    let now = state.now_ms();
    if !state.player.alive || amount <= 0 || state.player.is_invulnerable(now) {
        return;
    }
    let mut remaining = amount as f32;
    let mut shield_sound = false;
    for shield in state.powerup_shield.iter_mut().chain(state.shield.iter_mut()) {
        if remaining <= 0.0 {
            break;
        }
        let absorbed = shield.absorb(remaining, now);
        remaining = absorbed.passthrough;
        shield_sound |= absorbed.play_sound;
    }
    if shield_sound {
        state.play(SoundEffect::ShieldHit);
    }

    let hull = remaining.round() as i32;
    if hull <= 0 {
        return;
    }
    state.emit(GameEvent::PlayerDamaged { amount: hull });
    state.play(SoundEffect::PlayerHit);
    if state.player.take_damage(hull) {
        kill_player(state);
    }
}

fn kill_player(state: &mut GameState) {
    let tuning = Rc::clone(&state.tuning);
    let now = state.now_ms();
    let pos = state.player.pos;
    state.spawn_explosion(pos, &tuning.effects.player_death);
    state.play(SoundEffect::PlayerDestroyed);
    state.shield = None;
    state.powerup_shield = None;

    let continues = state
        .player
        .begin_respawn(now, state.rules.lives_cooldown_ms);
    state.emit(GameEvent::PlayerDestroyed {
        lives_left: state.player.lives,
    });
    if continues {
        log::info!("Player destroyed, {} lives left", state.player.lives);
    } else {
        state.phase = GamePhase::GameOver;
        state.play(SoundEffect::GameOver);
        state.emit(GameEvent::GameOver { score: state.score });
        log::info!("Game over with {} points", state.score);
    }
}

/// Grow every EMP wave and apply it to whatever it newly reaches.
/// Enemy lasers and blasters are erased, explosive shots go off
/// harmlessly, and each affected hostile pays a score bonus.
pub fn apply_emp_waves(state: &mut GameState, dt: f32) {
    if state.emp_waves.is_empty() {
        return;
    }
    let tuning = Rc::clone(&state.tuning);
    let mut bonus = 0u64;
    let mut detonations = Vec::new();

    let mut waves = std::mem::take(&mut state.emp_waves);
    waves.retain_mut(|wave| {
        let expanding = wave.update(dt);
        for enemy in state
            .enemies
            .iter_mut()
            .chain(state.fly_ins.iter_mut())
        {
            if enemy.is_alive() && wave.contains(enemy.pos) && wave.mark_affected(enemy.id) {
                enemy.apply_emp(&tuning.emp);
                bonus += tuning.emp.score_bonus;
            }
        }
        state.projectiles.enemy_shots.retain(|shot| {
            if !wave.contains(shot.pos) {
                return true;
            }
            if shot.kind.is_explosive() {
                detonations.push((shot.kind, shot.pos));
            }
            false
        });
        expanding
    });
    state.emp_waves = waves;

    for (kind, pos) in detonations {
        state.spawn_explosion(pos, &tuning.weapon(kind).explosion);
    }
    if bonus > 0 {
        state.add_score(bonus);
    }
}

/// Release an EMP pulse centered on the player if a charge is available
pub fn fire_emp(state: &mut GameState) -> bool {
    let now = state.now_ms();
    if !state.player.alive || !state.emp.try_use(now) {
        return false;
    }
    let wave = EmpWave::new(state.player.pos, &state.tuning.emp);
    state.emp_waves.push(wave);
    state.play(SoundEffect::EmpPulse);
    state.emit(GameEvent::EmpReleased);
    log::debug!("EMP released, {} charges left", state.emp.charges);
    true
}

/// Raise the ability shield if the ship has one and it is ready
pub fn activate_shield(state: &mut GameState) -> bool {
    let now = state.now_ms();
    if !state.player.alive || state.shield.is_some() || !state.player.loadout().shield {
        return false;
    }
    let tuning = Rc::clone(&state.tuning);
    let shield = state.shield_ability.activate(
        tuning.ability_shield(),
        state.player.max_health as f32,
        state.player.pos,
        now,
    );
    match shield {
        Some(shield) => {
            state.shield = Some(shield);
            state.play(SoundEffect::ShieldUp);
            state.emit(GameEvent::ShieldRaised(ShieldKind::Ability));
            true
        }
        None => false,
    }
}

/// Follow the player, regenerate, and drop shields that broke or expired
pub fn update_shields(state: &mut GameState, dt: f32) {
    let now = state.now_ms();
    let center = state.player.pos;
    let mut dropped = Vec::new();

    for slot in [&mut state.shield, &mut state.powerup_shield] {
        if let Some(shield) = slot.as_mut() {
            shield.center = center;
            let status = shield.update(dt, now);
            if status != ShieldStatus::Active {
                dropped.push((shield.kind, status));
                *slot = None;
            }
        }
    }
    for (kind, status) in dropped {
        if kind == ShieldKind::Ability && status == ShieldStatus::Depleted {
            state.shield_ability.record_destroyed(now);
        }
        state.play(SoundEffect::ShieldDown);
        state.emit(GameEvent::ShieldDropped(kind, status));
    }
}

/// Pick up every power-up the ship touches
pub fn collect_powerups(state: &mut GameState) {
    if !state.player.alive {
        return;
    }
    let rect = state.player.rect();
    for powerup in state.powerups.take_colliding(&rect) {
        apply_powerup(state, &powerup);
    }
}

pub fn apply_powerup(state: &mut GameState, powerup: &PowerUp) {
    let tuning = Rc::clone(&state.tuning);
    let cfg = tuning.powerup(powerup.kind);
    let now = state.now_ms();
    state.add_score(powerup.points as u64);

    match powerup.kind {
        PowerUpKind::Health | PowerUpKind::Repair => {
            state.player.heal_fraction(cfg.heal_percentage);
        }
        PowerUpKind::Shield => {
            let shield_cfg = tuning.powerup_shield();
            state.powerup_shield = Some(Shield::new(
                ShieldKind::PowerUp,
                shield_cfg,
                state.player.max_health as f32,
                1.0,
                state.player.pos,
                now,
                shield_cfg.duration_for_stage(state.player.stage),
            ));
            state.emit(GameEvent::ShieldRaised(ShieldKind::PowerUp));
        }
        PowerUpKind::DoubleLaser => {
            state.player.effects.double_laser_until_ms = now + cfg.effect_duration_ms;
        }
        PowerUpKind::SpeedBoost => {
            state.player.effects.speed_boost_until_ms = now + cfg.effect_duration_ms;
            state.player.effects.speed_multiplier = cfg.speed_multiplier.unwrap_or(1.5);
        }
        PowerUpKind::Emp => {
            state.emp.add_charges(cfg.emp_charges.max(1));
        }
    }
    state.play(SoundEffect::PowerUpCollected);
    state.emit(GameEvent::PowerUpCollected(powerup.kind));
    log::debug!("Collected {} power-up", powerup.kind.as_key());
}
