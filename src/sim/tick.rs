//! Fixed timestep physics and the per-frame simulation update
//!
//! `physics_tick` advances projectiles by exactly one fixed step. The
//! outer loop calls it zero or more times per rendered frame, then calls
//! `frame_update` once with the frame's simulated time.

use std::rc::Rc;

use glam::Vec2;

use super::combat;
use super::enemy::EnemyKind;
use super::player::MoveIntent;
use super::projectile::ProjectileKind;
use super::state::{GameEvent, GamePhase, GameState};
use crate::audio::SoundEffect;
use crate::consts::*;

/// Input commands for a single frame (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Horizontal steering, -1 (left) to 1 (right)
    pub move_x: f32,
    /// Vertical steering, -1 (up) to 1 (down)
    pub move_y: f32,
    /// Main gun (laser, or double laser while that effect runs)
    pub fire: bool,
    pub fire_rocket: bool,
    pub fire_homing: bool,
    pub fire_blaster: bool,
    pub fire_nuke: bool,
    /// Raise the ability shield
    pub shield: bool,
    /// Release an EMP pulse
    pub emp: bool,
    /// Switch ship stage (debug/testing)
    pub set_stage: Option<u8>,
    /// Replace the formation with this kind (debug/testing)
    pub debug_wave: Option<EnemyKind>,
    /// Idle/demo mode - AI flies the ship
    pub idle_mode: bool,
}

/// Advance projectiles and the game clock by one fixed step
pub fn physics_tick(state: &mut GameState) {
    if state.phase != GamePhase::Playing {
        return;
    }
    state.clock.tick();
    let now = state.now_ms();
    let enemy_targets = state.enemy_candidates();
    let player_targets = state.player_candidates();
    state
        .projectiles
        .physics_update(now, &enemy_targets, &player_targets);
}

/// Run everything that happens once per rendered frame. `dt` is the
/// simulated time the physics substeps covered this frame.
pub fn frame_update(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase != GamePhase::Playing {
        return;
    }
    state.frame += 1;
    let tuning = Rc::clone(&state.tuning);
    let now = state.now_ms();

    let input = if input.idle_mode {
        autopilot(state, input)
    } else {
        input.clone()
    };

    // Respawn
    if state
        .player
        .try_respawn(now, state.rules.respawn_protection_ms)
    {
        log::info!("Player respawned");
        state.emit(GameEvent::PlayerRespawned);
    }

    if let Some(kind) = input.debug_wave {
        log::info!("Debug wave: {}", kind.as_key());
        state.force_wave(kind);
    }

    // Player
    if let Some(stage) = input.set_stage {
        if stage != state.player.stage {
            state.player.set_stage(&tuning, stage);
        }
    }
    if state.player.alive {
        state.player.steer(
            MoveIntent {
                x: input.move_x,
                y: input.move_y,
            },
            dt,
            now,
        );
        fire_player_weapons(state, &input);
        if input.shield {
            combat::activate_shield(state);
        }
        if input.emp {
            combat::fire_emp(state);
        }
    }

    // Enemies
    state.wave.step(&mut state.enemies, dt);
    for enemy in state.fly_ins.iter_mut().chain(state.boss.iter_mut()) {
        enemy.update(0.0, dt);
    }
    let mut shots = Vec::new();
    for enemy in state
        .enemies
        .iter_mut()
        .chain(state.fly_ins.iter_mut())
        .chain(state.boss.iter_mut())
    {
        shots.extend(enemy.fire(&tuning, now, &mut state.rng));
    }
    if !shots.is_empty() {
        state.add_shots(shots);
    }

    // Collisions
    combat::resolve_enemy_shots(state);
    combat::resolve_player_shots(state);
    cull_escaped_enemies(state);

    // Effects and pickups
    state.explosions.update(dt);
    state.powerups.update(&tuning, &mut state.rng, dt, now);
    combat::collect_powerups(state);
    combat::update_shields(state, dt);
    combat::apply_emp_waves(state, dt);

    if state.phase == GamePhase::Playing {
        advance_waves(state);
        spawn_fly_ins(state);
    }
    state.normalize_order();
}

fn fire_player_weapons(state: &mut GameState, input: &TickInput) {
    let tuning = Rc::clone(&state.tuning);
    let now = state.now_ms();
    let mut shots = Vec::new();
    if input.fire {
        shots.extend(state.player.fire_primary(&tuning, now));
    }
    let triggers = [
        (input.fire_rocket, ProjectileKind::Rocket),
        (input.fire_homing, ProjectileKind::HomingRocket),
        (input.fire_blaster, ProjectileKind::Blaster),
        (input.fire_nuke, ProjectileKind::Nuke),
    ];
    for (pressed, kind) in triggers {
        if pressed {
            shots.extend(state.player.shoot_weapon(&tuning, kind, now));
        }
    }
    if shots.is_empty() {
        return;
    }
    let mut fired: Vec<ProjectileKind> = shots.iter().map(|s| s.kind).collect();
    fired.dedup();
    for kind in fired {
        state.play(SoundEffect::Fire(kind));
    }
    state.add_shots(shots);
}

/// Drop hostiles that left the playfield; they pay nothing
fn cull_escaped_enemies(state: &mut GameState) {
    let before = state.enemies.len() + state.fly_ins.len();
    state.enemies.retain(|e| !e.below_playfield());
    state.fly_ins.retain(|e| !e.below_playfield());
    let escaped = before - state.enemies.len() - state.fly_ins.len();
    if escaped > 0 {
        log::debug!("{escaped} enemies left the playfield");
    }
}

/// Start the next wave once the current one is cleared and the breather ran out
fn advance_waves(state: &mut GameState) {
    let now = state.now_ms();
    match state.wave.next_wave_at_ms {
        None if state.wave_remaining() == 0 => {
            log::info!("Wave {} cleared", state.wave.number);
            state.wave.next_wave_at_ms = Some(now + WAVE_BREATHER_MS);
        }
        Some(at) if now >= at => {
            let next = state.wave.number + 1;
            state.start_wave(next);
        }
        _ => {}
    }
}

fn spawn_fly_ins(state: &mut GameState) {
    let tuning = Rc::clone(&state.tuning);
    let now = state.now_ms();
    let id = state.peek_entity_id();
    let alive = state.fly_ins.len();
    if let Some(fly) =
        state
            .fly_in_spawner
            .maybe_spawn(&tuning, state.wave.number, alive, now, &mut state.rng, id)
    {
        state.next_entity_id();
        log::debug!("Interceptor #{} flying in", fly.id);
        state.fly_ins.push(fly);
    }
}

/// Simple AI pilot for demo mode: track the closest hostile, sidestep
/// incoming fire and spend abilities when things get dangerous
pub fn autopilot(state: &GameState, input: &TickInput) -> TickInput {
    let mut out = input.clone();
    let ship = state.player.pos;

    // Aim under the lowest live hostile
    let target = state
        .hostiles()
        .filter(|e| e.is_alive())
        .max_by(|a, b| {
            a.pos
                .y
                .partial_cmp(&b.pos.y)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|e| e.pos);

    // Nearest enemy shot heading our way
    let threat = state
        .projectiles
        .enemy_shots
        .iter()
        .filter(|s| s.pos.y < ship.y && (s.pos.x - ship.x).abs() < state.player.size.x)
        .min_by(|a, b| {
            a.pos
                .distance_squared(ship)
                .partial_cmp(&b.pos.distance_squared(ship))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|s| s.pos);

    let mut steer = Vec2::ZERO;
    if let Some(threat) = threat {
        steer.x = if threat.x >= ship.x { -1.0 } else { 1.0 };
    } else if let Some(target) = target {
        let dx = target.x - ship.x;
        // Oscillate a little so the pilot doesn't park under one column
        let wobble = (state.clock.ticks() as f32 * 0.02).sin() * 40.0;
        steer.x = ((dx + wobble) / 100.0).clamp(-1.0, 1.0);
    }
    let home_y = PLAYFIELD_HEIGHT - 150.0;
    steer.y = ((home_y - ship.y) / 100.0).clamp(-1.0, 1.0);

    out.move_x = steer.x;
    out.move_y = steer.y;
    out.fire = target.is_some();
    out.fire_rocket = target.is_some();
    out.fire_homing = target.is_some();
    out.fire_blaster = target.is_some();
    out.shield = state.player.health_fraction() < 0.5;
    let incoming = state
        .projectiles
        .enemy_shots
        .iter()
        .filter(|s| s.pos.distance(ship) < 300.0)
        .count();
    out.emp = incoming >= 5;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::assets::AssetRegistry;
    use crate::settings::Settings;
    use crate::tuning::Tuning;

    fn playing(seed: u64) -> GameState {
        let tuning = Rc::new(Tuning::builtin().unwrap());
        let assets = Rc::new(AssetRegistry::headless(&tuning));
        let mut state = GameState::new(tuning, assets, &Settings::default(), seed);
        state.phase = GamePhase::Playing;
        state
    }

    fn step(state: &mut GameState, input: &TickInput) {
        physics_tick(state);
        frame_update(state, input, SIM_DT);
    }

    #[test]
    fn test_menu_does_not_simulate() {
        let mut state = playing(1);
        state.phase = GamePhase::Menu;
        step(&mut state, &TickInput::default());
        assert_eq!(state.clock.ticks(), 0);
        assert_eq!(state.frame, 0);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_first_frame_starts_wave_one() {
        let mut state = playing(1);
        step(&mut state, &TickInput::default());
        assert_eq!(state.wave.number, 1);
        assert_eq!(state.wave.kind, Some(EnemyKind::Alien));
        assert_eq!(state.enemies.len(), 32);
    }

    #[test]
    fn test_fire_spawns_player_shot() {
        let mut state = playing(1);
        let input = TickInput {
            fire: true,
            ..Default::default()
        };
        step(&mut state, &input);
        assert_eq!(state.projectiles.player_shots.len(), 1);
        assert_eq!(state.projectiles.player_shots[0].kind, ProjectileKind::Laser);
        assert!(
            state
                .events
                .contains(&GameEvent::Sound(SoundEffect::Fire(ProjectileKind::Laser)))
        );
    }

    #[test]
    fn test_cleared_wave_rolls_after_breather() {
        let mut state = playing(1);
        step(&mut state, &TickInput::default());
        state.enemies.clear();
        step(&mut state, &TickInput::default());
        assert!(state.wave.next_wave_at_ms.is_some());
        assert_eq!(state.wave.number, 1);

        let frames = (WAVE_BREATHER_MS / SIM_DT_MS).ceil() as usize + 1;
        for _ in 0..frames {
            step(&mut state, &TickInput::default());
        }
        assert_eq!(state.wave.number, 2);
        assert_eq!(state.wave.kind, Some(EnemyKind::Drone));
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = playing(99999);
        let mut state2 = playing(99999);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..600 {
            step(&mut state1, &input);
            step(&mut state2, &input);
        }
        assert_eq!(state1.clock.ticks(), state2.clock.ticks());
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.enemies.len(), state2.enemies.len());
        assert_eq!(state1.projectiles.len(), state2.projectiles.len());
        assert_eq!(state1.player.pos, state2.player.pos);
    }

    #[test]
    fn test_autopilot_makes_progress() {
        let mut state = playing(7);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..1800 {
            step(&mut state, &input);
        }
        assert!(state.kills > 0);
        assert!(state.score > 0);
    }
}
