use std::rc::Rc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use star_invaders::renderer::AssetRegistry;
use star_invaders::sim::combat::{
    HitOutcome, activate_shield, apply_aoe, apply_emp_waves, apply_powerup, damage_enemy,
    damage_player, fire_emp, on_player_hit, resolve_enemy_shots, resolve_player_shots,
};
use star_invaders::sim::projectile::{Candidate, TargetRef};
use star_invaders::sim::{
    DropCalculator, Enemy, EnemyKind, GameEvent, GamePhase, GameState, Owner, PowerUp,
    PowerUpKind, Projectile, ProjectileKind, ShieldAbility,
};
use star_invaders::{Settings, Tuning};

fn state_with(settings: &Settings) -> GameState {
    let tuning = Rc::new(Tuning::builtin().unwrap());
    let assets = Rc::new(AssetRegistry::headless(&tuning));
    let mut state = GameState::new(tuning, assets, settings, 7);
    state.phase = GamePhase::Playing;
    state.frame = 1;
    state
}

fn state() -> GameState {
    state_with(&Settings::default())
}

fn spawn(state: &mut GameState, kind: EnemyKind, pos: Vec2) -> u32 {
    let tuning = Rc::clone(&state.tuning);
    let id = state.next_entity_id();
    let enemy = Enemy::new(id, tuning.enemy(kind), pos, &mut state.rng);
    state.enemies.push(enemy);
    id
}

fn shot(state: &GameState, kind: ProjectileKind, owner: Owner, pos: Vec2) -> Projectile {
    Projectile::create(kind, state.tuning.weapon(kind), pos, owner, 0.0, state.now_ms())
}

fn count_events(state: &GameState, pred: impl Fn(&GameEvent) -> bool) -> usize {
    state.events.iter().filter(|e| pred(e)).count()
}

#[test]
fn laser_kill_pays_once_with_one_explosion() {
    let mut s = state();
    let pos = Vec2::new(400.0, 300.0);
    let id = spawn(&mut s, EnemyKind::Alien, pos);
    s.enemy_mut(id).unwrap().hp = 50;

    let laser = shot(&s, ProjectileKind::Laser, Owner::Player, pos);
    on_player_hit(&mut s, &laser, id);

    assert_eq!(s.explosions.active_count(), 1);
    let explosion = s.explosions.iter().next().unwrap();
    assert_eq!(explosion.pos, pos);
    assert_eq!(s.kills, 1);
    assert_eq!(s.score, 10);
    assert!(s.enemies.is_empty());
    assert_eq!(
        count_events(&s, |e| matches!(e, GameEvent::EnemyKilled { .. })),
        1
    );
}

#[test]
fn laser_hit_that_does_not_kill_leaves_an_impact() {
    let mut s = state();
    let pos = Vec2::new(400.0, 300.0);
    let id = spawn(&mut s, EnemyKind::Alien, pos);

    let laser = shot(&s, ProjectileKind::Laser, Owner::Player, pos);
    on_player_hit(&mut s, &laser, id);

    let alien = s.enemy(id).unwrap();
    assert_eq!(alien.hp, 50);
    assert!(alien.shows_hp_bar(s.now_ms()));
    assert_eq!(s.kills, 0);
    assert_eq!(s.explosions.active_count(), 1);
}

#[test]
fn dead_enemy_cannot_be_killed_twice() {
    let mut s = state();
    let id = spawn(&mut s, EnemyKind::Alien, Vec2::new(400.0, 300.0));

    assert!(matches!(damage_enemy(&mut s, id, 500), HitOutcome::Killed(_)));
    assert_eq!(damage_enemy(&mut s, id, 500), HitOutcome::Missing);
    s.remove_dead();
    assert_eq!(damage_enemy(&mut s, id, 500), HitOutcome::Missing);
}

#[test]
fn shots_collide_only_after_their_spawn_frame() {
    let mut s = state();
    let pos = Vec2::new(600.0, 300.0);
    let id = spawn(&mut s, EnemyKind::Alien, pos);

    let laser = shot(&s, ProjectileKind::Laser, Owner::Player, pos);
    s.add_shots(vec![laser]);
    resolve_player_shots(&mut s);
    assert_eq!(s.projectiles.player_shots.len(), 1, "same-frame shot is not tested");
    assert_eq!(s.enemy(id).unwrap().hp, 100);

    s.frame += 1;
    resolve_player_shots(&mut s);
    assert!(s.projectiles.player_shots.is_empty());
    assert_eq!(s.enemy(id).unwrap().hp, 50);
}

#[test]
fn rocket_splash_falls_off_linearly() {
    let mut s = state();
    let center = Vec2::new(800.0, 400.0);
    let near = spawn(&mut s, EnemyKind::Tank, center);
    let mid = spawn(&mut s, EnemyKind::Tank, center + Vec2::new(60.0, 0.0));
    let far = spawn(&mut s, EnemyKind::Tank, center + Vec2::new(150.0, 0.0));

    let kills = apply_aoe(&mut s, center, 120.0, 200);

    assert!(kills.is_empty());
    assert_eq!(s.enemy(near).unwrap().hp, 100);
    assert_eq!(s.enemy(mid).unwrap().hp, 200);
    assert_eq!(s.enemy(far).unwrap().hp, 300, "outside the radius");
}

#[test]
fn rocket_hit_has_no_separate_direct_damage() {
    let mut s = state();
    let center = Vec2::new(800.0, 400.0);
    let struck = spawn(&mut s, EnemyKind::Tank, center);

    let rocket = shot(&s, ProjectileKind::Rocket, Owner::Player, center);
    on_player_hit(&mut s, &rocket, struck);

    // Full splash only, not splash plus the direct hit
    assert_eq!(s.enemy(struck).unwrap().hp, 100);
}

#[test]
fn rocket_clipping_the_boss_edge_deals_full_splash() {
    let mut s = state();
    let tuning = Rc::clone(&s.tuning);
    let center = Vec2::new(960.0, 200.0);
    let id = s.next_entity_id();
    s.boss = Some(Enemy::new(id, tuning.enemy(EnemyKind::Boss), center, &mut s.rng));

    // Inside the 140x100 hull, near its corner
    let rocket = shot(&s, ProjectileKind::Rocket, Owner::Player, center + Vec2::new(65.0, 45.0));
    s.projectiles.player_shots.push(rocket);
    s.frame += 1;
    resolve_player_shots(&mut s);

    assert!(s.projectiles.player_shots.is_empty());
    assert_eq!(s.boss.as_ref().map(|b| b.hp), Some(800));
}

#[test]
fn rocket_splash_kills_the_cluster() {
    let mut s = state();
    let center = Vec2::new(800.0, 400.0);
    let a = spawn(&mut s, EnemyKind::Alien, center);
    spawn(&mut s, EnemyKind::Alien, center + Vec2::new(50.0, 0.0));
    let survivor = spawn(&mut s, EnemyKind::Alien, center + Vec2::new(200.0, 0.0));

    let rocket = shot(&s, ProjectileKind::Rocket, Owner::Player, center);
    on_player_hit(&mut s, &rocket, a);

    assert_eq!(s.kills, 2);
    assert_eq!(s.score, 20);
    assert_eq!(s.enemies.len(), 1);
    assert_eq!(s.enemies[0].id, survivor);
}

#[test]
fn enemy_rocket_hurts_player_directly_but_not_hostiles() {
    let mut s = state();
    let player_pos = s.player.pos;
    let bystander = spawn(&mut s, EnemyKind::Alien, player_pos + Vec2::new(0.0, -40.0));

    let mut rocket = shot(&s, ProjectileKind::Rocket, Owner::Enemy, player_pos);
    rocket.spawned_frame = 0;
    s.projectiles.enemy_shots.push(rocket);
    resolve_enemy_shots(&mut s);

    assert!(s.projectiles.enemy_shots.is_empty());
    assert_eq!(s.player.health, s.player.max_health - 200);
    assert_eq!(s.enemy(bystander).unwrap().hp, 100);
}

#[test]
fn damage_goes_powerup_shield_then_ability_shield_then_hull() {
    let mut s = state();
    let tuning = Rc::clone(&s.tuning);
    let pickup = PowerUp::new(
        PowerUpKind::Shield,
        tuning.powerup(PowerUpKind::Shield),
        s.player.pos,
        s.now_ms(),
    );
    apply_powerup(&mut s, &pickup);
    assert!(activate_shield(&mut s));

    damage_player(&mut s, 300);
    assert_eq!(s.powerup_shield.as_ref().unwrap().health(), 700.0);
    assert_eq!(s.shield.as_ref().unwrap().health(), 500.0);
    assert_eq!(s.player.health, 1000);

    s.powerup_shield = None;
    damage_player(&mut s, 100);
    assert!((s.shield.as_ref().unwrap().health() - 410.0).abs() < 1e-3);
    assert_eq!(s.player.health, 990);
    assert!(s.events.contains(&GameEvent::PlayerDamaged { amount: 10 }));
}

#[test]
fn invulnerable_player_takes_nothing() {
    let mut s = state();
    s.player.invulnerable_until_ms = s.now_ms() + 1000.0;
    damage_player(&mut s, 400);
    assert_eq!(s.player.health, s.player.max_health);
}

#[test]
fn broken_shield_recharges_from_the_floor() {
    let tuning = Tuning::builtin().unwrap();
    let cfg = tuning.ability_shield();
    let mut ability = ShieldAbility::new();

    assert!(ability.activate(cfg, 1000.0, Vec2::ZERO, 0.0).is_some());
    ability.record_destroyed(6900.0);
    assert!(ability.activate(cfg, 1000.0, Vec2::ZERO, 6950.0).is_none(), "cooling down");

    let shield = ability.activate(cfg, 1000.0, Vec2::ZERO, 7000.0).unwrap();
    assert!((shield.health_fraction() - cfg.min_health_percentage).abs() < 1e-4);
}

#[test]
fn death_costs_a_life_then_ends_the_run() {
    let mut s = state_with(&Settings {
        lives: 2,
        ..Settings::default()
    });

    damage_player(&mut s, 5000);
    assert!(!s.player.alive);
    assert_eq!(s.player.lives, 1);
    assert_eq!(s.phase, GamePhase::Playing);
    let at = s.player.respawn_at_ms.unwrap();
    assert!(s.player.try_respawn(at, s.rules.respawn_protection_ms));
    assert!(s.player.is_invulnerable(at));

    s.player.invulnerable_until_ms = 0.0;
    damage_player(&mut s, 5000);
    damage_player(&mut s, 5000);
    assert_eq!(s.phase, GamePhase::GameOver);
    assert_eq!(
        count_events(&s, |e| matches!(e, GameEvent::GameOver { .. })),
        1
    );
}

#[test]
fn full_manager_rejects_new_shots() {
    let mut s = state_with(&Settings {
        max_projectiles: 3,
        ..Settings::default()
    });
    let pos = Vec2::new(500.0, 500.0);
    let shots = (0..5)
        .map(|_| shot(&s, ProjectileKind::Laser, Owner::Player, pos))
        .collect();
    s.add_shots(shots);

    assert_eq!(s.projectiles.len(), 3);
    assert_eq!(s.projectiles.rejected(), 2);
}

#[test]
fn drop_table_rate_matches_total_chance() {
    let tuning = Tuning::builtin().unwrap();
    let calc = DropCalculator::from_tuning(&tuning);
    assert!((calc.total_chance() - 0.48).abs() < 1e-9);
    assert_eq!(calc.pick(0.9), None);
    assert_eq!(calc.pick(0.01), Some(PowerUpKind::Health));

    let mut rng = Pcg32::seed_from_u64(99);
    let rolls = 20_000;
    let drops = (0..rolls).filter(|_| calc.roll(&mut rng).is_some()).count();
    let rate = drops as f64 / rolls as f64;
    assert!((rate - 0.48).abs() < 0.02, "drop rate {rate}");
}

#[test]
fn homing_waits_for_its_delay_before_turning() {
    let tuning = Tuning::builtin().unwrap();
    let cfg = tuning.weapon(ProjectileKind::HomingRocket);
    let mut rocket = Projectile::create(
        ProjectileKind::HomingRocket,
        cfg,
        Vec2::new(500.0, 800.0),
        Owner::Player,
        0.0,
        0.0,
    );
    let target = [Candidate {
        target: TargetRef::Enemy(1),
        pos: Vec2::new(900.0, 800.0),
    }];

    rocket.physics_update(100.0, &target);
    assert_eq!(rocket.direction(), Vec2::new(0.0, -1.0));

    rocket.physics_update(400.0, &target);
    assert!(rocket.direction().x > 0.0);
    assert_eq!(rocket.homing_target(), Some(TargetRef::Enemy(1)));
}

#[test]
fn emp_pulse_disables_enemies_and_clears_shots() {
    let mut s = state();
    assert!(!fire_emp(&mut s), "no charges yet");
    s.emp.add_charges(1);

    let player_pos = s.player.pos;
    let id = spawn(&mut s, EnemyKind::Alien, player_pos + Vec2::new(0.0, -150.0));
    let laser = shot(&s, ProjectileKind::Laser, Owner::Enemy, player_pos + Vec2::new(40.0, 0.0));
    s.projectiles.enemy_shots.push(laser);

    assert!(fire_emp(&mut s));
    for _ in 0..40 {
        apply_emp_waves(&mut s, 1.0 / 60.0);
    }

    assert!(s.projectiles.enemy_shots.is_empty());
    assert!(!s.enemy(id).unwrap().emp.can_shoot());
    assert_eq!(s.score, s.tuning.emp.score_bonus, "bonus paid once");
    assert!(s.emp_waves.is_empty());
}
