use glam::Vec2;
use proptest::prelude::*;

use star_invaders::heading_from_angle;
use star_invaders::sim::projectile::{Candidate, TargetRef};
use star_invaders::sim::{
    DropCalculator, Owner, Projectile, ProjectileKind, ProjectileManager, Shield, ShieldKind,
    falloff_damage,
};
use star_invaders::Tuning;

fn guided_kind() -> impl Strategy<Value = ProjectileKind> {
    prop_oneof![
        Just(ProjectileKind::HomingRocket),
        Just(ProjectileKind::Blaster),
    ]
}

fn owner() -> impl Strategy<Value = Owner> {
    prop_oneof![Just(Owner::Player), Just(Owner::Enemy)]
}

proptest! {
    #[test]
    fn heading_is_unit_length(angle in -360.0f32..360.0, up in any::<bool>()) {
        let sign = if up { -1.0 } else { 1.0 };
        let heading = heading_from_angle(angle, sign);
        prop_assert!((heading.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn falloff_is_bounded_and_monotonic(
        max in 0i32..2000,
        radius in 1.0f32..500.0,
        a in 0.0f32..600.0,
        b in 0.0f32..600.0,
    ) {
        let (near, far) = if a <= b { (a, b) } else { (b, a) };
        let near_damage = falloff_damage(max, near, radius);
        let far_damage = falloff_damage(max, far, radius);
        prop_assert!(near_damage >= far_damage);
        prop_assert!((0..=max).contains(&near_damage));
        if far > radius {
            prop_assert_eq!(far_damage, 0);
        }
    }

    #[test]
    fn acceleration_never_bends_ballistic_shots(
        kind in prop_oneof![Just(ProjectileKind::Rocket), Just(ProjectileKind::Nuke), Just(ProjectileKind::Laser)],
        owner in owner(),
        angle in -60.0f32..60.0,
        steps in 1usize..200,
    ) {
        let tuning = Tuning::builtin().unwrap();
        let mut shot = Projectile::create(kind, tuning.weapon(kind), Vec2::new(960.0, 540.0), owner, angle, 0.0);
        let heading = shot.direction();
        for step in 0..steps {
            shot.physics_update(step as f64 * 1000.0 / 60.0, &[]);
            prop_assert!(shot.direction().abs_diff_eq(heading, 1e-6));
        }
    }

    #[test]
    fn guided_direction_stays_unit_length(
        kind in guided_kind(),
        owner in owner(),
        angle in -45.0f32..45.0,
        targets in prop::collection::vec((0.0f32..1920.0, 0.0f32..1080.0), 0..4),
        steps in 1usize..120,
    ) {
        let tuning = Tuning::builtin().unwrap();
        let candidates: Vec<Candidate> = targets
            .iter()
            .enumerate()
            .map(|(i, (x, y))| Candidate {
                target: TargetRef::Enemy(i as u32 + 1),
                pos: Vec2::new(*x, *y),
            })
            .collect();
        let mut shot = Projectile::create(
            kind,
            tuning.weapon(kind),
            Vec2::new(960.0, 540.0),
            owner,
            angle,
            0.0,
        );
        for step in 0..steps {
            shot.physics_update(step as f64 * 1000.0 / 60.0, &candidates);
            prop_assert!((shot.direction().length() - 1.0).abs() < 1e-4);
            prop_assert!(shot.speed() >= 0.0);
        }
    }

    #[test]
    fn shield_health_stays_in_range(
        kind in prop_oneof![Just(ShieldKind::Ability), Just(ShieldKind::PowerUp)],
        initial in 0.0f32..1.0,
        hits in prop::collection::vec((0.0f32..800.0, 0.0f32..0.5), 1..40),
    ) {
        let tuning = Tuning::builtin().unwrap();
        let cfg = match kind {
            ShieldKind::Ability => tuning.ability_shield(),
            ShieldKind::PowerUp => tuning.powerup_shield(),
        };
        let mut shield = Shield::new(kind, cfg, 1000.0, initial, Vec2::ZERO, 0.0, 1.0e9);
        let mut now = 0.0;
        for (damage, dt) in hits {
            let result = shield.absorb(damage, now);
            prop_assert!(result.absorbed >= 0.0);
            prop_assert!(result.passthrough >= 0.0);
            prop_assert!(result.absorbed + result.passthrough <= damage + 1e-3);
            shield.update(dt, now);
            prop_assert!(shield.health() >= 0.0);
            prop_assert!(shield.health() <= shield.max_health());
            now += dt as f64 * 1000.0;
        }
    }

    #[test]
    fn projectile_count_never_exceeds_capacity(capacity in 0usize..50, attempts in 0usize..120) {
        let tuning = Tuning::builtin().unwrap();
        let cfg = tuning.weapon(ProjectileKind::Laser);
        let mut manager = ProjectileManager::new(capacity);
        for i in 0..attempts {
            let owner = if i % 2 == 0 { Owner::Player } else { Owner::Enemy };
            let shot = Projectile::create(
                ProjectileKind::Laser,
                cfg,
                Vec2::new(500.0, 500.0),
                owner,
                0.0,
                0.0,
            );
            manager.add(shot, i as f64);
            prop_assert!(manager.len() <= capacity);
        }
        prop_assert_eq!(manager.len(), attempts.min(capacity));
        prop_assert_eq!(manager.rejected() as usize, attempts.saturating_sub(capacity));
    }

    #[test]
    fn drop_roll_hits_only_inside_total_chance(roll in 0.0f64..1.0) {
        let tuning = Tuning::builtin().unwrap();
        let calc = DropCalculator::from_tuning(&tuning);
        prop_assume!((roll - calc.total_chance()).abs() > 1e-6);
        prop_assert_eq!(calc.pick(roll).is_some(), roll <= calc.total_chance());
    }
}
