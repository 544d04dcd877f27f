//! Frame walker: issues one frame of draw calls from the game state

use glam::Vec2;

use super::{Color, DrawParams, Surface};
use crate::settings::Settings;
use crate::sim::{GamePhase, GameState, Owner, ShieldKind};

const HP_BAR_HEIGHT: f32 = 4.0;
const HP_BAR_GAP: f32 = 6.0;
const HUD_BAR_SIZE: Vec2 = Vec2::new(240.0, 12.0);
const HUD_MARGIN: f32 = 20.0;
/// Blink period while respawn protection runs
const BLINK_MS: f64 = 100.0;

/// Draw the playfield back to front: power-ups, hostiles, shots, ship,
/// shields, EMP pulses, explosions, then the HUD bars
pub fn draw_world(state: &GameState, settings: &Settings, surface: &mut dyn Surface) {
    if state.phase == GamePhase::Menu {
        return;
    }
    let assets = &state.assets;
    let tuning = &state.tuning;
    let now = state.now_ms();

    for powerup in &state.powerups.powerups {
        let sprite = assets.sprite(&tuning.powerup(powerup.kind).sprite);
        surface.draw(
            sprite,
            powerup.pos,
            DrawParams {
                alpha: powerup.alpha,
                ..Default::default()
            },
        );
    }

    for enemy in state.hostiles().filter(|e| e.is_alive()) {
        let sprite = assets.sprite(&tuning.enemy(enemy.kind).sprite);
        // EMP-struck hostiles flicker
        let alpha = if enemy.emp.is_visible() && (now / BLINK_MS) as u64 % 2 == 0 {
            0.5
        } else {
            1.0
        };
        surface.draw(
            sprite,
            enemy.pos,
            DrawParams {
                alpha,
                ..Default::default()
            },
        );
        if settings.show_hp_bars && enemy.shows_hp_bar(now) {
            let rect = enemy.rect();
            let top_left = Vec2::new(rect.left(), rect.top() - HP_BAR_GAP);
            let size = Vec2::new(rect.size().x, HP_BAR_HEIGHT);
            surface.fill_rect(top_left, size, Color::RED);
            surface.fill_rect(
                top_left,
                Vec2::new(size.x * enemy.hp_fraction(), size.y),
                Color::GREEN,
            );
        }
    }

    for shot in state.projectiles.iter() {
        let sprite = assets.sprite(&tuning.weapon(shot.kind).sprite);
        surface.draw(
            sprite,
            shot.pos,
            DrawParams {
                rotation_deg: shot.heading_deg(),
                flip_y: shot.owner == Owner::Enemy,
                ..Default::default()
            },
        );
    }

    let player = &state.player;
    if player.alive {
        let blink_off =
            player.is_invulnerable(now) && (now / BLINK_MS) as u64 % 2 == 1;
        if !blink_off {
            surface.draw(
                assets.sprite(&player.loadout().sprite),
                player.pos,
                DrawParams {
                    rotation_deg: player.tilt_deg,
                    ..Default::default()
                },
            );
        }
    }

    for shield in state.shield.iter().chain(state.powerup_shield.iter()) {
        let cfg = match shield.kind {
            ShieldKind::Ability => tuning.ability_shield(),
            ShieldKind::PowerUp => tuning.powerup_shield(),
        };
        let frames = assets.frames(&cfg.sheet);
        if frames.is_empty() {
            continue;
        }
        let sprite = frames.frames[shield.frame() % frames.len()];
        surface.draw(
            sprite,
            shield.center,
            DrawParams {
                alpha: 0.4 + 0.6 * shield.health_fraction(),
                ..Default::default()
            },
        );
    }

    let emp_frames = assets.frames(&tuning.emp.sheet);
    for wave in &state.emp_waves {
        if emp_frames.is_empty() {
            continue;
        }
        let sprite = emp_frames.frames[wave.frame() % emp_frames.len()];
        let scale = wave.diameter() / tuning.emp.start_diameter.max(1.0);
        surface.draw(
            sprite,
            wave.center,
            DrawParams {
                scale,
                alpha: 1.0 - wave.progress() * 0.5,
                ..Default::default()
            },
        );
    }

    for explosion in state.explosions.iter() {
        if let Some(sprite) = explosion.current_sprite() {
            surface.draw(
                sprite,
                explosion.pos,
                DrawParams {
                    scale: explosion.scale(),
                    ..Default::default()
                },
            );
        }
    }

    draw_hud(state, surface);
}

fn draw_hud(state: &GameState, surface: &mut dyn Surface) {
    let now = state.now_ms();
    let shield_fraction = match &state.shield {
        Some(shield) => shield.health_fraction(),
        None => state
            .shield_ability
            .cooldown_progress(state.tuning.ability_shield(), now),
    };
    let bars = [
        (state.player.health_fraction(), Color::GREEN),
        (shield_fraction, Color::CYAN),
        (state.emp.cooldown_progress(now), Color::YELLOW),
    ];
    let mut top_left = Vec2::new(HUD_MARGIN, HUD_MARGIN);
    for (fraction, color) in bars {
        surface.fill_rect(top_left, HUD_BAR_SIZE, Color::BACKDROP);
        surface.fill_rect(
            top_left,
            Vec2::new(HUD_BAR_SIZE.x * fraction.clamp(0.0, 1.0), HUD_BAR_SIZE.y),
            color,
        );
        top_left.y += HUD_BAR_SIZE.y + 4.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{AssetRegistry, DrawCommand, RecordingSurface};
    use crate::tuning::Tuning;
    use std::rc::Rc;

    fn state() -> GameState {
        let tuning = Rc::new(Tuning::builtin().unwrap());
        let assets = Rc::new(AssetRegistry::headless(&tuning));
        GameState::new(tuning, assets, &Settings::default(), 3)
    }

    #[test]
    fn test_menu_draws_nothing() {
        let s = state();
        let mut surface = RecordingSurface::new();
        draw_world(&s, &Settings::default(), &mut surface);
        assert!(surface.commands.is_empty());
    }

    #[test]
    fn test_draws_every_hostile_and_ship() {
        let mut s = state();
        s.phase = GamePhase::Playing;
        s.start_wave(1);
        let mut surface = RecordingSurface::new();
        draw_world(&s, &Settings::default(), &mut surface);
        let alien = s.assets.sprite(&s.tuning.enemy(crate::sim::EnemyKind::Alien).sprite);
        assert_eq!(surface.draws_of(alien), 32);
        let ship = s.assets.sprite(&s.player.loadout().sprite);
        assert_eq!(surface.draws_of(ship), 1);
        // Three HUD bars, two rects each
        let rects = surface
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Rect { .. }))
            .count();
        assert_eq!(rects, 6);
    }

    #[test]
    fn test_hp_bar_after_hit() {
        let mut s = state();
        s.phase = GamePhase::Playing;
        s.start_wave(3);
        s.enemies[0].take_damage(1, 0.0);
        let mut surface = RecordingSurface::new();
        draw_world(&s, &Settings::default(), &mut surface);
        let rects = surface
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Rect { .. }))
            .count();
        assert_eq!(rects, 8);

        let hidden = Settings {
            show_hp_bars: false,
            ..Settings::default()
        };
        surface.clear();
        draw_world(&s, &hidden, &mut surface);
        assert_eq!(surface.sprite_count(), s.enemies.len() + 1);
    }
}
