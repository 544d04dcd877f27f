//! Keyboard snapshot and its mapping onto simulation input
//!
//! Movement and the main gun read held keys. Everything else fires on the
//! key-down edge, so holding a key never repeats an ability.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::sim::{EnemyKind, TickInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    /// Rocket
    R,
    /// Homing rocket
    H,
    /// Blaster
    B,
    /// Nuke
    N,
    /// Ability shield
    S,
    /// EMP
    E,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Escape,
    Enter,
    Q,
    F1,
    F2,
    F3,
    F4,
    F5,
}

impl Key {
    /// Ship stage selected by a digit key
    pub fn stage(self) -> Option<u8> {
        match self {
            Key::Digit1 => Some(1),
            Key::Digit2 => Some(2),
            Key::Digit3 => Some(3),
            Key::Digit4 => Some(4),
            _ => None,
        }
    }

    /// Formation forced by a debug function key
    pub fn debug_wave(self) -> Option<EnemyKind> {
        match self {
            Key::F1 => Some(EnemyKind::Alien),
            Key::F2 => Some(EnemyKind::Drone),
            Key::F3 => Some(EnemyKind::Tank),
            Key::F4 => Some(EnemyKind::Sniper),
            Key::F5 => Some(EnemyKind::Boss),
            _ => None,
        }
    }
}

/// Keys held this frame plus the ones that went down since the last frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    held: BTreeSet<Key>,
    pressed: BTreeSet<Key>,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key-down event
    pub fn press(&mut self, key: Key) {
        if self.held.insert(key) {
            self.pressed.insert(key);
        }
    }

    /// Key-up event
    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// Forget key-down edges once a frame consumed them
    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }

    /// Drop everything held (focus lost)
    pub fn release_all(&mut self) {
        self.held.clear();
        self.pressed.clear();
    }

    fn axis(&self, negative: Key, positive: Key) -> f32 {
        let mut value = 0.0;
        if self.is_held(negative) {
            value -= 1.0;
        }
        if self.is_held(positive) {
            value += 1.0;
        }
        value
    }

    /// Simulation input for this frame
    pub fn to_tick_input(&self) -> TickInput {
        TickInput {
            move_x: self.axis(Key::Left, Key::Right),
            move_y: self.axis(Key::Up, Key::Down),
            fire: self.is_held(Key::Space),
            fire_rocket: self.was_pressed(Key::R),
            fire_homing: self.was_pressed(Key::H),
            fire_blaster: self.was_pressed(Key::B),
            fire_nuke: self.was_pressed(Key::N),
            shield: self.was_pressed(Key::S),
            emp: self.was_pressed(Key::E),
            set_stage: self.pressed.iter().rev().find_map(|k| k.stage()),
            debug_wave: self.pressed.iter().rev().find_map(|k| k.debug_wave()),
            idle_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axes_cancel() {
        let mut input = InputSnapshot::new();
        input.press(Key::Left);
        assert_eq!(input.to_tick_input().move_x, -1.0);
        input.press(Key::Right);
        assert_eq!(input.to_tick_input().move_x, 0.0);
        input.release(Key::Left);
        assert_eq!(input.to_tick_input().move_x, 1.0);
    }

    #[test]
    fn test_abilities_fire_on_edge_only() {
        let mut input = InputSnapshot::new();
        input.press(Key::E);
        input.press(Key::Space);
        let first = input.to_tick_input();
        assert!(first.emp);
        assert!(first.fire);
        input.end_frame();
        let held = input.to_tick_input();
        assert!(!held.emp, "holding does not repeat");
        assert!(held.fire, "main gun is held-fire");
    }

    #[test]
    fn test_repeat_press_without_release_is_not_an_edge() {
        let mut input = InputSnapshot::new();
        input.press(Key::N);
        input.end_frame();
        input.press(Key::N);
        assert!(!input.was_pressed(Key::N));
    }

    #[test]
    fn test_stage_and_debug_keys() {
        let mut input = InputSnapshot::new();
        input.press(Key::Digit3);
        input.press(Key::F5);
        let tick = input.to_tick_input();
        assert_eq!(tick.set_stage, Some(3));
        assert_eq!(tick.debug_wave, Some(EnemyKind::Boss));
    }
}
