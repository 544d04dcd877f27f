//! Asset registry
//!
//! Sprites and sprite-sheet frame sets are referenced by opaque handles. The
//! registry is filled once from a platform [`AssetProvider`] and then shared
//! read-only with the simulation and the frame walker.

use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;

use crate::tuning::{ExplosionStyle, Tuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameSetId(pub u32);

/// Frames cut from one sprite sheet, in playback order
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet {
    pub id: FrameSetId,
    pub frames: Rc<[SpriteId]>,
}

impl FrameSet {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Platform side of asset loading (textures, sheet slicing)
pub trait AssetProvider {
    fn load_sprite(&mut self, key: &str) -> SpriteId;
    fn load_frames(&mut self, key: &str, cols: u32, rows: u32) -> FrameSet;
}

/// Hands out sequential handles without touching any files
#[derive(Debug, Default)]
pub struct HeadlessAssets {
    next_sprite: u32,
    next_set: u32,
}

impl AssetProvider for HeadlessAssets {
    fn load_sprite(&mut self, _key: &str) -> SpriteId {
        self.next_sprite += 1;
        SpriteId(self.next_sprite)
    }

    fn load_frames(&mut self, key: &str, cols: u32, rows: u32) -> FrameSet {
        self.next_set += 1;
        let frames: Vec<SpriteId> = (0..(cols * rows).max(1))
            .map(|_| self.load_sprite(key))
            .collect();
        FrameSet {
            id: FrameSetId(self.next_set),
            frames: frames.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssetRegistry {
    sprites: HashMap<String, SpriteId>,
    frame_sets: HashMap<String, FrameSet>,
    sprite_sizes: HashMap<String, Vec2>,
    fallback_sprite: SpriteId,
    fallback_frames: FrameSet,
    loaded: bool,
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self {
            sprites: HashMap::new(),
            frame_sets: HashMap::new(),
            sprite_sizes: HashMap::new(),
            fallback_sprite: SpriteId(0),
            fallback_frames: FrameSet {
                id: FrameSetId(0),
                frames: Rc::from(vec![SpriteId(0)]),
            },
            loaded: false,
        }
    }

    /// Registry already loaded from `tuning` with a headless provider
    pub fn headless(tuning: &Tuning) -> Self {
        let mut registry = Self::new();
        registry.load(&mut HeadlessAssets::default(), tuning);
        registry
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Load every sprite and sheet the tables reference. Runs once.
    pub fn load(&mut self, provider: &mut dyn AssetProvider, tuning: &Tuning) {
        if self.loaded {
            log::debug!("Assets already loaded, skipping");
            return;
        }

        let mut sprites: Vec<(String, Vec2)> = Vec::new();
        let mut sheets: Vec<(String, u32, u32)> = Vec::new();
        let sheet = |style: &ExplosionStyle| (style.sheet.clone(), style.cols, style.rows);

        for kind in crate::sim::ProjectileKind::ALL {
            let cfg = tuning.weapon(kind);
            sprites.push((cfg.sprite.clone(), cfg.size_vec()));
            sheets.push(sheet(&cfg.explosion));
        }
        for kind in crate::sim::EnemyKind::ALL {
            let template = tuning.enemy(kind);
            sprites.push((template.sprite.clone(), template.size));
        }
        for kind in crate::sim::PowerUpKind::ALL {
            let cfg = tuning.powerup(kind);
            sprites.push((cfg.sprite.clone(), Vec2::new(cfg.size.0, cfg.size.1)));
        }
        for stage in tuning.ship_stages() {
            if let Ok(ship) = tuning.ship(stage) {
                sprites.push((ship.sprite.clone(), ship.size));
            }
        }
        for shield in [tuning.ability_shield(), tuning.powerup_shield()] {
            sheets.push((shield.sheet.clone(), shield.cols, shield.rows));
        }
        sheets.push((tuning.emp.sheet.clone(), tuning.emp.cols, tuning.emp.rows));
        sheets.push(sheet(&tuning.effects.enemy_death));
        sheets.push(sheet(&tuning.effects.player_death));

        for (key, size) in sprites {
            if !self.sprites.contains_key(&key) {
                let id = provider.load_sprite(&key);
                self.sprites.insert(key.clone(), id);
                self.sprite_sizes.insert(key, size);
            }
        }
        for (key, cols, rows) in sheets {
            if !self.frame_sets.contains_key(&key) {
                let set = provider.load_frames(&key, cols, rows);
                self.frame_sets.insert(key, set);
            }
        }

        self.loaded = true;
        log::info!(
            "Loaded {} sprites and {} frame sets",
            self.sprites.len(),
            self.frame_sets.len()
        );
    }

    /// Sprite handle for `key`, or the placeholder when missing
    pub fn sprite(&self, key: &str) -> SpriteId {
        self.sprites.get(key).copied().unwrap_or(self.fallback_sprite)
    }

    pub fn sprite_size(&self, key: &str) -> Option<Vec2> {
        self.sprite_sizes.get(key).copied()
    }

    /// Frame set for `key`, or a single placeholder frame when missing
    pub fn frames(&self, key: &str) -> &FrameSet {
        self.frame_sets.get(key).unwrap_or(&self.fallback_frames)
    }
}
