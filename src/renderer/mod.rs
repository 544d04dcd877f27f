//! Rendering seam
//!
//! The crate never talks to a graphics API. A host implements [`Surface`]
//! (a blit and a rectangle fill) and [`scene::draw_world`] walks the game
//! state once per frame, issuing draws back to front.

pub mod assets;
pub mod scene;

use glam::Vec2;

pub use assets::{AssetProvider, AssetRegistry, FrameSet, HeadlessAssets, SpriteId};
pub use scene::draw_world;

/// RGBA color in 0.0 - 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const RED: Color = Color::rgba(0.9, 0.15, 0.15, 1.0);
    pub const GREEN: Color = Color::rgba(0.2, 0.85, 0.3, 1.0);
    pub const CYAN: Color = Color::rgba(0.3, 0.8, 1.0, 1.0);
    pub const YELLOW: Color = Color::rgba(1.0, 0.85, 0.2, 1.0);
    pub const BACKDROP: Color = Color::rgba(0.0, 0.0, 0.0, 0.6);
}

/// Per-blit parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    pub scale: f32,
    pub alpha: f32,
    /// Clockwise, 0 = sprite's natural orientation
    pub rotation_deg: f32,
    /// Flip vertically (enemy-owned shots)
    pub flip_y: bool,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            alpha: 1.0,
            rotation_deg: 0.0,
            flip_y: false,
        }
    }
}

/// Host-provided drawing target
pub trait Surface {
    /// Blit `sprite` centered on `pos` (playfield coordinates)
    fn draw(&mut self, sprite: SpriteId, pos: Vec2, params: DrawParams);
    /// Filled axis-aligned rectangle by top-left corner
    fn fill_rect(&mut self, top_left: Vec2, size: Vec2, color: Color);
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Sprite {
        sprite: SpriteId,
        pos: Vec2,
        params: DrawParams,
    },
    Rect {
        top_left: Vec2,
        size: Vec2,
        color: Color,
    },
}

/// Keeps every draw call in order (headless runs and tests)
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn sprite_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Sprite { .. }))
            .count()
    }

    pub fn draws_of(&self, sprite: SpriteId) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Sprite { sprite: s, .. } if *s == sprite))
            .count()
    }
}

impl Surface for RecordingSurface {
    fn draw(&mut self, sprite: SpriteId, pos: Vec2, params: DrawParams) {
        self.commands.push(DrawCommand::Sprite {
            sprite,
            pos,
            params,
        });
    }

    fn fill_rect(&mut self, top_left: Vec2, size: Vec2, color: Color) {
        self.commands.push(DrawCommand::Rect {
            top_left,
            size,
            color,
        });
    }
}
