//! Collision primitives
//!
//! Everything on the playfield collides as an axis-aligned box, except
//! shields which use a circle (or an optional sprite mask).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};

/// Axis-aligned box stored as center + half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub center: Vec2,
    pub half: Vec2,
}

impl Rect {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size * 0.5,
        }
    }

    pub fn left(&self) -> f32 {
        self.center.x - self.half.x
    }

    pub fn right(&self) -> f32 {
        self.center.x + self.half.x
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.half.y
    }

    pub fn bottom(&self) -> f32 {
        self.center.y + self.half.y
    }

    pub fn size(&self) -> Vec2 {
        self.half * 2.0
    }

    /// Bottom edge midpoint, where enemies spawn their shots
    pub fn mid_bottom(&self) -> Vec2 {
        Vec2::new(self.center.x, self.bottom())
    }

    /// Overlap test; touching edges do not count
    pub fn overlaps(&self, other: &Rect) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = self.half + other.half;
        delta.x < reach.x && delta.y < reach.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let delta = (point - self.center).abs();
        delta.x <= self.half.x && delta.y <= self.half.y
    }

    /// True when the box lies entirely outside the playfield grown by `margin`
    pub fn outside_playfield(&self, margin: f32) -> bool {
        self.right() < -margin
            || self.left() > PLAYFIELD_WIDTH + margin
            || self.bottom() < -margin
            || self.top() > PLAYFIELD_HEIGHT + margin
    }
}

pub fn circle_contains(center: Vec2, radius: f32, point: Vec2) -> bool {
    center.distance_squared(point) <= radius * radius
}

/// Per-pixel opacity mask for sprite-accurate hit tests
#[derive(Debug, Clone, PartialEq)]
pub struct HitMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl HitMask {
    /// `bits` is row-major; returns None when the length does not match
    pub fn new(width: u32, height: u32, bits: Vec<bool>) -> Option<Self> {
        (bits.len() == (width * height) as usize).then_some(Self {
            width,
            height,
            bits,
        })
    }

    /// A filled disc, for shields without a custom mask
    pub fn disc(diameter: u32) -> Self {
        let r = diameter as f32 * 0.5;
        let bits = (0..diameter * diameter)
            .map(|i| {
                let x = (i % diameter) as f32 + 0.5 - r;
                let y = (i / diameter) as f32 + 0.5 - r;
                x * x + y * y <= r * r
            })
            .collect();
        Self {
            width: diameter,
            height: diameter,
            bits,
        }
    }

    /// Test `point` against the mask centered on `center`, scaled to `size`
    pub fn hit(&self, center: Vec2, size: Vec2, point: Vec2) -> bool {
        if size.x <= 0.0 || size.y <= 0.0 {
            return false;
        }
        let local = (point - center) / size + Vec2::splat(0.5);
        if !(0.0..1.0).contains(&local.x) || !(0.0..1.0).contains(&local.y) {
            return false;
        }
        let px = (local.x * self.width as f32) as u32;
        let py = (local.y * self.height as f32) as u32;
        self.bits
            .get((py * self.width + px) as usize)
            .copied()
            .unwrap_or(false)
    }
}
