//! Explosions: frame-animated effects with pooling and a frame cache
//!
//! Finished explosions go back to a pool and are reused by later spawns.
//! Scaled frame sequences are shared through a cache keyed by
//! (frame set, scale, frame count), so a thousand laser impacts share one.

use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;

use crate::consts::MAX_EXPLOSIONS;
use crate::renderer::assets::{FrameSet, FrameSetId, SpriteId};

/// Frames plus the draw scale they were prepared at
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    pub frames: Vec<SpriteId>,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameCacheKey {
    pub set: FrameSetId,
    pub scale_bits: u32,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct Explosion {
    pub pos: Vec2,
    frames: Rc<FrameSequence>,
    fps: f32,
    frame: usize,
    elapsed: f32,
    done: bool,
}

impl Explosion {
    pub fn new(pos: Vec2, frames: Rc<FrameSequence>, fps: f32) -> Self {
        let done = frames.frames.is_empty();
        Self {
            pos,
            frames,
            fps: fps.max(1.0),
            frame: 0,
            elapsed: 0.0,
            done,
        }
    }

    /// Reinitialize in place for reuse
    pub fn reset(&mut self, pos: Vec2, frames: Rc<FrameSequence>, fps: f32) {
        self.done = frames.frames.is_empty();
        self.pos = pos;
        self.frames = frames;
        self.fps = fps.max(1.0);
        self.frame = 0;
        self.elapsed = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        if self.done {
            return;
        }
        self.elapsed += dt;
        let step = 1.0 / self.fps;
        while self.elapsed >= step {
            self.elapsed -= step;
            self.frame += 1;
            if self.frame >= self.frames.frames.len() {
                self.done = true;
                return;
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn scale(&self) -> f32 {
        self.frames.scale
    }

    pub fn current_sprite(&self) -> Option<SpriteId> {
        if self.done {
            None
        } else {
            self.frames.frames.get(self.frame).copied()
        }
    }

    /// Playback position as 0..=1
    pub fn progress(&self) -> f32 {
        let len = self.frames.frames.len();
        if self.done || len == 0 {
            1.0
        } else {
            self.frame as f32 / len as f32
        }
    }

    fn shares_frames(&self, other: &Rc<FrameSequence>) -> bool {
        Rc::ptr_eq(&self.frames, other)
    }
}

#[derive(Debug, Clone)]
pub struct ExplosionManager {
    active: Vec<Explosion>,
    pool: Vec<Explosion>,
    capacity: usize,
    cache: HashMap<FrameCacheKey, Rc<FrameSequence>>,
    recycled: u64,
}

impl Default for ExplosionManager {
    fn default() -> Self {
        Self::new(MAX_EXPLOSIONS)
    }
}

impl ExplosionManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            active: Vec::new(),
            pool: Vec::new(),
            capacity: capacity.max(1),
            cache: HashMap::new(),
            recycled: 0,
        }
    }

    /// Shared, scaled frames for `set`, optionally cut to the first `keep`
    pub fn frames_for(&mut self, set: &FrameSet, scale: f32, keep: Option<usize>) -> Rc<FrameSequence> {
        let count = keep.map_or(set.len(), |k| k.min(set.len()));
        let key = FrameCacheKey {
            set: set.id,
            scale_bits: scale.to_bits(),
            count,
        };
        self.cache
            .entry(key)
            .or_insert_with(|| {
                Rc::new(FrameSequence {
                    frames: set.frames[..count].to_vec(),
                    scale,
                })
            })
            .clone()
    }

    /// Start an explosion; at capacity the first finished (else the most
    /// advanced) explosion is reused in place
    pub fn spawn(&mut self, pos: Vec2, set: &FrameSet, scale: f32, fps: f32, keep: Option<usize>) {
        let frames = self.frames_for(set, scale, keep);
        if self.active.len() >= self.capacity {
            let slot = self
                .active
                .iter()
                .position(Explosion::is_done)
                .or_else(|| {
                    self.active
                        .iter()
                        .enumerate()
                        .max_by(|a, b| a.1.progress().total_cmp(&b.1.progress()))
                        .map(|(i, _)| i)
                })
                .unwrap_or(0);
            self.active[slot].reset(pos, frames, fps);
            self.recycled += 1;
            log::trace!("Explosion limit reached, recycled slot {slot}");
            return;
        }
        match self.pool.pop() {
            Some(mut explosion) => {
                explosion.reset(pos, frames, fps);
                self.active.push(explosion);
            }
            None => self.active.push(Explosion::new(pos, frames, fps)),
        }
    }

    pub fn update(&mut self, dt: f32) {
        for explosion in &mut self.active {
            explosion.update(dt);
        }
        let mut i = 0;
        while i < self.active.len() {
            if self.active[i].is_done() {
                let finished = self.active.swap_remove(i);
                if self.pool.len() < self.capacity {
                    self.pool.push(finished);
                }
            } else {
                i += 1;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Explosion> {
        self.active.iter()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Spawns that had to steal a live slot
    pub fn recycled(&self) -> u64 {
        self.recycled
    }

    /// Explosions currently sharing the cached sequence
    pub fn sharing(&self, frames: &Rc<FrameSequence>) -> usize {
        self.active.iter().filter(|e| e.shares_frames(frames)).count()
    }

    pub fn clear(&mut self) {
        self.pool.extend(self.active.drain(..));
        self.pool.truncate(self.capacity);
    }
}
