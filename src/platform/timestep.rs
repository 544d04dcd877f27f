//! Fixed-step accumulator
//!
//! Wall-clock frame time goes in, a whole number of physics steps comes out.
//! The fractional remainder carries into the next frame. A stall longer
//! than the step cap can cover is dropped instead of replayed.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

#[derive(Debug, Clone, PartialEq)]
pub struct FixedStepper {
    step: f32,
    max_substeps: u32,
    max_frame_dt: f32,
    accumulator: f32,
    dropped_s: f32,
}

impl Default for FixedStepper {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_SUBSTEPS, MAX_FRAME_DT)
    }
}

impl FixedStepper {
    pub fn new(step: f32, max_substeps: u32, max_frame_dt: f32) -> Self {
        Self {
            step,
            max_substeps: max_substeps.max(1),
            max_frame_dt,
            accumulator: 0.0,
            dropped_s: 0.0,
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Time waiting for the next step
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Total backlog discarded after stalls
    pub fn dropped_s(&self) -> f32 {
        self.dropped_s
    }

    /// Interpolation factor between the last two physics states
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Feed one frame's elapsed time; returns the number of physics steps to run
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }
        self.accumulator += frame_dt.min(self.max_frame_dt);

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_substeps {
            self.accumulator -= self.step;
            steps += 1;
        }
        // Still behind after the cap: drop the backlog (spiral-of-death guard)
        if self.accumulator >= self.step {
            self.dropped_s += self.accumulator;
            log::debug!("Frame stall, dropping {:.3}s of simulation", self.accumulator);
            self.accumulator = 0.0;
        }
        steps
    }
}
