//! Game clock
//!
//! Time only advances when the simulation steps, so pausing freezes every
//! cooldown, lifetime and homing delay that is measured against it.

use serde::{Deserialize, Serialize};

use crate::consts::SIM_DT_MS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GameClock {
    now_ms: f64,
    ticks: u64,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one physics tick
    pub fn tick(&mut self) {
        self.ticks += 1;
        self.now_ms += SIM_DT_MS;
    }

    /// Milliseconds of simulated time since the run started
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Milliseconds elapsed since `earlier`
    pub fn since(&self, earlier: f64) -> f64 {
        self.now_ms - earlier
    }
}
