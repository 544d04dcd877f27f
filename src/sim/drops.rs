//! Weighted power-up drop table
//!
//! Entries are sorted by chance (highest first) and accumulated. A uniform
//! roll above the accumulated total means no drop; otherwise the first
//! entry whose running total covers the roll wins.

use rand::Rng;

use super::powerup::PowerUpKind;
use crate::tuning::Tuning;

/// Slack for summed chances such as 0.15 + 0.08 landing just under 0.23
const ROLL_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropEntry {
    pub kind: PowerUpKind,
    pub chance: f64,
    pub cumulative: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropCalculator {
    table: Vec<DropEntry>,
    total: f64,
}

impl DropCalculator {
    pub fn new(chances: impl IntoIterator<Item = (PowerUpKind, f64)>) -> Self {
        let mut sorted: Vec<(PowerUpKind, f64)> = chances
            .into_iter()
            .filter(|(_, chance)| *chance > 0.0)
            .collect();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut cumulative = 0.0;
        let table = sorted
            .into_iter()
            .map(|(kind, chance)| {
                cumulative += chance;
                DropEntry {
                    kind,
                    chance,
                    cumulative,
                }
            })
            .collect();
        Self {
            table,
            total: cumulative,
        }
    }

    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(
            PowerUpKind::ALL
                .iter()
                .map(|kind| (*kind, tuning.powerup(*kind).drop_chance)),
        )
    }

    pub fn entries(&self) -> &[DropEntry] {
        &self.table
    }

    /// Probability that a roll yields anything
    pub fn total_chance(&self) -> f64 {
        self.total
    }

    /// Map a roll in [0, 1) onto the table. Boundaries are inclusive up to
    /// float rounding of the running sums.
    pub fn pick(&self, roll: f64) -> Option<PowerUpKind> {
        if self.table.is_empty() || roll > self.total + ROLL_EPSILON {
            return None;
        }
        self.table
            .iter()
            .find(|entry| roll <= entry.cumulative + ROLL_EPSILON)
            .map(|entry| entry.kind)
    }

    pub fn roll(&self, rng: &mut impl Rng) -> Option<PowerUpKind> {
        self.pick(rng.random::<f64>())
    }
}
