//! Platform abstraction layer
//!
//! Handles host-side concerns the simulation never sees:
//! - Keyboard state
//! - Frame timing (fixed-step accumulator)

pub mod input;
pub mod timestep;

pub use input::{InputSnapshot, Key};
pub use timestep::FixedStepper;
