//! Flipper Sim - a fixed-step physics core for pinball-style tables
//!
//! Core modules:
//! - `sim`: Simulation (integration, collisions, scoring, session state)
//! - `frame_loop`: Host-agnostic fixed-step scheduler
//! - `tuning`: Data-driven physics and scoring constants
//! - `error`: Configuration errors

pub mod error;
pub mod frame_loop;
pub mod sim;
pub mod tuning;

pub use error::TuningError;
pub use frame_loop::{FrameLoop, FrameOutcome, StepPolicy};
pub use sim::{GameEvent, GameStatus, Side, Simulation, Snapshot};
pub use tuning::Tuning;

/// Simulation configuration constants
pub mod consts {
    /// Length of one fixed simulation step in seconds (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// `dt` passed to `Simulation::tick` for one nominal step
    pub const TICK_DT: f64 = 1.0;
    /// Maximum substeps per frame in catch-up mode
    pub const MAX_SUBSTEPS: u32 = 5;
    /// Largest frame gap fed into the accumulator (seconds)
    pub const MAX_FRAME_GAP: f64 = 0.25;

    /// Table dimensions
    pub const TABLE_WIDTH: f64 = 400.0;
    pub const TABLE_HEIGHT: f64 = 600.0;

    /// Ball defaults
    pub const BALL_RADIUS: f64 = 10.0;

    /// Hit feedback length for bumpers (ticks)
    pub const PULSE_FRAMES: u32 = 12;

    /// Below this, lengths and distances count as zero
    pub const GEOM_EPSILON: f64 = 1e-9;
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn move_towards(current: f64, target: f64, max_delta: f64) -> f64 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(delta)
    }
}
