//! Read-only per-tick view for renderers and HUDs
//!
//! A snapshot is a copy; nothing a renderer does to it reaches the
//! simulation.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Bumper, Target};
use super::state::{Body, Flipper, SessionState, Side};

/// Flipper pose for drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlipperView {
    pub side: Side,
    pub pivot: DVec2,
    pub tip: DVec2,
    pub angle: f64,
}

impl From<&Flipper> for FlipperView {
    fn from(flipper: &Flipper) -> Self {
        Self {
            side: flipper.side,
            pivot: flipper.pivot,
            tip: flipper.tip(),
            angle: flipper.angle,
        }
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ticks simulated since the last reset
    pub tick: u64,
    pub session: SessionState,
    pub bodies: Vec<Body>,
    /// `pulse` drives glow intensity
    pub bumpers: Vec<Bumper>,
    pub targets: Vec<Target>,
    pub flippers: Vec<FlipperView>,
    pub plunger_charge: f64,
}

impl Snapshot {
    /// Plunger charge as a 0..1 fraction of `max`
    pub fn plunger_fraction(&self, max: f64) -> f64 {
        if max <= 0.0 {
            0.0
        } else {
            (self.plunger_charge / max).clamp(0.0, 1.0)
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
