//! Physics and scoring tuning
//!
//! All numbers that shape the feel of a table live here. Values are tuned
//! constants, not material properties. Loaded from JSON so tables can be
//! rebalanced without a rebuild; missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TuningError;

/// Tuned physics, actuator and scoring constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Integrator ===
    /// Downward acceleration (pixels per tick²)
    pub gravity: f64,
    /// Multiplicative velocity decay per tick
    pub friction: f64,

    // === Collision response ===
    /// Fraction of normal velocity kept after a wall or flipper bounce
    pub bounciness: f64,
    /// Bumpers never send the ball away slower than this (pixels per tick)
    pub min_boost_speed: f64,
    /// Gap left between ball and bumper after push-out
    pub bumper_separation: f64,
    /// Vertical velocity factor on first contact with an unlit target
    pub target_damping: f64,
    /// Extra contact thickness around flipper segments
    pub collision_margin: f64,

    // === Flippers ===
    /// Max angular step per tick (radians)
    pub flipper_step: f64,
    /// Outbound speed per radian of remaining flipper travel
    pub flipper_gain: f64,
    /// Angle while released (radians, positive points down)
    pub flipper_rest_angle: f64,
    /// Angle while pressed
    pub flipper_extended_angle: f64,

    // === Plunger ===
    /// Charge gained per tick while held
    pub plunger_charge_rate: f64,
    /// Charge cap (also the top launch speed)
    pub plunger_max: f64,

    // === Scoring / session ===
    /// Ticks a bumper glows after a hit
    pub pulse_frames: u32,
    /// Points for clearing all targets
    pub level_bonus: u64,
    /// Clearing this level wins the game
    pub max_level: u32,
    pub starting_lives: u32,
    /// How far below the table a ball must fall to count as lost
    pub loss_margin: f64,

    // === Table ===
    pub ball_radius: f64,
    pub table_width: f64,
    pub table_height: f64,
    /// Seed for scene growth between levels
    pub seed: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.15,
            friction: 0.995,

            bounciness: 0.7,
            min_boost_speed: 6.0,
            bumper_separation: 1.0,
            target_damping: 0.5,
            collision_margin: 2.0,

            flipper_step: 0.2,
            flipper_gain: 6.0,
            flipper_rest_angle: 0.5,
            flipper_extended_angle: -0.5,

            plunger_charge_rate: 0.5,
            plunger_max: 22.0,

            pulse_frames: PULSE_FRAMES,
            level_bonus: 1000,
            max_level: 3,
            starting_lives: 3,
            loss_margin: 20.0,

            ball_radius: BALL_RADIUS,
            table_width: TABLE_WIDTH,
            table_height: TABLE_HEIGHT,
            seed: 0x5EED,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!(
            "Loaded tuning: gravity={} friction={} bounciness={}",
            tuning.gravity,
            tuning.friction,
            tuning.bounciness
        );
        Ok(tuning)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> String {
        // Plain struct of numbers; serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let finite = [
            ("gravity", self.gravity),
            ("friction", self.friction),
            ("bounciness", self.bounciness),
            ("min_boost_speed", self.min_boost_speed),
            ("bumper_separation", self.bumper_separation),
            ("target_damping", self.target_damping),
            ("collision_margin", self.collision_margin),
            ("flipper_step", self.flipper_step),
            ("flipper_gain", self.flipper_gain),
            ("flipper_rest_angle", self.flipper_rest_angle),
            ("flipper_extended_angle", self.flipper_extended_angle),
            ("plunger_charge_rate", self.plunger_charge_rate),
            ("plunger_max", self.plunger_max),
            ("loss_margin", self.loss_margin),
            ("ball_radius", self.ball_radius),
            ("table_width", self.table_width),
            ("table_height", self.table_height),
        ];
        if let Some((field, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(TuningError::invalid(field, "must be finite"));
        }

        if self.friction <= 0.0 || self.friction > 1.0 {
            return Err(TuningError::invalid("friction", "must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.bounciness) {
            return Err(TuningError::invalid("bounciness", "must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.target_damping) {
            return Err(TuningError::invalid("target_damping", "must be in [0, 1]"));
        }
        if self.min_boost_speed < 0.0 {
            return Err(TuningError::invalid("min_boost_speed", "must not be negative"));
        }
        if self.flipper_step <= 0.0 {
            return Err(TuningError::invalid("flipper_step", "must be positive"));
        }
        if self.plunger_max < 0.0 || self.plunger_charge_rate < 0.0 {
            return Err(TuningError::invalid("plunger_max", "plunger values must not be negative"));
        }
        if self.ball_radius <= 0.0 {
            return Err(TuningError::invalid("ball_radius", "must be positive"));
        }
        // Table must fit the lane and the flipper gap with room to spare
        if self.table_width < self.ball_radius * 20.0 || self.table_height < self.ball_radius * 20.0
        {
            return Err(TuningError::invalid("table_width", "table too small for the ball"));
        }
        if self.max_level == 0 {
            return Err(TuningError::invalid("max_level", "must be at least 1"));
        }
        if self.starting_lives == 0 {
            return Err(TuningError::invalid("starting_lives", "must be at least 1"));
        }
        Ok(())
    }
}
