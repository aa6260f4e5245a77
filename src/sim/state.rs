//! Simulation entities and session bookkeeping

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::move_towards;

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Before `start()`, after `reset()`, or paused mid-game
    Paused,
    /// Ticks advance the simulation
    Playing,
    /// Final level cleared (terminal until reset)
    Won,
    /// Last life drained (terminal until reset)
    Lost,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Won | GameStatus::Lost)
    }
}

/// Score, lives, level and status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub score: u64,
    pub lives: u32,
    /// 1-based
    pub level: u32,
    pub status: GameStatus,
}

impl SessionState {
    pub fn new(lives: u32) -> Self {
        Self {
            score: 0,
            lives,
            level: 1,
            status: GameStatus::Paused,
        }
    }
}

/// A simulated ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: u32,
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
    /// Riding the launch lane this tick; set by the integrator
    #[serde(default)]
    pub in_lane: bool,
}

impl Body {
    pub fn new(id: u32, pos: DVec2, radius: f64) -> Self {
        Self {
            id,
            pos,
            vel: DVec2::ZERO,
            radius,
            in_lane: false,
        }
    }

    pub fn speed(&self) -> f64 {
        self.vel.length()
    }
}

/// Which side of the table a flipper sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Mirror factor applied to the x axis
    pub fn sign(&self) -> f64 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

/// A player-actuated rotating segment
///
/// `angle` is measured in screen space (positive rotates the tip downward)
/// and mirrored in x for the right flipper, so both sides share the same
/// rest and extended angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flipper {
    pub side: Side,
    pub pivot: DVec2,
    pub length: f64,
    pub angle: f64,
    pub target_angle: f64,
    pub rest_angle: f64,
    pub extended_angle: f64,
}

impl Flipper {
    pub fn new(side: Side, pivot: DVec2, length: f64, rest_angle: f64, extended_angle: f64) -> Self {
        Self {
            side,
            pivot,
            length,
            angle: rest_angle,
            target_angle: rest_angle,
            rest_angle,
            extended_angle,
        }
    }

    /// Input hook: pressed chases the extended angle, released the rest angle
    pub fn set_pressed(&mut self, pressed: bool) {
        self.target_angle = if pressed {
            self.extended_angle
        } else {
            self.rest_angle
        };
    }

    pub fn is_pressed(&self) -> bool {
        self.target_angle == self.extended_angle
    }

    /// Chase `target_angle` by at most `max_step` radians
    pub fn update(&mut self, max_step: f64) {
        self.angle = move_towards(self.angle, self.target_angle, max_step);
    }

    /// Unit vector from pivot to tip
    pub fn axis(&self) -> DVec2 {
        DVec2::new(self.side.sign() * self.angle.cos(), self.angle.sin())
    }

    pub fn tip(&self) -> DVec2 {
        self.pivot + self.axis() * self.length
    }

    /// Remaining travel toward the target; zero when at rest
    pub fn angular_velocity(&self) -> f64 {
        self.target_angle - self.angle
    }

    /// Direction the flipper surface is sweeping, or zero at rest
    pub fn sweep_direction(&self) -> DVec2 {
        let omega = self.angular_velocity();
        if omega == 0.0 {
            return DVec2::ZERO;
        }
        // d(axis)/d(angle), oriented by the direction of rotation
        let tangent = DVec2::new(-self.side.sign() * self.angle.sin(), self.angle.cos());
        tangent * omega.signum()
    }

    /// Rotating toward the extended position (the only motion that boosts)
    pub fn is_flipping_up(&self) -> bool {
        self.is_pressed() && self.angle != self.target_angle
    }
}

/// Launch plunger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plunger {
    /// Stored charge, `0..=max`
    pub charge: f64,
    /// Launch input state
    pub held: bool,
}

impl Plunger {
    /// Accumulate charge while held, clamped to `max`
    pub fn charge(&mut self, rate: f64, max: f64, dt: f64) {
        self.charge = (self.charge + rate * dt).min(max);
    }

    /// Take the stored charge and reset to zero
    pub fn release(&mut self) -> f64 {
        std::mem::take(&mut self.charge)
    }
}

/// Something gameplay-relevant that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BumperHit { bumper: usize, points: u64 },
    TargetLit { target: usize, points: u64 },
    LevelAdvanced { level: u32, bonus: u64 },
    BumperAdded { bumper: usize },
    Launched { body: u32, speed: f64 },
    /// A ball left play; a life is only lost when it was the last one
    BallDrained { body: u32 },
    LifeLost { lives_left: u32 },
    Won { score: u64 },
    Lost { score: u64 },
}
