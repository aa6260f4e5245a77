//! Scene geometry: static colliders and the classic table layout
//!
//! Screen space, y grows downward. Wall normals point into the playable
//! region.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::state::{Flipper, Side};
use crate::tuning::Tuning;

/// Axis-aligned half-plane boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AxisWall {
    /// Solid where `x < k`
    Left(f64),
    /// Solid where `x > k`
    Right(f64),
    /// Solid where `y < k`
    Top(f64),
}

/// Angled boundary given by an anchor and a unit normal
///
/// Without an extent it is an unbounded half-plane (corner cuts). With
/// `half_extent` it only applies where the body projects within that
/// distance of the anchor along the wall (guide rails, lane divider).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlantedWall {
    pub anchor: DVec2,
    pub normal: DVec2,
    pub half_extent: Option<f64>,
}

impl SlantedWall {
    /// Unbounded wall; `normal` need not be unit length
    pub fn new(anchor: DVec2, normal: DVec2) -> Self {
        Self {
            anchor,
            normal: normal.normalize_or_zero(),
            half_extent: None,
        }
    }

    /// Wall through `a` and `b`, facing `inside`
    pub fn through(a: DVec2, b: DVec2, inside: DVec2, bounded: bool) -> Self {
        let anchor = (a + b) * 0.5;
        let along = b - a;
        let mut normal = along.perp().normalize_or_zero();
        if normal.dot(inside - anchor) < 0.0 {
            normal = -normal;
        }
        Self {
            anchor,
            normal,
            half_extent: bounded.then(|| along.length() * 0.5),
        }
    }

    /// Signed distance of `p` from the wall line (positive on the open side)
    pub fn signed_distance(&self, p: DVec2) -> f64 {
        (p - self.anchor).dot(self.normal)
    }

    /// Whether `p` lies within the wall's extent along its tangent
    pub fn spans(&self, p: DVec2) -> bool {
        match self.half_extent {
            None => true,
            Some(h) => (p - self.anchor).dot(self.normal.perp()).abs() <= h,
        }
    }
}

/// Circular pop bumper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bumper {
    pub pos: DVec2,
    pub radius: f64,
    pub points: u64,
    /// Ticks of hit glow left
    pub pulse: u32,
}

impl Bumper {
    pub fn new(pos: DVec2, radius: f64, points: u64) -> Self {
        Self {
            pos,
            radius,
            points,
            pulse: 0,
        }
    }

    pub fn decay_pulse(&mut self) {
        self.pulse = self.pulse.saturating_sub(1);
    }
}

/// Rectangular drop target, lit once per level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Top-left corner
    pub pos: DVec2,
    pub size: DVec2,
    pub lit: bool,
    pub points: u64,
}

impl Target {
    pub fn new(pos: DVec2, size: DVec2, points: u64) -> Self {
        Self {
            pos,
            size,
            lit: false,
            points,
        }
    }

    /// Closest point of the rectangle to `p`
    pub fn closest_point(&self, p: DVec2) -> DVec2 {
        p.clamp(self.pos, self.pos + self.size)
    }
}

/// Plunger channel on the right edge of the table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchLane {
    pub x_min: f64,
    pub x_max: f64,
    /// Top of the channel; above this a ball is in free play
    pub exit_y: f64,
    /// Ball centre height when resting on the plunger
    pub rest_y: f64,
}

impl LaunchLane {
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.exit_y
    }

    pub fn rest_position(&self) -> DVec2 {
        DVec2::new((self.x_min + self.x_max) * 0.5, self.rest_y)
    }
}

/// Static colliders of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub walls: Vec<AxisWall>,
    pub slants: Vec<SlantedWall>,
    /// Grows by one on some level transitions, never shrinks mid-level
    pub bumpers: Vec<Bumper>,
    pub targets: Vec<Target>,
    pub lane: LaunchLane,
}

/// Flipper length on the classic table
pub const FLIPPER_LENGTH: f64 = 70.0;
/// Horizontal offset of each pivot from the playfield centre
const FLIPPER_PIVOT_OFFSET: f64 = 100.0;
/// Pivot height above the bottom edge
const FLIPPER_PIVOT_RISE: f64 = 80.0;

impl Scene {
    /// Three bumpers, three targets, corner cuts, guide rails and a
    /// right-hand launch lane, scaled to the tuning's table size.
    pub fn classic(tuning: &Tuning) -> Self {
        let w = tuning.table_width;
        let h = tuning.table_height;
        let r = tuning.ball_radius;

        let lane_width = 2.0 * r + 8.0;
        let lane = LaunchLane {
            x_min: w - lane_width,
            x_max: w,
            exit_y: h * 0.2,
            rest_y: h - 4.0 * r,
        };
        let play_w = lane.x_min;
        let cx = play_w * 0.5;
        let centre = DVec2::new(cx, h * 0.5);
        let corner = w * 0.225;
        let (left_pivot, right_pivot) = flipper_pivots(tuning);
        let rail_top = left_pivot.y - FLIPPER_PIVOT_OFFSET + 10.0;

        let slants = vec![
            // Top corners
            SlantedWall::through(DVec2::new(w - corner, 0.0), DVec2::new(w, corner), centre, false),
            SlantedWall::through(DVec2::new(0.0, corner), DVec2::new(corner, 0.0), centre, false),
            // Lane divider
            SlantedWall::through(
                DVec2::new(lane.x_min, lane.exit_y),
                DVec2::new(lane.x_min, h),
                centre,
                true,
            ),
            // Guide rails into the flippers
            SlantedWall::through(DVec2::new(0.0, rail_top), left_pivot, centre, true),
            SlantedWall::through(DVec2::new(play_w, rail_top), right_pivot, centre, true),
        ];

        let bumpers = vec![
            Bumper::new(DVec2::new(cx, h * 0.25), 25.0, 100),
            Bumper::new(DVec2::new(cx - 70.0, h * 0.38), 25.0, 100),
            Bumper::new(DVec2::new(cx + 70.0, h * 0.38), 25.0, 100),
        ];

        let target_size = DVec2::new(30.0, 10.0);
        let targets = [-90.0, -15.0, 60.0]
            .iter()
            .map(|dx| Target::new(DVec2::new(cx + dx, h * 0.62), target_size, 250))
            .collect();

        Self {
            width: w,
            height: h,
            walls: vec![AxisWall::Left(0.0), AxisWall::Right(w), AxisWall::Top(0.0)],
            slants,
            bumpers,
            targets,
            lane,
        }
    }

    /// Whether a new bumper at `pos` would crowd existing colliders
    pub fn is_clear(&self, pos: DVec2, radius: f64, clearance: f64) -> bool {
        let bumpers_clear = self
            .bumpers
            .iter()
            .all(|b| b.pos.distance(pos) > b.radius + radius + clearance);
        let targets_clear = self
            .targets
            .iter()
            .all(|t| t.closest_point(pos).distance(pos) > radius + clearance);
        bumpers_clear && targets_clear && !self.lane.contains(pos)
    }

    /// Whether every target is lit (false for a table without targets)
    pub fn all_targets_lit(&self) -> bool {
        !self.targets.is_empty() && self.targets.iter().all(|t| t.lit)
    }
}

fn flipper_pivots(tuning: &Tuning) -> (DVec2, DVec2) {
    let w = tuning.table_width;
    let h = tuning.table_height;
    let lane_width = 2.0 * tuning.ball_radius + 8.0;
    let cx = (w - lane_width) * 0.5;
    let y = h - FLIPPER_PIVOT_RISE;
    (
        DVec2::new(cx - FLIPPER_PIVOT_OFFSET, y),
        DVec2::new(cx + FLIPPER_PIVOT_OFFSET, y),
    )
}

/// Left and right flippers matching [`Scene::classic`]
pub fn classic_flippers(tuning: &Tuning) -> Vec<Flipper> {
    let (left, right) = flipper_pivots(tuning);
    [(Side::Left, left), (Side::Right, right)]
        .into_iter()
        .map(|(side, pivot)| {
            Flipper::new(
                side,
                pivot,
                FLIPPER_LENGTH,
                tuning.flipper_rest_angle,
                tuning.flipper_extended_angle,
            )
        })
        .collect()
}
