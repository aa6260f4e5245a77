//! Gravity and friction integration

use super::geometry::LaunchLane;
use super::state::Body;
use crate::tuning::Tuning;

/// Advance one body by `dt` ticks
///
/// Outside the launch lane: damp velocity by `friction`, add gravity, then
/// move. Inside the lane forces are suspended and the ball only coasts
/// vertically along the channel; the lane floor catches it at the rest
/// height.
///
/// A free ball joins the lane only through its open top. One that crosses
/// the divider from the playfield stays free and is pushed back by the
/// collision pass.
pub fn integrate(body: &mut Body, lane: &LaunchLane, tuning: &Tuning, dt: f64) {
    if lane.contains(body.pos) {
        body.in_lane = true;
        body.pos.x = lane.rest_position().x;
        body.vel.x = 0.0;
        body.pos.y += body.vel.y * dt;
        if body.pos.y >= lane.rest_y {
            body.pos.y = lane.rest_y;
            body.vel = glam::DVec2::ZERO;
        }
        return;
    }

    let from_x = body.pos.x;
    body.vel *= tuning.friction.powf(dt);
    body.vel.y += tuning.gravity * dt;
    body.pos += body.vel * dt;
    body.in_lane = lane.contains(body.pos) && from_x >= lane.x_min;
}

/// Whether a body sits still on the plunger
pub fn is_resting_in_lane(body: &Body, lane: &LaunchLane) -> bool {
    lane.contains(body.pos) && body.pos.y >= lane.rest_y && body.vel == glam::DVec2::ZERO
}
