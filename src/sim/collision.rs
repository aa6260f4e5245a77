//! Collision detection and response
//!
//! One ball is tested against every collider each tick, in a fixed order:
//! walls, slanted walls, flippers, bumpers, targets. Every collider that
//! overlaps applies its correction; corrections are additive and there is
//! no early exit. Degenerate geometry (zero-length segments, coincident
//! centres) counts as a miss so no NaN can reach the body.

use glam::DVec2;

use super::geometry::{AxisWall, Bumper, Scene, SlantedWall, Target};
use super::state::{Body, Flipper};
use crate::consts::GEOM_EPSILON;
use crate::tuning::Tuning;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal at collision (pointing toward ball center)
    pub normal: DVec2,
    /// Penetration depth (for position correction)
    pub penetration: f64,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: DVec2::ZERO,
            penetration: 0.0,
        }
    }

    fn contact(normal: DVec2, penetration: f64) -> Self {
        Self {
            hit: true,
            normal,
            penetration,
        }
    }
}

/// A collider the resolver visits, tagged by kind and index into the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collider {
    Wall(usize),
    SlantedWall(usize),
    Flipper(usize),
    Bumper(usize),
    Target(usize),
}

/// A scoring hook raised by the resolver, applied by the scoring layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Bumper(usize),
    Target(usize),
}

/// All colliders of a scene in resolution order
pub fn colliders(scene: &Scene, flippers: &[Flipper]) -> Vec<Collider> {
    (0..scene.walls.len())
        .map(Collider::Wall)
        .chain((0..scene.slants.len()).map(Collider::SlantedWall))
        .chain((0..flippers.len()).map(Collider::Flipper))
        .chain((0..scene.bumpers.len()).map(Collider::Bumper))
        .chain((0..scene.targets.len()).map(Collider::Target))
        .collect()
}

/// Resolve one ball against the whole scene, returning scoring triggers
///
/// Balls the integrator placed in the launch lane are left alone; the lane
/// is a mechanical channel handled by the plunger. A ball that only crossed
/// the divider is still resolved, so the divider pushes it back out.
pub fn resolve(body: &mut Body, scene: &Scene, flippers: &[Flipper], tuning: &Tuning) -> Vec<Trigger> {
    let mut triggers = Vec::new();
    if body.in_lane {
        return triggers;
    }

    for collider in colliders(scene, flippers) {
        match collider {
            Collider::Wall(i) => {
                let contact = ball_axis_wall_collision(body.pos, body.radius, &scene.walls[i]);
                if contact.hit {
                    push_out(body, &contact);
                    body.vel = reflect_with_restitution(body.vel, contact.normal, tuning.bounciness);
                }
            }
            Collider::SlantedWall(i) => {
                let contact = ball_slant_collision(body.pos, body.radius, &scene.slants[i]);
                if contact.hit {
                    push_out(body, &contact);
                    body.vel = reflect_with_restitution(body.vel, contact.normal, tuning.bounciness);
                }
            }
            Collider::Flipper(i) => {
                resolve_flipper(body, &flippers[i], tuning);
            }
            Collider::Bumper(i) => {
                if resolve_bumper(body, &scene.bumpers[i], tuning) {
                    triggers.push(Trigger::Bumper(i));
                }
            }
            Collider::Target(i) => {
                let target = &scene.targets[i];
                if !target.lit && ball_rect_overlap(body.pos, body.radius, target) {
                    // Soft contact: no push-out, no reflection
                    body.vel.y *= tuning.target_damping;
                    triggers.push(Trigger::Target(i));
                }
            }
        }
    }

    triggers
}

fn push_out(body: &mut Body, contact: &CollisionResult) {
    body.pos += contact.normal * contact.penetration;
}

/// Flipper response: reflect with restitution, then add the sweep boost
///
/// Unlike walls, the whole reflected velocity (tangent included) is scaled
/// by `bounciness`, so a resting flipper always takes energy out. A ball
/// pressed onto a resting flipper therefore slides slowly. Returns whether
/// the ball touched the flipper.
pub fn resolve_flipper(body: &mut Body, flipper: &Flipper, tuning: &Tuning) -> bool {
    let contact = ball_segment_collision(
        body.pos,
        body.radius + tuning.collision_margin,
        flipper.pivot,
        flipper.tip(),
    );
    if !contact.hit {
        return false;
    }

    push_out(body, &contact);
    if body.vel.dot(contact.normal) < 0.0 {
        body.vel = reflect_velocity(body.vel, contact.normal) * tuning.bounciness;
    }

    // Only the face sweeping toward the ball while flipping up pushes it
    if flipper.is_flipping_up() && flipper.sweep_direction().dot(contact.normal) > 0.0 {
        body.vel += contact.normal * flipper.angular_velocity().abs() * tuning.flipper_gain;
    }
    true
}

/// Bumper response: push out along the centre line and kick
///
/// Outbound speed is never below `min_boost_speed`. Returns whether the
/// bumper was hit.
pub fn resolve_bumper(body: &mut Body, bumper: &Bumper, tuning: &Tuning) -> bool {
    let contact = ball_circle_collision(body.pos, body.radius, bumper.pos, bumper.radius);
    if !contact.hit {
        return false;
    }

    body.pos = bumper.pos + contact.normal * (bumper.radius + body.radius + tuning.bumper_separation);
    let speed = body.speed().max(tuning.min_boost_speed);
    body.vel = contact.normal * speed;
    true
}

/// Check a ball against an axis-aligned half-plane
pub fn ball_axis_wall_collision(ball_pos: DVec2, ball_radius: f64, wall: &AxisWall) -> CollisionResult {
    match *wall {
        AxisWall::Left(k) if ball_pos.x - ball_radius < k => {
            CollisionResult::contact(DVec2::X, k + ball_radius - ball_pos.x)
        }
        AxisWall::Right(k) if ball_pos.x + ball_radius > k => {
            CollisionResult::contact(DVec2::NEG_X, ball_pos.x + ball_radius - k)
        }
        AxisWall::Top(k) if ball_pos.y - ball_radius < k => {
            CollisionResult::contact(DVec2::Y, k + ball_radius - ball_pos.y)
        }
        _ => CollisionResult::miss(),
    }
}

/// Check a ball against a slanted wall (any depth past the line counts)
pub fn ball_slant_collision(ball_pos: DVec2, ball_radius: f64, wall: &SlantedWall) -> CollisionResult {
    if wall.normal == DVec2::ZERO || !wall.spans(ball_pos) {
        return CollisionResult::miss();
    }
    let dist = wall.signed_distance(ball_pos);
    if dist >= ball_radius {
        return CollisionResult::miss();
    }
    CollisionResult::contact(wall.normal, ball_radius - dist)
}

/// Check a ball against a circle
pub fn ball_circle_collision(ball_pos: DVec2, ball_radius: f64, center: DVec2, radius: f64) -> CollisionResult {
    let delta = ball_pos - center;
    let dist = delta.length();
    let reach = ball_radius + radius;
    if dist >= reach || dist < GEOM_EPSILON {
        return CollisionResult::miss();
    }
    CollisionResult::contact(delta / dist, reach - dist)
}

/// Check a ball against a line segment from `a` to `b`
///
/// Closest point by clamped projection. A zero-length segment or a ball
/// centred exactly on the segment is a miss.
pub fn ball_segment_collision(ball_pos: DVec2, ball_radius: f64, a: DVec2, b: DVec2) -> CollisionResult {
    let seg = b - a;
    let len_sq = seg.length_squared();
    if len_sq < GEOM_EPSILON {
        return CollisionResult::miss();
    }

    let t = ((ball_pos - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    let closest = a + seg * t;
    let delta = ball_pos - closest;
    let dist = delta.length();
    if dist >= ball_radius || dist < GEOM_EPSILON {
        return CollisionResult::miss();
    }
    CollisionResult::contact(delta / dist, ball_radius - dist)
}

/// Circle vs axis-aligned rectangle overlap (closest-point clamp)
pub fn ball_rect_overlap(ball_pos: DVec2, ball_radius: f64, target: &Target) -> bool {
    target.closest_point(ball_pos).distance_squared(ball_pos) < ball_radius * ball_radius
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: DVec2, normal: DVec2) -> DVec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Reverse the normal component scaled by `bounciness`, keep the tangent
///
/// Only applies while moving into the surface.
#[inline]
pub fn reflect_with_restitution(velocity: DVec2, normal: DVec2, bounciness: f64) -> DVec2 {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return velocity;
    }
    velocity - (1.0 + bounciness) * vn * normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geometry::LaunchLane;
    use crate::sim::integrator::integrate;
    use crate::sim::state::Side;
    use proptest::prelude::*;

    fn body_at(x: f64, y: f64, vx: f64, vy: f64, radius: f64) -> Body {
        let mut body = Body::new(1, DVec2::new(x, y), radius);
        body.vel = DVec2::new(vx, vy);
        body
    }

    fn empty_scene(width: f64, height: f64) -> Scene {
        Scene {
            width,
            height,
            walls: Vec::new(),
            slants: Vec::new(),
            bumpers: Vec::new(),
            targets: Vec::new(),
            lane: LaunchLane {
                x_min: -1000.0,
                x_max: -1000.0,
                exit_y: 0.0,
                rest_y: 0.0,
            },
        }
    }

    fn boxed_scene(width: f64, height: f64) -> Scene {
        let mut scene = empty_scene(width, height);
        scene.walls = vec![AxisWall::Left(0.0), AxisWall::Right(width), AxisWall::Top(0.0)];
        scene
    }

    #[test]
    fn test_axis_wall_reflects_with_restitution() {
        let tuning = Tuning::default();
        let scene = boxed_scene(400.0, 600.0);
        let mut body = body_at(4.0, 300.0, -10.0, 1.0, 10.0);

        resolve(&mut body, &scene, &[], &tuning);
        assert!((body.pos.x - 10.0).abs() < 1e-9);
        assert!((body.vel.x - 7.0).abs() < 1e-9);
        assert!((body.vel.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_slanted_wall_reflection() {
        let tuning = Tuning::default();
        let mut scene = empty_scene(400.0, 600.0);
        // Floor-like slant facing up
        scene.slants.push(SlantedWall::new(DVec2::new(0.0, 100.0), DVec2::new(0.0, -1.0)));
        let mut body = body_at(50.0, 95.0, 3.0, 5.0, 10.0);

        resolve(&mut body, &scene, &[], &tuning);
        assert!((body.pos.y - 90.0).abs() < 1e-9);
        assert!((body.vel.y - (-3.5)).abs() < 1e-9);
        assert!((body.vel.x - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounded_slant_ignores_ball_past_end() {
        let tuning = Tuning::default();
        let mut scene = empty_scene(400.0, 600.0);
        scene.slants.push(SlantedWall::through(
            DVec2::new(100.0, 100.0),
            DVec2::new(100.0, 200.0),
            DVec2::ZERO,
            true,
        ));
        let mut body = body_at(105.0, 300.0, -1.0, 0.0, 10.0);
        resolve(&mut body, &scene, &[], &tuning);
        assert_eq!(body.pos, DVec2::new(105.0, 300.0));
    }

    #[test]
    fn test_bumper_scenario() {
        let tuning = Tuning::default();
        let mut scene = empty_scene(400.0, 600.0);
        scene.bumpers.push(Bumper::new(DVec2::new(50.0, 50.0), 25.0, 100));
        let mut body = body_at(50.0, 74.0, 0.0, 2.0, 10.0);

        let triggers = resolve(&mut body, &scene, &[], &tuning);
        assert_eq!(triggers, vec![Trigger::Bumper(0)]);
        assert!((body.pos.distance(DVec2::new(50.0, 50.0)) - 36.0).abs() < 1e-9);
        assert!(body.pos.x == 50.0 && body.pos.y > 50.0);
        assert!((body.vel.y - tuning.min_boost_speed).abs() < 1e-9);
    }

    #[test]
    fn test_bumper_keeps_fast_ball_speed() {
        let tuning = Tuning::default();
        let bumper = Bumper::new(DVec2::new(0.0, 0.0), 20.0, 10);
        let mut body = body_at(0.0, -25.0, 0.0, 12.0, 10.0);
        assert!(resolve_bumper(&mut body, &bumper, &tuning));
        assert!((body.speed() - 12.0).abs() < 1e-9);
        assert!(body.vel.y < 0.0);
    }

    #[test]
    fn test_coincident_centres_are_a_miss() {
        let tuning = Tuning::default();
        let bumper = Bumper::new(DVec2::new(10.0, 10.0), 20.0, 10);
        let mut body = body_at(10.0, 10.0, 1.0, 1.0, 10.0);
        assert!(!resolve_bumper(&mut body, &bumper, &tuning));
        assert!(body.pos.is_finite() && body.vel.is_finite());
    }

    #[test]
    fn test_zero_length_segment_is_a_miss() {
        let p = DVec2::new(5.0, 5.0);
        let result = ball_segment_collision(DVec2::new(6.0, 5.0), 10.0, p, p);
        assert!(!result.hit);
    }

    #[test]
    fn test_target_soft_contact() {
        let tuning = Tuning::default();
        let mut scene = empty_scene(400.0, 600.0);
        scene
            .targets
            .push(Target::new(DVec2::new(100.0, 100.0), DVec2::new(30.0, 10.0), 250));
        let mut body = body_at(115.0, 95.0, 1.0, 4.0, 10.0);

        let triggers = resolve(&mut body, &scene, &[], &tuning);
        assert_eq!(triggers, vec![Trigger::Target(0)]);
        assert_eq!(body.pos, DVec2::new(115.0, 95.0));
        assert!((body.vel.y - 2.0).abs() < 1e-12);

        // Lit targets are inert
        scene.targets[0].lit = true;
        let mut body = body_at(115.0, 95.0, 1.0, 4.0, 10.0);
        assert!(resolve(&mut body, &scene, &[], &tuning).is_empty());
        assert_eq!(body.vel, DVec2::new(1.0, 4.0));
    }

    #[test]
    fn test_flipper_at_rest_never_boosts() {
        let tuning = Tuning::default();
        let flipper = Flipper::new(Side::Left, DVec2::new(100.0, 500.0), 70.0, 0.0, -0.5);
        // Ball falling onto the middle of a horizontal flipper
        let mut body = body_at(135.0, 490.0, 1.0, 8.0, 10.0);
        let incoming = body.speed();

        assert!(resolve_flipper(&mut body, &flipper, &tuning));
        assert!(body.speed() <= incoming * tuning.bounciness + 1e-9);
        assert!(body.vel.y < 0.0);
        assert!((body.pos.y - (500.0 - 10.0 - tuning.collision_margin)).abs() < 1e-9);
    }

    #[test]
    fn test_flipping_up_boosts_ball() {
        let tuning = Tuning::default();
        let mut flipper = Flipper::new(Side::Left, DVec2::new(100.0, 500.0), 70.0, 0.0, -0.6);
        flipper.set_pressed(true);
        flipper.update(tuning.flipper_step);

        let mut body = body_at(160.0, 480.0, 0.0, 0.0, 10.0);
        // Move the ball onto the swept face
        body.pos = flipper.pivot + flipper.axis() * 60.0 + flipper.axis().perp() * -11.0;
        assert!(resolve_flipper(&mut body, &flipper, &tuning));
        assert!(body.vel.y < 0.0);
        let expected = flipper.angular_velocity().abs() * tuning.flipper_gain;
        assert!((body.speed() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_flipper_damps_sliding_ball() {
        let tuning = Tuning::default();
        let flipper = Flipper::new(Side::Left, DVec2::new(100.0, 500.0), 70.0, 0.0, -0.5);
        // Sliding along the flipper while pressing into it
        let mut body = body_at(135.0, 490.0, 2.0, 0.5, 10.0);

        assert!(resolve_flipper(&mut body, &flipper, &tuning));
        assert!((body.vel.x - 2.0 * tuning.bounciness).abs() < 1e-12);
        assert!((body.vel.y + 0.5 * tuning.bounciness).abs() < 1e-12);
    }

    #[test]
    fn test_divider_stops_ball_crossing_into_lane() {
        let tuning = Tuning::default();
        let scene = Scene::classic(&tuning);
        let x_min = scene.lane.x_min;
        let mut body = body_at(x_min - 10.5, 300.0, 12.0, 0.0, 10.0);

        // One step carries the centre past the divider
        integrate(&mut body, &scene.lane, &tuning, 1.0);
        assert!(body.pos.x > x_min);
        assert!(!body.in_lane);

        resolve(&mut body, &scene, &[], &tuning);
        assert!((body.pos.x - (x_min - body.radius)).abs() < 1e-9);
        assert!(body.vel.x < 0.0);
    }

    #[test]
    fn test_ball_in_lane_is_not_resolved() {
        let tuning = Tuning::default();
        let scene = Scene::classic(&tuning);
        let mut body = body_at(scene.lane.rest_position().x, scene.lane.rest_y, 0.0, 0.0, 10.0);
        body.in_lane = true;
        body.pos.x = scene.width - 2.0; // would overlap the right wall
        assert!(resolve(&mut body, &scene, &[], &tuning).is_empty());
        assert_eq!(body.pos.x, scene.width - 2.0);
    }

    #[test]
    fn test_collider_order() {
        let tuning = Tuning::default();
        let scene = Scene::classic(&tuning);
        let order = colliders(&scene, &crate::sim::geometry::classic_flippers(&tuning));
        let rank = |c: &Collider| match c {
            Collider::Wall(_) => 0,
            Collider::SlantedWall(_) => 1,
            Collider::Flipper(_) => 2,
            Collider::Bumper(_) => 3,
            Collider::Target(_) => 4,
        };
        assert!(order.windows(2).all(|w| rank(&w[0]) <= rank(&w[1])));
        assert_eq!(order.len(), 3 + 5 + 2 + 3 + 3);
    }

    proptest! {
        #[test]
        fn prop_walls_contain_ball(
            x in 10.0f64..390.0,
            y in 10.0f64..500.0,
            vx in -15.0f64..15.0,
            vy in -15.0f64..15.0,
        ) {
            let tuning = Tuning { gravity: 0.0, ..Default::default() };
            let scene = boxed_scene(400.0, 600.0);
            let mut body = body_at(x, y, vx, vy, 10.0);
            for _ in 0..120 {
                integrate(&mut body, &scene.lane, &tuning, 1.0);
                resolve(&mut body, &scene, &[], &tuning);
                prop_assert!(body.pos.x >= 10.0 - 1e-9);
                prop_assert!(body.pos.x <= 390.0 + 1e-9);
                prop_assert!(body.pos.y >= 10.0 - 1e-9);
            }
        }

        #[test]
        fn prop_bumper_minimum_boost(
            angle in 0.0f64..std::f64::consts::TAU,
            depth in 0.5f64..30.0,
            vx in -4.0f64..4.0,
            vy in -4.0f64..4.0,
        ) {
            let tuning = Tuning::default();
            prop_assume!((vx * vx + vy * vy).sqrt() < tuning.min_boost_speed);
            let bumper = Bumper::new(DVec2::new(200.0, 200.0), 25.0, 100);
            let dir = DVec2::new(angle.cos(), angle.sin());
            let mut body = body_at(0.0, 0.0, vx, vy, 10.0);
            body.pos = bumper.pos + dir * (35.0 - depth);

            prop_assert!(resolve_bumper(&mut body, &bumper, &tuning));
            prop_assert!((body.speed() - tuning.min_boost_speed).abs() < 1e-9);
            prop_assert!(body.pos.distance(bumper.pos) >= 35.0);
        }
    }
}
