//! Simulation core
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (colliders in declared order, balls by id)

pub mod collision;
pub mod geometry;
pub mod integrator;
pub mod scoring;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use collision::{Collider, CollisionResult, Trigger, reflect_velocity, reflect_with_restitution, resolve};
pub use geometry::{AxisWall, Bumper, LaunchLane, Scene, SlantedWall, Target, classic_flippers};
pub use integrator::integrate;
pub use snapshot::{FlipperView, Snapshot};
pub use state::{Body, Flipper, GameEvent, GameStatus, Plunger, SessionState, Side};
pub use tick::Simulation;
