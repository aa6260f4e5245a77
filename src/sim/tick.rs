//! Fixed timestep simulation tick
//!
//! `Simulation` owns every piece of mutable state. Input hooks only set
//! actuator targets; `tick` reads them on the next step.

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision;
use super::geometry::{Scene, classic_flippers};
use super::integrator::{integrate, is_resting_in_lane};
use super::scoring;
use super::snapshot::{FlipperView, Snapshot};
use super::state::{Body, Flipper, GameEvent, GameStatus, Plunger, SessionState, Side};
use crate::error::TuningError;
use crate::tuning::Tuning;

/// A pinball table in play
#[derive(Debug, Clone)]
pub struct Simulation {
    tuning: Tuning,
    /// Table as built, restored on reset
    layout: (Scene, Vec<Flipper>),
    scene: Scene,
    flippers: Vec<Flipper>,
    plunger: Plunger,
    /// Balls in play, in id order
    bodies: Vec<Body>,
    session: SessionState,
    rng: Pcg32,
    events: Vec<GameEvent>,
    time_ticks: u64,
    next_id: u32,
}

impl Simulation {
    /// Build the classic table, paused, with a ball on the plunger
    pub fn new(tuning: Tuning) -> Self {
        let scene = Scene::classic(&tuning);
        let flippers = classic_flippers(&tuning);
        Self::with_scene(tuning, scene, flippers)
    }

    /// Validate `tuning` first
    pub fn try_new(tuning: Tuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self::new(tuning))
    }

    /// Custom table layout
    pub fn with_scene(tuning: Tuning, scene: Scene, flippers: Vec<Flipper>) -> Self {
        let mut sim = Self {
            rng: Pcg32::seed_from_u64(tuning.seed),
            session: SessionState::new(tuning.starting_lives),
            tuning,
            layout: (scene.clone(), flippers.clone()),
            scene,
            flippers,
            plunger: Plunger::default(),
            bodies: Vec::new(),
            events: Vec::new(),
            time_ticks: 0,
            next_id: 1,
        };
        sim.spawn_in_lane();
        sim
    }

    // === Session control ===

    /// Begin play from `Paused`
    pub fn start(&mut self) {
        match self.session.status {
            GameStatus::Paused => {
                self.session.status = GameStatus::Playing;
                log::info!("Simulation started (level {})", self.session.level);
            }
            GameStatus::Playing => {}
            status => log::warn!("Cannot start a finished game ({:?}); reset first", status),
        }
    }

    /// Stop ticking, keeping all state
    pub fn pause(&mut self) {
        if self.session.status == GameStatus::Playing {
            self.session.status = GameStatus::Paused;
            log::info!("Simulation paused at tick {}", self.time_ticks);
        }
    }

    /// Continue a paused game
    pub fn resume(&mut self) {
        self.start();
    }

    /// Rebuild table, balls and session; ends `Paused`
    pub fn reset(&mut self) {
        let (scene, flippers) = self.layout.clone();
        self.scene = scene;
        self.flippers = flippers;
        self.plunger = Plunger::default();
        self.bodies.clear();
        self.session = SessionState::new(self.tuning.starting_lives);
        self.rng = Pcg32::seed_from_u64(self.tuning.seed);
        self.events.clear();
        self.time_ticks = 0;
        self.next_id = 1;
        self.spawn_in_lane();
        log::info!("Simulation reset");
    }

    /// Whether the host should keep scheduling ticks
    pub fn is_running(&self) -> bool {
        self.session.status == GameStatus::Playing
    }

    // === Input hooks ===

    pub fn set_flipper_target(&mut self, side: Side, pressed: bool) {
        for flipper in self.flippers.iter_mut().filter(|f| f.side == side) {
            flipper.set_pressed(pressed);
        }
    }

    pub fn set_launch_held(&mut self, pressed: bool) {
        self.plunger.held = pressed;
    }

    /// Put an extra ball in play (multiball); returns its id
    pub fn spawn_ball(&mut self, pos: DVec2, vel: DVec2) -> u32 {
        let id = self.next_entity_id();
        let mut body = Body::new(id, pos, self.tuning.ball_radius);
        body.vel = vel;
        self.bodies.push(body);
        id
    }

    // === Stepping ===

    /// Advance by `dt` nominal ticks; returns [`Self::is_running`]
    ///
    /// Order: actuators, integration, collisions, scoring, level check,
    /// drain check. Does nothing unless `Playing`.
    pub fn tick(&mut self, dt: f64) -> bool {
        if !self.is_running() {
            return false;
        }
        self.time_ticks += 1;

        self.update_actuators(dt);
        for bumper in &mut self.scene.bumpers {
            bumper.decay_pulse();
        }

        for body in &mut self.bodies {
            integrate(body, &self.scene.lane, &self.tuning, dt);
            let triggers = collision::resolve(body, &self.scene, &self.flippers, &self.tuning);
            scoring::apply_triggers(
                &triggers,
                &mut self.session,
                &mut self.scene,
                &self.tuning,
                &mut self.events,
            );
        }

        scoring::check_level_clear(
            &mut self.session,
            &mut self.scene,
            &mut self.rng,
            &self.tuning,
            &mut self.events,
        );
        if self.session.status == GameStatus::Won {
            return false;
        }

        self.check_drained();
        self.is_running()
    }

    fn update_actuators(&mut self, dt: f64) {
        let step = self.tuning.flipper_step * dt;
        for flipper in &mut self.flippers {
            flipper.update(step);
        }

        let lane = self.scene.lane;
        let resting = self.bodies.iter().position(|b| is_resting_in_lane(b, &lane));
        if self.plunger.held {
            if resting.is_some() {
                self.plunger
                    .charge(self.tuning.plunger_charge_rate, self.tuning.plunger_max, dt);
            }
        } else if self.plunger.charge > 0.0 {
            let power = self.plunger.release();
            if let Some(i) = resting {
                let body = &mut self.bodies[i];
                body.vel = DVec2::new(0.0, -power);
                log::info!("Ball {} launched at {:.2}", body.id, power);
                self.events.push(GameEvent::Launched {
                    body: body.id,
                    speed: power,
                });
            }
        }
    }

    /// Remove balls below the table; lose a life when none are left
    fn check_drained(&mut self) {
        let floor = self.scene.height + self.tuning.loss_margin;
        let events = &mut self.events;
        self.bodies.retain(|body| {
            let drained = body.pos.y > floor;
            if drained {
                log::debug!("Ball {} drained", body.id);
                events.push(GameEvent::BallDrained { body: body.id });
            }
            !drained
        });

        if !self.bodies.is_empty() {
            return;
        }

        self.session.lives = self.session.lives.saturating_sub(1);
        self.events.push(GameEvent::LifeLost {
            lives_left: self.session.lives,
        });

        if self.session.lives == 0 {
            self.session.status = GameStatus::Lost;
            log::info!("Game over with {} points", self.session.score);
            self.events.push(GameEvent::Lost {
                score: self.session.score,
            });
        } else {
            log::info!("Life lost, {} left", self.session.lives);
            self.spawn_in_lane();
        }
    }

    // === Accessors ===

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn flippers(&self) -> &[Flipper] {
        &self.flippers
    }

    pub fn plunger(&self) -> &Plunger {
        &self.plunger
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.time_ticks,
            session: self.session,
            bodies: self.bodies.clone(),
            bumpers: self.scene.bumpers.clone(),
            targets: self.scene.targets.clone(),
            flippers: self.flippers.iter().map(FlipperView::from).collect(),
            plunger_charge: self.plunger.charge,
        }
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn spawn_in_lane(&mut self) {
        let pos = self.scene.lane.rest_position();
        self.spawn_ball(pos, DVec2::ZERO);
    }
}
