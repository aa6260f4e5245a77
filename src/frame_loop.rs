//! Fixed-step scheduling for a frame-callback host
//!
//! The host calls [`FrameLoop::frame`] once per animation frame with its
//! clock. Elapsed time feeds an accumulator and the simulation steps only in
//! whole fixed steps. `scheduled == false` in the outcome means the host
//! should not request another frame (paused, finished, or stopped).

use crate::consts::{MAX_FRAME_GAP, MAX_SUBSTEPS, SIM_DT, TICK_DT};
use crate::sim::Simulation;

/// How many fixed steps a single frame may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPolicy {
    /// At most one step per frame; backlog beyond one step is dropped, so
    /// physics slows down when frames do
    #[default]
    SingleStep,
    /// Catch up on wall-clock time, bounded per frame
    CatchUp { max_substeps: u32 },
}

impl StepPolicy {
    pub fn catch_up() -> Self {
        StepPolicy::CatchUp {
            max_substeps: MAX_SUBSTEPS,
        }
    }
}

/// What one frame did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Fixed steps run this frame
    pub steps: u32,
    /// Whether the host should schedule another frame
    pub scheduled: bool,
}

/// Accumulator-driven fixed-step loop
#[derive(Debug, Clone)]
pub struct FrameLoop {
    policy: StepPolicy,
    /// Fixed step length in seconds
    step: f64,
    accumulator: f64,
    last_time: Option<f64>,
    stopped: bool,
}

impl FrameLoop {
    pub fn new(policy: StepPolicy) -> Self {
        Self::with_step(policy, SIM_DT)
    }

    pub fn with_step(policy: StepPolicy, step: f64) -> Self {
        Self {
            policy,
            step,
            accumulator: 0.0,
            last_time: None,
            stopped: false,
        }
    }

    pub fn policy(&self) -> StepPolicy {
        self.policy
    }

    /// Stop scheduling; the simulation is left untouched
    pub fn stop(&mut self) {
        self.stopped = true;
        log::debug!("Frame loop stopped");
    }

    /// Re-arm after `stop()` or a pause without counting the idle gap
    pub fn restart(&mut self) {
        self.stopped = false;
        self.last_time = None;
        self.accumulator = 0.0;
    }

    /// Run the fixed steps due at `now` (seconds, host clock)
    pub fn frame(&mut self, sim: &mut Simulation, now: f64) -> FrameOutcome {
        if self.stopped {
            return FrameOutcome {
                steps: 0,
                scheduled: false,
            };
        }

        let elapsed = match self.last_time {
            Some(last) => (now - last).clamp(0.0, MAX_FRAME_GAP),
            None => 0.0,
        };
        self.last_time = Some(now);

        if !sim.is_running() {
            self.accumulator = 0.0;
            return FrameOutcome {
                steps: 0,
                scheduled: false,
            };
        }
        self.accumulator += elapsed;

        let mut steps = 0;
        match self.policy {
            StepPolicy::SingleStep => {
                if self.accumulator >= self.step {
                    sim.tick(TICK_DT);
                    steps = 1;
                    // Keep sub-step jitter, drop real backlog
                    self.accumulator = (self.accumulator - self.step).min(self.step);
                }
            }
            StepPolicy::CatchUp { max_substeps } => {
                while self.accumulator >= self.step && steps < max_substeps && sim.is_running() {
                    sim.tick(TICK_DT);
                    self.accumulator -= self.step;
                    steps += 1;
                }
                self.accumulator = self.accumulator.min(self.step * max_substeps as f64);
            }
        }

        log::trace!("Frame at {:.4}s ran {} step(s)", now, steps);
        FrameOutcome {
            steps,
            scheduled: sim.is_running(),
        }
    }
}
