//! Flipper Sim headless host
//!
//! Drives the simulation through the fixed-step frame loop with a simulated
//! 60 Hz clock and a simple autoplayer, then prints the final snapshot.
//!
//! Usage: `flipper-sim [--tuning FILE] [--frames N] [--catch-up] [--seed N]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use clap::Parser;
    use flipper_sim::sim::integrator::is_resting_in_lane;
    use flipper_sim::{FrameLoop, GameEvent, Side, Simulation, StepPolicy, Tuning};

    /// Host frame interval; every 7th frame is dropped to a 30 Hz gap
    const FRAME_INTERVAL: f64 = 1.0 / 60.0;

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Run a pinball table headless and print the final snapshot", long_about = None)]
    struct Args {
        /// Tuning JSON file (defaults when omitted)
        #[arg(long)]
        tuning: Option<PathBuf>,
        /// Host frames to simulate
        #[arg(long, default_value_t = 20_000)]
        frames: u64,
        /// Catch up on dropped frames instead of slowing down
        #[arg(long)]
        catch_up: bool,
        /// Override the tuning's RNG seed
        #[arg(long)]
        seed: Option<u64>,
    }

    impl Args {
        fn policy(&self) -> StepPolicy {
            if self.catch_up {
                StepPolicy::catch_up()
            } else {
                StepPolicy::SingleStep
            }
        }
    }

    fn load_tuning(args: &Args) -> Result<Tuning, String> {
        let mut tuning = match &args.tuning {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
                Tuning::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))?
            }
            None => Tuning::default(),
        };
        if let Some(seed) = args.seed {
            tuning.seed = seed;
        }
        Ok(tuning)
    }

    /// Flip when a falling ball is over a flipper; launch at ~80% power
    fn autoplay(sim: &mut Simulation) {
        let lane = sim.scene().lane;
        for side in [Side::Left, Side::Right] {
            let pressed = sim.flippers().iter().filter(|f| f.side == side).any(|f| {
                let middle = (f.pivot + f.tip()) * 0.5;
                sim.bodies()
                    .iter()
                    .any(|b| b.vel.y > 0.0 && b.pos.distance(middle) < f.length * 0.75)
            });
            sim.set_flipper_target(side, pressed);
        }

        let waiting = sim.bodies().iter().any(|b| is_resting_in_lane(b, &lane));
        let charged = sim.plunger().charge >= sim.tuning().plunger_max * 0.8;
        sim.set_launch_held(waiting && !charged);
    }

    pub fn run() -> ExitCode {
        env_logger::init();

        let args = Args::parse();
        let tuning = match load_tuning(&args) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Failed to load tuning: {}", e);
                return ExitCode::FAILURE;
            }
        };
        let mut sim = match Simulation::try_new(tuning) {
            Ok(sim) => sim,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        };

        let policy = args.policy();
        log::info!("Flipper Sim (headless) starting, {:?}", policy);
        let mut frame_loop = FrameLoop::new(policy);
        sim.start();

        let mut now = 0.0;
        let mut bumper_hits = 0u64;
        let mut frames_run = 0u64;
        for frame in 0..args.frames {
            now += if frame % 7 == 6 {
                FRAME_INTERVAL * 2.0
            } else {
                FRAME_INTERVAL
            };
            autoplay(&mut sim);
            let outcome = frame_loop.frame(&mut sim, now);
            frames_run += 1;

            for event in sim.drain_events() {
                match event {
                    GameEvent::BumperHit { .. } => bumper_hits += 1,
                    GameEvent::LevelAdvanced { level, .. } => log::info!("Now on level {}", level),
                    _ => {}
                }
            }
            if !outcome.scheduled {
                break;
            }
        }

        let snapshot = sim.snapshot();
        log::info!(
            "Ran {} frames / {} ticks, {} bumper hits, status {:?}",
            frames_run,
            snapshot.tick,
            bumper_hits,
            snapshot.session.status
        );
        match snapshot.to_json() {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Failed to serialize snapshot: {}", e);
                ExitCode::FAILURE
            }
        }
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web hosts embed the library and drive `FrameLoop` from requestAnimationFrame
}
