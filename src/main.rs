//! Ripple Stride headless demo
//!
//! Drives the simulation against the sandbox host with a seeded wander
//! script: the character roams a small island with a water pool, ripples pulse
//! on two beacons and on the player.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::path::PathBuf;

    use clap::Parser;
    use glam::{Vec2, Vec3};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use ripple_stride::Settings;
    use ripple_stride::consts::*;
    use ripple_stride::sim::sandbox::{
        SandboxAnimator, SandboxBody, SandboxEffects, SandboxScene, SandboxTerrain, SandboxTransition,
        SandboxVisual, Zone,
    };
    use ripple_stride::sim::{
        Bounds, CharacterBody, CharacterLocomotion, Color, LocomotionInput, MaterialId, PlayRegistry,
        Ripple, RippleEffects, TargetId, fade_in_transition, fade_out_transition, remove_outline,
        set_outline,
    };

    const PLAYER: TargetId = TargetId(1);
    const BEACON_A: TargetId = TargetId(2);
    const BEACON_B: TargetId = TargetId(3);

    const ISLAND_HALF_EXTENT: f32 = 12.0;
    const WANDER_LIMIT: f32 = 9.0;
    const EFFECT_DURATION: f32 = 2.0;
    const OUTLINE: MaterialId = MaterialId(100);

    #[derive(Parser)]
    #[command(version, about = "Headless ripple and locomotion simulation")]
    pub struct Cli {
        /// Settings JSON (defaults are used when absent or invalid)
        #[arg(long, value_name = "PATH")]
        settings: Option<PathBuf>,

        /// Simulated seconds to run
        #[arg(long, default_value_t = 20.0)]
        seconds: f32,

        /// Seed for the wander script
        #[arg(long, default_value_t = 12345)]
        seed: u64,
    }

    /// Scripted beats, in simulated seconds
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Beat {
        StopBeaconB,
        DropBlue,
        Done,
    }

    struct Demo {
        loco: CharacterLocomotion,
        body: SandboxBody,
        animator: SandboxAnimator,
        terrain: SandboxTerrain,

        ripples: RippleEffects,
        registry: PlayRegistry,
        effects: SandboxEffects,
        scene: SandboxScene,
        beacon_visuals: Vec<SandboxVisual>,
        transition: SandboxTransition,

        rng: Pcg32,
        input: LocomotionInput,
        next_decision: f32,
        clock: f32,
        accumulator: f32,
        beat: Beat,
        recoveries: u32,
    }

    impl Demo {
        fn new(settings: Settings, seed: u64) -> Self {
            let spawn = Vec3::new(-4.0, 0.0, 0.0);
            let terrain = SandboxTerrain::new(ISLAND_HALF_EXTENT)
                .with_hazard(Zone::new(Vec2::new(3.0, -3.0), Vec2::new(6.0, 3.0)));

            let mut scene = SandboxScene::new();
            scene.add_target(
                PLAYER,
                spawn,
                Some(Bounds::from_center_size(spawn + Vec3::Y, Vec3::new(1.0, 2.0, 1.0))),
            );
            for (target, x) in [(BEACON_A, -6.0), (BEACON_B, 0.0)] {
                let base = Vec3::new(x, 0.0, 6.0);
                scene.add_target(
                    target,
                    base,
                    Some(Bounds::from_center_size(base + Vec3::Y * 1.5, Vec3::new(0.8, 3.0, 0.8))),
                );
            }

            Self {
                loco: CharacterLocomotion::new(settings.locomotion, spawn + Vec3::Y * STABLE_LIFT),
                body: SandboxBody::new(spawn, 0.5),
                animator: SandboxAnimator::new(),
                terrain,
                ripples: RippleEffects::new(settings.effects),
                registry: PlayRegistry::new(),
                effects: SandboxEffects::new(EFFECT_DURATION),
                scene,
                beacon_visuals: vec![
                    SandboxVisual::mesh(vec![MaterialId(1), MaterialId(2)]),
                    SandboxVisual::flat(MaterialId(3)),
                ],
                transition: SandboxTransition::default(),
                rng: Pcg32::seed_from_u64(seed),
                input: LocomotionInput::default(),
                next_decision: 0.0,
                clock: 0.0,
                accumulator: 0.0,
                beat: Beat::StopBeaconB,
                recoveries: 0,
            }
        }

        fn start(&mut self) {
            fade_in_transition(Some(&mut self.transition));

            let player = Ripple::primary(PLAYER, Color::WHITE, Vec3::splat(0.3)).with_offset(Vec3::Y * -0.9);
            self.ripples
                .trigger(&mut self.registry, &mut self.effects, &self.scene, player);
            for (target, color) in [
                (BEACON_A, Color::RED),
                (BEACON_A, Color::BLUE),
                (BEACON_B, Color::GREEN),
                (BEACON_B, Color::YELLOW),
            ] {
                self.ripples.trigger(
                    &mut self.registry,
                    &mut self.effects,
                    &self.scene,
                    Ripple::object(target, color),
                );
            }
            set_outline(&mut self.beacon_visuals, OUTLINE);
        }

        fn finish(&mut self) {
            fade_out_transition(Some(&mut self.transition));
            let active: Vec<TargetId> = self.registry.targets().collect();
            for target in active {
                self.ripples.stop(&mut self.registry, &mut self.effects, target);
            }
        }

        /// Advance by one rendered frame
        fn frame(&mut self, frame_dt: f32) {
            self.accumulator += frame_dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.step();
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            // Drop backlog rather than spiral
            if substeps == MAX_SUBSTEPS && self.accumulator >= SIM_DT {
                log::warn!("Dropping {:.3}s of simulation backlog", self.accumulator);
                self.accumulator = 0.0;
            }
        }

        fn step(&mut self) {
            self.clock += SIM_DT;
            self.run_script();
            self.decide_input();

            self.loco.tick(
                SIM_DT,
                &self.input,
                &mut self.body,
                &mut self.animator,
                &self.terrain,
            );
            // One-shot input
            self.input.jump = false;

            if let Some(surface) = self.terrain.contact(&self.body) {
                if self.loco.on_surface_contact(surface, &mut self.body) {
                    self.recoveries += 1;
                    // Drop the intent that walked us in
                    self.input.clear();
                    log::info!(
                        "t={:.2}s fell into water at {}, heading back to {}",
                        self.clock,
                        self.body.position(),
                        self.loco.state().last_stable_position
                    );
                }
            }

            let position = self.body.position();
            self.scene.set_position(PLAYER, position);
            self.ripples
                .reposition(&self.registry, &mut self.effects, PLAYER, position + Vec3::Y * 0.1);
            self.ripples
                .tick(SIM_DT, Some(&mut self.registry), &mut self.effects);
        }

        fn run_script(&mut self) {
            match self.beat {
                Beat::StopBeaconB if self.clock >= 4.0 => {
                    if self.ripples.stop(&mut self.registry, &mut self.effects, BEACON_B) {
                        log::info!("t={:.2}s beacon B ripple stopped", self.clock);
                    }
                    remove_outline(&mut self.beacon_visuals);
                    self.beat = Beat::DropBlue;
                }
                Beat::DropBlue if self.clock >= 6.0 => {
                    self.ripples.remove_color(&mut self.registry, BEACON_A, Color::BLUE);
                    log::info!(
                        "t={:.2}s beacon A colors now {:?}",
                        self.clock,
                        self.registry.colors(BEACON_A)
                    );
                    self.beat = Beat::Done;
                }
                _ => {}
            }
        }

        fn decide_input(&mut self) {
            if self.clock < self.next_decision {
                return;
            }
            self.next_decision = self.clock + self.rng.random_range(0.5..2.0);

            let position = self.body.position();
            let (x, z) = if Vec2::new(position.x, position.z).length() > WANDER_LIMIT {
                let home = -Vec2::new(position.x, position.z).normalize_or_zero();
                (home.x, home.y)
            } else {
                (self.rng.random_range(-1.0..=1.0), self.rng.random_range(-1.0..=1.0))
            };

            self.input = LocomotionInput {
                move_x: x,
                move_z: z,
                jump: self.rng.random_bool(0.15),
                run: self.rng.random_bool(0.3),
            };
            log::debug!("t={:.2}s new intent {:?}", self.clock, self.input);
        }
    }

    pub fn run(cli: Cli) {
        let settings = match &cli.settings {
            Some(path) => Settings::load_or_default(path),
            None => Settings::default(),
        };

        let mut demo = Demo::new(settings, cli.seed);
        demo.start();

        // Jittery frame times exercise the fixed-step accumulator
        let mut frame_rng = Pcg32::seed_from_u64(cli.seed ^ 0x5EED);
        let mut elapsed = 0.0;
        while elapsed < cli.seconds {
            let frame_dt = frame_rng.random_range(1.0 / 75.0..1.0 / 45.0);
            demo.frame(frame_dt);
            elapsed += frame_dt;
        }

        demo.finish();
        // Let deferred destruction run out
        for _ in 0..(EFFECT_DURATION / SIM_DT) as u32 {
            demo.ripples
                .tick(SIM_DT, Some(&mut demo.registry), &mut demo.effects);
        }

        log::info!(
            "Simulated {:.1}s in {} ticks: {} recoveries, final position {}, {} live effects",
            demo.clock,
            demo.loco.ticks(),
            demo.recoveries,
            demo.body.position(),
            demo.effects.live_count()
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Ripple Stride (headless) starting...");
    demo::run(demo::Cli::parse());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is a library on wasm; there is no demo driver
}
