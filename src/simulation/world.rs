//! Main simulation world that ties everything together
//!
//! This is the entry point for running the highway simulation without any
//! Bevy dependencies. One `tick` is one display frame:
//! assets → physics step → traffic → segments → player → session → camera.

use anyhow::Result;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::assets::{AssetInbox, AssetKind, AssetSender};
use super::camera::{CameraRig, CameraTransform};
use super::config::SimConfig;
use super::context::SimulationContext;
use super::physics::CollisionEvent;
use super::segment_pool::SegmentPool;
use super::session::{SessionState, SessionStateMachine};
use super::skyline::SkylineRing;
use super::traffic::TrafficManager;
use super::types::{BodyClass, Transform};
use super::vehicle::{DriveInput, PlayerVehicle, TailLightEvent, VehicleController};

/// Everything the presentation layer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub player: Transform,
    pub player_visual: Transform,
    pub camera: CameraTransform,
    pub displayed_speed: f32,
    pub displayed_score: u64,
    pub braking: bool,
    pub brake_light_intensity: Option<f32>,
    pub tail_light_event: Option<TailLightEvent>,
    pub at_top_speed: bool,
    pub tire_spin: f32,
    pub game_over: bool,
    pub final_score: Option<u64>,
}

/// The main simulation world
pub struct SimWorld {
    pub ctx: SimulationContext,
    pub player: PlayerVehicle,
    pub controller: VehicleController,
    pub traffic: TrafficManager,
    pub segments: SegmentPool,
    pub skyline: SkylineRing,
    pub session: SessionStateMachine,
    pub camera: CameraRig,

    /// Handed out to asset loaders
    asset_sender: AssetSender,

    /// Collisions drained from the last physics step
    last_collisions: Vec<CollisionEvent>,
    last_tail_light: Option<TailLightEvent>,
    pub ticks: u64,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new_internal(SimConfig::default(), StdRng::from_os_rng())
    }
}

impl SimWorld {
    fn new_internal(config: SimConfig, rng: StdRng) -> Self {
        let (asset_sender, inbox) = AssetInbox::channel();
        let mut ctx = SimulationContext::new(config, inbox, rng);
        let (player, traffic, segments, skyline) = Self::populate(&mut ctx);

        info!(
            "Session started: {} segments of {:.0} units, {} lanes",
            segments.len(),
            ctx.config.segment_length,
            ctx.config.lane_count
        );

        Self {
            ctx,
            player,
            controller: VehicleController::new(),
            traffic,
            segments,
            skyline,
            session: SessionStateMachine::new(),
            camera: CameraRig::new(),
            asset_sender,
            last_collisions: Vec::new(),
            last_tail_light: None,
            ticks: 0,
        }
    }

    /// Create a world with entropy-seeded randomness
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new_internal(config, StdRng::from_os_rng()))
    }

    /// Create a world with a seeded RNG for reproducible runs
    pub fn new_with_seed(config: SimConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self::new_internal(config, StdRng::seed_from_u64(seed)))
    }

    /// Build the per-session entities; the player comes first so every
    /// collider created afterwards can subscribe it
    fn populate(
        ctx: &mut SimulationContext,
    ) -> (PlayerVehicle, TrafficManager, SegmentPool, SkylineRing) {
        ctx.spawn_body(
            super::physics::BodyDesc::plane(0.0),
            BodyClass::Ground,
        );
        let player = PlayerVehicle::spawn(ctx);

        let mut traffic = TrafficManager::new();
        if let Some(model) = ctx.assets.model(AssetKind::NpcCar) {
            traffic.apply_model(model);
        }
        let segments = SegmentPool::new(&mut traffic, ctx);

        let mut skyline = SkylineRing::new();
        if ctx.assets.is_ready(AssetKind::Skyscrapers) {
            skyline.spawn(ctx);
        }
        (player, traffic, segments, skyline)
    }

    /// A sender asset loaders use to report completion
    pub fn asset_sender(&self) -> AssetSender {
        self.asset_sender.clone()
    }

    pub fn config(&self) -> &SimConfig {
        &self.ctx.config
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    pub fn is_game_over(&self) -> bool {
        self.session.state == SessionState::GameOver
    }

    pub fn last_collisions(&self) -> &[CollisionEvent] {
        &self.last_collisions
    }

    /// World z of the player's body
    pub fn player_z(&self) -> f32 {
        self.player
            .transform(&self.ctx)
            .map(|t| t.translation.z)
            .unwrap_or(self.ctx.config.start_z)
    }

    /// Run one frame
    ///
    /// A negative or non-finite delta is skipped so time never runs backwards.
    pub fn tick(&mut self, delta_secs: f32, input: DriveInput) {
        if !(delta_secs.is_finite() && delta_secs >= 0.0) {
            warn!("Skipping frame with invalid delta {}", delta_secs);
            return;
        }
        self.ticks += 1;
        self.apply_asset_events();

        self.ctx.time += delta_secs;
        self.ctx.physics.step(delta_secs);
        self.last_collisions = self.ctx.physics.drain_collisions();

        let player_z = self.player_z();
        self.traffic
            .update(player_z, delta_secs, &mut self.segments, &mut self.ctx);
        self.segments
            .update(player_z, &mut self.traffic, &mut self.ctx);
        self.skyline.update(player_z, &self.ctx);

        self.last_tail_light = self.controller.update(
            delta_secs,
            input,
            self.session.state,
            &mut self.player,
            &mut self.ctx,
        );

        self.session
            .reconcile(&self.last_collisions, &mut self.player, &mut self.ctx);

        match self.player.visual_transform(&self.ctx) {
            Ok(car) => self.camera.update(delta_secs, &car, &self.ctx.config),
            Err(e) => warn!("Camera has no car to follow: {:#}", e),
        }
    }

    /// Dispatch models that finished loading since the last frame
    fn apply_asset_events(&mut self) {
        for kind in self.ctx.assets.drain() {
            match kind {
                AssetKind::PlayerCar => {
                    if let Some(model) = self.ctx.assets.model(kind) {
                        self.player.apply_model(model, &self.ctx.config);
                    }
                }
                AssetKind::NpcCar => {
                    if let Some(model) = self.ctx.assets.model(kind) {
                        self.traffic.apply_model(model);
                    }
                    self.segments
                        .on_asset_ready(kind, &mut self.traffic, &mut self.ctx);
                }
                AssetKind::Skyscrapers => self.skyline.spawn(&mut self.ctx),
                AssetKind::Barrier | AssetKind::LightBarrier | AssetKind::StreetLight => {
                    self.segments
                        .on_asset_ready(kind, &mut self.traffic, &mut self.ctx);
                }
            }
        }
    }

    /// Throw the session away and start a new run
    ///
    /// Config, randomness and already-loaded assets carry over.
    pub fn restart(&mut self) {
        info!("Restarting session");
        self.ctx.reset();
        let (player, traffic, segments, skyline) = Self::populate(&mut self.ctx);
        self.player = player;
        self.traffic = traffic;
        self.segments = segments;
        self.skyline = skyline;
        self.controller = VehicleController::new();
        self.session = SessionStateMachine::new();
        self.camera = CameraRig::new();
        self.last_collisions.clear();
        self.last_tail_light = None;
        self.ticks = 0;
    }

    /// Presentation data for the current frame
    pub fn snapshot(&self) -> FrameSnapshot {
        let config = &self.ctx.config;
        let player = self.player.transform(&self.ctx).unwrap_or_default();
        let player_visual = self
            .player
            .visual_transform(&self.ctx)
            .unwrap_or(player);

        FrameSnapshot {
            player,
            player_visual,
            camera: self.camera.transform,
            displayed_speed: self.player.displayed_speed(config),
            displayed_score: self.player.displayed_score(config),
            braking: self.player.braking,
            brake_light_intensity: self.player.brake_light_intensity(config),
            tail_light_event: self.last_tail_light,
            at_top_speed: self.player.at_top_speed(config),
            tire_spin: self.player.tire_spin,
            game_over: self.session.show_game_over,
            final_score: self.session.final_score,
        }
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        println!("=== Highway Simulation Summary ===");
        println!("Time: {:.2}s ({} ticks)", self.ctx.time, self.ticks);
        println!("State: {:?}", self.session.state);
        println!(
            "Player: z={:.1}, x={:.2}, speed={:.1} ({:.0} mph), turn rate={:.3}",
            snapshot.player.translation.z,
            snapshot.player.translation.x,
            self.player.speed,
            snapshot.displayed_speed,
            self.player.turn_rate
        );
        println!("Score: {}", snapshot.displayed_score);
        if let Some(final_score) = snapshot.final_score {
            println!(
                "Final score: {} (hit {:?})",
                final_score, self.session.crashed_into
            );
        }
        println!(
            "Segments: {}, recycled {} times",
            self.segments.len(),
            self.segments.recycled_total()
        );
        println!(
            "NPCs: {} live, {} spawned, {} despawned",
            self.traffic.len(),
            self.traffic.spawned_total,
            self.traffic.despawned_total
        );
        println!(
            "Physics bodies: {} (walls={}, npcs={})",
            self.ctx.physics.body_count(),
            self.ctx.bodies.count(BodyClass::Wall),
            self.ctx.bodies.count(BodyClass::Npc)
        );
    }
}
