//! Shared simulation context
//!
//! One `SimulationContext` exists per session. It owns the resources every
//! component touches (physics, the body-class side table, asset readiness,
//! randomness, tuning) and is passed by reference into each component's
//! update in a fixed order.

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};

use super::assets::AssetInbox;
use super::config::SimConfig;
use super::physics::{ArcadePhysics, BodyDesc, PhysicsWorld};
use super::types::{BodyClass, BodyHandle};

/// Body-class tags for every live physics handle
#[derive(Debug, Default)]
pub struct BodyRegistry {
    classes: HashMap<BodyHandle, BodyClass>,
}

impl BodyRegistry {
    pub fn insert(&mut self, handle: BodyHandle, class: BodyClass) {
        self.classes.insert(handle, class);
    }

    pub fn remove(&mut self, handle: BodyHandle) -> Option<BodyClass> {
        self.classes.remove(&handle)
    }

    pub fn class_of(&self, handle: BodyHandle) -> Option<BodyClass> {
        self.classes.get(&handle).copied()
    }

    pub fn count(&self, class: BodyClass) -> usize {
        self.classes.values().filter(|c| **c == class).count()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

pub struct SimulationContext {
    pub config: SimConfig,
    pub physics: Box<dyn PhysicsWorld>,
    pub bodies: BodyRegistry,
    pub assets: AssetInbox,
    pub rng: StdRng,
    /// The player's body, once created
    pub player_body: Option<BodyHandle>,
    /// Collision subscriptions: (watched body, counterpart class)
    watches: HashSet<(BodyHandle, BodyClass)>,
    /// Simulated seconds since the session started
    pub time: f32,
}

impl SimulationContext {
    pub fn new(config: SimConfig, assets: AssetInbox, rng: StdRng) -> Self {
        let physics = Self::default_physics(&config);
        Self {
            config,
            physics,
            bodies: BodyRegistry::default(),
            assets,
            rng,
            player_body: None,
            watches: HashSet::new(),
            time: 0.0,
        }
    }

    pub fn new_with_seed(config: SimConfig, assets: AssetInbox, seed: u64) -> Self {
        Self::new(config, assets, StdRng::seed_from_u64(seed))
    }

    fn default_physics(config: &SimConfig) -> Box<dyn PhysicsWorld> {
        Box::new(ArcadePhysics::new(
            config.gravity,
            config.fixed_timestep,
            config.max_substeps,
        ))
    }

    /// Drop every body and subscription, keeping config, randomness and assets
    pub fn reset(&mut self) {
        self.physics = Self::default_physics(&self.config);
        self.bodies = BodyRegistry::default();
        self.player_body = None;
        self.watches.clear();
        self.time = 0.0;
    }

    /// Create a physics body and record its class
    pub fn spawn_body(&mut self, desc: BodyDesc, class: BodyClass) -> BodyHandle {
        let handle = self.physics.add_body(desc);
        self.bodies.insert(handle, class);
        handle
    }

    /// Remove a physics body and its class tag; safe to call twice
    pub fn despawn_body(&mut self, handle: BodyHandle) -> bool {
        let removed = self.physics.remove_body(handle);
        self.bodies.remove(handle);
        self.watches.retain(|(watched, _)| *watched != handle);
        if !removed {
            debug!("Ignoring removal of unknown body {:?}", handle);
        }
        removed
    }

    /// Subscribe to collisions between `body` and any body of `class`
    ///
    /// Subscribing twice is a no-op.
    pub fn watch(&mut self, body: BodyHandle, class: BodyClass) {
        self.watches.insert((body, class));
    }

    pub fn is_watched(&self, body: BodyHandle, class: BodyClass) -> bool {
        self.watches.contains(&(body, class))
    }

    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }
}
