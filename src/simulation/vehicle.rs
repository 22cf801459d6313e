//! Player vehicle model
//!
//! Standalone implementation that doesn't depend on Bevy. Input intent is
//! turned into speed, turn rate and heading here; the physics body only
//! receives the resulting horizontal velocity and orientation.

use anyhow::Result;
use glam::{Quat, Vec3};
use log::{debug, warn};

use super::assets::{AssetKind, LoadedModel, TAIL_LIGHT_NAMES, TIRE_NAMES};
use super::config::SimConfig;
use super::context::SimulationContext;
use super::physics::{BodyDesc, BodyKind};
use super::session::SessionState;
use super::types::{BodyClass, BodyHandle, Transform};

/// The four driving intents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveInput {
    pub forward: bool,
    pub brake: bool,
    pub left: bool,
    pub right: bool,
}

impl DriveInput {
    pub fn turning(&self) -> bool {
        self.left || self.right
    }

    /// Brake only counts when forward isn't also held
    pub fn braking(&self) -> bool {
        self.brake && !self.forward
    }
}

/// Emitted once per change of the braking state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailLightEvent {
    BrakeOn,
    BrakeOff,
}

/// The singleton player car
#[derive(Debug, Clone)]
pub struct PlayerVehicle {
    pub speed: f32,
    pub heading: Quat,
    pub turn_rate: f32,
    pub body: BodyHandle,
    /// Distance accumulator; see `displayed_score`
    pub score: f32,
    pub braking: bool,
    pub tire_spin: f32,
    /// Vertical offset from the physics pivot to the model pivot
    pub draw_offset: f32,
    /// Tire meshes found on the loaded model
    pub tires: Vec<&'static str>,
    /// Tail lights found on the loaded model
    pub tail_lights: Vec<&'static str>,
}

impl PlayerVehicle {
    /// Create the player's body at the start line and register it with the context
    pub fn spawn(ctx: &mut SimulationContext) -> Self {
        let config = &ctx.config;
        let desc = BodyDesc::cuboid(
            BodyKind::Dynamic,
            config.player_half_extents,
            Vec3::new(0.0, config.player_spawn_height, config.start_z),
        )
        .with_fixed_rotation();
        let speed = config.initial_speed;
        let turn_rate = config.initial_turn_rate;
        let draw_offset = -config.player_half_extents.y;

        let body = ctx.spawn_body(desc, BodyClass::Player);
        ctx.player_body = Some(body);

        let mut player = Self {
            speed,
            heading: Quat::IDENTITY,
            turn_rate,
            body,
            score: 0.0,
            braking: false,
            tire_spin: 0.0,
            draw_offset,
            tires: Vec::new(),
            tail_lights: Vec::new(),
        };
        if let Some(model) = ctx.assets.model(AssetKind::PlayerCar) {
            player.apply_model(model, &ctx.config);
        }
        player
    }

    /// Pick up draw offset and named parts from the loaded player model
    ///
    /// Missing tires or tail lights only disable the matching effect.
    pub fn apply_model(&mut self, model: &LoadedModel, config: &SimConfig) {
        self.draw_offset = -model.bounds_min_y - config.player_half_extents.y;

        let (tires, missing_tires) = model.lookup(&TIRE_NAMES);
        let (lights, missing_lights) = model.lookup(&TAIL_LIGHT_NAMES);
        if !missing_tires.is_empty() {
            warn!("Player model is missing tires {:?}", missing_tires);
        }
        if !missing_lights.is_empty() {
            warn!("Player model is missing tail lights {:?}", missing_lights);
        }
        self.tires = tires;
        self.tail_lights = lights;
    }

    pub fn displayed_score(&self, config: &SimConfig) -> u64 {
        (self.score * config.score_multiplier).floor() as u64
    }

    pub fn displayed_speed(&self, config: &SimConfig) -> f32 {
        self.speed * config.speed_display_multiplier
    }

    pub fn at_top_speed(&self, config: &SimConfig) -> bool {
        self.speed >= config.top_speed_threshold
    }

    /// Tail-light intensity multiplier, if the model has tail lights at all
    pub fn brake_light_intensity(&self, config: &SimConfig) -> Option<f32> {
        if self.tail_lights.is_empty() {
            return None;
        }
        Some(if self.braking {
            config.brake_light_boost
        } else {
            1.0
        })
    }

    /// Physics transform of the car
    pub fn transform(&self, ctx: &SimulationContext) -> Result<Transform> {
        let translation = ctx.physics.position(self.body)?;
        Ok(Transform::new(translation, self.heading))
    }

    /// Where the car's model is drawn: the physics transform lifted by the draw offset
    pub fn visual_transform(&self, ctx: &SimulationContext) -> Result<Transform> {
        let mut transform = self.transform(ctx)?;
        transform.translation.y += self.draw_offset;
        Ok(transform)
    }
}

/// Turns input intent into player motion, one tick at a time
#[derive(Debug, Default)]
pub struct VehicleController {
    pub ticks: u64,
}

impl VehicleController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the player by one frame
    ///
    /// Does nothing once the session is over. Returns the tail-light event if
    /// the braking state changed this frame.
    pub fn update(
        &mut self,
        delta_secs: f32,
        input: DriveInput,
        state: SessionState,
        player: &mut PlayerVehicle,
        ctx: &mut SimulationContext,
    ) -> Option<TailLightEvent> {
        if state == SessionState::GameOver {
            return None;
        }
        self.ticks += 1;

        let config = &ctx.config;
        let tail_light = update_speed(player, input, delta_secs, config);
        accumulate_score(player, delta_secs);
        update_turning(player, input, delta_secs, config);

        player.heading =
            (Quat::from_rotation_y(player.turn_rate * delta_secs) * player.heading).normalize();
        player.tire_spin -=
            player.speed * delta_secs / config.tire_radius / config.player_tire_spin_divisor;

        let speed = effective_speed(player, input, config);
        let forward = player.heading * Vec3::NEG_Z;

        // Vertical motion stays with gravity and ground contact
        let vertical = ctx
            .physics
            .linear_velocity(player.body)
            .map(|v| v.y)
            .unwrap_or(0.0);
        let velocity = Vec3::new(forward.x * speed, vertical, forward.z * speed);

        if let Err(e) = ctx.physics.set_linear_velocity(player.body, velocity) {
            warn!("Failed to drive player body: {:#}", e);
        }
        if let Err(e) = ctx.physics.set_rotation(player.body, player.heading) {
            warn!("Failed to rotate player body: {:#}", e);
        }

        if let Some(event) = tail_light {
            debug!("Tail lights: {:?}", event);
        }
        tail_light
    }
}

/// Apply acceleration, braking or coasting and track the braking edge
pub fn update_speed(
    player: &mut PlayerVehicle,
    input: DriveInput,
    delta_secs: f32,
    config: &SimConfig,
) -> Option<TailLightEvent> {
    if input.forward {
        let mut increment =
            config.acceleration_rate * (1.0 - player.speed / config.max_speed) * delta_secs;
        if input.turning() {
            increment *= config.turning_acceleration_penalty;
        }
        player.speed += increment;
    } else if input.brake {
        player.speed -= config.brake_deceleration_rate * delta_secs;
    } else {
        player.speed -= config.brake_deceleration_rate / config.coast_divisor * delta_secs;
    }
    player.speed = player.speed.clamp(0.0, config.max_speed);

    let braking = input.braking();
    if braking == player.braking {
        return None;
    }
    player.braking = braking;
    Some(if braking {
        TailLightEvent::BrakeOn
    } else {
        TailLightEvent::BrakeOff
    })
}

/// Score grows with distance covered
pub fn accumulate_score(player: &mut PlayerVehicle, delta_secs: f32) {
    if player.speed > 0.0 {
        player.score += player.speed * delta_secs;
    }
}

/// Ramp the turn rate while steering and let it die off once released
pub fn update_turning(
    player: &mut PlayerVehicle,
    input: DriveInput,
    delta_secs: f32,
    config: &SimConfig,
) {
    if input.left {
        player.turn_rate += config.turn_acceleration * delta_secs;
    } else if input.right {
        player.turn_rate -= config.turn_acceleration * delta_secs;
    } else {
        player.turn_rate *= config.turn_damping;
        if player.turn_rate.abs() < config.turn_epsilon {
            player.turn_rate = 0.0;
        }
    }
    player.turn_rate = player
        .turn_rate
        .clamp(-config.max_turn_rate, config.max_turn_rate);
}

/// Forward speed after lateral slip while a turn key is held
pub fn effective_speed(player: &PlayerVehicle, input: DriveInput, config: &SimConfig) -> f32 {
    if !input.turning() {
        return player.speed;
    }
    let turn_fraction = (player.turn_rate.abs() / config.max_turn_rate).min(1.0);
    player.speed * (1.0 - config.max_slip_reduction * turn_fraction)
}
