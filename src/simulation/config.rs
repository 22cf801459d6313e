//! Tuning parameters for the highway simulation
//!
//! Every constant the simulation depends on lives in `SimConfig` so headless
//! runs, the UI and the tests can all override what they need.

use anyhow::{bail, Result};
use glam::Vec3;

/// Number of recycled road segments in the reference build
pub const SEGMENT_COUNT: usize = 20;
/// Length of one road segment along the travel axis
pub const SEGMENT_LENGTH: f32 = 50.0;
/// Number of lanes on the highway
pub const LANE_COUNT: usize = 4;
/// Width of a single lane
pub const LANE_WIDTH: f32 = 3.0;

/// Chance that a recycled, empty segment receives a new NPC
pub const NPC_SPAWN_CHANCE: f32 = 0.75;
/// NPC travel speed (units per second, toward -Z)
pub const NPC_SPEED: f32 = 30.0;

/// Every `LIGHT_BARRIER_INTERVAL`th slot uses the light barrier prop
pub const LIGHT_BARRIER_INTERVAL: usize = 5;

#[derive(Debug, Clone)]
pub struct SimConfig {
    // Road
    pub segment_count: usize,
    pub segment_length: f32,
    pub lane_count: usize,
    pub lane_width: f32,
    /// Z where the first segment is centred (the player's start)
    pub start_z: f32,
    pub barrier_offset: f32,
    pub wall_thickness: f32,
    pub wall_height: f32,
    pub wall_margin: f32,

    // Player vehicle
    pub initial_speed: f32,
    pub max_speed: f32,
    pub acceleration_rate: f32,
    pub brake_deceleration_rate: f32,
    /// Coasting friction is `brake_deceleration_rate / coast_divisor`
    pub coast_divisor: f32,
    /// Acceleration multiplier while a turn key is held
    pub turning_acceleration_penalty: f32,
    pub initial_turn_rate: f32,
    pub max_turn_rate: f32,
    pub turn_acceleration: f32,
    /// Per-frame multiplier applied to the turn rate once steering is released
    pub turn_damping: f32,
    pub turn_epsilon: f32,
    /// Fraction of speed lost at full turn rate
    pub max_slip_reduction: f32,
    pub score_multiplier: f32,
    pub speed_display_multiplier: f32,
    pub top_speed_threshold: f32,
    pub tire_radius: f32,
    /// Player tires spin at a fraction of true rolling speed
    pub player_tire_spin_divisor: f32,
    pub brake_light_boost: f32,
    pub player_half_extents: Vec3,
    pub player_spawn_height: f32,

    // Traffic
    pub npc_speed: f32,
    pub npc_spawn_chance: f32,
    /// How far behind the player (toward +Z) an NPC stays alive
    pub npc_window_behind: f32,
    /// How far ahead of the player (toward -Z) an NPC stays alive
    pub npc_window_ahead: f32,
    pub npc_half_extents: Vec3,
    pub npc_shape_offset: Vec3,
    pub npc_body_height: f32,
    pub npc_visual_height: f32,

    // Camera
    pub intro_duration: f32,
    pub intro_angle_offset: f32,
    pub intro_start_distance: f32,
    pub intro_start_height: f32,
    pub chase_distance: f32,
    pub chase_height: f32,
    pub chase_smoothing: f32,
    pub look_at_height: f32,

    // Skyline
    pub skyline_rows: usize,
    pub skyline_spacing: f32,
    pub skyline_recycle_threshold: f32,

    // Physics
    pub fixed_timestep: f32,
    pub max_substeps: u32,
    pub gravity: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            segment_count: SEGMENT_COUNT,
            segment_length: SEGMENT_LENGTH,
            lane_count: LANE_COUNT,
            lane_width: LANE_WIDTH,
            start_z: 0.0,
            barrier_offset: 1.0,
            wall_thickness: 0.1,
            wall_height: 2.0,
            wall_margin: -0.1,

            initial_speed: 40.0,
            max_speed: 100.0,
            acceleration_rate: 15.0,
            brake_deceleration_rate: 25.0,
            coast_divisor: 5.0,
            turning_acceleration_penalty: 0.1,
            initial_turn_rate: 0.1,
            max_turn_rate: 1.5,
            turn_acceleration: 2.5,
            turn_damping: 0.9,
            turn_epsilon: 0.001,
            max_slip_reduction: 0.5,
            score_multiplier: 0.5,
            speed_display_multiplier: 1.5,
            top_speed_threshold: 99.0,
            tire_radius: 0.3,
            player_tire_spin_divisor: 3.0,
            brake_light_boost: 1.5,
            player_half_extents: Vec3::new(0.5, 0.25, 1.0),
            player_spawn_height: 0.5,

            npc_speed: NPC_SPEED,
            npc_spawn_chance: NPC_SPAWN_CHANCE,
            npc_window_behind: 100.0,
            npc_window_ahead: 1100.0,
            npc_half_extents: Vec3::new(0.55, 1.0, 2.2),
            npc_shape_offset: Vec3::new(0.15, 0.0, 0.8),
            npc_body_height: 0.5,
            npc_visual_height: 0.36,

            intro_duration: 2.0,
            intro_angle_offset: std::f32::consts::FRAC_PI_3,
            intro_start_distance: 2.0,
            intro_start_height: 1.2,
            chase_distance: 2.5,
            chase_height: 2.0,
            chase_smoothing: 0.1,
            look_at_height: 2.25,

            skyline_rows: 20,
            skyline_spacing: 25.0,
            skyline_recycle_threshold: 50.0,

            fixed_timestep: 1.0 / 60.0,
            max_substeps: 3,
            gravity: -9.82,
        }
    }
}

impl SimConfig {
    /// Reject tunings the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.segment_count == 0 {
            bail!("segment_count must be at least 1");
        }
        if self.lane_count == 0 {
            bail!("lane_count must be at least 1");
        }
        for (name, value) in [
            ("segment_length", self.segment_length),
            ("lane_width", self.lane_width),
            ("max_speed", self.max_speed),
            ("max_turn_rate", self.max_turn_rate),
            ("coast_divisor", self.coast_divisor),
            ("intro_duration", self.intro_duration),
            ("fixed_timestep", self.fixed_timestep),
            ("tire_radius", self.tire_radius),
        ] {
            if value.is_nan() || value <= 0.0 {
                bail!("{name} must be positive, got {value}");
            }
        }
        if !(0.0..=1.0).contains(&self.npc_spawn_chance) {
            bail!(
                "npc_spawn_chance must be within [0, 1], got {}",
                self.npc_spawn_chance
            );
        }
        if !(0.0..=1.0).contains(&self.max_slip_reduction) {
            bail!("max_slip_reduction must be within [0, 1]");
        }
        if self.initial_speed < 0.0 || self.initial_speed > self.max_speed {
            bail!("initial_speed must be within [0, max_speed]");
        }
        if self.initial_turn_rate.is_nan() || self.initial_turn_rate.abs() > self.max_turn_rate {
            bail!(
                "initial_turn_rate must be within [-max_turn_rate, max_turn_rate], got {}",
                self.initial_turn_rate
            );
        }
        if self.max_substeps == 0 {
            bail!("max_substeps must be at least 1");
        }
        Ok(())
    }

    /// Total width of the paved road
    pub fn road_width(&self) -> f32 {
        self.lane_count as f32 * self.lane_width
    }

    /// Total length covered by the segment pool
    pub fn pool_length(&self) -> f32 {
        self.segment_count as f32 * self.segment_length
    }

    /// X coordinate of a lane's centre line
    pub fn lane_center(&self, lane_index: usize) -> f32 {
        -self.road_width() / 2.0 + self.lane_width / 2.0 + lane_index as f32 * self.lane_width
    }

    /// X coordinate of the left or right wall's centre
    pub fn wall_x(&self, sign: f32) -> f32 {
        sign * (self.road_width() / 2.0 + self.wall_thickness / 2.0 + self.wall_margin)
    }
}
