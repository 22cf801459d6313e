//! UI module that visualizes the simulation state using Bevy
//!
//! This module is purely for visualization - all simulation logic is in the `simulation` module.
//! The UI reads state from `SimWorld` and renders it using Bevy's 3D graphics. Model loading
//! happens here and is reported back to the simulation through its asset channel.

mod components;
mod input;
pub mod spawner;
mod sync;
mod world;

use bevy::prelude::*;

pub use components::{EntityMappings, SimWorldResource};

use components::*;
use input::handle_input;
use spawner::{load_models, report_model_loads, spawn_initial_visuals};
use sync::{
    spin_tires, sync_camera, sync_npcs, sync_player, sync_segments, sync_skyline, tag_model_parts,
    tick_simulation, update_game_over_overlay, update_hud, update_tail_lights,
};
use world::{follow_ground, setup_hud, setup_world};

/// Simulation frames per second
const TICK_RATE_HZ: f64 = 60.0;

/// Plugin to register all UI systems
pub struct HighwaySimUIPlugin;

impl Plugin for HighwaySimUIPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimWorldResource>()
            .init_resource::<EntityMappings>()
            .init_resource::<ModelHandles>()
            .insert_resource(Time::<Fixed>::from_hz(TICK_RATE_HZ))
            .add_systems(
                Startup,
                (
                    setup_world,
                    setup_hud,
                    load_models,
                    spawn_initial_visuals.after(setup_world),
                ),
            )
            .add_systems(FixedUpdate, tick_simulation)
            .add_systems(
                Update,
                (
                    report_model_loads,
                    handle_input,
                    sync_player,
                    sync_npcs,
                    sync_segments,
                    sync_skyline,
                    sync_camera,
                    follow_ground.after(sync_camera),
                    tag_model_parts,
                    spin_tires.after(tag_model_parts),
                    update_tail_lights.after(tag_model_parts),
                    update_hud,
                    update_game_over_overlay,
                ),
            );
    }
}
