//! UI components and resources for linking Bevy entities to simulation state

use bevy::gltf::Gltf;
use bevy::prelude::*;
use std::collections::HashMap;

use crate::simulation::{AssetKind, NpcId, SegmentId, SimWorld};

/// Resource wrapper for the simulation world
#[derive(Resource)]
pub struct SimWorldResource(pub SimWorld);

impl Default for SimWorldResource {
    fn default() -> Self {
        Self(SimWorld::default())
    }
}

/// Marker component for ground plane
#[derive(Component)]
pub struct Ground;

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Marker for entities synced from simulation
#[derive(Component)]
pub struct SimSynced;

/// The player's car
#[derive(Component)]
pub struct PlayerVisual;

/// Links a Bevy entity to a simulation NPC
#[derive(Component)]
pub struct NpcLink(pub NpcId);

/// Links a Bevy entity to a simulation road segment
#[derive(Component)]
pub struct SegmentLink(pub SegmentId);

/// Props already spawned under a segment entity
#[derive(Component, Default)]
pub struct SegmentProps {
    pub barrier: Option<AssetKind>,
    pub street_light: bool,
}

/// Links a Bevy entity to a skyline building by index
#[derive(Component)]
pub struct SkylineLink(pub usize);

/// Tail-light fixture with the intensity it was imported with
#[derive(Component)]
pub struct TailLight {
    pub base_intensity: f32,
}

/// Tire mesh node and the car entity it belongs to
#[derive(Component)]
pub struct Tire {
    pub rest: Quat,
    pub owner: Entity,
}

/// Resource to track Bevy entities mapped to simulation entities
#[derive(Resource, Default)]
pub struct EntityMappings {
    pub player: Option<Entity>,
    pub npcs: HashMap<NpcId, Entity>,
    pub segments: HashMap<SegmentId, Entity>,
    pub skyline: Vec<Entity>,
}

/// glTF handles per asset kind and whether the simulation has been told
#[derive(Resource, Default)]
pub struct ModelHandles {
    pub gltfs: HashMap<AssetKind, Vec<Handle<Gltf>>>,
    pub reported: HashMap<AssetKind, bool>,
}

impl ModelHandles {
    /// First scene of the `index`th file of `kind`, once loaded
    pub fn scene(&self, kind: AssetKind, index: usize, gltfs: &Assets<Gltf>) -> Option<Handle<Scene>> {
        let handle = self.gltfs.get(&kind)?.get(index)?;
        let gltf = gltfs.get(handle)?;
        gltf.default_scene
            .clone()
            .or_else(|| gltf.scenes.first().cloned())
    }
}

/// Marker for HUD text elements
#[derive(Component)]
pub enum HudText {
    Speed,
    Score,
    Brake,
}

/// Root node of the game-over overlay
#[derive(Component)]
pub struct GameOverOverlay;

/// Text inside the game-over overlay
#[derive(Component)]
pub struct FinalScoreText;
