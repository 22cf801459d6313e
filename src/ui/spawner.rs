//! Systems for loading models and spawning visual entities from simulation state

use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::mesh::VertexAttributeValues;
use bevy::prelude::*;

use super::components::{
    EntityMappings, ModelHandles, PlayerVisual, SegmentLink, SegmentProps, SimSynced,
    SimWorldResource,
};
use crate::simulation::{AssetKind, LoadedModel, Segment, SimConfig};

/// Start loading every model the simulation knows about
pub fn load_models(asset_server: Res<AssetServer>, mut handles: ResMut<ModelHandles>) {
    for kind in AssetKind::ALL {
        let loaded = kind
            .paths()
            .iter()
            .map(|path| asset_server.load::<Gltf>(*path))
            .collect();
        handles.gltfs.insert(kind, loaded);
    }
}

/// Forward finished (or failed) loads into the simulation's asset channel
///
/// A kind is reported once: ready when all of its files are loaded, failed
/// as soon as any of them fails.
pub fn report_model_loads(
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    scenes: Res<Assets<Scene>>,
    meshes: Res<Assets<Mesh>>,
    mut handles: ResMut<ModelHandles>,
    sim_world: Res<SimWorldResource>,
) {
    let sender = sim_world.0.asset_sender();

    for kind in AssetKind::ALL {
        if handles.reported.get(&kind).copied().unwrap_or(false) {
            continue;
        }
        let Some(files) = handles.gltfs.get(&kind) else {
            continue;
        };

        let mut all_loaded = true;
        let mut failure = None;
        for handle in files {
            match asset_server.load_state(handle.id()) {
                LoadState::Loaded => {}
                LoadState::Failed(err) => {
                    failure = Some(err.to_string());
                    break;
                }
                _ => all_loaded = false,
            }
        }

        if let Some(reason) = failure {
            sender.failed(kind, reason);
        } else if all_loaded {
            let loaded: Vec<&Gltf> = files.iter().filter_map(|handle| gltfs.get(handle)).collect();
            let names = loaded
                .iter()
                .flat_map(|gltf| gltf.named_nodes.keys().map(|name| name.to_string()))
                .collect::<Vec<_>>();
            let measured = loaded
                .iter()
                .filter_map(|gltf| gltf.default_scene.as_ref().or_else(|| gltf.scenes.first()))
                .filter_map(|scene| scenes.get(scene))
                .filter_map(|scene| scene_min_y(scene, &meshes))
                .reduce(f32::min);
            let bounds_min_y = match measured {
                Some(min_y) => min_y,
                None => {
                    let stock = LoadedModel::stock(kind).bounds_min_y;
                    warn!(
                        "No mesh bounds for {:?}, assuming the stock model's lowest point {}",
                        kind, stock
                    );
                    stock
                }
            };
            let model = LoadedModel::new(kind)
                .with_sub_objects(names)
                .with_bounds_min_y(bounds_min_y);
            sender.ready(model);
        } else {
            continue;
        }
        handles.reported.insert(kind, true);
    }
}

/// Lowest vertex of a scene in scene space, if it has any meshes loaded
pub fn scene_min_y(scene: &Scene, meshes: &Assets<Mesh>) -> Option<f32> {
    let world = &scene.world;
    let mut lowest: Option<f32> = None;

    #[allow(deprecated)]
    for entity_ref in world.iter_entities() {
        let Some(mesh3d) = entity_ref.get::<Mesh3d>() else {
            continue;
        };
        let Some(mesh) = meshes.get(&mesh3d.0) else {
            continue;
        };
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            continue;
        };

        let matrix = scene_matrix(entity_ref.id(), world);
        for position in positions {
            let y = matrix.transform_point3(Vec3::from_array(*position)).y;
            lowest = Some(lowest.map_or(y, |current| current.min(y)));
        }
    }
    lowest
}

/// Accumulated transform from the scene root down to `entity`
fn scene_matrix(entity: Entity, world: &World) -> Mat4 {
    let mut matrix = Mat4::IDENTITY;
    let mut current = entity;
    loop {
        if let Some(transform) = world.get::<Transform>(current) {
            matrix = transform.to_matrix() * matrix;
        }
        match world.get::<ChildOf>(current) {
            Some(child_of) => current = child_of.parent(),
            None => break,
        }
    }
    matrix
}

/// System to create initial visual entities from simulation state
pub fn spawn_initial_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    sim_world: Res<SimWorldResource>,
    mut mappings: ResMut<EntityMappings>,
) {
    let world = &sim_world.0;

    let player = commands
        .spawn((
            SimSynced,
            PlayerVisual,
            Transform::default(),
            Visibility::default(),
        ))
        .id();
    mappings.player = Some(player);

    for segment in world.segments.segments() {
        spawn_segment_visual(
            &mut commands,
            &mut meshes,
            &mut materials,
            world.config(),
            segment,
            &mut mappings,
        );
    }
}

/// Spawn the road surface and lane markings for one segment
pub fn spawn_segment_visual(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    config: &SimConfig,
    segment: &Segment,
    mappings: &mut ResMut<EntityMappings>,
) {
    const MARKING_WIDTH: f32 = 0.1;
    const MARKING_LENGTH: f32 = 3.0;
    const MARKINGS_PER_SEGMENT: usize = 5;
    let road_color = Color::srgb(0.15, 0.15, 0.17);
    let marking_color = Color::srgb(0.9, 0.9, 0.85);

    let road_width = config.road_width();
    let segment_length = config.segment_length;
    let marking_mesh = meshes.add(Plane3d::default().mesh().size(MARKING_WIDTH, MARKING_LENGTH));
    let marking_material = materials.add(marking_color);

    let entity = commands
        .spawn((
            SimSynced,
            SegmentLink(segment.id),
            SegmentProps::default(),
            Mesh3d(meshes.add(Plane3d::default().mesh().size(road_width, segment_length))),
            MeshMaterial3d(materials.add(road_color)),
            Transform::from_xyz(0.0, 0.0, segment.z_position),
        ))
        .with_children(|parent| {
            // Dashed lines between lanes
            for lane in 1..config.lane_count {
                let x = -road_width / 2.0 + lane as f32 * config.lane_width;
                for i in 0..MARKINGS_PER_SEGMENT {
                    let z = -segment_length / 2.0
                        + (i as f32 + 0.5) * segment_length / MARKINGS_PER_SEGMENT as f32;
                    parent.spawn((
                        Mesh3d(marking_mesh.clone()),
                        MeshMaterial3d(marking_material.clone()),
                        Transform::from_xyz(x, 0.01, z),
                    ));
                }
            }
        })
        .id();
    mappings.segments.insert(segment.id, entity);
}
