//! Systems for syncing Bevy entities with simulation state

use bevy::gltf::Gltf;
use bevy::prelude::*;
use std::collections::HashSet;

use super::components::{
    EntityMappings, FinalScoreText, GameOverOverlay, HudText, MainCamera, ModelHandles, NpcLink,
    PlayerVisual, SegmentLink, SegmentProps, SimSynced, SimWorldResource, SkylineLink, TailLight,
    Tire,
};
use super::input::read_drive_input;
use crate::simulation::{
    barrier_placements, AssetKind, NpcId, Transform as SimTransform, TAIL_LIGHT_NAMES, TIRE_NAMES,
};

/// Height of the street light above the road centre line
const STREET_LIGHT_HEIGHT: f32 = 5.0;

fn to_bevy(transform: &SimTransform) -> Transform {
    Transform::from_translation(transform.translation).with_rotation(transform.rotation)
}

fn paint(color: u32) -> Color {
    let [_, r, g, b] = color.to_be_bytes();
    Color::srgb_u8(r, g, b)
}

/// System to run simulation tick
pub fn tick_simulation(
    time: Res<Time>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut sim_world: ResMut<SimWorldResource>,
) {
    let input = read_drive_input(&keyboard);
    sim_world.0.tick(time.delta_secs(), input);
}

/// System to place the player's car and give it a model once one is loaded
pub fn sync_player(
    mut commands: Commands,
    sim_world: Res<SimWorldResource>,
    handles: Res<ModelHandles>,
    gltfs: Res<Assets<Gltf>>,
    mut player_query: Query<(Entity, &mut Transform, Has<SceneRoot>), With<PlayerVisual>>,
) {
    let snapshot = sim_world.0.snapshot();
    for (entity, mut transform, has_scene) in player_query.iter_mut() {
        *transform = to_bevy(&snapshot.player_visual);
        if !has_scene {
            if let Some(scene) = handles.scene(AssetKind::PlayerCar, 0, &gltfs) {
                commands.entity(entity).insert(SceneRoot(scene));
            }
        }
    }
}

/// System to sync NPC visuals from simulation state
pub fn sync_npcs(
    mut commands: Commands,
    sim_world: Res<SimWorldResource>,
    handles: Res<ModelHandles>,
    gltfs: Res<Assets<Gltf>>,
    mut mappings: ResMut<EntityMappings>,
    mut npc_query: Query<(Entity, &NpcLink, &mut Transform)>,
) {
    let world = &sim_world.0;
    let visual_height = world.config().npc_visual_height;

    // Update existing NPCs and track which ones still exist
    let mut existing: HashSet<NpcId> = HashSet::new();
    for (entity, link, mut transform) in npc_query.iter_mut() {
        if let Some(npc) = world.traffic.get(link.0) {
            existing.insert(link.0);
            *transform = to_bevy(&npc.visual_transform(visual_height));
        } else {
            // NPC no longer exists in simulation, despawn
            commands.entity(entity).despawn();
            mappings.npcs.remove(&link.0);
        }
    }

    let Some(scene) = handles.scene(AssetKind::NpcCar, 0, &gltfs) else {
        return;
    };
    for npc in world.traffic.npcs() {
        if existing.contains(&npc.id) {
            continue;
        }
        let entity = commands
            .spawn((
                SimSynced,
                NpcLink(npc.id),
                SceneRoot(scene.clone()),
                to_bevy(&npc.visual_transform(visual_height)),
            ))
            .id();
        mappings.npcs.insert(npc.id, entity);
    }
}

/// System to move recycled segments and attach props that became available
pub fn sync_segments(
    mut commands: Commands,
    sim_world: Res<SimWorldResource>,
    handles: Res<ModelHandles>,
    gltfs: Res<Assets<Gltf>>,
    mut segment_query: Query<(Entity, &SegmentLink, &mut Transform, &mut SegmentProps)>,
) {
    let world = &sim_world.0;
    let placements = barrier_placements(world.config());

    for (entity, link, mut transform, mut props) in segment_query.iter_mut() {
        let Some(segment) = world.segments.segment(link.0) else {
            continue;
        };
        transform.translation.z = segment.z_position;

        if let Some(kind) = segment.barrier {
            if props.barrier != Some(kind) {
                if let Some(scene) = handles.scene(kind, 0, &gltfs) {
                    commands.entity(entity).with_children(|parent| {
                        for placement in &placements {
                            parent.spawn((
                                SceneRoot(scene.clone()),
                                Transform::from_translation(placement.offset)
                                    .with_rotation(Quat::from_rotation_y(placement.yaw)),
                            ));
                        }
                    });
                    props.barrier = Some(kind);
                }
            }
        }

        if segment.has_street_light && !props.street_light {
            if let Some(scene) = handles.scene(AssetKind::StreetLight, 0, &gltfs) {
                commands.entity(entity).with_children(|parent| {
                    parent.spawn((
                        SceneRoot(scene),
                        Transform::from_xyz(0.0, STREET_LIGHT_HEIGHT, 0.0),
                    ));
                    parent.spawn((
                        SpotLight {
                            color: paint(0xF36940),
                            intensity: 200_000.0,
                            range: 20.0,
                            outer_angle: 0.8,
                            shadows_enabled: false,
                            ..default()
                        },
                        Transform::from_xyz(0.0, STREET_LIGHT_HEIGHT, 0.0)
                            .looking_at(Vec3::ZERO, Vec3::Z),
                    ));
                });
                props.street_light = true;
            }
        }
    }
}

/// System to spawn and recycle skyline buildings
pub fn sync_skyline(
    mut commands: Commands,
    sim_world: Res<SimWorldResource>,
    handles: Res<ModelHandles>,
    gltfs: Res<Assets<Gltf>>,
    mut mappings: ResMut<EntityMappings>,
    mut skyline_query: Query<(&SkylineLink, &mut Transform)>,
) {
    let buildings = sim_world.0.skyline.buildings();

    for (link, mut transform) in skyline_query.iter_mut() {
        if let Some(building) = buildings.get(link.0) {
            transform.translation = building.position;
            transform.scale = building.scale;
        }
    }

    for (index, building) in buildings.iter().enumerate().skip(mappings.skyline.len()) {
        let Some(scene) = handles.scene(AssetKind::Skyscrapers, building.variant, &gltfs) else {
            return;
        };
        let entity = commands
            .spawn((
                SimSynced,
                SkylineLink(index),
                SceneRoot(scene),
                Transform::from_translation(building.position).with_scale(building.scale),
            ))
            .id();
        mappings.skyline.push(entity);
    }
}

/// System to place the camera from the simulation's camera rig
pub fn sync_camera(
    sim_world: Res<SimWorldResource>,
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
) {
    let camera = sim_world.0.camera.transform;
    for mut transform in camera_query.iter_mut() {
        *transform =
            Transform::from_translation(camera.position).looking_at(camera.look_at, Vec3::Y);
    }
}

/// Tag tires, tail lights and NPC body panels as car scenes finish spawning
#[allow(clippy::too_many_arguments)]
pub fn tag_model_parts(
    mut commands: Commands,
    sim_world: Res<SimWorldResource>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    named_query: Query<(Entity, &Name, &Transform), Added<Name>>,
    parents: Query<&ChildOf>,
    children: Query<&Children>,
    players: Query<(), With<PlayerVisual>>,
    npcs: Query<&NpcLink>,
    point_lights: Query<&PointLight>,
    spot_lights: Query<&SpotLight>,
    meshes: Query<(), With<MeshMaterial3d<StandardMaterial>>>,
) {
    for (entity, name, transform) in named_query.iter() {
        let Some(owner) = parents
            .iter_ancestors(entity)
            .find(|ancestor| players.contains(*ancestor) || npcs.contains(*ancestor))
        else {
            continue;
        };
        let name = name.as_str();

        if TIRE_NAMES.contains(&name) {
            commands.entity(entity).insert(Tire {
                rest: transform.rotation,
                owner,
            });
        }

        if players.contains(owner) && TAIL_LIGHT_NAMES.contains(&name) {
            let lit = std::iter::once(entity).chain(children.iter_descendants(entity));
            for light in lit {
                let intensity = point_lights
                    .get(light)
                    .map(|l| l.intensity)
                    .or_else(|_| spot_lights.get(light).map(|l| l.intensity));
                if let Ok(base_intensity) = intensity {
                    commands.entity(light).insert(TailLight { base_intensity });
                }
            }
        }

        if name == "main_frame" {
            let Ok(link) = npcs.get(owner) else {
                continue;
            };
            let Some(npc) = sim_world.0.traffic.get(link.0) else {
                continue;
            };
            let material = materials.add(StandardMaterial {
                base_color: paint(npc.color),
                metallic: 0.6,
                perceptual_roughness: 0.4,
                ..default()
            });
            let panels = std::iter::once(entity).chain(children.iter_descendants(entity));
            for panel in panels.filter(|e| meshes.contains(*e)) {
                commands
                    .entity(panel)
                    .insert(MeshMaterial3d(material.clone()));
            }
        }
    }
}

/// System to roll tires by their car's accumulated spin
pub fn spin_tires(
    sim_world: Res<SimWorldResource>,
    npcs: Query<&NpcLink>,
    mut tire_query: Query<(&Tire, &mut Transform)>,
) {
    let world = &sim_world.0;
    for (tire, mut transform) in tire_query.iter_mut() {
        let spin = match npcs.get(tire.owner) {
            Ok(link) => match world.traffic.get(link.0) {
                Some(npc) => npc.tire_spin,
                None => continue,
            },
            Err(_) => world.player.tire_spin,
        };
        transform.rotation = tire.rest * Quat::from_rotation_x(spin);
    }
}

/// System to brighten the tail lights while braking
pub fn update_tail_lights(
    sim_world: Res<SimWorldResource>,
    mut light_query: Query<(&TailLight, Option<&mut PointLight>, Option<&mut SpotLight>)>,
) {
    let multiplier = sim_world
        .0
        .snapshot()
        .brake_light_intensity
        .unwrap_or(1.0);
    for (tail_light, point, spot) in light_query.iter_mut() {
        let intensity = tail_light.base_intensity * multiplier;
        if let Some(mut point) = point {
            point.intensity = intensity;
        }
        if let Some(mut spot) = spot {
            spot.intensity = intensity;
        }
    }
}

/// System to update the speed/score readout
pub fn update_hud(
    sim_world: Res<SimWorldResource>,
    mut text_query: Query<(&HudText, &mut Text)>,
) {
    let snapshot = sim_world.0.snapshot();

    for (hud_text, mut text) in text_query.iter_mut() {
        match hud_text {
            HudText::Speed => {
                **text = if snapshot.at_top_speed {
                    format!("Speed: {:.0} mph (TOP SPEED)", snapshot.displayed_speed)
                } else {
                    format!("Speed: {:.0} mph", snapshot.displayed_speed)
                };
            }
            HudText::Score => {
                **text = format!("Score: {}", snapshot.displayed_score);
            }
            HudText::Brake => {
                **text = if snapshot.braking {
                    "BRAKE".to_string()
                } else {
                    String::new()
                };
            }
        }
    }
}

/// System to show the game-over overlay with the frozen final score
pub fn update_game_over_overlay(
    sim_world: Res<SimWorldResource>,
    mut overlay_query: Query<&mut Visibility, With<GameOverOverlay>>,
    mut score_query: Query<&mut Text, (With<FinalScoreText>, Without<HudText>)>,
) {
    let session = &sim_world.0.session;

    for mut visibility in overlay_query.iter_mut() {
        *visibility = if session.show_game_over {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
    }

    if let Some(final_score) = session.final_score {
        for mut text in score_query.iter_mut() {
            **text = format!("Final score: {}", final_score);
        }
    }
}
