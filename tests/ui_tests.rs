#![cfg(feature = "ui")]
//! Model measurement used when reporting loaded models to the simulation

use bevy::prelude::*;
use highway_sim::ui::spawner::scene_min_y;

/// Test that the lowest point includes the transforms of parent nodes
#[test]
fn test_scene_min_y_follows_node_hierarchy() {
    let mut meshes = Assets::<Mesh>::default();
    let body = meshes.add(Cuboid::new(1.0, 0.5, 2.0));
    let wheel = meshes.add(Cuboid::new(0.6, 0.6, 0.6));

    let mut world = World::new();
    let root = world.spawn(Transform::from_xyz(0.0, 1.0, 0.0)).id();
    world.spawn((Mesh3d(body), Transform::from_xyz(0.0, -0.5, 0.0), ChildOf(root)));
    world.spawn((Mesh3d(wheel), Transform::from_xyz(0.0, 0.2, 1.0)));
    let scene = Scene::new(world);

    // Body bottom: 1.0 - 0.5 - 0.25; wheel bottom: 0.2 - 0.3
    let min_y = scene_min_y(&scene, &meshes).unwrap();
    assert!((min_y - -0.1).abs() < 1e-5, "min_y was {}", min_y);
}

/// Test that a scene without loaded meshes reports no bounds
#[test]
fn test_scene_min_y_without_meshes() {
    let meshes = Assets::<Mesh>::default();

    let mut empty = World::new();
    empty.spawn(Transform::default());
    assert_eq!(scene_min_y(&Scene::new(empty), &meshes), None);

    // A handle whose mesh never arrived is skipped
    let mut missing = World::new();
    missing.spawn(Mesh3d(Handle::<Mesh>::default()));
    assert_eq!(scene_min_y(&Scene::new(missing), &meshes), None);
}
