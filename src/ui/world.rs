//! World setup systems for camera, lighting, ground and the HUD

use bevy::prelude::*;

use super::components::{FinalScoreText, GameOverOverlay, Ground, HudText, MainCamera};

/// System to setup the world environment (ground, lighting, camera)
pub fn setup_world(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Placed every frame by the simulation's camera rig
    commands.spawn((
        MainCamera,
        Camera3d::default(),
        Transform::from_xyz(0.0, 2.0, 2.5).looking_at(Vec3::new(0.0, 2.25, 0.0), Vec3::Y),
    ));

    // Dusk sky
    commands.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.12)));
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.6, 0.6, 0.8),
        brightness: 300.0,
        ..default()
    });

    commands.spawn((
        DirectionalLight {
            illuminance: 4000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 20.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Grass on both sides of the road; the road itself is drawn per segment
    commands.spawn((
        Ground,
        Mesh3d(meshes.add(Plane3d::default().mesh().size(400.0, 400.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.12, 0.2, 0.12))),
        Transform::from_xyz(0.0, -0.01, 0.0),
    ));
}

/// Keep the ground under the player so it never runs out
pub fn follow_ground(
    camera_query: Query<&Transform, (With<MainCamera>, Without<Ground>)>,
    mut ground_query: Query<&mut Transform, With<Ground>>,
) {
    let Ok(camera) = camera_query.single() else {
        return;
    };
    for mut ground in ground_query.iter_mut() {
        ground.translation.z = camera.translation.z;
    }
}

/// System to setup the speed/score readout and the hidden game-over overlay
pub fn setup_hud(mut commands: Commands) {
    commands
        .spawn((
            Node {
                width: Val::Auto,
                height: Val::Auto,
                position_type: PositionType::Absolute,
                top: Val::Px(10.0),
                left: Val::Px(10.0),
                padding: UiRect::all(Val::Px(10.0)),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(5.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Speed: 0 mph"),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                HudText::Speed,
            ));
            parent.spawn((
                Text::new("Score: 0"),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::srgb(0.9, 0.9, 0.9)),
                HudText::Score,
            ));
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::srgb(1.0, 0.3, 0.3)),
                HudText::Brake,
            ));
        });

    commands
        .spawn((
            GameOverOverlay,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(12.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("GAME OVER"),
                TextFont {
                    font_size: 48.0,
                    ..default()
                },
                TextColor(Color::srgb(1.0, 0.2, 0.2)),
            ));
            parent.spawn((
                Text::new("Final score: 0"),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                FinalScoreText,
            ));
            parent.spawn((
                Text::new("Press Enter to restart"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(0.8, 0.8, 0.8)),
            ));
        });
}
