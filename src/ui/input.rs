//! Input handling systems

use bevy::prelude::*;

use super::components::{EntityMappings, NpcLink, SimWorldResource};
use crate::simulation::DriveInput;

/// Map held keys to driving intent
pub fn read_drive_input(keyboard: &ButtonInput<KeyCode>) -> DriveInput {
    let held = |keys: [KeyCode; 2]| keyboard.any_pressed(keys);
    DriveInput {
        forward: held([KeyCode::KeyW, KeyCode::ArrowUp]),
        brake: held([KeyCode::KeyS, KeyCode::ArrowDown]),
        left: held([KeyCode::KeyA, KeyCode::ArrowLeft]),
        right: held([KeyCode::KeyD, KeyCode::ArrowRight]),
    }
}

/// Handle basic keyboard input
pub fn handle_input(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut sim_world: ResMut<SimWorldResource>,
    mut mappings: ResMut<EntityMappings>,
    npc_query: Query<Entity, With<NpcLink>>,
    mut exit: MessageWriter<AppExit>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }

    let restart = keyboard.any_just_pressed([KeyCode::Enter, KeyCode::Space]);
    if restart && sim_world.0.session.show_game_over {
        sim_world.0.restart();
        // NPC ids start over with the new session
        for entity in npc_query.iter() {
            commands.entity(entity).despawn();
        }
        mappings.npcs.clear();
    }
}
