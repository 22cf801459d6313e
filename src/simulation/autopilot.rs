//! Scripted driver for headless runs
//!
//! Holds the throttle, steers back toward the centre line and brakes when
//! traffic is close ahead in the same stretch of road.

use super::types::Transform;
use super::vehicle::DriveInput;
use super::world::SimWorld;

/// How far ahead traffic makes the autopilot brake
const BRAKE_DISTANCE: f32 = 15.0;
/// Lateral gap under which an NPC counts as being in the way
const LATERAL_CLEARANCE: f32 = 1.2;
const MAX_CORRECTION_YAW: f32 = 0.1;
const YAW_PER_UNIT_OFFSET: f32 = 0.05;
const YAW_DEADBAND: f32 = 0.005;

/// Decide this frame's input from the current world state
pub fn autopilot(world: &SimWorld) -> DriveInput {
    let Ok(car) = world.player.transform(&world.ctx) else {
        return DriveInput::default();
    };

    // Yaw still to come from the current turn rate once steering is released
    let config = world.config();
    let settle = config.fixed_timestep * config.turn_damping / (1.0 - config.turn_damping);
    let (left, right) = steer_to_centre(&car, world.player.turn_rate * settle);
    let blocked = world.traffic.npcs().any(|npc| {
        let ahead = car.translation.z - npc.global_z;
        (0.0..BRAKE_DISTANCE).contains(&ahead)
            && (npc.lane_x - car.translation.x).abs() < LATERAL_CLEARANCE
    });

    DriveInput {
        forward: !blocked,
        brake: blocked,
        left,
        right,
    }
}

/// Returns (left, right)
fn steer_to_centre(car: &Transform, pending_yaw: f32) -> (bool, bool) {
    // Positive yaw heads toward -X
    let desired =
        (car.translation.x * YAW_PER_UNIT_OFFSET).clamp(-MAX_CORRECTION_YAW, MAX_CORRECTION_YAW);
    let yaw = car.yaw() + pending_yaw;
    if yaw < desired - YAW_DEADBAND {
        (true, false)
    } else if yaw > desired + YAW_DEADBAND {
        (false, true)
    } else {
        (false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn steers_left_when_drifted_right() {
        let car = Transform::from_translation(Vec3::new(3.0, 0.25, 0.0));
        assert_eq!(steer_to_centre(&car, 0.0), (true, false));
    }

    #[test]
    fn counter_steers_against_pending_turn() {
        let car = Transform::new(Vec3::ZERO, Quat::IDENTITY);
        assert_eq!(steer_to_centre(&car, 0.05), (false, true));
    }

    #[test]
    fn holds_straight_on_centre_line() {
        let car = Transform::new(Vec3::ZERO, Quat::IDENTITY);
        assert_eq!(steer_to_centre(&car, 0.0), (false, false));
    }
}
