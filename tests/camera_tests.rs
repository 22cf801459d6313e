//! Follow camera intro and chase behaviour

use std::f32::consts::FRAC_PI_3;

use glam::{Quat, Vec3};
use highway_sim::simulation::{CameraMode, CameraRig, SimConfig, Transform};

const DT: f32 = 1.0 / 60.0;

fn orbit_angle_of(rig: &CameraRig, car: &Transform) -> f32 {
    let offset = rig.transform.position - car.translation;
    offset.x.atan2(offset.z)
}

#[test]
fn test_intro_angle_at_time_zero() {
    let config = SimConfig::default();
    let mut rig = CameraRig::new();
    let car = Transform::from_translation(Vec3::ZERO);

    rig.update(0.0, &car, &config);

    assert!(rig.in_intro());
    assert!((rig.orbit_angle - FRAC_PI_3).abs() < 1e-6);
    assert!((orbit_angle_of(&rig, &car) - FRAC_PI_3).abs() < 1e-5);
    let position = rig.transform.position;
    assert!((position.y - config.intro_start_height).abs() < 1e-6);
    assert!((position.x.hypot(position.z) - config.intro_start_distance).abs() < 1e-5);
}

#[test]
fn test_intro_starts_beside_the_car() {
    let config = SimConfig::default();
    let mut rig = CameraRig::new();
    let car = Transform::from_translation(Vec3::new(0.0, 0.05, 0.0));

    rig.update(DT, &car, &config);

    let t = DT / config.intro_duration;
    let expected = FRAC_PI_3 * (1.0 - t);
    assert!(rig.in_intro());
    assert!((rig.orbit_angle - expected).abs() < 1e-5);
    assert!((orbit_angle_of(&rig, &car) - expected).abs() < 1e-4);
    assert_eq!(
        rig.transform.look_at,
        car.translation + Vec3::Y * config.look_at_height
    );
}

#[test]
fn test_intro_ends_behind_the_car_and_switches_once() {
    let config = SimConfig::default();
    let mut rig = CameraRig::new();
    let car = Transform::from_translation(Vec3::ZERO);

    let mut frames = 0;
    while rig.in_intro() {
        rig.update(DT, &car, &config);
        frames += 1;
        assert!(frames <= 125, "intro never finished");
    }

    assert!(frames >= 120, "intro finished after only {} frames", frames);
    assert_eq!(rig.mode, CameraMode::Chase);
    assert_eq!(rig.mode_switches, 1);
    assert!(rig.orbit_angle.abs() < 1e-5);
    let position = rig.transform.position;
    assert!(position.x.abs() < 1e-4);
    assert!((position.y - config.chase_height).abs() < 1e-4);
    assert!((position.z - config.chase_distance).abs() < 1e-4);

    for _ in 0..300 {
        rig.update(DT, &car, &config);
    }
    assert_eq!(rig.mode_switches, 1);
    assert!(!rig.in_intro());
}

#[test]
fn test_intro_sweeps_monotonically_toward_the_back() {
    let config = SimConfig::default();
    let mut rig = CameraRig::new();
    let car = Transform::from_translation(Vec3::ZERO);

    let mut previous = f32::MAX;
    while rig.in_intro() {
        rig.update(DT, &car, &config);
        assert!(rig.orbit_angle <= previous);
        previous = rig.orbit_angle;
    }
}

#[test]
fn test_intro_offset_follows_car_heading() {
    let config = SimConfig::default();
    let mut rig = CameraRig::new();
    let car = Transform::new(Vec3::new(2.0, 0.0, -40.0), Quat::from_rotation_y(0.5));

    rig.update(DT, &car, &config);

    // The car's back points at angle 0.5 around Y
    let t = DT / config.intro_duration;
    let expected = 0.5 + FRAC_PI_3 * (1.0 - t);
    assert!((rig.orbit_angle - expected).abs() < 1e-5);
    assert!((orbit_angle_of(&rig, &car) - expected).abs() < 1e-4);
}

#[test]
fn test_chase_snaps_along_travel_and_smooths_sideways() {
    let config = SimConfig::default();
    let mut rig = CameraRig::new();
    let start = Transform::from_translation(Vec3::ZERO);
    while rig.in_intro() {
        rig.update(DT, &start, &config);
    }
    let before = rig.transform.position;

    let moved = Transform::from_translation(Vec3::new(1.0, 0.0, -10.0));
    rig.update(DT, &moved, &config);
    let position = rig.transform.position;

    assert!((position.z - (-10.0 + config.chase_distance)).abs() < 1e-5);
    let expected_x = before.x + (1.0 - before.x) * config.chase_smoothing;
    assert!((position.x - expected_x).abs() < 1e-5);
    assert!((position.y - config.chase_height).abs() < 1e-4);
    assert_eq!(
        rig.transform.look_at,
        moved.translation + Vec3::Y * config.look_at_height
    );
}

#[test]
fn test_chase_converges_on_a_steady_car() {
    let config = SimConfig::default();
    let mut rig = CameraRig::new();
    let start = Transform::from_translation(Vec3::ZERO);
    while rig.in_intro() {
        rig.update(DT, &start, &config);
    }

    let car = Transform::from_translation(Vec3::new(3.0, 0.0, -50.0));
    for _ in 0..200 {
        rig.update(DT, &car, &config);
    }
    let position = rig.transform.position;
    assert!((position.x - 3.0).abs() < 1e-3);
    assert!((position.z - (-50.0 + config.chase_distance)).abs() < 1e-5);
}
