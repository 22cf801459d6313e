use highway_sim::simulation::{
    autopilot, AssetKind, BodyClass, SessionState, SimConfig, SimWorld,
};
use std::process::Command;

const DT: f32 = 1.0 / 60.0;

/// Drive the world with the autopilot the way the headless binary does
fn drive(world: &mut SimWorld, ticks: u32) {
    let sender = world.asset_sender();
    for tick in 0..ticks {
        let input = autopilot(world);
        world.tick(DT, input);
        if tick == 0 {
            sender.ready_all();
        }
    }
}

fn expected_body_count(world: &SimWorld) -> usize {
    2 + 2 * world.segments.len() + world.traffic.len()
}

/// Test that the simulation runs in headless mode without crashing
#[test]
fn test_headless_simulation_runs() {
    let output = Command::new("cargo")
        .args(["run", "--", "--ticks", "600", "--seed", "3"])
        .env("RUST_LOG", "warn,highway_sim=info")
        .output()
        .expect("Failed to execute simulation");

    assert!(
        output.status.success(),
        "Simulation failed to run in headless mode. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("=== Final State ==="),
        "Simulation did not complete properly. stdout: {}",
        stdout
    );
    assert!(stdout.contains("State: Running"), "Autopilot crashed: {}", stdout);
}

/// Test that the binary refuses a delta that would never advance time
#[test]
fn test_headless_rejects_non_positive_delta() {
    for delta in ["--delta=-0.1", "--delta=0"] {
        let output = Command::new("cargo")
            .args(["run", "--", delta, "--ticks", "5", "--seed", "1"])
            .output()
            .expect("Failed to execute simulation");

        assert!(!output.status.success(), "{} was accepted", delta);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("--delta"), "unexpected error: {}", stderr);
    }
}

/// Test that a low top speed also lowers the starting speed
#[test]
fn test_headless_accepts_max_speed_below_initial_speed() {
    let output = Command::new("cargo")
        .args(["run", "--", "--max-speed", "30", "--ticks", "120", "--seed", "2"])
        .output()
        .expect("Failed to execute simulation");

    assert!(
        output.status.success(),
        "Simulation rejected --max-speed 30. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== Final State ==="));
}

/// Test that an invalid configuration is rejected before anything is built
#[test]
fn test_invalid_configuration_is_rejected() {
    let no_segments = SimConfig {
        segment_count: 0,
        ..SimConfig::default()
    };
    assert!(SimWorld::new_with_seed(no_segments, 1).is_err());

    let bad_chance = SimConfig {
        npc_spawn_chance: 1.5,
        ..SimConfig::default()
    };
    let err = SimWorld::new_with_seed(bad_chance, 1).err().unwrap();
    assert!(err.to_string().contains("npc_spawn_chance"));

    let nan_speed = SimConfig {
        max_speed: f32::NAN,
        ..SimConfig::default()
    };
    assert!(SimWorld::new_with_seed(nan_speed, 1).is_err());

    let sharp_start = SimConfig {
        max_turn_rate: 0.05,
        ..SimConfig::default()
    };
    let err = SimWorld::new_with_seed(sharp_start, 1).err().unwrap();
    assert!(err.to_string().contains("initial_turn_rate"));

    assert!(SimWorld::new_with_seed(SimConfig::default(), 1).is_ok());
}

/// Test that a frame with a negative or non-finite delta changes nothing
#[test]
fn test_invalid_delta_frames_are_skipped() {
    let mut world = SimWorld::new_with_seed(SimConfig::default(), 1).unwrap();
    drive(&mut world, 60);
    let score = world.player.score;
    let ticks = world.ticks;
    let time = world.ctx.time;
    let z = world.player_z();

    let forward = autopilot(&world);
    for delta in [-0.1, f32::NAN, f32::INFINITY] {
        world.tick(delta, forward);
    }

    assert_eq!(world.player.score, score);
    assert_eq!(world.ticks, ticks);
    assert_eq!(world.ctx.time, time);
    assert_eq!(world.player_z(), z);
}

/// Test the first frame's presentation data
#[test]
fn test_initial_snapshot() {
    let world = SimWorld::new_with_seed(SimConfig::default(), 1).unwrap();
    let snapshot = world.snapshot();

    assert_eq!(snapshot.displayed_speed, 60.0);
    assert_eq!(snapshot.displayed_score, 0);
    assert!(!snapshot.braking);
    assert!(!snapshot.at_top_speed);
    assert!(!snapshot.game_over);
    assert_eq!(snapshot.final_score, None);
    assert_eq!(snapshot.tail_light_event, None);
    // No tail lights until the player model arrives
    assert_eq!(snapshot.brake_light_intensity, None);
    assert_eq!(world.state(), SessionState::Running);
}

/// Test that the autopilot survives half a minute and covers real distance
#[test]
fn test_autopilot_drives_without_crashing() {
    let mut world = SimWorld::new_with_seed(SimConfig::default(), 7).unwrap();
    drive(&mut world, 1800);

    assert_eq!(world.state(), SessionState::Running, "crashed into {:?}", world.session.crashed_into);
    assert!(world.player_z() < -1000.0, "only reached z={}", world.player_z());
    assert!(world.snapshot().displayed_score > 500);
    assert!(world.segments.recycled_total() > 20);
    assert!(world.traffic.spawned_total > 20);
}

/// Test that every physics body is accounted for while driving
#[test]
fn test_body_count_matches_live_entities() {
    let mut world = SimWorld::new_with_seed(SimConfig::default(), 21).unwrap();
    let sender = world.asset_sender();
    sender.ready_all();

    for _ in 0..900 {
        let input = autopilot(&world);
        world.tick(DT, input);
        assert_eq!(world.ctx.physics.body_count(), expected_body_count(&world));
        assert_eq!(world.ctx.bodies.len(), world.ctx.physics.body_count());
        assert_eq!(world.ctx.bodies.count(BodyClass::Npc), world.traffic.len());
        assert_eq!(world.ctx.bodies.count(BodyClass::Wall), 40);
    }
}

/// Test that traffic never lingers outside the active window
#[test]
fn test_npcs_stay_inside_active_window() {
    let mut world = SimWorld::new_with_seed(SimConfig::default(), 4).unwrap();
    world.asset_sender().ready_all();

    for _ in 0..1200 {
        let input = autopilot(&world);
        world.tick(DT, input);
        let player_z = world.player_z();
        for npc in world.traffic.npcs() {
            assert!(
                npc.global_z >= player_z - 1100.0 - 1.0,
                "NPC {:?} too far ahead",
                npc.id
            );
            assert!(
                npc.global_z <= player_z + 100.0 + 1.0,
                "NPC {:?} too far behind",
                npc.id
            );
        }
    }
}

/// Test that the skyline appears with its model and keeps up with the player
#[test]
fn test_skyline_recycles_ahead_of_player() {
    let mut world = SimWorld::new_with_seed(SimConfig::default(), 12).unwrap();
    assert!(!world.skyline.is_spawned());
    world.asset_sender().ready_all();

    for _ in 0..1200 {
        let input = autopilot(&world);
        world.tick(DT, input);
        let player_z = world.player_z();
        for building in world.skyline.buildings() {
            assert!(building.position.z <= player_z + 50.0);
        }
    }
    assert_eq!(world.skyline.buildings().len(), 40);
}

/// Test that missing models degrade visuals but never stop the simulation
#[test]
fn test_failed_assets_still_run() {
    let mut world = SimWorld::new_with_seed(SimConfig::default(), 8).unwrap();
    let sender = world.asset_sender();
    for kind in AssetKind::ALL {
        sender.failed(kind, "file not found");
    }

    for _ in 0..600 {
        let input = autopilot(&world);
        world.tick(DT, input);
    }

    assert_eq!(world.state(), SessionState::Running);
    assert!(world.traffic.is_empty());
    assert!(!world.skyline.is_spawned());
    assert!(world.segments.segments().iter().all(|s| !s.has_barriers));
    assert!(world.player.tires.is_empty());
    assert!(world.player_z() < -100.0);
}

/// Test that a restart after a crash rebuilds a fresh session
#[test]
fn test_restart_after_crash() {
    let mut world = SimWorld::new_with_seed(SimConfig::default(), 9).unwrap();
    world.asset_sender().ready_all();
    world.tick(DT, Default::default());

    let (x, z) = world
        .traffic
        .npcs()
        .map(|npc| (npc.lane_x, npc.global_z))
        .next()
        .unwrap();
    world
        .ctx
        .physics
        .set_position(world.player.body, glam::Vec3::new(x, 0.25, z))
        .unwrap();
    world.tick(DT, Default::default());
    assert!(world.is_game_over());

    world.restart();

    assert_eq!(world.state(), SessionState::Running);
    assert_eq!(world.ticks, 0);
    assert_eq!(world.player.speed, 40.0);
    assert_eq!(world.player.score, 0.0);
    assert_eq!(world.player_z(), 0.0);
    assert!(world.camera.in_intro());
    assert!(!world.snapshot().game_over);
    // Models stay loaded across restarts
    assert_eq!(world.traffic.len(), 20);
    assert!(!world.player.tires.is_empty());
    assert!(world.skyline.is_spawned());
    assert_eq!(world.ctx.physics.body_count(), expected_body_count(&world));

    drive(&mut world, 300);
    assert_eq!(world.state(), SessionState::Running);
}
