//! Segment recycling validation tests

use highway_sim::simulation::{
    AssetInbox, AssetKind, AssetSender, BodyClass, LoadedModel, Segment, SegmentId, SegmentPool,
    SimConfig, SimWorld, SimulationContext, TrafficManager,
};

fn context(config: SimConfig) -> (AssetSender, SimulationContext) {
    let (sender, inbox) = AssetInbox::channel();
    (sender, SimulationContext::new_with_seed(config, inbox, 42))
}

fn ready_context(config: SimConfig) -> SimulationContext {
    let (sender, mut ctx) = context(config);
    sender.ready_all();
    ctx.assets.drain();
    ctx
}

fn assert_contiguous(pool: &SegmentPool, segment_length: f32) {
    let zs = pool.sorted_z_positions();
    for pair in zs.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            (gap - segment_length).abs() < 1e-3,
            "gap of {} between segments at {} and {}",
            gap,
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_initial_layout_is_contiguous_behind_start() {
    let mut ctx = ready_context(SimConfig::default());
    let mut traffic = TrafficManager::new();
    let pool = SegmentPool::new(&mut traffic, &mut ctx);

    assert_eq!(pool.len(), 20);
    assert_contiguous(&pool, 50.0);
    let zs = pool.sorted_z_positions();
    assert_eq!(zs[0], -950.0);
    assert_eq!(zs[19], 0.0);
}

#[test]
fn test_segment_count_constant_and_contiguous_after_many_recycles() {
    let mut ctx = ready_context(SimConfig::default());
    let mut traffic = TrafficManager::new();
    let mut pool = SegmentPool::new(&mut traffic, &mut ctx);

    let mut player_z = 0.0;
    let mut recycled = 0;
    for _ in 0..2000 {
        player_z -= 7.3;
        recycled += pool.update(player_z, &mut traffic, &mut ctx);
        assert_eq!(pool.len(), 20);
        assert_contiguous(&pool, 50.0);
    }

    assert!(recycled > 100, "expected many recycles, got {}", recycled);
    assert_eq!(pool.recycled_total(), recycled as u64);
}

#[test]
fn test_pool_covers_the_player_after_update() {
    let mut ctx = ready_context(SimConfig::default());
    let mut traffic = TrafficManager::new();
    let mut pool = SegmentPool::new(&mut traffic, &mut ctx);

    for step in 1..500 {
        let player_z = step as f32 * -11.0;
        pool.update(player_z, &mut traffic, &mut ctx);
        let zs = pool.sorted_z_positions();
        assert!(zs[19] <= player_z + 50.0);
        assert!(zs[0] >= player_z - 20.0 * 50.0);
    }
}

#[test]
fn test_player_outrunning_the_pool_keeps_progression() {
    let mut ctx = ready_context(SimConfig::default());
    let mut traffic = TrafficManager::new();
    let mut pool = SegmentPool::new(&mut traffic, &mut ctx);

    // Further than the whole pool in one frame
    let player_z = -2500.0;
    pool.update(player_z, &mut traffic, &mut ctx);

    assert_contiguous(&pool, 50.0);
    let zs = pool.sorted_z_positions();
    assert!(zs[19] <= player_z + 50.0);
    assert!(zs[0] >= player_z - 1000.0);
}

#[test]
fn test_barrier_attach_is_idempotent() {
    let (sender, mut inbox) = AssetInbox::channel();
    sender.ready(LoadedModel::new(AssetKind::Barrier));
    inbox.drain();

    let mut segment = Segment::new(SegmentId(3), 0.0);
    assert!(!segment.uses_light_barrier);
    assert!(segment.attach_barriers(&inbox));
    assert!(segment.has_barriers);
    assert_eq!(segment.barrier, Some(AssetKind::Barrier));

    assert!(!segment.attach_barriers(&inbox));
    assert!(segment.has_barriers);
    assert_eq!(segment.barrier, Some(AssetKind::Barrier));
}

#[test]
fn test_light_barrier_slot_prefers_light_barrier_and_falls_back() {
    let (sender, mut inbox) = AssetInbox::channel();
    sender.ready(LoadedModel::new(AssetKind::Barrier));
    inbox.drain();

    let mut fallback = Segment::new(SegmentId(5), 0.0);
    assert!(fallback.uses_light_barrier);
    assert!(fallback.attach_barriers(&inbox));
    assert_eq!(fallback.barrier, Some(AssetKind::Barrier));

    sender.ready(LoadedModel::new(AssetKind::LightBarrier));
    inbox.drain();
    let mut lit = Segment::new(SegmentId(10), 0.0);
    assert!(lit.attach_barriers(&inbox));
    assert_eq!(lit.barrier, Some(AssetKind::LightBarrier));
}

#[test]
fn test_barriers_wait_for_their_asset() {
    let (sender, mut ctx) = context(SimConfig::default());
    let mut traffic = TrafficManager::new();
    let mut pool = SegmentPool::new(&mut traffic, &mut ctx);
    assert!(pool.segments().iter().all(|s| !s.has_barriers));

    sender.ready(LoadedModel::new(AssetKind::Barrier));
    for kind in ctx.assets.drain() {
        pool.on_asset_ready(kind, &mut traffic, &mut ctx);
    }

    for segment in pool.segments() {
        // The regular barrier ready event only covers regular slots
        assert_eq!(segment.has_barriers, !segment.uses_light_barrier);
    }

    sender.ready(LoadedModel::new(AssetKind::LightBarrier));
    sender.ready(LoadedModel::new(AssetKind::StreetLight));
    for kind in ctx.assets.drain() {
        pool.on_asset_ready(kind, &mut traffic, &mut ctx);
    }
    for segment in pool.segments() {
        assert!(segment.has_barriers);
        assert_eq!(segment.has_street_light, segment.uses_light_barrier);
        if segment.uses_light_barrier {
            assert_eq!(segment.barrier, Some(AssetKind::LightBarrier));
        }
    }
}

#[test]
fn test_failed_barrier_asset_never_attaches() {
    let (sender, mut ctx) = context(SimConfig::default());
    sender.failed(AssetKind::Barrier, "file not found");
    sender.failed(AssetKind::LightBarrier, "file not found");
    ctx.assets.drain();

    let mut traffic = TrafficManager::new();
    let mut pool = SegmentPool::new(&mut traffic, &mut ctx);
    for step in 1..100 {
        pool.update(step as f32 * -20.0, &mut traffic, &mut ctx);
    }
    assert!(pool.segments().iter().all(|s| !s.has_barriers));
}

#[test]
fn test_walls_are_created_once_and_moved_on_recycle() {
    let mut ctx = ready_context(SimConfig::default());
    let mut traffic = TrafficManager::new();
    let mut pool = SegmentPool::new(&mut traffic, &mut ctx);

    let walls_before: Vec<_> = pool.segments().iter().map(|s| s.wall_bodies).collect();
    assert!(pool.segments().iter().all(|s| s.has_collidable_walls()));
    assert_eq!(ctx.bodies.count(BodyClass::Wall), 40);

    pool.update(-400.0, &mut traffic, &mut ctx);
    assert!(pool.recycled_total() > 0);

    let walls_after: Vec<_> = pool.segments().iter().map(|s| s.wall_bodies).collect();
    assert_eq!(walls_before, walls_after);
    assert_eq!(ctx.bodies.count(BodyClass::Wall), 40);

    for segment in pool.segments() {
        let [left, right] = segment.wall_bodies.unwrap();
        let left = ctx.physics.position(left).unwrap();
        let right = ctx.physics.position(right).unwrap();
        assert_eq!(left.z, segment.z_position);
        assert_eq!(right.z, segment.z_position);
        assert!((left.x + 5.95).abs() < 1e-4);
        assert!((right.x - 5.95).abs() < 1e-4);
        assert_eq!(left.y, 1.0);
    }
}

#[test]
fn test_recycle_spawns_npc_with_certain_chance() {
    let config = SimConfig {
        npc_spawn_chance: 1.0,
        ..SimConfig::default()
    };
    let mut ctx = ready_context(config);
    let mut traffic = TrafficManager::new();
    let mut pool = SegmentPool::new(&mut traffic, &mut ctx);

    // Clear the initial traffic so recycled slots start empty
    let ids: Vec<_> = traffic.npcs().map(|npc| npc.id).collect();
    for id in ids {
        traffic.despawn(id, &mut pool, &mut ctx);
    }

    pool.update(-400.0, &mut traffic, &mut ctx);
    let recycled: Vec<_> = pool
        .segments()
        .iter()
        .filter(|s| s.recycle_count > 0)
        .collect();
    assert!(!recycled.is_empty());
    assert!(recycled.iter().all(|s| s.occupant.is_some()));
    assert_eq!(traffic.len(), recycled.len());
}

#[test]
fn test_recycle_never_spawns_with_zero_chance() {
    let config = SimConfig {
        npc_spawn_chance: 0.0,
        ..SimConfig::default()
    };
    let mut ctx = ready_context(config);
    let mut traffic = TrafficManager::new();
    let mut pool = SegmentPool::new(&mut traffic, &mut ctx);
    let initial = traffic.spawned_total;

    for step in 1..200 {
        pool.update(step as f32 * -25.0, &mut traffic, &mut ctx);
    }
    assert_eq!(traffic.spawned_total, initial);
}

#[test]
fn test_world_keeps_pool_invariants_while_driving() {
    let config = SimConfig {
        initial_turn_rate: 0.0,
        ..SimConfig::default()
    };
    let mut world = SimWorld::new_with_seed(config, 11).unwrap();
    world.asset_sender().ready_all();

    for _ in 0..1200 {
        let input = highway_sim::simulation::autopilot(&world);
        world.tick(1.0 / 60.0, input);
        assert_eq!(world.segments.len(), 20);
    }
    assert!(world.segments.recycled_total() > 0);
    assert_contiguous(&world.segments, 50.0);
}
