//! Recycled road segments
//!
//! A fixed ring of segments gives the illusion of an endless highway: any
//! segment that falls more than one segment length behind the player is
//! moved to the front of the ring, picking up its props and possibly a new
//! NPC on the way.

use glam::Vec3;
use log::{debug, warn};
use rand::Rng;

use super::assets::{AssetInbox, AssetKind};
use super::config::{SimConfig, LIGHT_BARRIER_INTERVAL};
use super::context::SimulationContext;
use super::physics::{BodyDesc, BodyKind};
use super::traffic::TrafficManager;
use super::types::{BodyClass, BodyHandle, NpcId, RoadSide, SegmentId};

/// Where a barrier prop sits within its segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierPlacement {
    pub side: RoadSide,
    /// Segment-local offset
    pub offset: Vec3,
    /// Rotation about the vertical axis
    pub yaw: f32,
}

/// Barrier placements for both road edges
pub fn barrier_placements(config: &SimConfig) -> [BarrierPlacement; 2] {
    let x = config.road_width() / 2.0 + config.barrier_offset;
    [
        BarrierPlacement {
            side: RoadSide::Left,
            offset: Vec3::new(-x, 0.0, 0.0),
            yaw: std::f32::consts::FRAC_PI_2,
        },
        BarrierPlacement {
            side: RoadSide::Right,
            offset: Vec3::new(x, 0.0, 0.0),
            yaw: -std::f32::consts::FRAC_PI_2,
        },
    ]
}

/// One fixed-length stretch of road
#[derive(Debug, Clone)]
pub struct Segment {
    pub id: SegmentId,
    pub z_position: f32,
    pub has_barriers: bool,
    /// Which barrier model ended up attached
    pub barrier: Option<AssetKind>,
    pub uses_light_barrier: bool,
    pub has_street_light: bool,
    /// Left and right wall colliders, created once
    pub wall_bodies: Option<[BodyHandle; 2]>,
    pub occupant: Option<NpcId>,
    /// An NPC spawn was requested before the NPC model was ready
    pub needs_npc: bool,
    pub recycle_count: u32,
}

impl Segment {
    pub fn new(id: SegmentId, z_position: f32) -> Self {
        Self {
            id,
            z_position,
            has_barriers: false,
            barrier: None,
            uses_light_barrier: id.0 % LIGHT_BARRIER_INTERVAL == 0,
            has_street_light: false,
            wall_bodies: None,
            occupant: None,
            needs_npc: false,
            recycle_count: 0,
        }
    }

    pub fn has_collidable_walls(&self) -> bool {
        self.wall_bodies.is_some()
    }

    /// Attach edge barriers if a suitable model is ready
    ///
    /// Light-barrier slots prefer the light barrier and fall back to the
    /// regular one. Returns false (and changes nothing) once barriers exist.
    pub fn attach_barriers(&mut self, assets: &AssetInbox) -> bool {
        if self.has_barriers {
            return false;
        }
        let kind = if self.uses_light_barrier && assets.is_ready(AssetKind::LightBarrier) {
            AssetKind::LightBarrier
        } else if assets.is_ready(AssetKind::Barrier) {
            AssetKind::Barrier
        } else {
            return false;
        };
        self.barrier = Some(kind);
        self.has_barriers = true;
        true
    }

    /// Attach the overhead street light to light-barrier slots
    pub fn attach_street_light(&mut self, assets: &AssetInbox) -> bool {
        if !self.uses_light_barrier
            || self.has_street_light
            || !assets.is_ready(AssetKind::StreetLight)
        {
            return false;
        }
        self.has_street_light = true;
        true
    }

    /// Create the wall colliders, or move the existing ones to this segment's z
    pub fn ensure_walls(&mut self, ctx: &mut SimulationContext) {
        let config = &ctx.config;
        let wall_y = config.wall_height / 2.0;
        let left = Vec3::new(config.wall_x(RoadSide::Left.sign()), wall_y, self.z_position);
        let right = Vec3::new(config.wall_x(RoadSide::Right.sign()), wall_y, self.z_position);

        match self.wall_bodies {
            Some([left_body, right_body]) => {
                for (body, position) in [(left_body, left), (right_body, right)] {
                    if let Err(e) = ctx.physics.set_position(body, position) {
                        warn!("Failed to move wall of segment {:?}: {:#}", self.id, e);
                    }
                }
            }
            None => {
                let half_extents = Vec3::new(
                    config.wall_thickness / 2.0,
                    config.wall_height / 2.0,
                    config.segment_length / 2.0,
                );
                let left_body = ctx.spawn_body(
                    BodyDesc::cuboid(BodyKind::Static, half_extents, left),
                    BodyClass::Wall,
                );
                let right_body = ctx.spawn_body(
                    BodyDesc::cuboid(BodyKind::Static, half_extents, right),
                    BodyClass::Wall,
                );
                if let Some(player) = ctx.player_body {
                    ctx.watch(player, BodyClass::Wall);
                }
                self.wall_bodies = Some([left_body, right_body]);
            }
        }
    }
}

/// Fixed-size ring of road segments
#[derive(Debug)]
pub struct SegmentPool {
    segments: Vec<Segment>,
    recycled_total: u64,
}

impl SegmentPool {
    /// Lay out every slot behind the start position and request its props
    pub fn new(traffic: &mut TrafficManager, ctx: &mut SimulationContext) -> Self {
        let count = ctx.config.segment_count;
        let mut segments = Vec::with_capacity(count);

        for i in 0..count {
            let z = ctx.config.start_z - i as f32 * ctx.config.segment_length;
            let mut segment = Segment::new(SegmentId(i), z);
            segment.attach_barriers(&ctx.assets);
            segment.attach_street_light(&ctx.assets);
            segment.ensure_walls(ctx);
            traffic.spawn(&mut segment, ctx);
            segments.push(segment);
        }

        Self {
            segments,
            recycled_total: 0,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.0)
    }

    pub fn segment_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.segments.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn recycled_total(&self) -> u64 {
        self.recycled_total
    }

    /// Segment z positions, front-most (most negative) first
    pub fn sorted_z_positions(&self) -> Vec<f32> {
        let mut zs: Vec<f32> = self.segments.iter().map(|s| s.z_position).collect();
        zs.sort_by(|a, b| a.total_cmp(b));
        zs
    }

    /// Recycle every segment that has scrolled behind the player
    ///
    /// Returns the number of recycle operations performed.
    pub fn update(
        &mut self,
        player_z: f32,
        traffic: &mut TrafficManager,
        ctx: &mut SimulationContext,
    ) -> usize {
        let threshold = player_z + ctx.config.segment_length;
        let shift = ctx.config.pool_length();
        let mut recycled = 0;

        for segment in &mut self.segments {
            // Only loops more than once if the player outran the whole pool in one frame
            while segment.z_position > threshold {
                segment.z_position -= shift;
                segment.recycle_count += 1;
                recycled += 1;

                segment.attach_barriers(&ctx.assets);
                segment.attach_street_light(&ctx.assets);
                segment.ensure_walls(ctx);

                if segment.occupant.is_none()
                    && ctx.rng.random::<f32>() < ctx.config.npc_spawn_chance
                {
                    traffic.spawn(segment, ctx);
                }
                debug!(
                    "Recycled segment {:?} to z={:.1}",
                    segment.id, segment.z_position
                );
            }
        }

        self.recycled_total += recycled as u64;
        recycled
    }

    /// React to a model finishing its load
    pub fn on_asset_ready(
        &mut self,
        kind: AssetKind,
        traffic: &mut TrafficManager,
        ctx: &mut SimulationContext,
    ) {
        match kind {
            AssetKind::Barrier => {
                for segment in self.segments.iter_mut().filter(|s| !s.uses_light_barrier) {
                    segment.attach_barriers(&ctx.assets);
                }
            }
            AssetKind::LightBarrier => {
                for segment in self.segments.iter_mut().filter(|s| s.uses_light_barrier) {
                    segment.attach_barriers(&ctx.assets);
                }
            }
            AssetKind::StreetLight => {
                for segment in &mut self.segments {
                    segment.attach_street_light(&ctx.assets);
                }
            }
            AssetKind::NpcCar => {
                self.drain_pending_spawns(traffic, ctx);
            }
            AssetKind::PlayerCar | AssetKind::Skyscrapers => {}
        }
    }

    /// Spawn NPCs for every segment that asked for one before the model was ready
    ///
    /// Each deferred spawn rolls lane and offset afresh.
    pub fn drain_pending_spawns(
        &mut self,
        traffic: &mut TrafficManager,
        ctx: &mut SimulationContext,
    ) -> usize {
        let mut spawned = 0;
        for segment in self.segments.iter_mut().filter(|s| s.needs_npc) {
            if traffic.spawn(segment, ctx).is_some() {
                spawned += 1;
            }
        }
        if spawned > 0 {
            debug!("Spawned {} deferred NPCs", spawned);
        }
        spawned
    }
}
