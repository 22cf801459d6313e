//! NPC traffic spawning, movement and despawning
//!
//! NPCs live in an arena keyed by `NpcId`. A segment only stores the id of
//! its occupant; the NPC itself, and the physics proxy it owns, belong to
//! the `TrafficManager`.

use glam::{Quat, Vec3};
use log::{debug, warn};
use rand::Rng;
use std::collections::BTreeMap;

use super::assets::{AssetKind, AssetStatus, LoadedModel, TIRE_NAMES};
use super::context::SimulationContext;
use super::physics::{BodyDesc, BodyKind};
use super::segment_pool::{Segment, SegmentPool};
use super::types::{BodyClass, BodyHandle, NpcId, SegmentId, SimId, Transform};

/// Body colours an NPC may be painted with
pub const NPC_COLORS: [u32; 4] = [0xCA1818, 0x254EA3, 0xE8B221, 0xD5D5D5];

/// A traffic vehicle bound to one segment
#[derive(Debug, Clone)]
pub struct NpcVehicle {
    pub id: NpcId,
    pub segment: SegmentId,
    pub lane_index: usize,
    pub lane_x: f32,
    /// Offset from the segment centre rolled at spawn
    pub local_z_offset: f32,
    /// Current offset from the owning segment's centre
    pub local_z: f32,
    /// Authoritative world z
    pub global_z: f32,
    pub body: BodyHandle,
    pub color: u32,
    pub tire_spin: f32,
}

impl NpcVehicle {
    /// World transform of the NPC's model (faces +Z, drives toward -Z)
    pub fn visual_transform(&self, visual_height: f32) -> Transform {
        Transform::new(
            Vec3::new(self.lane_x, visual_height, self.global_z),
            Quat::from_rotation_y(-std::f32::consts::PI),
        )
    }
}

#[derive(Debug, Default)]
pub struct TrafficManager {
    npcs: BTreeMap<NpcId, NpcVehicle>,
    next_id: usize,
    pub spawned_total: u64,
    pub despawned_total: u64,
    /// Tire meshes found on the NPC model
    pub tires: Vec<&'static str>,
    /// Whether the NPC model has a body frame that can be repainted
    pub paintable: bool,
}

impl TrafficManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record which named parts the NPC model offers
    pub fn apply_model(&mut self, model: &LoadedModel) {
        let (tires, missing) = model.lookup(&TIRE_NAMES);
        if !missing.is_empty() {
            warn!("NPC model is missing tires {:?}", missing);
        }
        self.paintable = model.has("main_frame");
        if !self.paintable {
            warn!("main_frame not found in NPC model; traffic keeps its stock paint");
        }
        self.tires = tires;
    }

    pub fn get(&self, id: NpcId) -> Option<&NpcVehicle> {
        self.npcs.get(&id)
    }

    pub fn npcs(&self) -> impl Iterator<Item = &NpcVehicle> {
        self.npcs.values()
    }

    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }

    /// Place a new NPC on `segment`
    ///
    /// If the NPC model is still loading the request is parked on the segment
    /// and `None` is returned. Occupied segments are left alone.
    pub fn spawn(&mut self, segment: &mut Segment, ctx: &mut SimulationContext) -> Option<NpcId> {
        if segment.occupant.is_some() {
            segment.needs_npc = false;
            return None;
        }
        match ctx.assets.status(AssetKind::NpcCar) {
            AssetStatus::Pending => {
                segment.needs_npc = true;
                return None;
            }
            AssetStatus::Unavailable => {
                segment.needs_npc = false;
                return None;
            }
            AssetStatus::Ready => {}
        }
        segment.needs_npc = false;

        let config = &ctx.config;
        let lane_index = ctx.rng.random_range(0..config.lane_count);
        let quarter = config.segment_length / 4.0;
        let local_z_offset = ctx.rng.random_range(-quarter..=quarter);
        let color = NPC_COLORS[ctx.rng.random_range(0..NPC_COLORS.len())];
        let lane_x = config.lane_center(lane_index);
        let global_z = segment.z_position + local_z_offset;

        let desc = BodyDesc::cuboid(
            BodyKind::Kinematic,
            config.npc_half_extents,
            Vec3::new(lane_x, config.npc_body_height, global_z),
        )
        .with_offset(config.npc_shape_offset)
        .with_rotation(Quat::from_rotation_y(-std::f32::consts::PI));
        let body = ctx.spawn_body(desc, BodyClass::Npc);
        if let Some(player) = ctx.player_body {
            ctx.watch(player, BodyClass::Npc);
        }

        let id = NpcId(SimId(self.next_id));
        self.next_id += 1;
        self.npcs.insert(
            id,
            NpcVehicle {
                id,
                segment: segment.id,
                lane_index,
                lane_x,
                local_z_offset,
                local_z: local_z_offset,
                global_z,
                body,
                color,
                tire_spin: 0.0,
            },
        );
        segment.occupant = Some(id);
        self.spawned_total += 1;

        debug!(
            "Spawned NPC {:?} in lane {} at z={:.1} on segment {:?}",
            id, lane_index, global_z, segment.id
        );
        Some(id)
    }

    /// Move every NPC and despawn those outside the active window
    ///
    /// Returns the ids that were despawned this call.
    pub fn update(
        &mut self,
        player_z: f32,
        delta_secs: f32,
        pool: &mut SegmentPool,
        ctx: &mut SimulationContext,
    ) -> Vec<NpcId> {
        let config = &ctx.config;
        let travel = config.npc_speed * delta_secs;
        let spin = travel / config.tire_radius;
        let rear_limit = player_z + config.npc_window_behind;
        let front_limit = player_z - config.npc_window_ahead;
        let body_height = config.npc_body_height;

        let mut out_of_window = Vec::new();

        for npc in self.npcs.values_mut() {
            npc.global_z -= travel;
            npc.tire_spin -= spin;

            // Derived from global z every frame so recycling the owning segment can't drift it
            if let Some(segment) = pool.segment(npc.segment) {
                npc.local_z = npc.global_z - segment.z_position;
            }

            let position = Vec3::new(npc.lane_x, body_height, npc.global_z);
            if let Err(e) = ctx.physics.set_position(npc.body, position) {
                warn!("Failed to move proxy of NPC {:?}: {:#}", npc.id, e);
            }

            if npc.global_z > rear_limit || npc.global_z < front_limit {
                out_of_window.push(npc.id);
            }
        }

        out_of_window.retain(|id| self.despawn(*id, pool, ctx));
        out_of_window
    }

    /// Remove an NPC, its physics proxy and its segment back-reference
    ///
    /// Unknown ids are ignored and return false.
    pub fn despawn(
        &mut self,
        id: NpcId,
        pool: &mut SegmentPool,
        ctx: &mut SimulationContext,
    ) -> bool {
        let Some(npc) = self.npcs.remove(&id) else {
            debug!("Ignoring despawn of unknown NPC {:?}", id);
            return false;
        };

        ctx.despawn_body(npc.body);
        if let Some(segment) = pool.segment_mut(npc.segment) {
            if segment.occupant == Some(id) {
                segment.occupant = None;
            }
        }
        self.despawned_total += 1;

        debug!("Despawned NPC {:?} at z={:.1}", id, npc.global_z);
        true
    }
}
