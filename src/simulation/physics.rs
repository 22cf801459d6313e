//! Physics collaborator for the highway simulation
//!
//! The simulation only ever talks to physics through `PhysicsWorld` and holds
//! nothing but `BodyHandle`s into it. `ArcadePhysics` is the implementation
//! shipped with the crate:
//! - Fixed timestep with a bounded number of substeps per frame
//! - Gravity on dynamic bodies, resolved against static ground planes
//! - Axis-aligned box overlap for everything else, reported as begin-contact
//!   events and left unresolved (contacts with traffic or walls end the run)

use anyhow::{Context, Result};
use glam::{Mat3, Quat, Vec3};
use std::collections::{BTreeMap, HashSet};

use super::types::{BodyHandle, SimId};

/// Resting contacts closer than this still count as touching
const CONTACT_TOLERANCE: f32 = 1e-4;

/// How a body participates in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Integrated under gravity; velocity may be written from outside
    Dynamic,
    /// Never integrated; position is written from outside every frame
    Kinematic,
    /// Never moves on its own
    Static,
}

/// Collision shape attached to a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Box given by half extents, centred at `offset` in body-local space
    Cuboid { half_extents: Vec3, offset: Vec3 },
    /// Infinite horizontal plane at the body's height
    Plane,
}

/// Everything needed to create a body
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub shape: Shape,
    pub position: Vec3,
    pub rotation: Quat,
    pub fixed_rotation: bool,
}

impl BodyDesc {
    pub fn cuboid(kind: BodyKind, half_extents: Vec3, position: Vec3) -> Self {
        Self {
            kind,
            shape: Shape::Cuboid {
                half_extents,
                offset: Vec3::ZERO,
            },
            position,
            rotation: Quat::IDENTITY,
            fixed_rotation: false,
        }
    }

    /// Static ground plane at the given height
    pub fn plane(height: f32) -> Self {
        Self {
            kind: BodyKind::Static,
            shape: Shape::Plane,
            position: Vec3::new(0.0, height, 0.0),
            rotation: Quat::IDENTITY,
            fixed_rotation: true,
        }
    }

    /// Shift a cuboid shape away from the body origin
    pub fn with_offset(mut self, shape_offset: Vec3) -> Self {
        if let Shape::Cuboid { offset, .. } = &mut self.shape {
            *offset = shape_offset;
        }
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_fixed_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }
}

/// A pair of bodies that started touching during a step
///
/// `body` is always the dynamic participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub body: BodyHandle,
    pub other: BodyHandle,
}

/// The rigid-body simulator seen by the rest of the crate
///
/// Collision events raised during `step` are queued and only handed out by
/// `drain_collisions`, so nothing reacts to them while bodies are mid-step.
pub trait PhysicsWorld: Send + Sync {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Remove a body; returns false when the handle is unknown
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    fn contains(&self, handle: BodyHandle) -> bool;

    fn body_count(&self) -> usize;

    fn position(&self, handle: BodyHandle) -> Result<Vec3>;

    fn set_position(&mut self, handle: BodyHandle, position: Vec3) -> Result<()>;

    fn rotation(&self, handle: BodyHandle) -> Result<Quat>;

    fn set_rotation(&mut self, handle: BodyHandle, rotation: Quat) -> Result<()>;

    fn linear_velocity(&self, handle: BodyHandle) -> Result<Vec3>;

    fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> Result<()>;

    fn angular_velocity(&self, handle: BodyHandle) -> Result<Vec3>;

    fn set_angular_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> Result<()>;

    /// Advance by one frame's worth of elapsed time
    fn step(&mut self, dt: f32);

    fn drain_collisions(&mut self) -> Vec<CollisionEvent>;
}

#[derive(Debug, Clone, Copy)]
struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Aabb {
    fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

#[derive(Debug, Clone)]
struct Body {
    kind: BodyKind,
    shape: Shape,
    position: Vec3,
    rotation: Quat,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    fixed_rotation: bool,
}

impl Body {
    fn aabb(&self) -> Option<Aabb> {
        let Shape::Cuboid {
            half_extents,
            offset,
        } = self.shape
        else {
            return None;
        };

        let center = self.position + self.rotation * offset;
        let m = Mat3::from_quat(self.rotation);
        let extent = Vec3::new(
            m.x_axis.x.abs() * half_extents.x
                + m.y_axis.x.abs() * half_extents.y
                + m.z_axis.x.abs() * half_extents.z,
            m.x_axis.y.abs() * half_extents.x
                + m.y_axis.y.abs() * half_extents.y
                + m.z_axis.y.abs() * half_extents.z,
            m.x_axis.z.abs() * half_extents.x
                + m.y_axis.z.abs() * half_extents.y
                + m.z_axis.z.abs() * half_extents.z,
        );

        Some(Aabb {
            min: center - extent,
            max: center + extent,
        })
    }
}

/// Lightweight fixed-timestep box simulator
pub struct ArcadePhysics {
    bodies: BTreeMap<BodyHandle, Body>,
    next_id: usize,
    gravity: Vec3,
    fixed_timestep: f32,
    max_substeps: u32,
    accumulator: f32,
    /// Pairs touching at the end of the last substep
    contacts: HashSet<(BodyHandle, BodyHandle)>,
    events: Vec<CollisionEvent>,
}

impl ArcadePhysics {
    pub fn new(gravity: f32, fixed_timestep: f32, max_substeps: u32) -> Self {
        Self {
            bodies: BTreeMap::new(),
            next_id: 0,
            gravity: Vec3::new(0.0, gravity, 0.0),
            fixed_timestep,
            max_substeps,
            accumulator: 0.0,
            contacts: HashSet::new(),
            events: Vec::new(),
        }
    }

    fn body(&self, handle: BodyHandle) -> Result<&Body> {
        self.bodies
            .get(&handle)
            .with_context(|| format!("physics body {:?} not found", handle))
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut Body> {
        self.bodies
            .get_mut(&handle)
            .with_context(|| format!("physics body {:?} not found", handle))
    }

    fn substep(&mut self, h: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Dynamic {
                continue;
            }
            body.linear_velocity += gravity * h;
            body.position += body.linear_velocity * h;
            if !body.fixed_rotation && body.angular_velocity != Vec3::ZERO {
                body.rotation =
                    (Quat::from_scaled_axis(body.angular_velocity * h) * body.rotation).normalize();
            }
        }

        let planes: Vec<(BodyHandle, f32)> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.shape == Shape::Plane)
            .map(|(handle, b)| (*handle, b.position.y))
            .collect();

        let mut touching = HashSet::new();

        // Ground contact is the only contact that gets resolved
        let dynamic_handles: Vec<BodyHandle> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.kind == BodyKind::Dynamic)
            .map(|(handle, _)| *handle)
            .collect();

        for handle in &dynamic_handles {
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            for (plane, plane_y) in &planes {
                let Some(aabb) = body.aabb() else {
                    continue;
                };
                if aabb.min.y < *plane_y {
                    body.position.y += plane_y - aabb.min.y;
                    if body.linear_velocity.y < 0.0 {
                        body.linear_velocity.y = 0.0;
                    }
                    touching.insert((*handle, *plane));
                } else if aabb.min.y - plane_y <= CONTACT_TOLERANCE {
                    touching.insert((*handle, *plane));
                }
            }
        }

        for handle in &dynamic_handles {
            let Some(aabb) = self.bodies.get(handle).and_then(Body::aabb) else {
                continue;
            };
            for (other_handle, other) in &self.bodies {
                if other_handle == handle {
                    continue;
                }
                if let Some(other_aabb) = other.aabb() {
                    if aabb.overlaps(&other_aabb) {
                        touching.insert((*handle, *other_handle));
                    }
                }
            }
        }

        for pair in &touching {
            if !self.contacts.contains(pair) {
                self.events.push(CollisionEvent {
                    body: pair.0,
                    other: pair.1,
                });
            }
        }
        self.contacts = touching;
    }
}

impl PhysicsWorld for ArcadePhysics {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(SimId(self.next_id));
        self.next_id += 1;
        self.bodies.insert(
            handle,
            Body {
                kind: desc.kind,
                shape: desc.shape,
                position: desc.position,
                rotation: desc.rotation,
                linear_velocity: Vec3::ZERO,
                angular_velocity: Vec3::ZERO,
                fixed_rotation: desc.fixed_rotation,
            },
        );
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        if self.bodies.remove(&handle).is_none() {
            return false;
        }
        self.contacts
            .retain(|(a, b)| *a != handle && *b != handle);
        true
    }

    fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn position(&self, handle: BodyHandle) -> Result<Vec3> {
        Ok(self.body(handle)?.position)
    }

    fn set_position(&mut self, handle: BodyHandle, position: Vec3) -> Result<()> {
        self.body_mut(handle)?.position = position;
        Ok(())
    }

    fn rotation(&self, handle: BodyHandle) -> Result<Quat> {
        Ok(self.body(handle)?.rotation)
    }

    fn set_rotation(&mut self, handle: BodyHandle, rotation: Quat) -> Result<()> {
        self.body_mut(handle)?.rotation = rotation;
        Ok(())
    }

    fn linear_velocity(&self, handle: BodyHandle) -> Result<Vec3> {
        Ok(self.body(handle)?.linear_velocity)
    }

    fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> Result<()> {
        self.body_mut(handle)?.linear_velocity = velocity;
        Ok(())
    }

    fn angular_velocity(&self, handle: BodyHandle) -> Result<Vec3> {
        Ok(self.body(handle)?.angular_velocity)
    }

    fn set_angular_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> Result<()> {
        self.body_mut(handle)?.angular_velocity = velocity;
        Ok(())
    }

    fn step(&mut self, dt: f32) {
        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator >= self.fixed_timestep && substeps < self.max_substeps {
            self.substep(self.fixed_timestep);
            self.accumulator -= self.fixed_timestep;
            substeps += 1;
        }
        // Drop whatever backlog the substep cap could not absorb
        if self.accumulator >= self.fixed_timestep {
            self.accumulator %= self.fixed_timestep;
        }
    }

    fn drain_collisions(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.events)
    }
}
