//! Core types for the highway simulation
//!
//! These are standalone types that don't depend on Bevy.

use glam::{EulerRot, Quat, Vec3};

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// Slot index of a road segment (stable for the pool's lifetime)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub usize);

/// A wrapper type for NPC vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NpcId(pub SimId);

/// Handle into the physics world's body storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub SimId);

/// Classification of a physics body, used for collision semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyClass {
    Player,
    Npc,
    Wall,
    Ground,
}

impl BodyClass {
    /// Whether touching a body of this class ends the run
    pub fn is_terminal(self) -> bool {
        matches!(self, BodyClass::Npc | BodyClass::Wall)
    }
}

/// Which side of the road a prop sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadSide {
    Left,
    Right,
}

impl RoadSide {
    pub fn sign(self) -> f32 {
        match self {
            RoadSide::Left => -1.0,
            RoadSide::Right => 1.0,
        }
    }
}

/// Position and orientation of something in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::IDENTITY)
    }

    /// Rotation about the vertical axis, in radians
    pub fn yaw(&self) -> f32 {
        self.rotation.to_euler(EulerRot::YXZ).0
    }

    /// Direction the local +Z axis points to in world space
    ///
    /// Vehicles travel along their local -Z, so this is "behind".
    pub fn local_back(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// Linear interpolation between two scalars
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
