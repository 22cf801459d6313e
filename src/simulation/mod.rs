//! Standalone highway simulation module
//!
//! This module contains all the core driving simulation logic that can run
//! independently of the Bevy game engine. It can be tested via console
//! without needing to boot up the full game.

mod assets;
mod autopilot;
mod camera;
mod config;
mod context;
mod physics;
mod segment_pool;
mod session;
mod skyline;
mod traffic;
mod types;
mod vehicle;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use assets::{
    AssetEvent, AssetInbox, AssetKind, AssetSender, AssetStatus, LoadedModel,
    SKYSCRAPER_VARIANTS, TAIL_LIGHT_NAMES, TIRE_NAMES,
};
pub use autopilot::autopilot;
#[allow(unused_imports)]
pub use camera::{CameraMode, CameraRig, CameraTransform};
#[allow(unused_imports)]
pub use config::{
    SimConfig, LANE_COUNT, LANE_WIDTH, LIGHT_BARRIER_INTERVAL, NPC_SPAWN_CHANCE, NPC_SPEED,
    SEGMENT_COUNT, SEGMENT_LENGTH,
};
#[allow(unused_imports)]
pub use context::{BodyRegistry, SimulationContext};
#[allow(unused_imports)]
pub use physics::{ArcadePhysics, BodyDesc, BodyKind, CollisionEvent, PhysicsWorld, Shape};
#[allow(unused_imports)]
pub use segment_pool::{barrier_placements, BarrierPlacement, Segment, SegmentPool};
#[allow(unused_imports)]
pub use session::{SessionState, SessionStateMachine};
#[allow(unused_imports)]
pub use skyline::{SkylineBuilding, SkylineRing};
#[allow(unused_imports)]
pub use traffic::{NpcVehicle, TrafficManager, NPC_COLORS};
#[allow(unused_imports)]
pub use types::{
    lerp, BodyClass, BodyHandle, NpcId, RoadSide, SegmentId, SimId, Transform,
};
#[allow(unused_imports)]
pub use vehicle::{
    accumulate_score, effective_speed, update_speed, update_turning, DriveInput,
    PlayerVehicle, TailLightEvent, VehicleController,
};
pub use world::{FrameSnapshot, SimWorld};
