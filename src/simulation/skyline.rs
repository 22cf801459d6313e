//! Skyscrapers lining the highway
//!
//! Purely scenery: two rows of buildings recycled ahead of the player the
//! same way road segments are. No physics bodies.

use glam::Vec3;
use log::debug;
use rand::Rng;

use super::assets::SKYSCRAPER_VARIANTS;
use super::context::SimulationContext;
use super::types::RoadSide;

#[derive(Debug, Clone)]
pub struct SkylineBuilding {
    pub side: RoadSide,
    /// Which of the skyscraper models to draw
    pub variant: usize,
    pub position: Vec3,
    pub scale: Vec3,
}

#[derive(Debug, Default)]
pub struct SkylineRing {
    buildings: Vec<SkylineBuilding>,
}

impl SkylineRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buildings(&self) -> &[SkylineBuilding] {
        &self.buildings
    }

    pub fn is_spawned(&self) -> bool {
        !self.buildings.is_empty()
    }

    /// Lay out every row once the skyscraper models are ready
    pub fn spawn(&mut self, ctx: &mut SimulationContext) {
        if self.is_spawned() {
            return;
        }
        const BASE_SCALE: f32 = 2.0;
        let rows = ctx.config.skyline_rows;
        let spacing = ctx.config.skyline_spacing;
        let road_center_z = ctx.config.start_z;
        let rng = &mut ctx.rng;

        for i in 0..rows {
            let z_jitter = (rng.random::<f32>() - 0.5) * 3.0;
            let z = road_center_z - i as f32 * spacing + z_jitter;

            for (side, max_offset) in [(RoadSide::Left, 5.0), (RoadSide::Right, 10.0)] {
                let offset = rng.random::<f32>() * max_offset;
                let x = side.sign() * (40.0 + offset);
                let scale = Vec3::new(
                    BASE_SCALE * (1.0 + offset * 0.1),
                    BASE_SCALE + rng.random::<f32>(),
                    BASE_SCALE,
                );
                self.buildings.push(SkylineBuilding {
                    side,
                    variant: rng.random_range(0..SKYSCRAPER_VARIANTS),
                    position: Vec3::new(x, 0.0, z),
                    scale,
                });
            }
        }
        debug!("Spawned {} skyline buildings", self.buildings.len());
    }

    /// Move buildings that fell behind the player to the far end of the ring
    pub fn update(&mut self, player_z: f32, ctx: &SimulationContext) {
        let threshold = player_z + ctx.config.skyline_recycle_threshold;
        let total_length = ctx.config.skyline_rows as f32 * ctx.config.skyline_spacing;
        for building in &mut self.buildings {
            if building.position.z > threshold {
                building.position.z -= total_length;
            }
        }
    }
}
