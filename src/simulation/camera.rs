//! Follow camera
//!
//! The rig starts in a timed intro sweep from beside the car to behind it,
//! then switches (once, for good) to a chase mode that lags sideways and
//! vertically but never along the direction of travel.

use glam::Vec3;
use log::debug;

use super::config::SimConfig;
use super::types::{lerp, Transform};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraMode {
    Intro { elapsed: f32 },
    Chase,
}

/// Camera placement handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    pub mode: CameraMode,
    pub transform: CameraTransform,
    /// Orbit angle around the car used on the last intro frame
    pub orbit_angle: f32,
    /// Times the rig switched from intro to chase (0 or 1)
    pub mode_switches: u32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraRig {
    pub fn new() -> Self {
        Self {
            mode: CameraMode::Intro { elapsed: 0.0 },
            transform: CameraTransform::default(),
            orbit_angle: 0.0,
            mode_switches: 0,
        }
    }

    pub fn in_intro(&self) -> bool {
        matches!(self.mode, CameraMode::Intro { .. })
    }

    /// Place the camera for this frame around the car's visual transform
    pub fn update(&mut self, delta_secs: f32, car: &Transform, config: &SimConfig) {
        let behind = car.local_back();
        let car_angle = behind.x.atan2(behind.z);
        let look_at = car.translation + Vec3::Y * config.look_at_height;

        match self.mode {
            CameraMode::Intro { elapsed } => {
                let elapsed = elapsed + delta_secs;
                let t = (elapsed / config.intro_duration).clamp(0.0, 1.0);

                let start_angle = car_angle + config.intro_angle_offset;
                let angle = start_angle + t * (car_angle - start_angle);
                let radius = lerp(config.intro_start_distance, config.chase_distance, t);
                let height = lerp(config.intro_start_height, config.chase_height, t);

                let offset = Vec3::new(angle.sin() * radius, height, angle.cos() * radius);
                self.orbit_angle = angle;
                self.transform = CameraTransform {
                    position: car.translation + offset,
                    look_at,
                };

                if t >= 1.0 {
                    self.mode = CameraMode::Chase;
                    self.mode_switches += 1;
                    debug!("Camera intro finished after {:.2}s", elapsed);
                } else {
                    self.mode = CameraMode::Intro { elapsed };
                }
            }
            CameraMode::Chase => {
                let mut desired = car.translation + behind * config.chase_distance;
                desired.y += config.chase_height;

                let current = self.transform.position;
                let smoothing = config.chase_smoothing;
                self.transform = CameraTransform {
                    position: Vec3::new(
                        lerp(current.x, desired.x, smoothing),
                        lerp(current.y, desired.y, smoothing),
                        desired.z,
                    ),
                    look_at,
                };
            }
        }
    }
}
