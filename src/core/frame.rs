//! RGB-D frame

use glam::Mat4;

use crate::core::{ColorImage, DepthImage};

/// A single RGB-D frame of one sensor.
#[derive(Debug, Clone)]
pub struct RgbdFrame {
    /// Frame index within the sensor (0-based)
    pub index: usize,
    /// Timestamp in seconds
    pub timestamp: f64,
    /// Color image
    pub color: ColorImage,
    /// Depth image (meters)
    pub depth: DepthImage,
    /// Camera-to-world pose
    pub camera_to_world: Mat4,
}

impl RgbdFrame {
    pub fn new(
        index: usize,
        timestamp: f64,
        color: ColorImage,
        depth: DepthImage,
        camera_to_world: Mat4,
    ) -> Self {
        Self {
            index,
            timestamp,
            color,
            depth,
            camera_to_world,
        }
    }

    pub fn world_to_camera(&self) -> Mat4 {
        self.camera_to_world.inverse()
    }
}
