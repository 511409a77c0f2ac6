//! Per-frame projection data used for reprojection residuals

use glam::{Mat4, Vec2, Vec3};

use crate::core::{project, Camera, FrameId};
use crate::io::dataset::Result;
use crate::io::FrameSource;
use crate::matching::layout::FrameLayout;

/// Camera model and world-to-camera poses of one sensor.
#[derive(Debug, Clone)]
pub struct SensorGeometry {
    pub camera: Camera,
    pub world_to_camera: Vec<Mat4>,
}

/// Projection data of every frame of a scene.
#[derive(Debug, Clone, Default)]
pub struct SceneGeometry {
    sensors: Vec<SensorGeometry>,
}

impl SceneGeometry {
    pub fn new(sensors: Vec<SensorGeometry>) -> Self {
        Self { sensors }
    }

    /// Read poses from each source and invert them once.
    pub fn from_sources<S: FrameSource>(sources: &[S]) -> Result<Self> {
        let sensors = sources
            .iter()
            .map(|source| {
                let world_to_camera = (0..source.len())
                    .map(|frame| source.camera_to_world(frame).map(|pose| pose.inverse()))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SensorGeometry {
                    camera: source.camera().clone(),
                    world_to_camera,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { sensors })
    }

    pub fn sensors(&self) -> &[SensorGeometry] {
        &self.sensors
    }

    pub fn layout(&self) -> FrameLayout {
        FrameLayout::new(self.sensors.iter().map(|s| s.world_to_camera.len()).collect())
    }

    /// Project a world point into the image plane of frame `id`.
    pub fn reproject(&self, world: Vec3, id: FrameId) -> Option<Vec2> {
        let sensor = self.sensors.get(id.sensor)?;
        let world_to_camera = sensor.world_to_camera.get(id.frame)?;
        Some(project(world, world_to_camera, &sensor.camera))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::InMemorySensor;
    use crate::test_utils::{marker_frame, test_camera, translation_pose};

    #[test]
    fn test_from_sources() {
        let camera = test_camera();
        let sensors = vec![
            InMemorySensor::new("a", camera.clone()).with_frames([
                marker_frame(&camera, translation_pose(0.0, 0.0, -1.0), &[]),
                marker_frame(&camera, translation_pose(0.1, 0.0, -1.0), &[]),
            ]),
            InMemorySensor::new("b", camera.clone()),
        ];

        let geometry = SceneGeometry::from_sources(&sensors).unwrap();
        assert_eq!(geometry.layout(), FrameLayout::new(vec![2, 0]));

        // World origin sits 1 m in front of frame 0 on the optical axis
        let pixel = geometry.reproject(Vec3::ZERO, FrameId::new(0, 0)).unwrap();
        assert!(pixel.abs_diff_eq(camera.principal(), 1e-4));

        // Frame 1 moved 0.1 m right, so the origin appears fx * 0.1 to the left
        let pixel = geometry.reproject(Vec3::ZERO, FrameId::new(0, 1)).unwrap();
        assert!((pixel.x - (camera.principal().x - camera.focal().x * 0.1)).abs() < 1e-3);

        assert!(geometry.reproject(Vec3::ZERO, FrameId::new(1, 0)).is_none());
    }
}
