//! Test utilities for scenematch
//!
//! This module provides utilities for generating synthetic test data:
//! - A small pinhole camera and translation-only poses
//! - Marker frames: black color images with pure red marker pixels whose
//!   depth is the only valid depth in the frame
//! - A detector that reports every marker pixel as a keypoint
//!
//! # Examples
//!
//! ```
//! use scenematch::test_utils::*;
//! use glam::Vec3;
//!
//! let camera = test_camera();
//! let pose = translation_pose(0.0, 0.0, -1.0);
//! let frame = marker_frame_for_world(&camera, pose, &[Vec3::ZERO]);
//! assert_eq!(MarkerDetector.detect_markers(&frame.color).len(), 1);
//! ```

use glam::{Mat4, Vec3};

use crate::core::{Camera, ColorImage, DepthImage, RawKeypoint, RgbdFrame};
use crate::features::KeypointDetector;

/// Color of marker pixels
pub const MARKER_COLOR: [u8; 3] = [255, 0, 0];

/// 80x60 camera with fx = fy = 100 and an integer principal point (40, 30)
pub fn test_camera() -> Camera {
    Camera::new(100.0, 100.0, 40.0, 30.0, 80, 60)
}

/// Camera-to-world pose with identity rotation
pub fn translation_pose(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, y, z))
}

/// Detector that reports every marker-colored pixel, in scan order.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerDetector;

impl MarkerDetector {
    pub fn detect_markers(&self, image: &ColorImage) -> Vec<RawKeypoint> {
        let mut keypoints = Vec::new();
        for y in 0..image.height() {
            for x in 0..image.width() {
                if image.pixel(x, y) == Some(MARKER_COLOR) {
                    keypoints.push(RawKeypoint::new(x as f32, y as f32, 1.0, 1.0));
                }
            }
        }
        keypoints
    }
}

impl KeypointDetector for MarkerDetector {
    fn detect(&self, image: &ColorImage) -> Vec<RawKeypoint> {
        self.detect_markers(image)
    }
}

/// Create a marker frame from pixel markers `(x, y, depth)`.
///
/// Depth is zero (missing) everywhere except under the markers.
pub fn marker_frame(camera: &Camera, camera_to_world: Mat4, markers: &[(u32, u32, f32)]) -> RgbdFrame {
    let mut color = ColorImage::filled(camera.width, camera.height, [0, 0, 0]);
    let mut depth = DepthImage::filled(camera.width, camera.height, 0.0);
    for &(x, y, d) in markers {
        color.put_pixel(x, y, MARKER_COLOR);
        depth.set(x, y, d);
    }
    RgbdFrame::new(0, 0.0, color, depth, camera_to_world)
}

/// Create a marker frame observing the given world points.
///
/// Each point is projected into the frame and rounded to the nearest pixel;
/// points behind the camera or outside the image are skipped.
pub fn marker_frame_for_world(camera: &Camera, camera_to_world: Mat4, points: &[Vec3]) -> RgbdFrame {
    let world_to_camera = camera_to_world.inverse();
    let markers: Vec<(u32, u32, f32)> = points
        .iter()
        .filter_map(|p| {
            let proj = camera.camera_to_proj(world_to_camera.transform_point3(*p));
            let (x, y) = (proj.x.round(), proj.y.round());
            let inside = proj.z > 0.0
                && x >= 0.0
                && y >= 0.0
                && x < camera.width as f32
                && y < camera.height as f32;
            inside.then(|| (x as u32, y as u32, proj.z))
        })
        .collect();
    marker_frame(camera, camera_to_world, &markers)
}

/// Write a sensor directory in the on-disk scene layout.
///
/// Poses are written as translations only; depth is stored as 16-bit PNG
/// in millimeters.
#[cfg(feature = "image")]
pub fn write_sensor_dir(dir: &std::path::Path, camera: &Camera, frames: &[RgbdFrame]) -> std::io::Result<()> {
    use std::fmt::Write as _;

    std::fs::create_dir_all(dir.join("rgb"))?;
    std::fs::create_dir_all(dir.join("depth"))?;

    let to_io = |e: image::ImageError| std::io::Error::new(std::io::ErrorKind::Other, e);
    let mut rgb_list = String::from("# color images\n");
    let mut depth_list = String::from("# depth images\n");
    let mut trajectory = String::from("# timestamp tx ty tz qx qy qz qw\n");

    for (i, frame) in frames.iter().enumerate() {
        let timestamp = i as f64 * 0.033;
        let color = image::RgbImage::from_fn(frame.color.width(), frame.color.height(), |x, y| {
            image::Rgb(frame.color.pixel(x, y).unwrap_or([0, 0, 0]))
        });
        color.save(dir.join(format!("rgb/{i}.png"))).map_err(to_io)?;

        let depth = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_fn(
            frame.depth.width(),
            frame.depth.height(),
            |x, y| {
                let d = frame.depth.get(x as i64, y as i64).unwrap_or(0.0);
                image::Luma([(d * 1000.0).round() as u16])
            },
        );
        depth.save(dir.join(format!("depth/{i}.png"))).map_err(to_io)?;

        let t = frame.camera_to_world.w_axis;
        let _ = writeln!(rgb_list, "{timestamp:.6} rgb/{i}.png");
        let _ = writeln!(depth_list, "{timestamp:.6} depth/{i}.png");
        let _ = writeln!(trajectory, "{timestamp:.6} {} {} {} 0 0 0 1", t.x, t.y, t.z);
    }

    std::fs::write(dir.join("rgb.txt"), rgb_list)?;
    std::fs::write(dir.join("depth.txt"), depth_list)?;
    std::fs::write(dir.join("groundtruth.txt"), trajectory)?;
    let focal = camera.focal();
    let principal = camera.principal();
    std::fs::write(
        dir.join("calibration.txt"),
        format!(
            "{} {} {} {} {} {}\n",
            focal.x, focal.y, principal.x, principal.y, camera.width, camera.height
        ),
    )
}
