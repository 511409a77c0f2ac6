//! Pixel <-> world coordinate transforms
//!
//! Both functions are pure numeric transforms. Callers guarantee a finite
//! positive depth and invertible pose/intrinsic matrices.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::core::Camera;

/// Back-project a pixel with its depth sample into world space.
///
/// The camera-space point is `intrinsic_inverse * (x*d, y*d, d, 0)` truncated
/// to three components; `camera_to_world` then maps it into the world frame.
#[inline]
pub fn back_project(
    pixel: Vec2,
    depth: f32,
    intrinsic_inverse: &Mat4,
    camera_to_world: &Mat4,
) -> Vec3 {
    let camera = (*intrinsic_inverse
        * Vec4::new(pixel.x * depth, pixel.y * depth, depth, 0.0))
    .truncate();
    camera_to_world.transform_point3(camera)
}

/// Project a world point into the image plane of another frame.
#[inline]
pub fn project(world: Vec3, world_to_camera: &Mat4, camera: &Camera) -> Vec2 {
    let p = camera.camera_to_proj(world_to_camera.transform_point3(world));
    Vec2::new(p.x, p.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn camera() -> Camera {
        Camera::new(525.0, 520.0, 319.5, 239.5, 640, 480)
    }

    #[test]
    fn test_back_project_identity_pose() {
        let camera = camera();
        let world = back_project(
            Vec2::new(319.5, 239.5),
            2.0,
            &camera.intrinsic_inverse,
            &Mat4::IDENTITY,
        );
        assert!(world.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
    }

    #[test]
    fn test_back_project_applies_pose() {
        let camera = camera();
        let pose = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let world = back_project(Vec2::new(319.5, 239.5), 1.0, &camera.intrinsic_inverse, &pose);
        assert!(world.abs_diff_eq(Vec3::new(1.0, 2.0, 4.0), 1e-5));
    }

    #[test]
    fn test_round_trip_with_rotated_pose() {
        let camera = camera();
        let camera_to_world = Mat4::from_rotation_translation(
            Quat::from_euler(glam::EulerRot::XYZ, 0.1, -0.3, 0.05),
            Vec3::new(0.4, -0.2, 1.5),
        );
        let world_to_camera = camera_to_world.inverse();

        for &(x, y, d) in &[
            (100.0f32, 50.0f32, 0.8f32),
            (319.0, 240.0, 1.2),
            (600.0, 400.0, 3.5),
            (12.0, 470.0, 0.45),
        ] {
            let world = back_project(Vec2::new(x, y), d, &camera.intrinsic_inverse, &camera_to_world);
            let pixel = project(world, &world_to_camera, &camera);
            assert!(
                pixel.abs_diff_eq(Vec2::new(x, y), 1e-2),
                "round trip of ({}, {}) gave {:?}",
                x,
                y,
                pixel
            );
        }
    }

    #[test]
    fn test_project_into_other_frame() {
        let camera = camera();
        // Second camera sits 0.1 m to the right of the first.
        let pose_a = Mat4::IDENTITY;
        let pose_b = Mat4::from_translation(Vec3::new(0.1, 0.0, 0.0));

        let world = back_project(Vec2::new(319.5, 239.5), 1.0, &camera.intrinsic_inverse, &pose_a);
        let pixel = project(world, &pose_b.inverse(), &camera);

        // The point appears 0.1 * fx pixels to the left in frame B.
        assert!((pixel.x - (319.5 - 52.5)).abs() < 1e-3);
        assert!((pixel.y - 239.5).abs() < 1e-3);
    }
}
