//! Depth camera intrinsics

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Depth camera model shared by all frames of one sensor.
///
/// The intrinsic is stored as a 4x4 matrix so that back-projection can be
/// written as a single matrix product on homogeneous coordinates:
///
/// ```text
/// | fx  0  cx  0 |
/// |  0 fy  cy  0 |
/// |  0  0   1  0 |
/// |  0  0   0  1 |
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Intrinsic matrix (camera space -> image plane)
    pub intrinsic: Mat4,
    /// Cached inverse of `intrinsic`
    pub intrinsic_inverse: Mat4,
    /// Depth image width
    pub width: u32,
    /// Depth image height
    pub height: u32,
}

impl Camera {
    /// Create a camera from pinhole parameters.
    pub fn new(fx: f32, fy: f32, cx: f32, cy: f32, width: u32, height: u32) -> Self {
        let intrinsic = Mat4::from_cols(
            Vec4::new(fx, 0.0, 0.0, 0.0),
            Vec4::new(0.0, fy, 0.0, 0.0),
            Vec4::new(cx, cy, 1.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        );
        Self::from_matrix(intrinsic, width, height)
    }

    /// Create a camera from an arbitrary invertible 4x4 intrinsic matrix.
    pub fn from_matrix(intrinsic: Mat4, width: u32, height: u32) -> Self {
        Self {
            intrinsic,
            intrinsic_inverse: intrinsic.inverse(),
            width,
            height,
        }
    }

    /// Focal lengths (fx, fy)
    pub fn focal(&self) -> Vec2 {
        Vec2::new(self.intrinsic.x_axis.x, self.intrinsic.y_axis.y)
    }

    /// Principal point (cx, cy)
    pub fn principal(&self) -> Vec2 {
        Vec2::new(self.intrinsic.z_axis.x, self.intrinsic.z_axis.y)
    }

    /// Map a camera-space point onto the image plane.
    ///
    /// Returns `(u, v, z)` where `z` is the camera-space depth.
    pub fn camera_to_proj(&self, point: Vec3) -> Vec3 {
        let h = self.intrinsic * point.extend(1.0);
        Vec3::new(h.x / h.z, h.y / h.z, h.z)
    }
}
