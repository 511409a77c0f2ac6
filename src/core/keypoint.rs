//! Keypoint representations

use std::fmt;

use glam::{Vec2, Vec3};

/// A 2D keypoint candidate as reported by a detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawKeypoint {
    /// x coordinate (pixel, sub-pixel precision)
    pub x: f32,
    /// y coordinate (pixel, sub-pixel precision)
    pub y: f32,
    /// Detection scale
    pub size: f32,
    /// Detector response
    pub response: f32,
}

impl RawKeypoint {
    pub fn new(x: f32, y: f32, size: f32, response: f32) -> Self {
        Self {
            x,
            y,
            size,
            response,
        }
    }
}

/// Identity of one frame of one sensor.
///
/// Ordering is sensor-major, which is the frame enumeration order used
/// throughout the matching pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId {
    pub sensor: usize,
    pub frame: usize,
}

impl FrameId {
    pub fn new(sensor: usize, frame: usize) -> Self {
        Self { sensor, frame }
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.sensor, self.frame)
    }
}

/// A keypoint with validated depth and a world-space position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichedKeypoint {
    /// Originating sensor
    pub sensor: usize,
    /// Frame index within the sensor
    pub frame: usize,
    /// Pixel position, rounded to the integer pixel the depth was read at
    pub pixel: Vec2,
    /// Depth sample (meters)
    pub depth: f32,
    /// Position in the shared world frame
    pub world: Vec3,
    /// Detection scale
    pub size: f32,
    /// Detector response
    pub response: f32,
}

impl EnrichedKeypoint {
    pub fn frame_id(&self) -> FrameId {
        FrameId::new(self.sensor, self.frame)
    }
}

/// `sensor frame px py depth wx wy wz size response`
impl fmt::Display for EnrichedKeypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {} {} {}",
            self.sensor,
            self.frame,
            self.pixel.x,
            self.pixel.y,
            self.depth,
            self.world.x,
            self.world.y,
            self.world.z,
            self.size,
            self.response
        )
    }
}
