//! Frame sources
//!
//! A frame source is one sensor of a scene: a depth camera model shared by all
//! of its frames, a camera-to-world pose per frame, and the RGB-D images.

use glam::Mat4;

use crate::core::{Camera, RgbdFrame};
use crate::io::dataset::{DatasetError, Result};

/// One sensor of a scanned scene.
pub trait FrameSource {
    /// Sensor name (used in logs)
    fn name(&self) -> &str;

    /// Depth camera model shared by all frames
    fn camera(&self) -> &Camera;

    /// Number of frames
    fn len(&self) -> usize;

    /// Check if the sensor has no frames
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Camera-to-world pose of a frame, without decoding its images
    fn camera_to_world(&self, index: usize) -> Result<Mat4>;

    /// Load the color and depth images of a frame
    fn load_frame(&self, index: usize) -> Result<RgbdFrame>;
}

/// A sensor whose frames are already in memory.
#[derive(Debug, Clone)]
pub struct InMemorySensor {
    name: String,
    camera: Camera,
    frames: Vec<RgbdFrame>,
}

impl InMemorySensor {
    pub fn new(name: impl Into<String>, camera: Camera) -> Self {
        Self {
            name: name.into(),
            camera,
            frames: Vec::new(),
        }
    }

    /// Append a frame. Its index is reassigned to its position in the sensor.
    pub fn push_frame(&mut self, mut frame: RgbdFrame) {
        frame.index = self.frames.len();
        self.frames.push(frame);
    }

    pub fn with_frames(mut self, frames: impl IntoIterator<Item = RgbdFrame>) -> Self {
        for frame in frames {
            self.push_frame(frame);
        }
        self
    }

    pub fn frames(&self) -> &[RgbdFrame] {
        &self.frames
    }

    fn frame(&self, index: usize) -> Result<&RgbdFrame> {
        self.frames.get(index).ok_or(DatasetError::FrameIndex(index))
    }
}

impl FrameSource for InMemorySensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn len(&self) -> usize {
        self.frames.len()
    }

    fn camera_to_world(&self, index: usize) -> Result<Mat4> {
        Ok(self.frame(index)?.camera_to_world)
    }

    fn load_frame(&self, index: usize) -> Result<RgbdFrame> {
        self.frame(index).cloned()
    }
}
