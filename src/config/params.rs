//! Parameter structures for the matching components

use serde::{Deserialize, Serialize};

/// Keypoint detector parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Maximum number of keypoints returned per image
    pub max_keypoints: usize,
    /// Minimum response, relative to the strongest corner of the image
    pub min_response: f32,
    /// Free parameter of the Harris detector
    pub harris_k: f32,
    /// Gaussian window size (odd)
    pub window_size: usize,
    /// Gaussian window sigma
    pub window_sigma: f32,
    /// Non-maximum suppression radius
    pub nms_radius: usize,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            max_keypoints: 512,
            min_response: 0.03,
            harris_k: 0.04,
            window_size: 5,
            window_sigma: 1.2,
            nms_radius: 3,
        }
    }
}

/// Keypoint collection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorParams {
    /// Keypoints closer than this to any image border are dropped (pixels)
    pub padding: u32,
    /// Collect frames in parallel
    pub parallel: bool,
}

impl Default for CollectorParams {
    fn default() -> Self {
        Self {
            padding: 50,
            parallel: false,
        }
    }
}

/// Cross-frame matcher parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherParams {
    /// Search radius in world units (meters)
    pub radius: f32,
    /// Maximum neighbors returned per (keypoint, target frame) query
    pub max_neighbors: usize,
    /// Query source keypoints in parallel
    pub parallel: bool,
}

impl Default for MatcherParams {
    fn default() -> Self {
        Self {
            radius: 0.02,
            max_neighbors: 5,
            parallel: false,
        }
    }
}

/// Dataset parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetParams {
    /// Raw depth units per meter
    pub depth_scale: f32,
    /// Maximum frames per sensor (0 for all)
    pub max_frames: usize,
    /// Frame stride (keep every Nth frame)
    pub stride: usize,
    /// Maximum timestamp difference for color/depth/pose association (seconds)
    pub max_time_difference: f64,
}

impl Default for DatasetParams {
    fn default() -> Self {
        Self {
            depth_scale: 1000.0,
            max_frames: 0,
            stride: 1,
            max_time_difference: 0.1,
        }
    }
}
