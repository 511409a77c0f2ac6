//! # scenematch
//!
//! Cross-frame keypoint correspondences for RGB-D scenes captured by one or
//! more sensors.
//!
//! ## Overview
//!
//! Keypoints are detected independently in every color frame, lifted into a
//! shared world frame using the depth image and the camera pose, and matched
//! across every pair of frames by radius search:
//! - [`core`]: cameras, images, keypoints and pixel/world transforms
//! - [`features`]: keypoint detectors
//! - [`matching`]: keypoint collection, per-frame spatial indices and the
//!   cross-frame matcher
//! - [`io`]: scene loading and match files
//! - [`scene`]: the [`ScannedScene`] that ties these together
//!
//! ## Example
//!
//! ```rust
//! use glam::Vec3;
//! use scenematch::config::{CollectorParams, MatchConfig};
//! use scenematch::io::InMemorySensor;
//! use scenematch::test_utils::{marker_frame_for_world, test_camera, translation_pose, MarkerDetector};
//! use scenematch::ScannedScene;
//!
//! let camera = test_camera();
//! let pose = translation_pose(0.0, 0.0, -1.0);
//! let sensor = InMemorySensor::new("cam0", camera.clone()).with_frames([
//!     marker_frame_for_world(&camera, pose, &[Vec3::ZERO]),
//!     marker_frame_for_world(&camera, pose, &[Vec3::new(0.0, 0.0, 0.01)]),
//! ]);
//!
//! let config = MatchConfig {
//!     collector: CollectorParams { padding: 5, parallel: false },
//!     ..Default::default()
//! };
//! let mut scene = ScannedScene::new("example", vec![sensor], config);
//! scene.find_keypoints_with(MarkerDetector).unwrap();
//! assert_eq!(scene.match_keypoints().unwrap().len(), 1);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod features;
pub mod io;
pub mod matching;
pub mod scene;
pub mod test_utils;

pub use crate::core::{Camera, EnrichedKeypoint, FrameId, RawKeypoint, RgbdFrame};
pub use crate::matching::{Correspondence, CrossFrameMatcher, KeypointArena, MatchStore};
pub use crate::scene::ScannedScene;
