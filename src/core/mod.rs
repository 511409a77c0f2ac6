//! Core data structures for scenematch

pub mod camera;
pub mod frame;
pub mod image;
pub mod keypoint;
pub mod projection;

pub use camera::Camera;
pub use frame::RgbdFrame;
pub use image::{is_valid_depth, ColorImage, DepthImage};
pub use keypoint::{EnrichedKeypoint, FrameId, RawKeypoint};
pub use projection::{back_project, project};
