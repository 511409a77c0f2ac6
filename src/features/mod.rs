//! Keypoint detection module

pub mod harris;
mod utils;

pub use harris::{HarrisDetector, HarrisParams};

use crate::core::{ColorImage, RawKeypoint};

/// Produces 2D keypoint candidates for a single color image.
///
/// Order and count of the returned candidates are unconstrained.
pub trait KeypointDetector {
    fn detect(&self, image: &ColorImage) -> Vec<RawKeypoint>;
}

impl<D: KeypointDetector + ?Sized> KeypointDetector for &D {
    fn detect(&self, image: &ColorImage) -> Vec<RawKeypoint> {
        (**self).detect(image)
    }
}
