//! Utility helpers for keypoint detection.

use crate::core::RawKeypoint;

/// Normalized 2D Gaussian kernel of `size * size` weights (row-major).
pub fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let size = size.max(1);
    let half = (size / 2) as f32;
    let denom = 2.0 * sigma.max(1e-3) * sigma.max(1e-3);

    let mut kernel = Vec::with_capacity(size * size);
    for i in 0..size {
        for j in 0..size {
            let dy = i as f32 - half;
            let dx = j as f32 - half;
            kernel.push((-(dx * dx + dy * dy) / denom).exp());
        }
    }

    let sum: f32 = kernel.iter().sum();
    if sum > 0.0 {
        for w in &mut kernel {
            *w /= sum;
        }
    }
    kernel
}

/// Keep the strongest keypoints.
///
/// Responses are expected to be normalized; anything below `min_response` is
/// dropped and at most `max_keypoints` are returned, strongest first.
pub fn select_strongest(
    mut keypoints: Vec<RawKeypoint>,
    min_response: f32,
    max_keypoints: usize,
) -> Vec<RawKeypoint> {
    keypoints.retain(|kp| kp.response >= min_response);
    keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
    keypoints.truncate(max_keypoints);
    keypoints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_kernel_normalized() {
        let kernel = gaussian_kernel(5, 1.2);
        assert_eq!(kernel.len(), 25);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        // Center weight is the largest
        let center = kernel[12];
        assert!(kernel.iter().all(|w| *w <= center));
    }

    #[test]
    fn test_select_strongest() {
        let keypoints = vec![
            RawKeypoint::new(0.0, 0.0, 1.0, 0.5),
            RawKeypoint::new(1.0, 0.0, 1.0, 0.01),
            RawKeypoint::new(2.0, 0.0, 1.0, 1.0),
            RawKeypoint::new(3.0, 0.0, 1.0, 0.2),
        ];

        let selected = select_strongest(keypoints, 0.03, 2);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].x, 2.0);
        assert_eq!(selected[1].x, 0.0);
    }
}
