//! Harris corner detector
//!
//! Default keypoint detector for color frames. Responses are normalized by
//! the strongest corner of the image so that `min_response` is independent of
//! image contrast.

use crate::config::DetectorParams;
use crate::core::{ColorImage, RawKeypoint};
use crate::features::utils::{gaussian_kernel, select_strongest};
use crate::features::KeypointDetector;

/// Harris corner detector parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarrisParams {
    /// Free parameter of Harris detector
    pub k: f32,
    /// Gaussian window size (odd)
    pub window_size: usize,
    /// Gaussian window sigma
    pub window_sigma: f32,
    /// Non-maximum suppression radius
    pub nms_radius: usize,
    /// Minimum normalized response
    pub min_response: f32,
    /// Maximum number of corners returned
    pub max_keypoints: usize,
}

impl Default for HarrisParams {
    fn default() -> Self {
        Self::from(&DetectorParams::default())
    }
}

impl From<&DetectorParams> for HarrisParams {
    fn from(params: &DetectorParams) -> Self {
        Self {
            k: params.harris_k,
            window_size: params.window_size | 1,
            window_sigma: params.window_sigma,
            nms_radius: params.nms_radius.max(1),
            min_response: params.min_response,
            max_keypoints: params.max_keypoints,
        }
    }
}

/// Harris corner detector
#[derive(Debug, Clone)]
pub struct HarrisDetector {
    params: HarrisParams,
    kernel: Vec<f32>,
}

impl HarrisDetector {
    /// Create a new Harris detector
    pub fn new(params: HarrisParams) -> Self {
        let kernel = gaussian_kernel(params.window_size, params.window_sigma);
        Self { params, kernel }
    }

    pub fn params(&self) -> &HarrisParams {
        &self.params
    }

    /// Detect corners in a grayscale image (row-major).
    pub fn detect_gray(&self, image: &[u8], width: u32, height: u32) -> Vec<RawKeypoint> {
        let w = width as usize;
        let h = height as usize;
        let half_k = self.params.window_size / 2;
        let border = (half_k + 1).max(self.params.nms_radius + 1);

        if image.len() != w * h || w <= 2 * border || h <= 2 * border {
            return Vec::new();
        }

        // Sobel gradients and their products
        let mut ixx = vec![0.0f32; w * h];
        let mut iyy = vec![0.0f32; w * h];
        let mut ixy = vec![0.0f32; w * h];

        for i in 1..(h - 1) {
            for j in 1..(w - 1) {
                let p = |di: usize, dj: usize| image[(i + di - 1) * w + (j + dj - 1)] as f32;
                let gx = -p(0, 0) - 2.0 * p(1, 0) - p(2, 0) + p(0, 2) + 2.0 * p(1, 2) + p(2, 2);
                let gy = -p(0, 0) - 2.0 * p(0, 1) - p(0, 2) + p(2, 0) + 2.0 * p(2, 1) + p(2, 2);
                let idx = i * w + j;
                ixx[idx] = gx * gx;
                iyy[idx] = gy * gy;
                ixy[idx] = gx * gy;
            }
        }

        // Harris response over a Gaussian-weighted window: det(M) - k * trace(M)^2
        let size = self.params.window_size;
        let mut response = vec![0.0f32; w * h];
        for i in border..(h - border) {
            for j in border..(w - border) {
                let mut sxx = 0.0f32;
                let mut syy = 0.0f32;
                let mut sxy = 0.0f32;
                for di in 0..size {
                    for dj in 0..size {
                        let idx = (i + di - half_k) * w + (j + dj - half_k);
                        let weight = self.kernel[di * size + dj];
                        sxx += ixx[idx] * weight;
                        syy += iyy[idx] * weight;
                        sxy += ixy[idx] * weight;
                    }
                }
                let det = sxx * syy - sxy * sxy;
                let trace = sxx + syy;
                response[i * w + j] = det - self.params.k * trace * trace;
            }
        }

        let corners = self.non_max_suppression(&response, w, h, border);
        let max_response = corners
            .iter()
            .map(|kp| kp.response)
            .fold(0.0f32, f32::max);
        if max_response <= 0.0 {
            return Vec::new();
        }

        let normalized = corners
            .into_iter()
            .map(|kp| RawKeypoint {
                response: kp.response / max_response,
                ..kp
            })
            .collect();

        select_strongest(normalized, self.params.min_response, self.params.max_keypoints)
    }

    fn non_max_suppression(
        &self,
        response: &[f32],
        w: usize,
        h: usize,
        border: usize,
    ) -> Vec<RawKeypoint> {
        let r = self.params.nms_radius;
        let size = self.params.window_size as f32;
        let mut corners = Vec::new();

        for i in border..(h - border) {
            for j in border..(w - border) {
                let val = response[i * w + j];
                if val <= 0.0 {
                    continue;
                }

                // Ties are broken towards the first pixel in scan order
                let mut is_max = true;
                'window: for ni in (i - r)..=(i + r) {
                    for nj in (j - r)..=(j + r) {
                        if ni == i && nj == j {
                            continue;
                        }
                        let other = response[ni * w + nj];
                        let earlier = ni < i || (ni == i && nj < j);
                        if other > val || (earlier && other == val) {
                            is_max = false;
                            break 'window;
                        }
                    }
                }

                if is_max {
                    corners.push(RawKeypoint::new(j as f32, i as f32, size, val));
                }
            }
        }

        corners
    }
}

impl Default for HarrisDetector {
    fn default() -> Self {
        Self::new(HarrisParams::default())
    }
}

impl KeypointDetector for HarrisDetector {
    fn detect(&self, image: &ColorImage) -> Vec<RawKeypoint> {
        let gray = image.to_grayscale();
        self.detect_gray(&gray, image.width(), image.height())
    }
}
