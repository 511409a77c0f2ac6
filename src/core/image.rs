//! Color and depth image buffers (row-major).

/// Returns true for depth samples that carry a measurement.
///
/// Zero and non-finite values are the missing-depth sentinels.
#[inline]
pub fn is_valid_depth(depth: f32) -> bool {
    depth.is_finite() && depth > 0.0
}

/// Depth image in meters (width * height, row-major)
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImage {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl DepthImage {
    /// Wrap a raw buffer. Returns `None` if the buffer size does not match.
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> Option<Self> {
        if data.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Create an image with every pixel set to `value`.
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Whether `(x, y)` lies inside the image.
    #[inline]
    pub fn is_valid_coordinate(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Depth sample at `(x, y)`, `None` when out of bounds.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Option<f32> {
        if !self.is_valid_coordinate(x, y) {
            return None;
        }
        Some(self.data[y as usize * self.width as usize + x as usize])
    }

    /// Whether `(x, y)` is in bounds and holds a usable depth sample.
    #[inline]
    pub fn is_valid(&self, x: i64, y: i64) -> bool {
        self.get(x, y).map(is_valid_depth).unwrap_or(false)
    }

    /// Set the depth at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        if x < self.width && y < self.height {
            self.data[y as usize * self.width as usize + x as usize] = value;
        }
    }

    /// Number of pixels with a usable depth sample.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|d| is_valid_depth(**d)).count()
    }
}

/// RGB color image (width * height * 3, row-major)
#[derive(Debug, Clone, PartialEq)]
pub struct ColorImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ColorImage {
    /// Wrap a raw RGB buffer. Returns `None` if the buffer size does not match.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * 3 {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Create an image with every pixel set to `rgb`.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Set the color at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x < self.width && y < self.height {
            let i = (y as usize * self.width as usize + x as usize) * 3;
            self.data[i..i + 3].copy_from_slice(&rgb);
        }
    }

    /// Convert to 8-bit grayscale (ITU-R BT.601 luma).
    pub fn to_grayscale(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .map(|p| {
                let luma = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
                luma.round().clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_from_raw_size_mismatch() {
        assert!(DepthImage::from_raw(4, 4, vec![1.0; 15]).is_none());
        assert!(DepthImage::from_raw(4, 4, vec![1.0; 16]).is_some());
    }

    #[test]
    fn test_depth_validity() {
        let mut depth = DepthImage::filled(8, 6, 0.0);
        depth.set(2, 3, 1.5);
        depth.set(4, 4, f32::NEG_INFINITY);
        depth.set(5, 1, f32::NAN);

        assert!(depth.is_valid(2, 3));
        assert!(!depth.is_valid(0, 0));
        assert!(!depth.is_valid(4, 4));
        assert!(!depth.is_valid(5, 1));
        assert!(!depth.is_valid(-1, 3));
        assert!(!depth.is_valid(8, 3));
        assert_eq!(depth.valid_count(), 1);
    }

    #[test]
    fn test_depth_coordinate_bounds() {
        let depth = DepthImage::filled(10, 5, 1.0);
        assert!(depth.is_valid_coordinate(0, 0));
        assert!(depth.is_valid_coordinate(9, 4));
        assert!(!depth.is_valid_coordinate(10, 4));
        assert!(!depth.is_valid_coordinate(9, 5));
        assert!(!depth.is_valid_coordinate(-1, 0));
    }

    #[test]
    fn test_color_pixels_and_grayscale() {
        let mut color = ColorImage::filled(3, 2, [10, 20, 30]);
        assert_eq!(color.data().len(), 18);
        assert_eq!(color.pixel(2, 1), Some([10, 20, 30]));

        color.put_pixel(1, 0, [255, 255, 255]);
        assert_eq!(color.pixel(1, 0), Some([255, 255, 255]));
        assert_eq!(color.pixel(3, 0), None);

        let gray = color.to_grayscale();
        assert_eq!(gray.len(), 6);
        assert_eq!(gray[1], 255);
    }
}
