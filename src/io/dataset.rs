//! Scene loading
//!
//! A scene directory holds one sub-directory per sensor. Sensors are
//! enumerated in sorted directory-name order. Each sensor directory is an
//! RGB-D sequence:
//! - rgb.txt: timestamps and filenames for color images
//! - depth.txt: timestamps and filenames for 16-bit depth images
//! - groundtruth.txt: timestamp tx ty tz qx qy qz qw (camera to world)
//! - calibration.txt (optional): fx fy cx cy [width height]

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use glam::{Mat4, Quat, Vec3};
use log::{debug, info, warn};

use crate::config::DatasetParams;
use crate::core::{Camera, ColorImage, DepthImage, RgbdFrame};
use crate::io::source::FrameSource;

/// Errors that can occur when loading datasets
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid dataset format: {0}")]
    Format(String),

    #[error("Image loading error: {0}")]
    Image(String),

    #[error("Camera calibration missing or invalid: {0}")]
    Calibration(String),

    #[error("Frame index out of bounds: {0}")]
    FrameIndex(usize),
}

/// Result type for dataset operations
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Default intrinsics of 640x480 structured-light depth sensors
const DEFAULT_CAMERA: (f32, f32, f32, f32, u32, u32) = (525.0, 525.0, 319.5, 239.5, 640, 480);

#[derive(Debug, Clone)]
struct SequenceEntry {
    timestamp: f64,
    color_path: PathBuf,
    depth_path: PathBuf,
    camera_to_world: Mat4,
}

/// RGB-D sequence recorded by one sensor.
#[derive(Debug, Clone)]
pub struct RgbdSequence {
    name: String,
    root: PathBuf,
    camera: Camera,
    depth_scale: f32,
    entries: Vec<SequenceEntry>,
}

impl RgbdSequence {
    /// Load a sequence from the given directory
    pub fn load(root: &Path, params: &DatasetParams) -> Result<Self> {
        let rgb_file = root.join("rgb.txt");
        let depth_file = root.join("depth.txt");
        let trajectory_file = root.join("groundtruth.txt");

        for required in [&rgb_file, &depth_file, &trajectory_file] {
            if !required.exists() {
                return Err(DatasetError::Format(format!(
                    "{} not found in {}",
                    required.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
                    root.display()
                )));
            }
        }

        let color_entries = parse_association_file(&rgb_file)?;
        let mut depth_entries = parse_association_file(&depth_file)?;
        depth_entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        let trajectory = parse_trajectory(&trajectory_file)?;
        let camera = load_camera(root)?;

        let tolerance = params.max_time_difference;
        let mut entries = Vec::with_capacity(color_entries.len());
        let mut dropped = 0usize;

        for (timestamp, color_name) in &color_entries {
            let depth_name = closest_by_timestamp(&depth_entries, *timestamp, tolerance);
            let pose = closest_by_timestamp(&trajectory, *timestamp, tolerance);
            match (depth_name, pose) {
                (Some(depth_name), Some(pose)) => entries.push(SequenceEntry {
                    timestamp: *timestamp,
                    color_path: root.join(color_name),
                    depth_path: root.join(depth_name),
                    camera_to_world: *pose,
                }),
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!(
                "{}: dropped {} of {} color frames without matching depth or pose",
                root.display(),
                dropped,
                color_entries.len()
            );
        }

        // Apply frame limits and stride
        let max_frames = if params.max_frames > 0 {
            params.max_frames.min(entries.len())
        } else {
            entries.len()
        };
        let entries = entries
            .into_iter()
            .take(max_frames)
            .step_by(params.stride.max(1))
            .collect::<Vec<_>>();

        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        info!(
            "Loaded sensor '{}': {} frames, depth {}x{}",
            name,
            entries.len(),
            camera.width,
            camera.height
        );

        Ok(Self {
            name,
            root: root.to_path_buf(),
            camera,
            depth_scale: params.depth_scale,
            entries,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Timestamp of a frame in seconds
    pub fn timestamp(&self, index: usize) -> Option<f64> {
        self.entries.get(index).map(|e| e.timestamp)
    }

    fn entry(&self, index: usize) -> Result<&SequenceEntry> {
        self.entries.get(index).ok_or(DatasetError::FrameIndex(index))
    }
}

impl FrameSource for RgbdSequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn camera_to_world(&self, index: usize) -> Result<Mat4> {
        Ok(self.entry(index)?.camera_to_world)
    }

    fn load_frame(&self, index: usize) -> Result<RgbdFrame> {
        let entry = self.entry(index)?;
        let color = load_color_image(&entry.color_path)?;
        let depth = load_depth_image(&entry.depth_path, self.depth_scale)?;

        Ok(RgbdFrame::new(
            index,
            entry.timestamp,
            color,
            depth,
            entry.camera_to_world,
        ))
    }
}

/// Load every sensor sequence of a scene directory, in sorted name order.
pub fn load_scene(root: &Path, params: &DatasetParams) -> Result<Vec<RgbdSequence>> {
    if !root.is_dir() {
        return Err(DatasetError::Format(format!(
            "scene directory not found: {}",
            root.display()
        )));
    }

    let mut sensor_dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            sensor_dirs.push(path);
        }
    }
    sensor_dirs.sort();

    if sensor_dirs.is_empty() {
        warn!("No sensor directories found in {}", root.display());
    }

    sensor_dirs
        .iter()
        .map(|dir| RgbdSequence::load(dir, params))
        .collect()
}

/// Parse an association file
/// Format: timestamp filename
fn parse_association_file(path: &Path) -> Result<Vec<(f64, String)>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(DatasetError::Format(format!(
                "{} line {}: expected 2 parts, got {}",
                path.display(),
                line_num + 1,
                parts.len()
            )));
        }

        let timestamp: f64 = parse_field(&parts, 0, "timestamp", line_num)?;
        entries.push((timestamp, parts[1].to_string()));
    }

    debug!("Parsed {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Parse a trajectory file (timestamp tx ty tz qx qy qz qw), sorted by timestamp
fn parse_trajectory(path: &Path) -> Result<Vec<(f64, Mat4)>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut poses = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 8 {
            return Err(DatasetError::Format(format!(
                "{} line {}: expected 8 parts for a pose, got {}",
                path.display(),
                line_num + 1,
                parts.len()
            )));
        }

        let timestamp: f64 = parse_field(&parts, 0, "timestamp", line_num)?;
        let translation = Vec3::new(
            parse_field(&parts, 1, "tx", line_num)?,
            parse_field(&parts, 2, "ty", line_num)?,
            parse_field(&parts, 3, "tz", line_num)?,
        );
        let rotation = Quat::from_xyzw(
            parse_field(&parts, 4, "qx", line_num)?,
            parse_field(&parts, 5, "qy", line_num)?,
            parse_field(&parts, 6, "qz", line_num)?,
            parse_field(&parts, 7, "qw", line_num)?,
        )
        .normalize();

        poses.push((timestamp, Mat4::from_rotation_translation(rotation, translation)));
    }

    // Sort by timestamp for binary search
    poses.sort_by(|a, b| a.0.total_cmp(&b.0));

    Ok(poses)
}

fn parse_field<T>(parts: &[&str], index: usize, field: &str, line_num: usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parts[index].parse().map_err(|e| {
        DatasetError::Format(format!(
            "Line {}: invalid {} '{}': {}",
            line_num + 1,
            field,
            parts[index],
            e
        ))
    })
}

/// Load the depth camera model from `calibration.txt`, or the 640x480 defaults
fn load_camera(root: &Path) -> Result<Camera> {
    let calib_file = root.join("calibration.txt");
    if !calib_file.exists() {
        let (fx, fy, cx, cy, width, height) = DEFAULT_CAMERA;
        return Ok(Camera::new(fx, fy, cx, cy, width, height));
    }

    let content = std::fs::read_to_string(&calib_file)?;
    let values: Vec<&str> = content.split_whitespace().collect();
    if values.len() != 4 && values.len() != 6 {
        return Err(DatasetError::Calibration(format!(
            "{}: expected 'fx fy cx cy [width height]', got {} values",
            calib_file.display(),
            values.len()
        )));
    }

    let parse = |i: usize| -> Result<f32> {
        values[i].parse().map_err(|e| {
            DatasetError::Calibration(format!("invalid value '{}': {}", values[i], e))
        })
    };
    let (width, height) = if values.len() == 6 {
        let w: u32 = values[4].parse().map_err(|e| {
            DatasetError::Calibration(format!("invalid width '{}': {}", values[4], e))
        })?;
        let h: u32 = values[5].parse().map_err(|e| {
            DatasetError::Calibration(format!("invalid height '{}': {}", values[5], e))
        })?;
        (w, h)
    } else {
        (DEFAULT_CAMERA.4, DEFAULT_CAMERA.5)
    };

    let (fx, fy) = (parse(0)?, parse(1)?);
    if fx <= 0.0 || fy <= 0.0 {
        return Err(DatasetError::Calibration(format!(
            "focal lengths must be positive, got fx={} fy={}",
            fx, fy
        )));
    }

    Ok(Camera::new(fx, fy, parse(2)?, parse(3)?, width, height))
}

/// Entry with the closest timestamp within `tolerance`. `entries` must be sorted.
fn closest_by_timestamp<T>(entries: &[(f64, T)], timestamp: f64, tolerance: f64) -> Option<&T> {
    if entries.is_empty() {
        return None;
    }

    let idx = entries.partition_point(|(ts, _)| *ts < timestamp);
    let mut best: Option<(f64, &T)> = None;
    for candidate in [idx.checked_sub(1), Some(idx)].into_iter().flatten() {
        if let Some((ts, value)) = entries.get(candidate) {
            let diff = (ts - timestamp).abs();
            if best.map(|(d, _)| diff < d).unwrap_or(true) {
                best = Some((diff, value));
            }
        }
    }

    best.filter(|(diff, _)| *diff <= tolerance).map(|(_, value)| value)
}

/// Load a 16-bit PNG depth image and convert to meters
#[cfg(feature = "image")]
fn load_depth_image(path: &Path, depth_scale: f32) -> Result<DepthImage> {
    use image::ImageReader;

    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| DatasetError::Image(format!("{}: {}", path.display(), e)))?;

    let (width, height) = (img.width(), img.height());
    let data: Vec<f32> = match img {
        image::DynamicImage::ImageLuma16(luma) => luma
            .pixels()
            .map(|p| p.0[0] as f32 / depth_scale)
            .collect(),
        _ => {
            return Err(DatasetError::Image(format!(
                "{}: expected 16-bit grayscale image, got {:?}",
                path.display(),
                img.color()
            )))
        }
    };

    DepthImage::from_raw(width, height, data).ok_or_else(|| {
        DatasetError::Image(format!("{}: depth image size mismatch", path.display()))
    })
}

/// Load an RGB image
#[cfg(feature = "image")]
fn load_color_image(path: &Path) -> Result<ColorImage> {
    use image::ImageReader;

    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| DatasetError::Image(format!("{}: {}", path.display(), e)))?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    ColorImage::from_raw(width, height, rgb.into_raw()).ok_or_else(|| {
        DatasetError::Image(format!("{}: color image size mismatch", path.display()))
    })
}

#[cfg(not(feature = "image"))]
fn load_depth_image(_path: &Path, _depth_scale: f32) -> Result<DepthImage> {
    Err(DatasetError::Image(
        "Depth image loading requires 'image' feature".to_string()
    ))
}

#[cfg(not(feature = "image"))]
fn load_color_image(_path: &Path) -> Result<ColorImage> {
    Err(DatasetError::Image(
        "Color image loading requires 'image' feature".to_string()
    ))
}
