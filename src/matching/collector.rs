//! Keypoint collection
//!
//! Runs the detector on every frame of every sensor, keeps the candidates
//! that have a depth sample and clear the border padding, and back-projects
//! them into world space.

use glam::{Mat4, Vec2};
use log::{debug, info};
use rayon::prelude::*;

use crate::config::CollectorParams;
use crate::core::{back_project, DepthImage, EnrichedKeypoint, FrameId, RawKeypoint};
use crate::features::KeypointDetector;
use crate::io::dataset::Result;
use crate::io::FrameSource;
use crate::matching::arena::KeypointArena;

/// Per-frame candidate filtering counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateStats {
    pub candidates: usize,
    pub near_border: usize,
    pub invalid_depth: usize,
    pub accepted: usize,
}

impl std::ops::AddAssign for CandidateStats {
    fn add_assign(&mut self, other: Self) {
        self.candidates += other.candidates;
        self.near_border += other.near_border;
        self.invalid_depth += other.invalid_depth;
        self.accepted += other.accepted;
    }
}

/// Filter the raw candidates of one frame and back-project the survivors.
///
/// A candidate is rounded to the nearest pixel and kept only if both
/// `pixel + padding` and `pixel - padding` lie inside the depth image and the
/// pixel holds a valid depth sample. Survivors keep the candidate order.
pub fn filter_candidates(
    id: FrameId,
    depth: &DepthImage,
    candidates: &[RawKeypoint],
    intrinsic_inverse: &Mat4,
    camera_to_world: &Mat4,
    padding: u32,
) -> (Vec<EnrichedKeypoint>, CandidateStats) {
    let pad = padding as i64;
    let mut stats = CandidateStats {
        candidates: candidates.len(),
        ..Default::default()
    };
    let mut keypoints = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let x = candidate.x.round() as i64;
        let y = candidate.y.round() as i64;

        if !(depth.is_valid_coordinate(x + pad, y + pad) && depth.is_valid_coordinate(x - pad, y - pad)) {
            stats.near_border += 1;
            continue;
        }

        let d = match depth.get(x, y) {
            Some(d) if crate::core::is_valid_depth(d) => d,
            _ => {
                stats.invalid_depth += 1;
                continue;
            }
        };

        let pixel = Vec2::new(x as f32, y as f32);
        keypoints.push(EnrichedKeypoint {
            sensor: id.sensor,
            frame: id.frame,
            pixel,
            depth: d,
            world: back_project(pixel, d, intrinsic_inverse, camera_to_world),
            size: candidate.size,
            response: candidate.response,
        });
    }

    stats.accepted = keypoints.len();
    (keypoints, stats)
}

/// Builds the keypoint arena of a scene.
pub struct KeypointCollector<D> {
    detector: D,
    params: CollectorParams,
}

impl<D: KeypointDetector + Sync> KeypointCollector<D> {
    pub fn new(detector: D, params: CollectorParams) -> Self {
        Self { detector, params }
    }

    pub fn params(&self) -> &CollectorParams {
        &self.params
    }

    /// Detect, filter and back-project the keypoints of every frame.
    ///
    /// Frames are processed in enumeration order; with `parallel` set the
    /// frames of each sensor are processed concurrently and merged back in
    /// frame order, giving the same arena as the sequential pass.
    pub fn collect<S: FrameSource + Sync>(&self, sources: &[S]) -> Result<KeypointArena> {
        let mut arena = KeypointArena::new();

        for (sensor, source) in sources.iter().enumerate() {
            let frames: Vec<(Vec<EnrichedKeypoint>, CandidateStats)> = if self.params.parallel {
                (0..source.len())
                    .into_par_iter()
                    .map(|frame| self.collect_frame(source, FrameId::new(sensor, frame)))
                    .collect::<Result<Vec<_>>>()?
            } else {
                (0..source.len())
                    .map(|frame| self.collect_frame(source, FrameId::new(sensor, frame)))
                    .collect::<Result<Vec<_>>>()?
            };

            let mut totals = CandidateStats::default();
            for (frame, (keypoints, stats)) in frames.into_iter().enumerate() {
                let id = FrameId::new(sensor, frame);
                debug!(
                    "Frame {}: {} keypoints ({} candidates, {} near border, {} without depth)",
                    id, stats.accepted, stats.candidates, stats.near_border, stats.invalid_depth
                );
                totals += stats;
                arena.push_frame(id, keypoints);
            }

            info!(
                "Sensor {} ('{}'): {} keypoints from {} frames ({} candidates)",
                sensor,
                source.name(),
                totals.accepted,
                source.len(),
                totals.candidates
            );
        }

        Ok(arena)
    }

    fn collect_frame<S: FrameSource>(
        &self,
        source: &S,
        id: FrameId,
    ) -> Result<(Vec<EnrichedKeypoint>, CandidateStats)> {
        let frame = source.load_frame(id.frame)?;
        let candidates = self.detector.detect(&frame.color);
        Ok(filter_candidates(
            id,
            &frame.depth,
            &candidates,
            &source.camera().intrinsic_inverse,
            &frame.camera_to_world,
            self.params.padding,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Camera;
    use crate::io::InMemorySensor;
    use crate::test_utils::{marker_frame, test_camera, translation_pose, MarkerDetector};
    use glam::Vec3;

    fn candidate(x: f32, y: f32) -> RawKeypoint {
        RawKeypoint::new(x, y, 3.0, 0.5)
    }

    #[test]
    fn test_padding_boundary_is_exclusive() {
        let camera = Camera::new(100.0, 100.0, 50.0, 50.0, 100, 100);
        let depth = DepthImage::filled(100, 100, 1.0);
        let pad = 10u32;

        let (kept, stats) = filter_candidates(
            FrameId::new(0, 0),
            &depth,
            &[candidate(10.0, 9.0), candidate(10.0, 10.0)],
            &camera.intrinsic_inverse,
            &Mat4::IDENTITY,
            pad,
        );

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].pixel, Vec2::new(10.0, 10.0));
        assert_eq!(stats.near_border, 1);
    }

    #[test]
    fn test_padding_upper_border() {
        let camera = Camera::new(100.0, 100.0, 50.0, 50.0, 100, 100);
        let depth = DepthImage::filled(100, 100, 1.0);

        // 89 + 10 = 99 is the last column, 90 + 10 is out of bounds
        let (kept, _) = filter_candidates(
            FrameId::new(0, 0),
            &depth,
            &[candidate(89.0, 50.0), candidate(90.0, 50.0)],
            &camera.intrinsic_inverse,
            &Mat4::IDENTITY,
            10,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].pixel.x, 89.0);
    }

    #[test]
    fn test_candidates_are_rounded() {
        let camera = Camera::new(100.0, 100.0, 50.0, 50.0, 100, 100);
        let mut depth = DepthImage::filled(100, 100, 0.0);
        depth.set(40, 61, 2.0);

        let (kept, stats) = filter_candidates(
            FrameId::new(1, 3),
            &depth,
            &[candidate(39.6, 60.7), candidate(40.0, 40.0)],
            &camera.intrinsic_inverse,
            &Mat4::IDENTITY,
            5,
        );

        assert_eq!(stats.invalid_depth, 1);
        assert_eq!(kept.len(), 1);
        let kp = kept[0];
        assert_eq!((kp.sensor, kp.frame), (1, 3));
        assert_eq!(kp.pixel, Vec2::new(40.0, 61.0));
        assert_eq!(kp.depth, 2.0);
        assert_eq!(kp.size, 3.0);
        assert_eq!(kp.response, 0.5);
        // (40 - 50) * 2 / 100, (61 - 50) * 2 / 100
        assert!(kp.world.abs_diff_eq(Vec3::new(-0.2, 0.22, 2.0), 1e-5));
    }

    #[test]
    fn test_non_finite_depth_rejected() {
        let camera = Camera::new(100.0, 100.0, 50.0, 50.0, 100, 100);
        let mut depth = DepthImage::filled(100, 100, 1.0);
        depth.set(30, 30, f32::NAN);
        depth.set(31, 30, f32::INFINITY);
        depth.set(32, 30, -1.0);

        let (kept, stats) = filter_candidates(
            FrameId::new(0, 0),
            &depth,
            &[candidate(30.0, 30.0), candidate(31.0, 30.0), candidate(32.0, 30.0)],
            &camera.intrinsic_inverse,
            &Mat4::IDENTITY,
            5,
        );
        assert!(kept.is_empty());
        assert_eq!(stats.invalid_depth, 3);
    }

    #[test]
    fn test_collect_builds_spans_for_every_frame() {
        let camera = test_camera();
        let pose = translation_pose(0.0, 0.0, -1.0);
        let sensor = InMemorySensor::new("cam0", camera.clone()).with_frames([
            marker_frame(&camera, pose, &[(32, 24, 1.0), (40, 30, 1.2)]),
            marker_frame(&camera, pose, &[]),
            marker_frame(&camera, pose, &[(20, 20, 0.9)]),
        ]);

        let collector = KeypointCollector::new(MarkerDetector, CollectorParams { padding: 4, parallel: false });
        let arena = collector.collect(&[sensor]).unwrap();

        assert_eq!(arena.len(), 3);
        assert_eq!(arena.spans().len(), 3);
        assert_eq!(arena.spans()[0].count, 2);
        assert!(arena.spans()[1].is_empty());
        assert_eq!(arena.spans()[2].start, 2);
        // (32 - 40) / 100, (24 - 30) / 100 at 1 m, camera 1 m behind the origin
        assert!(arena.keypoints()[0].world.abs_diff_eq(Vec3::new(-0.08, -0.06, 0.0), 1e-5));
    }

    #[test]
    fn test_parallel_collect_matches_sequential() {
        let camera = test_camera();
        let frames: Vec<_> = (0..6)
            .map(|i| {
                let pose = translation_pose(0.01 * i as f32, 0.0, -1.0);
                marker_frame(&camera, pose, &[(20 + i as u32, 20, 1.0), (30, 25 + i as u32, 1.1)])
            })
            .collect();
        let sensors = vec![
            InMemorySensor::new("a", camera.clone()).with_frames(frames.clone()),
            InMemorySensor::new("b", camera.clone()).with_frames(frames.into_iter().rev()),
        ];

        let sequential = KeypointCollector::new(MarkerDetector, CollectorParams { padding: 4, parallel: false })
            .collect(&sensors)
            .unwrap();
        let parallel = KeypointCollector::new(MarkerDetector, CollectorParams { padding: 4, parallel: true })
            .collect(&sensors)
            .unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(sequential.len(), 24);
    }

    #[test]
    fn test_collect_empty_input() {
        let collector = KeypointCollector::new(MarkerDetector, CollectorParams::default());
        let arena = collector.collect::<InMemorySensor>(&[]).unwrap();
        assert!(arena.is_empty());
        assert!(arena.spans().is_empty());
    }
}
