//! End-to-end matching on synthetic scenes.

use glam::Vec3;
use scenematch::config::{CollectorParams, MatchConfig, MatcherParams};
use scenematch::io::InMemorySensor;
use scenematch::test_utils::{
    marker_frame, marker_frame_for_world, test_camera, translation_pose, MarkerDetector,
};
use scenematch::{FrameId, ScannedScene};
use tempfile::tempdir;

fn config(parallel: bool) -> MatchConfig {
    MatchConfig {
        collector: CollectorParams { padding: 5, parallel },
        matcher: MatcherParams {
            parallel,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn two_frame_scene(second: Vec3) -> ScannedScene<InMemorySensor> {
    let camera = test_camera();
    let pose = translation_pose(0.0, 0.0, -1.0);
    let sensor = InMemorySensor::new("cam0", camera.clone()).with_frames([
        marker_frame_for_world(&camera, pose, &[Vec3::ZERO]),
        marker_frame_for_world(&camera, pose, &[second]),
    ]);
    ScannedScene::new("pair", vec![sensor], config(false))
}

/// Sensor 0 records two frames, sensor 1 records four; every frame sees the
/// same three points.
fn uneven_scene(parallel: bool) -> ScannedScene<InMemorySensor> {
    let camera = test_camera();
    let points = [Vec3::ZERO, Vec3::new(0.1, 0.0, 0.0), Vec3::new(0.0, -0.1, 0.0)];
    let frames = |count: usize, z: f32| {
        (0..count)
            .map(|f| marker_frame_for_world(&camera, translation_pose(0.01 * f as f32, 0.0, z), &points))
            .collect::<Vec<_>>()
    };
    let sensors = vec![
        InMemorySensor::new("short", camera.clone()).with_frames(frames(2, -1.0)),
        InMemorySensor::new("long", camera.clone()).with_frames(frames(4, -1.0)),
    ];
    ScannedScene::new("uneven", sensors, config(parallel))
}

#[test]
fn test_points_one_centimeter_apart_match() {
    let mut scene = two_frame_scene(Vec3::new(0.0, 0.0, 0.01));
    scene.find_keypoints_with(MarkerDetector).unwrap();
    let matches = scene.match_keypoints().unwrap();

    assert_eq!(matches.len(), 1);
    let m = matches.as_slice()[0];
    assert_eq!(m.source.frame_id(), FrameId::new(0, 0));
    assert_eq!(m.target.frame_id(), FrameId::new(0, 1));
    assert!(m.world_distance() <= 0.02);
}

#[test]
fn test_points_half_a_meter_apart_do_not_match() {
    let mut scene = two_frame_scene(Vec3::new(0.0, 0.0, 0.5));
    scene.find_keypoints_with(MarkerDetector).unwrap();
    assert_eq!(scene.keypoints().len(), 2);
    assert!(scene.match_keypoints().unwrap().is_empty());
}

#[test]
fn test_every_frame_pair_matched_once() {
    let mut scene = uneven_scene(false);
    scene.find_keypoints_with(MarkerDetector).unwrap();
    assert_eq!(scene.keypoints().len(), 18);

    let matches = scene.match_keypoints().unwrap();
    let summary = matches.summary();

    // 6 frames -> 15 unordered pairs, each point matched to its twin
    assert_eq!(summary.frame_pair_count, 15);
    assert_eq!(summary.match_count, 45);
    for m in matches {
        assert!(m.source.frame_id() < m.target.frame_id());
        assert!(m.world_distance() <= 0.02);
    }

    // Frames 2 and 3 of the longer sensor are reached from the shorter one
    assert!(matches
        .iter()
        .any(|m| m.source.sensor == 0 && m.target.frame_id() == FrameId::new(1, 3)));
}

#[test]
fn test_flat_wall_with_many_keypoints() {
    // 48 markers on a wall 1 m away, every keypoint at world z = 0
    let camera = test_camera();
    let pose = translation_pose(0.0, 0.0, -1.0);
    let markers: Vec<(u32, u32, f32)> = (0..8)
        .flat_map(|i| (0..6).map(move |j| (10 + 5 * i, 10 + 5 * j, 1.0)))
        .collect();
    let sensor = InMemorySensor::new("wall", camera.clone()).with_frames([
        marker_frame(&camera, pose, &markers),
        marker_frame(&camera, pose, &markers),
    ]);

    let mut scene = ScannedScene::new("wall", vec![sensor], config(false));
    scene.find_keypoints_with(MarkerDetector).unwrap();
    assert_eq!(scene.keypoints().len(), 96);
    assert!(scene.keypoints().keypoints().iter().all(|kp| kp.world.z.abs() < 1e-6));

    // Grid spacing is 5 cm, so each keypoint only matches its twin
    let matches = scene.match_keypoints().unwrap();
    assert_eq!(matches.len(), 48);
    assert!(matches.iter().all(|m| m.world_distance() < 1e-6));
}

#[test]
fn test_parallel_scene_matches_sequential() {
    let mut sequential = uneven_scene(false);
    sequential.find_keypoints_with(MarkerDetector).unwrap();
    sequential.match_keypoints().unwrap();

    let mut parallel = uneven_scene(true);
    parallel.find_keypoints_with(MarkerDetector).unwrap();
    parallel.match_keypoints().unwrap();

    assert_eq!(sequential.keypoints(), parallel.keypoints());
    assert_eq!(sequential.matches(), parallel.matches());
}

#[test]
fn test_empty_scene() {
    let mut scene: ScannedScene<InMemorySensor> = ScannedScene::new("empty", Vec::new(), MatchConfig::default());
    assert!(scene.find_keypoints_with(MarkerDetector).unwrap().is_empty());
    assert!(scene.match_keypoints().unwrap().is_empty());
}

#[test]
fn test_saved_matches_round_trip() {
    let mut scene = uneven_scene(false);
    scene.find_keypoints_with(MarkerDetector).unwrap();
    scene.match_keypoints().unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("uneven.matches.txt");
    scene.save_matches(&path).unwrap();

    let file = scenematch::io::load_matches(&path).unwrap();
    assert_eq!(file.scene_name, "uneven");
    assert_eq!(file.records.len(), scene.matches().len());
    for (record, m) in file.records.iter().zip(scene.matches()) {
        assert_eq!(record.source, m.source);
        assert_eq!(record.target, m.target);
        assert_eq!(record.offset, m.offset);
    }
}
