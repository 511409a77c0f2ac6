//! Scanned scene
//!
//! Owns the sensors of one scene together with the keypoints found in them
//! and the matches between those keypoints.

use std::path::Path;

use log::info;

use crate::config::MatchConfig;
use crate::features::{HarrisDetector, HarrisParams, KeypointDetector};
use crate::io::dataset::{self, DatasetError, RgbdSequence};
use crate::io::{match_file, FrameSource, MatchIoError};
use crate::matching::{CrossFrameMatcher, KeypointArena, KeypointCollector, MatchStore, SceneGeometry};

/// A scene observed by one or more RGB-D sensors.
pub struct ScannedScene<S> {
    name: String,
    sensors: Vec<S>,
    config: MatchConfig,
    keypoints: KeypointArena,
    matches: MatchStore,
}

impl ScannedScene<RgbdSequence> {
    /// Load every sensor directory under `root`.
    ///
    /// The scene is named after the directory unless `name` is given.
    pub fn load(root: &Path, name: Option<&str>, config: MatchConfig) -> Result<Self, DatasetError> {
        let sensors = dataset::load_scene(root, &config.dataset)?;
        let name = name
            .map(str::to_string)
            .or_else(|| root.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .unwrap_or_else(|| "scene".to_string());
        Ok(Self::new(name, sensors, config))
    }
}

impl<S: FrameSource + Sync> ScannedScene<S> {
    pub fn new(name: impl Into<String>, sensors: Vec<S>, config: MatchConfig) -> Self {
        Self {
            name: name.into(),
            sensors,
            config,
            keypoints: KeypointArena::new(),
            matches: MatchStore::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sensors(&self) -> &[S] {
        &self.sensors
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn keypoints(&self) -> &KeypointArena {
        &self.keypoints
    }

    pub fn matches(&self) -> &MatchStore {
        &self.matches
    }

    pub fn frame_count(&self) -> usize {
        self.sensors.iter().map(|s| s.len()).sum()
    }

    /// Detect keypoints with the Harris detector configured in `config.detector`.
    pub fn find_keypoints(&mut self) -> Result<&KeypointArena, DatasetError> {
        let detector = HarrisDetector::new(HarrisParams::from(&self.config.detector));
        self.find_keypoints_with(&detector)
    }

    /// Detect keypoints with a custom detector. Replaces any earlier keypoints
    /// and clears the matches found from them.
    pub fn find_keypoints_with<D: KeypointDetector + Sync>(
        &mut self,
        detector: D,
    ) -> Result<&KeypointArena, DatasetError> {
        let collector = KeypointCollector::new(detector, self.config.collector.clone());
        self.keypoints = collector.collect(&self.sensors)?;
        self.matches = MatchStore::new();

        info!(
            "Scene '{}': {} keypoints in {} frames",
            self.name,
            self.keypoints.len(),
            self.frame_count()
        );
        Ok(&self.keypoints)
    }

    /// Match the keypoints found by the last `find_keypoints` call.
    pub fn match_keypoints(&mut self) -> Result<&MatchStore, DatasetError> {
        let geometry = SceneGeometry::from_sources(&self.sensors)?;
        let matcher = CrossFrameMatcher::new(self.config.matcher.clone());
        self.matches = matcher.match_keypoints(&self.keypoints, &geometry);

        let summary = self.matches.summary();
        info!(
            "Scene '{}': {} matches over {} frame pairs, mean residual {:.3} px, max {:.3} px",
            self.name,
            summary.match_count,
            summary.frame_pair_count,
            summary.mean_residual,
            summary.max_residual
        );
        Ok(&self.matches)
    }

    pub fn save_matches(&self, path: &Path) -> Result<(), MatchIoError> {
        match_file::save_matches(path, &self.name, &self.matches)?;
        info!("Saved {} matches to {}", self.matches.len(), path.display());
        Ok(())
    }
}
