//! Cross-frame keypoint matching
//!
//! Every keypoint queries the KD-tree of each frame enumerated after its own
//! frame. Each hit becomes a correspondence annotated with the offset between
//! the target keypoint's pixel and the source keypoint reprojected into the
//! target frame.

use log::{debug, info};
use rayon::prelude::*;

use crate::config::MatcherParams;
use crate::core::EnrichedKeypoint;
use crate::matching::arena::KeypointArena;
use crate::matching::geometry::SceneGeometry;
use crate::matching::spatial_index::SpatialIndex;
use crate::matching::store::{Correspondence, MatchStore};

/// Radius-bounded matcher across all frame pairs.
#[derive(Debug, Clone)]
pub struct CrossFrameMatcher {
    params: MatcherParams,
}

impl CrossFrameMatcher {
    pub fn new(params: MatcherParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MatcherParams {
        &self.params
    }

    /// Match every keypoint of the arena against the frames after its own.
    ///
    /// The arena's frames must belong to `geometry`'s layout. The spatial
    /// index lives for the duration of the call only.
    pub fn match_keypoints(&self, arena: &KeypointArena, geometry: &SceneGeometry) -> MatchStore {
        let layout = geometry.layout();
        let index = SpatialIndex::build(arena, &layout);
        debug!(
            "Built spatial index for {} of {} frames",
            index.indexed_frames(),
            layout.total_frames()
        );

        let store: MatchStore = if self.params.parallel {
            let per_keypoint: Vec<Vec<Correspondence>> = arena
                .keypoints()
                .par_iter()
                .enumerate()
                .map(|(i, kp)| self.match_one(i, kp, arena, &index, geometry))
                .collect();
            per_keypoint.into_iter().flatten().collect()
        } else {
            arena
                .keypoints()
                .iter()
                .enumerate()
                .flat_map(|(i, kp)| self.match_one(i, kp, arena, &index, geometry))
                .collect()
        };

        info!(
            "Matched {} keypoints: {} correspondences (radius {}, max {} neighbors)",
            arena.len(),
            store.len(),
            self.params.radius,
            self.params.max_neighbors
        );
        store
    }

    fn match_one(
        &self,
        source_index: usize,
        source: &EnrichedKeypoint,
        arena: &KeypointArena,
        index: &SpatialIndex,
        geometry: &SceneGeometry,
    ) -> Vec<Correspondence> {
        let query = [source.world.x, source.world.y, source.world.z];
        let mut matches = Vec::new();

        for target_id in index.layout().frames_after(source.frame_id()) {
            let Some(frame_index) = index.get(target_id) else {
                continue;
            };
            let Some(reprojected) = geometry.reproject(source.world, target_id) else {
                continue;
            };

            for neighbor in frame_index.radius_query(query, self.params.radius, self.params.max_neighbors) {
                let target_index = frame_index.offset() + neighbor.local_index;
                let target = arena.keypoints()[target_index];
                matches.push(Correspondence {
                    source: *source,
                    target,
                    source_index,
                    target_index,
                    offset: target.pixel - reprojected,
                });
            }
        }

        matches
    }
}

impl Default for CrossFrameMatcher {
    fn default() -> Self {
        Self::new(MatcherParams::default())
    }
}
