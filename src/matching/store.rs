//! Correspondence records and the match store

use std::collections::HashSet;

use glam::Vec2;
use serde::Serialize;

use crate::core::{EnrichedKeypoint, FrameId};

/// A match between keypoints of two different frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    /// Keypoint that issued the query
    pub source: EnrichedKeypoint,
    /// Neighbor found in the target frame
    pub target: EnrichedKeypoint,
    /// Position of `source` in the keypoint arena
    pub source_index: usize,
    /// Position of `target` in the keypoint arena
    pub target_index: usize,
    /// Target pixel minus the source's world position projected into the target frame
    pub offset: Vec2,
}

impl Correspondence {
    /// Euclidean distance between the two world positions
    pub fn world_distance(&self) -> f32 {
        self.source.world.distance(self.target.world)
    }

    /// Length of the reprojection residual in pixels
    pub fn residual_norm(&self) -> f32 {
        self.offset.length()
    }

    pub fn frame_pair(&self) -> (FrameId, FrameId) {
        (self.source.frame_id(), self.target.frame_id())
    }
}

/// Summary statistics over a match store
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchSummary {
    pub match_count: usize,
    pub frame_pair_count: usize,
    pub mean_residual: f32,
    pub max_residual: f32,
}

/// Append-only, ordered sequence of correspondences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchStore {
    matches: Vec<Correspondence>,
}

impl MatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, correspondence: Correspondence) {
        self.matches.push(correspondence);
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Correspondence> {
        self.matches.iter()
    }

    pub fn as_slice(&self) -> &[Correspondence] {
        &self.matches
    }

    /// Sort by (source sensor, source frame, source keypoint, target sensor, target frame).
    ///
    /// Arena indices follow frame enumeration order, so sorting on them is
    /// equivalent. The sort is stable; neighbors of one query keep their
    /// nearest-first order.
    pub fn sort_canonical(&mut self) {
        self.matches.sort_by_key(|m| (m.source_index, m.target.frame_id()));
    }

    pub fn summary(&self) -> MatchSummary {
        let pairs: HashSet<(FrameId, FrameId)> = self.matches.iter().map(|m| m.frame_pair()).collect();
        let (sum, max) = self
            .matches
            .iter()
            .map(|m| m.residual_norm())
            .fold((0.0f32, 0.0f32), |(sum, max), r| (sum + r, max.max(r)));

        MatchSummary {
            match_count: self.matches.len(),
            frame_pair_count: pairs.len(),
            mean_residual: if self.matches.is_empty() {
                0.0
            } else {
                sum / self.matches.len() as f32
            },
            max_residual: max,
        }
    }
}

impl Extend<Correspondence> for MatchStore {
    fn extend<I: IntoIterator<Item = Correspondence>>(&mut self, iter: I) {
        self.matches.extend(iter);
    }
}

impl FromIterator<Correspondence> for MatchStore {
    fn from_iter<I: IntoIterator<Item = Correspondence>>(iter: I) -> Self {
        Self {
            matches: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MatchStore {
    type Item = &'a Correspondence;
    type IntoIter = std::slice::Iter<'a, Correspondence>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}
