//! Per-frame KD-trees over world-space keypoint positions

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

use crate::core::FrameId;
use crate::matching::arena::{FrameSpan, KeypointArena};
use crate::matching::layout::FrameLayout;

/// A neighbor returned by a radius query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index within the queried frame
    pub local_index: usize,
    /// Euclidean distance to the query point
    pub distance: f32,
}

/// KD-tree over the keypoints of a single frame.
///
/// Built in one pass from the frame's span. Keypoints on a plane share a
/// coordinate, so the tree must accept any number of repeated values per axis.
pub struct FrameIndex {
    tree: ImmutableKdTree<f32, u64, 3, 32>,
    offset: usize,
    len: usize,
}

impl FrameIndex {
    /// Build an index over one frame's span of the arena.
    ///
    /// Returns `None` for frames without keypoints.
    pub fn build(arena: &KeypointArena, span: &FrameSpan) -> Option<Self> {
        if span.is_empty() {
            return None;
        }

        // Items are positions in `points`, i.e. local indices within the frame
        let points: Vec<[f32; 3]> = arena.keypoints()[span.range()]
            .iter()
            .map(|kp| [kp.world.x, kp.world.y, kp.world.z])
            .collect();

        Some(Self {
            tree: ImmutableKdTree::new_from_slice(&points),
            offset: span.start,
            len: span.count,
        })
    }

    /// Arena position of the frame's first keypoint
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Up to `max_neighbors` points with distance `<= radius` from `query`,
    /// nearest first.
    pub fn radius_query(&self, query: [f32; 3], radius: f32, max_neighbors: usize) -> Vec<Neighbor> {
        if max_neighbors == 0 || radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }

        // `within` keeps hits strictly below the bound
        let bound = next_above(radius * radius);
        let mut hits = self.tree.within::<SquaredEuclidean>(&query, bound);
        hits.truncate(max_neighbors);
        hits.into_iter()
            .map(|hit| Neighbor {
                local_index: hit.item as usize,
                distance: hit.distance.sqrt(),
            })
            .collect()
    }
}

/// Smallest `f32` greater than a finite non-negative `value`.
fn next_above(value: f32) -> f32 {
    if value.is_finite() {
        f32::from_bits(value.to_bits() + 1)
    } else {
        value
    }
}

impl std::fmt::Debug for FrameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameIndex")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

/// Frame indices of a whole scene, addressed by `FrameId`.
#[derive(Debug)]
pub struct SpatialIndex {
    layout: FrameLayout,
    frames: Vec<Option<FrameIndex>>,
}

impl SpatialIndex {
    /// Build one index per non-empty frame of the arena.
    pub fn build(arena: &KeypointArena, layout: &FrameLayout) -> Self {
        let mut frames: Vec<Option<FrameIndex>> = Vec::with_capacity(layout.total_frames());
        frames.resize_with(layout.total_frames(), || None);

        for span in arena.spans() {
            if let Some(flat) = layout.flat_index(span.id) {
                frames[flat] = FrameIndex::build(arena, span);
            }
        }

        Self {
            layout: layout.clone(),
            frames,
        }
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Index of a frame, `None` for frames without keypoints
    pub fn get(&self, id: FrameId) -> Option<&FrameIndex> {
        self.layout
            .flat_index(id)
            .and_then(|flat| self.frames[flat].as_ref())
    }

    /// Number of frames that have an index
    pub fn indexed_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }
}
