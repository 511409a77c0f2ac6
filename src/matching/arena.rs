//! Flat keypoint arena partitioned by frame

use crate::core::{EnrichedKeypoint, FrameId};

/// Contiguous run of one frame's keypoints inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpan {
    pub id: FrameId,
    /// Arena position of the frame's first keypoint
    pub start: usize,
    pub count: usize,
}

impl FrameSpan {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Every enriched keypoint of a scene, grouped by frame in enumeration order.
///
/// Frames are appended in strictly increasing `FrameId` order, so the
/// keypoints of any frame occupy a single contiguous range. Frames without
/// keypoints still get a (zero-length) span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeypointArena {
    keypoints: Vec<EnrichedKeypoint>,
    spans: Vec<FrameSpan>,
}

impl KeypointArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the keypoints of the next frame and return its span.
    pub fn push_frame(&mut self, id: FrameId, keypoints: Vec<EnrichedKeypoint>) -> FrameSpan {
        debug_assert!(
            self.spans.last().map(|s| s.id < id).unwrap_or(true),
            "frames must be pushed in enumeration order"
        );
        debug_assert!(keypoints.iter().all(|kp| kp.frame_id() == id));

        let span = FrameSpan {
            id,
            start: self.keypoints.len(),
            count: keypoints.len(),
        };
        self.keypoints.extend(keypoints);
        self.spans.push(span);
        span
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn keypoints(&self) -> &[EnrichedKeypoint] {
        &self.keypoints
    }

    pub fn get(&self, index: usize) -> Option<&EnrichedKeypoint> {
        self.keypoints.get(index)
    }

    pub fn spans(&self) -> &[FrameSpan] {
        &self.spans
    }

    pub fn span(&self, id: FrameId) -> Option<&FrameSpan> {
        self.spans
            .binary_search_by(|s| s.id.cmp(&id))
            .ok()
            .map(|i| &self.spans[i])
    }

    /// Keypoints of one frame (empty for unknown frames)
    pub fn frame_keypoints(&self, id: FrameId) -> &[EnrichedKeypoint] {
        self.span(id)
            .map(|s| &self.keypoints[s.range()])
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    fn keypoints(sensor: usize, frame: usize, n: usize) -> Vec<EnrichedKeypoint> {
        (0..n)
            .map(|i| EnrichedKeypoint {
                sensor,
                frame,
                pixel: Vec2::new(i as f32, 0.0),
                depth: 1.0,
                world: Vec3::new(i as f32, 0.0, 1.0),
                size: 1.0,
                response: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_spans_are_contiguous() {
        let mut arena = KeypointArena::new();
        let a = arena.push_frame(FrameId::new(0, 0), keypoints(0, 0, 3));
        let b = arena.push_frame(FrameId::new(0, 1), Vec::new());
        let c = arena.push_frame(FrameId::new(1, 0), keypoints(1, 0, 2));

        assert_eq!(a.range(), 0..3);
        assert!(b.is_empty());
        assert_eq!(b.start, 3);
        assert_eq!(c.range(), 3..5);
        assert_eq!(arena.len(), 5);
        assert_eq!(arena.spans().len(), 3);
    }

    #[test]
    fn test_frame_keypoints_lookup() {
        let mut arena = KeypointArena::new();
        arena.push_frame(FrameId::new(0, 0), keypoints(0, 0, 1));
        arena.push_frame(FrameId::new(2, 4), keypoints(2, 4, 2));

        let kps = arena.frame_keypoints(FrameId::new(2, 4));
        assert_eq!(kps.len(), 2);
        assert!(kps.iter().all(|kp| kp.sensor == 2 && kp.frame == 4));
        assert!(arena.frame_keypoints(FrameId::new(1, 0)).is_empty());
        assert_eq!(arena.span(FrameId::new(2, 4)).map(|s| s.start), Some(1));
    }

    #[test]
    fn test_empty_arena() {
        let arena = KeypointArena::new();
        assert!(arena.is_empty());
        assert!(arena.get(0).is_none());
        assert!(arena.span(FrameId::new(0, 0)).is_none());
    }
}
