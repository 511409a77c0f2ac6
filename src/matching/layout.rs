//! Frame enumeration order
//!
//! Frames are enumerated sensor-major: every frame of sensor 0, then every
//! frame of sensor 1, and so on. Each frame has a flat position in that order.

use crate::core::FrameId;

/// Number of frames per sensor and the flat enumeration built on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameLayout {
    frame_counts: Vec<usize>,
    sensor_offsets: Vec<usize>,
}

impl FrameLayout {
    pub fn new(frame_counts: Vec<usize>) -> Self {
        let mut sensor_offsets = Vec::with_capacity(frame_counts.len());
        let mut total = 0;
        for &count in &frame_counts {
            sensor_offsets.push(total);
            total += count;
        }
        Self {
            frame_counts,
            sensor_offsets,
        }
    }

    pub fn sensor_count(&self) -> usize {
        self.frame_counts.len()
    }

    /// Frames recorded by `sensor` (0 for unknown sensors)
    pub fn frame_count(&self, sensor: usize) -> usize {
        self.frame_counts.get(sensor).copied().unwrap_or(0)
    }

    pub fn total_frames(&self) -> usize {
        self.frame_counts.iter().sum()
    }

    /// Position of `id` in the enumeration, `None` if it is not part of the layout
    pub fn flat_index(&self, id: FrameId) -> Option<usize> {
        if id.frame >= self.frame_count(id.sensor) {
            return None;
        }
        Some(self.sensor_offsets[id.sensor] + id.frame)
    }

    /// Every frame, in enumeration order
    pub fn frames(&self) -> impl Iterator<Item = FrameId> + '_ {
        self.frame_counts
            .iter()
            .enumerate()
            .flat_map(|(sensor, &count)| (0..count).map(move |frame| FrameId::new(sensor, frame)))
    }

    /// Frames enumerated strictly after `id`.
    ///
    /// Starts at frame `id.frame + 1` of the same sensor, runs through the end
    /// of that sensor, then every frame of each later sensor (bounded by that
    /// sensor's own frame count). Walking `frames_after` from every frame
    /// visits each unordered frame pair exactly once and never pairs a frame
    /// with itself.
    pub fn frames_after(&self, id: FrameId) -> impl Iterator<Item = FrameId> + '_ {
        let skip = self
            .flat_index(id)
            .map(|index| index + 1)
            .unwrap_or_else(|| self.total_frames());
        self.frames().skip(skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_index() {
        let layout = FrameLayout::new(vec![3, 0, 2]);
        assert_eq!(layout.sensor_count(), 3);
        assert_eq!(layout.total_frames(), 5);
        assert_eq!(layout.flat_index(FrameId::new(0, 2)), Some(2));
        assert_eq!(layout.flat_index(FrameId::new(2, 0)), Some(3));
        assert_eq!(layout.flat_index(FrameId::new(1, 0)), None);
        assert_eq!(layout.flat_index(FrameId::new(0, 3)), None);
        assert_eq!(layout.flat_index(FrameId::new(5, 0)), None);
    }

    #[test]
    fn test_frames_order() {
        let layout = FrameLayout::new(vec![2, 1]);
        let frames: Vec<FrameId> = layout.frames().collect();
        assert_eq!(
            frames,
            vec![FrameId::new(0, 0), FrameId::new(0, 1), FrameId::new(1, 0)]
        );
    }

    #[test]
    fn test_frames_after_uses_target_sensor_counts() {
        // The second sensor has more frames than the first
        let layout = FrameLayout::new(vec![2, 4]);
        let after: Vec<FrameId> = layout.frames_after(FrameId::new(0, 1)).collect();
        assert_eq!(
            after,
            vec![
                FrameId::new(1, 0),
                FrameId::new(1, 1),
                FrameId::new(1, 2),
                FrameId::new(1, 3),
            ]
        );

        let after: Vec<FrameId> = layout.frames_after(FrameId::new(1, 2)).collect();
        assert_eq!(after, vec![FrameId::new(1, 3)]);
        assert_eq!(layout.frames_after(FrameId::new(1, 3)).count(), 0);
    }

    #[test]
    fn test_every_unordered_pair_visited_once() {
        let layout = FrameLayout::new(vec![3, 1, 0, 2]);
        let mut pairs = Vec::new();
        for a in layout.frames() {
            for b in layout.frames_after(a) {
                assert_ne!(a, b);
                pairs.push((a.min(b), a.max(b)));
            }
        }
        let n = layout.total_frames();
        assert_eq!(pairs.len(), n * (n - 1) / 2);
        pairs.sort();
        pairs.dedup();
        assert_eq!(pairs.len(), n * (n - 1) / 2);
    }

    #[test]
    fn test_unknown_frame_has_nothing_after() {
        let layout = FrameLayout::new(vec![2]);
        assert_eq!(layout.frames_after(FrameId::new(3, 0)).count(), 0);
        assert_eq!(FrameLayout::default().frames().count(), 0);
    }
}
