//! Cross-frame keypoint matching
//!
//! The pipeline runs in three phases, each fully completed before the next:
//! - [`KeypointCollector`] turns per-frame detections into a [`KeypointArena`]
//!   of world-space keypoints
//! - [`SpatialIndex`] builds one KD-tree per non-empty frame
//! - [`CrossFrameMatcher`] queries every later frame for each keypoint and
//!   fills a [`MatchStore`]

pub mod arena;
pub mod collector;
pub mod geometry;
pub mod layout;
pub mod matcher;
pub mod spatial_index;
pub mod store;

pub use arena::{FrameSpan, KeypointArena};
pub use collector::{filter_candidates, CandidateStats, KeypointCollector};
pub use geometry::{SceneGeometry, SensorGeometry};
pub use layout::FrameLayout;
pub use matcher::CrossFrameMatcher;
pub use spatial_index::{FrameIndex, Neighbor, SpatialIndex};
pub use store::{Correspondence, MatchStore, MatchSummary};
