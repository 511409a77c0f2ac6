//! I/O module for scenematch
//!
//! Scene and sensor loading, plus reading and writing match files.

pub mod dataset;
pub mod match_file;
pub mod source;

pub use dataset::{load_scene, DatasetError, RgbdSequence};
pub use match_file::{load_matches, save_matches, MatchFile, MatchIoError, MatchRecord};
pub use source::{FrameSource, InMemorySensor};
