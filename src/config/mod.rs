//! Configuration module for scenematch
//!
//! This module provides configuration management for all matching components.

pub mod config;
pub mod params;

pub use config::{ConfigError, ConfigLoader, MatchConfig};
pub use params::{CollectorParams, DatasetParams, DetectorParams, MatcherParams};
