//! Main configuration structures for scenematch

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::params::*;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Failed to serialize TOML: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Matching pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Keypoint detector parameters
    pub detector: DetectorParams,
    /// Keypoint collection parameters
    pub collector: CollectorParams,
    /// Cross-frame matcher parameters
    pub matcher: MatcherParams,
    /// Dataset parameters
    pub dataset: DatasetParams,
}

/// Configuration loader supporting YAML and TOML
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file, choosing the format by extension.
    pub fn load<T, P>(path: P) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let extension = path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "yaml" | "yml" => Self::load_yaml(path),
            "toml" => Self::load_toml(path),
            _ => Err(ConfigError::UnsupportedFormat(extension.to_string())),
        }
    }

    /// Load configuration from YAML file
    pub fn load_yaml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_toml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn save_yaml<T: Serialize, P: AsRef<Path>>(config: &T, path: P) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save configuration to TOML file
    pub fn save_toml<T: Serialize, P: AsRef<Path>>(config: &T, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string(config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl MatchConfig {
    /// Configuration for ScanNet captures: 30 Hz streams with millimeter
    /// depth, subsampled to every 10th frame.
    pub fn scannet() -> Self {
        Self {
            dataset: DatasetParams {
                depth_scale: 1000.0,
                stride: 10,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Configuration for TUM RGB-D sequences (depth stored at 5000 units per meter).
    pub fn tum_rgbd() -> Self {
        Self {
            dataset: DatasetParams {
                depth_scale: 5000.0,
                max_time_difference: 0.02,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::Builder;

    #[test]
    fn test_config_default() {
        let config = MatchConfig::default();
        assert_eq!(config.matcher.radius, 0.02);
        assert_eq!(config.collector.padding, 50);
    }

    #[test]
    fn test_config_tum() {
        let config = MatchConfig::tum_rgbd();
        assert_eq!(config.dataset.depth_scale, 5000.0);
    }

    #[test]
    fn test_config_scannet_subsamples() {
        let config = MatchConfig::scannet();
        assert_eq!(config.dataset.stride, 10);
        assert_eq!(config.dataset.depth_scale, 1000.0);
        assert_ne!(config, MatchConfig::default());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "matcher:\n  radius: 0.05\n";
        let loaded: MatchConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(loaded.matcher.radius, 0.05);
        assert_eq!(loaded.matcher.max_neighbors, 5);
        assert_eq!(loaded.detector.max_keypoints, 512);
    }

    #[test]
    fn test_save_load_yaml() {
        let mut config = MatchConfig::scannet();
        config.matcher.max_neighbors = 3;
        let temp_file = Builder::new().suffix(".yaml").tempfile().unwrap();

        ConfigLoader::save_yaml(&config, temp_file.path()).unwrap();
        let loaded: MatchConfig = ConfigLoader::load(temp_file.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_load_toml() {
        let mut config = MatchConfig::tum_rgbd();
        config.collector.padding = 20;
        let temp_file = Builder::new().suffix(".toml").tempfile().unwrap();

        ConfigLoader::save_toml(&config, temp_file.path()).unwrap();
        let loaded: MatchConfig = ConfigLoader::load(temp_file.path()).unwrap();

        assert_eq!(loaded.collector.padding, 20);
        assert_eq!(loaded.dataset.depth_scale, config.dataset.depth_scale);
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_file = Builder::new().suffix(".ini").tempfile().unwrap();
        let err = ConfigLoader::load::<MatchConfig, _>(temp_file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "ini"));
    }
}
