use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quality::domain::quality_weights::QualityWeights;
use crate::shared::constants::{
    DEFAULT_EPS, DEFAULT_MERGE_THRESHOLD, DEFAULT_MIN_SAMPLES, DEFAULT_SIMILARITY_THRESHOLD,
    DEFAULT_THUMBNAIL_SIZE,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusteringStrategy {
    /// Density clustering followed by centroid merging.
    Dbscan,
    /// Single-link threshold grouping in input order.
    Threshold,
    /// Runs both and keeps whichever yields fewer clusters.
    Adaptive,
}

impl std::str::FromStr for ClusteringStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dbscan" => Ok(Self::Dbscan),
            "threshold" => Ok(Self::Threshold),
            "adaptive" => Ok(Self::Adaptive),
            other => Err(ConfigError::Invalid(format!(
                "strategy must be one of: dbscan, threshold, adaptive, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub strategy: ClusteringStrategy,
    pub eps: f64,
    pub min_samples: usize,
    pub merge_threshold: f64,
    pub similarity_threshold: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            strategy: ClusteringStrategy::Dbscan,
            eps: DEFAULT_EPS,
            min_samples: DEFAULT_MIN_SAMPLES,
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl ClusteringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.eps > 0.0 && self.eps <= 2.0) {
            return Err(ConfigError::Invalid(format!(
                "eps must be in (0, 2], got {}",
                self.eps
            )));
        }
        if self.min_samples == 0 {
            return Err(ConfigError::Invalid("min_samples must be at least 1".into()));
        }
        for (name, value) in [
            ("merge_threshold", self.merge_threshold),
            ("similarity_threshold", self.similarity_threshold),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between -1.0 and 1.0, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Settings for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    pub clustering: ClusteringConfig,
    pub thumbnail_size: (u32, u32),
    pub quality: QualityWeights,
    pub workers: usize,
    pub detection_timeout_secs: Option<u64>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            clustering: ClusteringConfig::default(),
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            quality: QualityWeights::default(),
            workers: 1,
            detection_timeout_secs: None,
        }
    }
}

impl GroupingConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clustering.validate()?;
        let (w, h) = self.thumbnail_size;
        if w == 0 || h == 0 {
            return Err(ConfigError::Invalid(format!(
                "thumbnail size must be non-zero, got {w}x{h}"
            )));
        }
        self.quality.validate()?;
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.detection_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "detection timeout must be at least 1 second".into(),
            ));
        }
        Ok(())
    }
}
