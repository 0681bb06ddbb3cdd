//! Pipeline configuration loaded from an optional TOML file.
//!
//! Every path the pipeline touches lives here and is passed explicitly into the entry points,
//! so tests can point a run at temporary files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ml::forest::ForestOptions;
use crate::training::SplitOptions;

/// Errors that may occur while loading pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration file layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Input dataset (CSV with a header row).
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Output model artifact.
    #[serde(default = "default_model_file")]
    pub model_file: PathBuf,
    /// Optional JSON training report.
    #[serde(default)]
    pub report_file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            model_file: default_model_file(),
            report_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    /// `0` removes the depth limit.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// `0` uses every available core.
    #[serde(default)]
    pub n_jobs: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            test_fraction: default_test_fraction(),
            n_trees: default_n_trees(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            n_jobs: 0,
        }
    }
}

impl TrainingConfig {
    /// Clamp values into ranges the trainer accepts.
    pub fn normalized(mut self) -> Self {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            self.test_fraction = default_test_fraction();
        }
        self.n_trees = self.n_trees.max(1);
        self.min_samples_split = self.min_samples_split.max(2);
        self.min_samples_leaf = self.min_samples_leaf.max(1);
        self
    }

    pub fn forest_options(&self) -> ForestOptions {
        ForestOptions {
            n_trees: self.n_trees,
            max_depth: (self.max_depth > 0).then_some(self.max_depth),
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: None,
            bootstrap: true,
            seed: self.seed,
            n_jobs: (self.n_jobs > 0).then_some(self.n_jobs),
        }
    }

    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            test_fraction: self.test_fraction,
            seed: self.seed,
        }
    }
}

impl PipelineConfig {
    pub fn normalized(mut self) -> Self {
        self.training = self.training.normalized();
        self
    }
}

/// Load configuration from `path`, returning defaults if the file is missing.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    if !path.exists() {
        return Ok(PipelineConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: PipelineConfig = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config.normalized())
}

fn default_data_file() -> PathBuf {
    PathBuf::from("shipping_dataset.csv")
}

fn default_model_file() -> PathBuf {
    PathBuf::from("freight_pricing_model.bin")
}

fn default_seed() -> u64 {
    42
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_n_trees() -> usize {
    100
}

fn default_max_depth() -> usize {
    20
}

fn default_min_samples_split() -> usize {
    5
}

fn default_min_samples_leaf() -> usize {
    2
}
