//! Freight cost estimation: train a seeded random forest on shipment attributes and score
//! new shipments with the persisted model.
//!
//! Training path: [`dataset`] → [`features`] → [`training`] → [`artifact`].
//! Inference path: [`artifact`] → [`predict`].

/// Application directory helpers.
pub mod app_dirs;
/// Model persistence.
pub mod artifact;
/// Pipeline configuration.
pub mod config;
/// Delimited-file loading.
pub mod dataset;
/// Error types.
pub mod error;
/// Feature selection and cleaning.
pub mod features;
/// Tracing setup for binaries.
pub mod logging;
/// Regression models and metrics.
pub mod ml;
/// Training orchestration and progress observers.
pub mod pipeline;
/// Inference helpers.
pub mod predict;
/// Split/fit/evaluate.
pub mod training;

pub use error::{ErrorKind, PipelineError, Result};
pub use features::FeatureRow;
