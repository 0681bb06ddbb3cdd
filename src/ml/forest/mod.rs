//! Seeded random forest regressor.
//!
//! An ensemble of CART regression trees fitted on bootstrap resamples and averaged at
//! prediction time. Properties:
//! - Every source of randomness derives from a single `u64` seed.
//! - Trees are fitted across worker threads but collected by index, so the fitted model does
//!   not depend on the worker count.
//! - Models serialize to plain node arrays and reload with bit-identical predictions.

mod model;
mod train;

pub use model::{FOREST_MODEL_VERSION, Node, RandomForestModel, RegressionTree};
pub use train::{ForestOptions, train_random_forest};
