//! Tabular dataset loading.

pub mod loader;

pub use loader::{Column, Dataset, LoadSummary, load_dataset};
