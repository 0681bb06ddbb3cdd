//! Regression building blocks: the model capability traits, a seeded random forest,
//! deterministic splitting and goodness-of-fit metrics.

pub mod forest;
pub mod metrics;
pub mod split;

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::Result;

/// A fitted model that maps a feature row to a predicted target.
pub trait RegressionModel {
    /// Number of positional features the model was trained on.
    fn n_features(&self) -> usize;

    /// Predict a single row. Values are read positionally; extra trailing values are ignored.
    fn predict_row(&self, row: &[f64]) -> f64;

    /// Predict every row of a `[n_rows, n_features]` matrix.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.rows()
            .into_iter()
            .map(|row| match row.as_slice() {
                Some(values) => self.predict_row(values),
                None => self.predict_row(&row.to_vec()),
            })
            .collect()
    }
}

/// A learning algorithm that fits a [`RegressionModel`] from aligned features and targets.
pub trait Regressor {
    type Model: RegressionModel;

    fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<Self::Model>;
}
