//! Split, fit and score a regressor on prepared data.

use ndarray::Axis;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::features::PreparedData;
use crate::ml::metrics::{mean_absolute_error, r2_score, root_mean_squared_error};
use crate::ml::split::train_test_split;
use crate::ml::{RegressionModel, Regressor};

/// Partitioning parameters for a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitOptions {
    /// Fraction of rows held out for testing.
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Goodness-of-fit on both partitions. Computed once per run and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainMetrics {
    pub train_r2: f64,
    pub test_r2: f64,
    pub train_mae: f64,
    pub test_mae: f64,
    pub train_rmse: f64,
    pub test_rmse: f64,
}

/// Fitted model plus how it scored.
#[derive(Debug, Clone)]
pub struct TrainOutcome<M> {
    pub model: M,
    pub metrics: TrainMetrics,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Split `data`, fit `regressor` on the training rows and score both partitions.
pub fn train_model<R: Regressor>(
    regressor: &R,
    data: &PreparedData,
    split: &SplitOptions,
) -> Result<TrainOutcome<R::Model>> {
    let partition = train_test_split(data.n_rows(), split.test_fraction, split.seed)?;
    let x_train = data.features.select(Axis(0), &partition.train);
    let y_train = data.target.select(Axis(0), &partition.train);
    let x_test = data.features.select(Axis(0), &partition.test);
    let y_test = data.target.select(Axis(0), &partition.test);

    let model = regressor.fit(x_train.view(), y_train.view())?;

    let train_pred = model.predict(x_train.view());
    let test_pred = model.predict(x_test.view());
    let metrics = TrainMetrics {
        train_r2: r2_score(y_train.view(), train_pred.view()),
        test_r2: r2_score(y_test.view(), test_pred.view()),
        train_mae: mean_absolute_error(y_train.view(), train_pred.view()),
        test_mae: mean_absolute_error(y_test.view(), test_pred.view()),
        train_rmse: root_mean_squared_error(y_train.view(), train_pred.view()),
        test_rmse: root_mean_squared_error(y_test.view(), test_pred.view()),
    };
    Ok(TrainOutcome {
        model,
        metrics,
        train_rows: partition.train.len(),
        test_rows: partition.test.len(),
    })
}
