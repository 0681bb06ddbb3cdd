//! Score new shipments with a persisted model.

use std::path::Path;

use crate::artifact::{ModelArtifact, load_model};
use crate::error::{PipelineError, Result};
use crate::features::{FEATURE_COUNT, FeatureRow};
use crate::ml::RegressionModel;
use crate::ml::forest::RandomForestModel;

/// A loaded model ready to score any number of rows.
#[derive(Debug, Clone)]
pub struct FreightPredictor<M = RandomForestModel> {
    model: M,
}

impl<M: ModelArtifact> FreightPredictor<M> {
    /// Load the model at `path`, rejecting models trained on a different feature layout.
    pub fn open(path: &Path) -> Result<Self> {
        let model: M = load_model(path)?;
        if model.n_features() != FEATURE_COUNT {
            return Err(PipelineError::serialization(
                path,
                format!(
                    "model expects {} features, freight rows have {FEATURE_COUNT}",
                    model.n_features()
                ),
            ));
        }
        Ok(Self { model })
    }
}

impl<M: RegressionModel> FreightPredictor<M> {
    pub fn from_model(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Inputs are not range-checked; a negative weight is scored like any other value.
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        self.model.predict_row(&row.to_array())
    }

    pub fn predict_many(&self, rows: &[FeatureRow]) -> Vec<f64> {
        rows.iter().map(|row| self.predict(row)).collect()
    }
}

/// Load the model at `model_path` and score one shipment.
pub fn predict_freight(row: &FeatureRow, model_path: &Path) -> Result<f64> {
    let predictor = FreightPredictor::<RandomForestModel>::open(model_path)?;
    Ok(predictor.predict(row))
}
