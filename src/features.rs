//! Feature selection and cleaning for the freight model.
//!
//! Feature columns are imputed with per-column medians while rows whose target is missing or
//! infinite are dropped outright. Medians are computed over the whole dataset, before the
//! train/test split exists, so held-out rows influence the fill values.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::dataset::{Column, Dataset};
use crate::error::{PipelineError, Result};

/// Number of scalars in a [`FeatureRow`].
pub const FEATURE_COUNT: usize = 6;

/// Feature column names in the positional order the model is trained on.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "customer_zip_code_prefix",
    "product_weight_g",
    "product_length_cm",
    "product_height_cm",
    "product_width_cm",
    "seller_zip_code_prefix",
];

/// Freight cost label column.
pub const TARGET_COLUMN: &str = "freight_value";

/// Inputs for a single shipment, in training units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub customer_zip_code_prefix: f64,
    /// Grams.
    pub product_weight_g: f64,
    /// Centimeters.
    pub product_length_cm: f64,
    pub product_height_cm: f64,
    pub product_width_cm: f64,
    pub seller_zip_code_prefix: f64,
}

impl FeatureRow {
    /// Values ordered as [`FEATURE_COLUMNS`].
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.customer_zip_code_prefix,
            self.product_weight_g,
            self.product_length_cm,
            self.product_height_cm,
            self.product_width_cm,
            self.seller_zip_code_prefix,
        ]
    }
}

/// What cleaning did to one feature column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnCleaning {
    pub column: String,
    /// Missing cells found before any imputation.
    pub missing: usize,
    /// Infinite cells found after the missing-value fill.
    pub infinite: usize,
    /// Median used for the missing-value fill, if one was needed.
    pub missing_fill: Option<f64>,
    /// Median used after infinities were turned into missing values, if one was needed.
    pub infinite_fill: Option<f64>,
}

/// Summary statistics of the retained target values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetStats {
    pub mean: f64,
    /// Sample standard deviation (`n - 1` denominator); zero for fewer than two rows.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningReport {
    pub initial_rows: usize,
    pub columns: Vec<ColumnCleaning>,
    /// Rows removed because the target was missing or infinite.
    pub dropped_rows: usize,
    pub final_rows: usize,
    pub target: Option<TargetStats>,
}

impl CleaningReport {
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing).sum()
    }

    pub fn total_infinite(&self) -> usize {
        self.columns.iter().map(|c| c.infinite).sum()
    }
}

/// Aligned feature matrix and target vector ready for training.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Shape `[n_rows, FEATURE_COUNT]`.
    pub features: Array2<f64>,
    pub target: Array1<f64>,
    pub report: CleaningReport,
}

impl PreparedData {
    pub fn n_rows(&self) -> usize {
        self.target.len()
    }
}

/// Select the feature and target columns and clean them.
pub fn prepare_features(dataset: &Dataset) -> Result<PreparedData> {
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(FEATURE_COUNT);
    for name in FEATURE_COLUMNS {
        columns.push(numeric_column(dataset, name)?.to_vec());
    }
    let target = numeric_column(dataset, TARGET_COLUMN)?;

    let mut cleaning = Vec::with_capacity(FEATURE_COUNT);
    for (name, values) in FEATURE_COLUMNS.iter().zip(columns.iter_mut()) {
        cleaning.push(clean_column(name, values)?);
    }

    let kept: Vec<usize> = (0..target.len())
        .filter(|&idx| target[idx].is_finite())
        .collect();
    let features = Array2::from_shape_fn((kept.len(), FEATURE_COUNT), |(row, col)| {
        columns[col][kept[row]]
    });
    let target: Array1<f64> = kept.iter().map(|&idx| target[idx]).collect();

    let report = CleaningReport {
        initial_rows: dataset.n_rows(),
        columns: cleaning,
        dropped_rows: dataset.n_rows() - kept.len(),
        final_rows: kept.len(),
        target: target_stats(target.as_slice().unwrap_or(&[])),
    };
    Ok(PreparedData {
        features,
        target,
        report,
    })
}

fn numeric_column<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a [f64]> {
    match dataset.column(name) {
        Some(Column::Numeric(values)) => Ok(values),
        Some(Column::Text(_)) => Err(PipelineError::Fit(format!(
            "column `{name}` contains non-numeric values"
        ))),
        None => Err(PipelineError::Schema {
            column: name.to_string(),
        }),
    }
}

/// Median-fill missing values, then treat infinities as missing and fill again.
fn clean_column(name: &str, values: &mut [f64]) -> Result<ColumnCleaning> {
    let missing = values.iter().filter(|v| v.is_nan()).count();
    let mut missing_fill = None;
    if missing > 0 {
        // Infinities still count as observed values at this stage.
        if let Some(fill) = median(values.iter().copied().filter(|v| !v.is_nan())) {
            fill_missing(values, fill);
            missing_fill = Some(fill);
        }
    }

    let infinite = values.iter().filter(|v| v.is_infinite()).count();
    for value in values.iter_mut().filter(|v| v.is_infinite()) {
        *value = f64::NAN;
    }
    let mut infinite_fill = None;
    if values.iter().any(|v| v.is_nan()) {
        let fill = median(values.iter().copied().filter(|v| !v.is_nan())).ok_or_else(|| {
            PipelineError::Fit(format!("column `{name}` has no finite values to impute from"))
        })?;
        fill_missing(values, fill);
        infinite_fill = Some(fill);
    }

    Ok(ColumnCleaning {
        column: name.to_string(),
        missing,
        infinite,
        missing_fill,
        infinite_fill,
    })
}

fn fill_missing(values: &mut [f64], fill: f64) {
    for value in values.iter_mut().filter(|v| v.is_nan()) {
        *value = fill;
    }
}

fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n % 2 == 0 {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    } else {
        Some(sorted[n / 2])
    }
}

fn target_stats(values: &[f64]) -> Option<TargetStats> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if values.len() < 2 {
        0.0
    } else {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(TargetStats {
        mean,
        std,
        min,
        max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset_with(weight: Vec<f64>, target: Vec<f64>) -> Dataset {
        let n = weight.len();
        let mut named: Vec<(String, Column)> = FEATURE_COLUMNS
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let values = if *name == "product_weight_g" {
                    weight.clone()
                } else {
                    (0..n).map(|i| (i * 10 + j) as f64).collect()
                };
                (name.to_string(), Column::Numeric(values))
            })
            .collect();
        named.push((TARGET_COLUMN.to_string(), Column::Numeric(target)));
        Dataset::from_columns(named).unwrap()
    }

    fn weight_column(prepared: &PreparedData) -> Vec<f64> {
        prepared.features.column(1).to_vec()
    }

    #[test]
    fn clean_data_passes_through_unchanged() {
        let dataset = dataset_with(vec![100.0, 200.0, 300.0], vec![1.0, 2.0, 3.0]);
        let prepared = prepare_features(&dataset).unwrap();
        assert_eq!(weight_column(&prepared), vec![100.0, 200.0, 300.0]);
        assert_eq!(prepared.features[[2, 0]], 20.0);
        assert_eq!(prepared.report.dropped_rows, 0);
        assert_eq!(prepared.report.total_missing(), 0);
        assert_eq!(prepared.report.total_infinite(), 0);
    }

    #[test]
    fn missing_feature_filled_with_median() {
        let dataset = dataset_with(vec![1.0, f64::NAN, 3.0], vec![1.0, 2.0, 3.0]);
        let prepared = prepare_features(&dataset).unwrap();
        assert_eq!(weight_column(&prepared), vec![1.0, 2.0, 3.0]);
        assert_eq!(prepared.report.columns[1].missing, 1);
        assert_eq!(prepared.report.columns[1].missing_fill, Some(2.0));
    }

    #[test]
    fn infinite_feature_treated_as_missing() {
        let dataset = dataset_with(vec![1.0, f64::INFINITY, 3.0], vec![1.0, 2.0, 3.0]);
        let prepared = prepare_features(&dataset).unwrap();
        assert_eq!(weight_column(&prepared), vec![1.0, 2.0, 3.0]);
        assert_eq!(prepared.report.columns[1].infinite, 1);
        assert_eq!(prepared.report.columns[1].infinite_fill, Some(2.0));
    }

    #[test]
    fn missing_median_counts_infinities_before_they_are_replaced() {
        let dataset = dataset_with(
            vec![1.0, f64::NAN, f64::INFINITY, 3.0],
            vec![1.0, 2.0, 3.0, 4.0],
        );
        let prepared = prepare_features(&dataset).unwrap();
        // First pass median of {1, 3, inf} is 3; the infinity is then filled from {1, 3, 3}.
        assert_eq!(weight_column(&prepared), vec![1.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn rows_with_bad_target_are_dropped_together() {
        let dataset = dataset_with(
            vec![10.0, 20.0, 30.0, 40.0],
            vec![5.0, f64::NAN, f64::NEG_INFINITY, 8.0],
        );
        let prepared = prepare_features(&dataset).unwrap();
        assert_eq!(prepared.features.nrows(), prepared.target.len());
        assert_eq!(prepared.target.to_vec(), vec![5.0, 8.0]);
        assert_eq!(weight_column(&prepared), vec![10.0, 40.0]);
        assert_eq!(prepared.report.dropped_rows, 2);
        let stats = prepared.report.target.unwrap();
        assert_eq!(stats.min, 5.0);
        assert_eq!(stats.max, 8.0);
        assert_eq!(stats.mean, 6.5);
    }

    #[test]
    fn absent_column_is_schema_error() {
        let dataset = Dataset::from_columns(vec![(
            "customer_zip_code_prefix".to_string(),
            Column::Numeric(vec![1.0]),
        )])
        .unwrap();
        let err = prepare_features(&dataset).unwrap_err();
        match err {
            PipelineError::Schema { column } => assert_eq!(column, "product_weight_g"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn text_column_is_fit_error() {
        let mut named: Vec<(String, Column)> = FEATURE_COLUMNS
            .iter()
            .map(|name| (name.to_string(), Column::Numeric(vec![1.0])))
            .collect();
        named.push((TARGET_COLUMN.to_string(), Column::Text(vec!["cheap".into()])));
        let dataset = Dataset::from_columns(named).unwrap();
        let err = prepare_features(&dataset).unwrap_err();
        assert!(matches!(err, PipelineError::Fit(_)));
    }

    #[test]
    fn all_missing_column_cannot_be_imputed() {
        let dataset = dataset_with(vec![f64::NAN, f64::NAN], vec![1.0, 2.0]);
        assert!(matches!(
            prepare_features(&dataset).unwrap_err(),
            PipelineError::Fit(_)
        ));
    }

    #[test]
    fn feature_row_order_matches_columns() {
        let row = FeatureRow {
            customer_zip_code_prefix: 28013.0,
            product_weight_g: 650.0,
            product_length_cm: 28.0,
            product_height_cm: 9.0,
            product_width_cm: 14.0,
            seller_zip_code_prefix: 27277.0,
        };
        assert_eq!(row.to_array(), [28013.0, 650.0, 28.0, 9.0, 14.0, 27277.0]);
    }
}
