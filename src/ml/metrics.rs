//! Evaluation metrics for regression models.

use ndarray::ArrayView1;

/// Coefficient of determination.
///
/// When the truth is constant the score is `1.0` for an exact prediction and `0.0` otherwise.
/// Empty inputs score `0.0`.
pub fn r2_score(truth: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let mean = truth.sum() / truth.len() as f64;
    let mut ss_res = 0.0f64;
    let mut ss_tot = 0.0f64;
    for (&t, &p) in truth.iter().zip(predicted.iter()) {
        ss_res += (t - p) * (t - p);
        ss_tot += (t - mean) * (t - mean);
    }
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn mean_absolute_error(truth: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let total: f64 = truth
        .iter()
        .zip(predicted.iter())
        .map(|(t, p)| (t - p).abs())
        .sum();
    total / truth.len() as f64
}

pub fn root_mean_squared_error(truth: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let total: f64 = truth
        .iter()
        .zip(predicted.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum();
    (total / truth.len() as f64).sqrt()
}
