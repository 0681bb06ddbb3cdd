//! Training pipeline orchestration with pluggable progress reporting.
//!
//! Pipeline stages return structured results; progress is published as [`PipelineEvent`]s to
//! an observer instead of being printed, so automated runs can stay silent.

use std::path::PathBuf;

use ndarray::{ArrayView1, ArrayView2};
use serde::Serialize;
use tracing::{info, warn};

use crate::artifact::{ArtifactInfo, save_model};
use crate::config::PipelineConfig;
use crate::dataset::{LoadSummary, load_dataset};
use crate::error::{PipelineError, Result};
use crate::features::{
    CleaningReport, ColumnCleaning, FEATURE_COLUMNS, TARGET_COLUMN, prepare_features,
};
use crate::ml::Regressor;
use crate::ml::forest::{ForestOptions, RandomForestModel, train_random_forest};
use crate::training::{TrainMetrics, TrainOutcome, train_model};

/// Progress notifications emitted by [`run_training`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    DatasetLoaded { path: PathBuf, summary: LoadSummary },
    FeaturesSelected { features: Vec<String>, target: String },
    /// Feature columns that had missing cells before imputation.
    MissingValues { columns: Vec<(String, usize)> },
    /// Feature columns that had infinite cells.
    InfiniteValues { columns: Vec<(String, usize)> },
    Cleaned(CleaningReport),
    SplitReady { train_rows: usize, test_rows: usize },
    TrainingStarted { n_trees: usize },
    Trained(TrainMetrics),
    ModelSaved(ArtifactInfo),
}

/// Receives pipeline progress.
pub trait PipelineObserver {
    fn on_event(&mut self, event: &PipelineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&mut self, _event: &PipelineEvent) {}
}

/// Collects events, mostly for tests.
impl PipelineObserver for Vec<PipelineEvent> {
    fn on_event(&mut self, event: &PipelineEvent) {
        self.push(event.clone());
    }
}

/// Renders events as human-readable `tracing` lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::DatasetLoaded { path, summary } => info!(
                "Dataset loaded from {}: {} rows, {} columns",
                path.display(),
                summary.rows,
                summary.columns
            ),
            PipelineEvent::FeaturesSelected { features, target } => {
                info!("Preparing features: {}", features.join(", "));
                info!("Target variable: {target}");
            }
            PipelineEvent::MissingValues { columns } => {
                for (column, count) in columns {
                    info!("Missing values in {column}: {count} (filled with median)");
                }
            }
            PipelineEvent::InfiniteValues { columns } => {
                for (column, count) in columns {
                    info!("Infinite values in {column}: {count} (replaced with median)");
                }
            }
            PipelineEvent::Cleaned(report) => {
                if report.total_missing() + report.total_infinite() > 0 {
                    warn!(
                        "Imputation medians were computed on all {} rows, including rows later held out for testing",
                        report.initial_rows
                    );
                }
                info!(
                    "After cleaning: {} rows ({} dropped for invalid {TARGET_COLUMN})",
                    report.final_rows, report.dropped_rows
                );
                if let Some(stats) = &report.target {
                    info!(
                        "Target statistics: mean={:.2} std={:.2} min={:.2} max={:.2}",
                        stats.mean, stats.std, stats.min, stats.max
                    );
                }
            }
            PipelineEvent::SplitReady {
                train_rows,
                test_rows,
            } => info!("Training set: {train_rows} samples, test set: {test_rows} samples"),
            PipelineEvent::TrainingStarted { n_trees } => {
                info!("Training random forest regressor with {n_trees} trees...")
            }
            PipelineEvent::Trained(metrics) => info!(
                "Train R2={:.4} Test R2={:.4} Test MAE={:.2} Test RMSE={:.2}",
                metrics.train_r2, metrics.test_r2, metrics.test_mae, metrics.test_rmse
            ),
            PipelineEvent::ModelSaved(artifact) => info!(
                "Model saved to {} ({:.2} MB)",
                artifact.path.display(),
                artifact.megabytes()
            ),
        }
    }
}

/// Structured outcome of a full training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub dataset: LoadSummary,
    pub cleaning: CleaningReport,
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics: TrainMetrics,
    pub artifact: ArtifactInfo,
}

/// Load, clean, train and persist according to `config`.
///
/// Fails with [`PipelineError::NotFound`] before touching the model path when the dataset is
/// absent.
pub fn run_training(
    config: &PipelineConfig,
    observer: &mut dyn PipelineObserver,
) -> Result<TrainingReport> {
    let data_path = &config.paths.data_file;
    if !data_path.exists() {
        return Err(PipelineError::NotFound {
            path: data_path.clone(),
        });
    }

    let dataset = load_dataset(data_path)?;
    let summary = dataset.summary();
    observer.on_event(&PipelineEvent::DatasetLoaded {
        path: data_path.clone(),
        summary,
    });
    observer.on_event(&PipelineEvent::FeaturesSelected {
        features: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        target: TARGET_COLUMN.to_string(),
    });

    let prepared = prepare_features(&dataset)?;
    let report = &prepared.report;
    let missing = affected_columns(&report.columns, |c| c.missing);
    if !missing.is_empty() {
        observer.on_event(&PipelineEvent::MissingValues { columns: missing });
    }
    let infinite = affected_columns(&report.columns, |c| c.infinite);
    if !infinite.is_empty() {
        observer.on_event(&PipelineEvent::InfiniteValues { columns: infinite });
    }
    observer.on_event(&PipelineEvent::Cleaned(report.clone()));

    let forest = NamedForest(config.training.forest_options());
    observer.on_event(&PipelineEvent::TrainingStarted {
        n_trees: forest.0.n_trees,
    });
    let TrainOutcome {
        model,
        metrics,
        train_rows,
        test_rows,
    } = train_model(&forest, &prepared, &config.training.split_options())?;
    observer.on_event(&PipelineEvent::SplitReady {
        train_rows,
        test_rows,
    });
    observer.on_event(&PipelineEvent::Trained(metrics));

    let artifact = save_model(&model, &config.paths.model_file)?;
    observer.on_event(&PipelineEvent::ModelSaved(artifact.clone()));

    Ok(TrainingReport {
        dataset: summary,
        cleaning: prepared.report,
        train_rows,
        test_rows,
        metrics,
        artifact,
    })
}

/// Forest regressor that records the freight column names in the fitted model.
struct NamedForest(ForestOptions);

impl Regressor for NamedForest {
    type Model = RandomForestModel;

    fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<RandomForestModel> {
        let names = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        train_random_forest(x, y, names, &self.0)
    }
}

fn affected_columns(
    columns: &[ColumnCleaning],
    count: impl Fn(&ColumnCleaning) -> usize,
) -> Vec<(String, usize)> {
    columns
        .iter()
        .filter(|c| count(c) > 0)
        .map(|c| (c.column.clone(), count(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use tempfile::tempdir;

    #[test]
    fn missing_dataset_stops_before_writing_model() {
        let dir = tempdir().unwrap();
        let config = PipelineConfig {
            paths: PathsConfig {
                data_file: dir.path().join("shipping_dataset.csv"),
                model_file: dir.path().join("model.bin"),
                report_file: None,
            },
            ..PipelineConfig::default()
        };
        let mut events: Vec<PipelineEvent> = Vec::new();
        let err = run_training(&config, &mut events).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
        assert!(events.is_empty());
        assert!(!config.paths.model_file.exists());
    }

    #[test]
    fn affected_columns_skips_clean_ones() {
        let columns = vec![
            ColumnCleaning {
                column: "a".into(),
                missing: 0,
                infinite: 2,
                missing_fill: None,
                infinite_fill: Some(1.0),
            },
            ColumnCleaning {
                column: "b".into(),
                missing: 3,
                infinite: 0,
                missing_fill: Some(4.0),
                infinite_fill: None,
            },
        ];
        assert_eq!(affected_columns(&columns, |c| c.missing), vec![("b".to_string(), 3)]);
        assert_eq!(affected_columns(&columns, |c| c.infinite), vec![("a".to_string(), 2)]);
    }
}
