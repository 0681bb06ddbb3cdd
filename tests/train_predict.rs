mod support;

use freight_pricing::artifact::load_model;
use freight_pricing::config::{PathsConfig, PipelineConfig, TrainingConfig};
use freight_pricing::ml::RegressionModel;
use freight_pricing::ml::forest::RandomForestModel;
use freight_pricing::pipeline::{NoopObserver, PipelineEvent, run_training};
use freight_pricing::predict::{FreightPredictor, predict_freight};
use freight_pricing::{ErrorKind, FeatureRow};
use support::shipments::{freight_range, shipments_csv, write_csv};
use tempfile::tempdir;

const ROWS: usize = 200;

fn example_row() -> FeatureRow {
    FeatureRow {
        customer_zip_code_prefix: 28013.0,
        product_weight_g: 650.0,
        product_length_cm: 28.0,
        product_height_cm: 9.0,
        product_width_cm: 14.0,
        seller_zip_code_prefix: 27277.0,
    }
}

fn config_for(dir: &std::path::Path, data_name: &str, model_name: &str) -> PipelineConfig {
    PipelineConfig {
        paths: PathsConfig {
            data_file: dir.join(data_name),
            model_file: dir.join(model_name),
            report_file: None,
        },
        training: TrainingConfig {
            n_trees: 20,
            ..TrainingConfig::default()
        },
    }
}

#[test]
fn trained_model_predicts_within_target_range() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "shipping_dataset.csv", &shipments_csv(ROWS));
    let config = config_for(dir.path(), "shipping_dataset.csv", "model.bin");

    let mut events: Vec<PipelineEvent> = Vec::new();
    let report = run_training(&config, &mut events).unwrap();
    assert_eq!(report.dataset.rows, ROWS);
    assert_eq!(report.dataset.columns, 8);
    assert_eq!(report.train_rows, 160);
    assert_eq!(report.test_rows, 40);
    assert!(report.metrics.train_r2 > 0.5, "{:?}", report.metrics);
    assert!(matches!(events.first(), Some(PipelineEvent::DatasetLoaded { .. })));
    assert!(matches!(events.last(), Some(PipelineEvent::ModelSaved(_))));

    let predicted = predict_freight(&example_row(), &config.paths.model_file).unwrap();
    let (lo, hi) = freight_range(ROWS);
    assert!(predicted >= lo && predicted <= hi, "{predicted} outside [{lo}, {hi}]");
}

#[test]
fn retraining_with_same_seed_is_bit_identical() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "data.csv", &shipments_csv(ROWS));
    let first = config_for(dir.path(), "data.csv", "a.bin");
    let second = config_for(dir.path(), "data.csv", "b.bin");
    run_training(&first, &mut NoopObserver).unwrap();
    run_training(&second, &mut NoopObserver).unwrap();

    let a: RandomForestModel = load_model(&first.paths.model_file).unwrap();
    let b: RandomForestModel = load_model(&second.paths.model_file).unwrap();
    let row = example_row().to_array();
    assert_eq!(a.predict_row(&row).to_bits(), b.predict_row(&row).to_bits());
    assert_eq!(
        std::fs::read(&first.paths.model_file).unwrap(),
        std::fs::read(&second.paths.model_file).unwrap()
    );
}

#[test]
fn dirty_rows_are_cleaned_before_training() {
    let dir = tempdir().unwrap();
    let mut csv = shipments_csv(50);
    csv.push_str("bad1,28013,,28,9,14,27277,15.0\n");
    csv.push_str("bad2,28013,inf,28,9,14,27277,16.0\n");
    csv.push_str("bad3,28013,650,28,9,14,27277,\n");
    csv.push_str("bad4,28013,650,28,9,14,27277,-inf\n");
    write_csv(dir.path(), "data.csv", &csv);
    let config = config_for(dir.path(), "data.csv", "model.bin");

    let mut events: Vec<PipelineEvent> = Vec::new();
    let report = run_training(&config, &mut events).unwrap();
    assert_eq!(report.cleaning.initial_rows, 54);
    assert_eq!(report.cleaning.dropped_rows, 2);
    assert_eq!(report.cleaning.final_rows, 52);
    assert_eq!(report.cleaning.columns[1].missing, 1);
    assert_eq!(report.cleaning.columns[1].infinite, 1);
    assert!(events.iter().any(|e| matches!(e, PipelineEvent::MissingValues { .. })));
    assert!(events.iter().any(|e| matches!(e, PipelineEvent::InfiniteValues { .. })));
}

#[test]
fn missing_column_is_schema_error() {
    let dir = tempdir().unwrap();
    write_csv(
        dir.path(),
        "data.csv",
        "customer_zip_code_prefix,product_weight_g,freight_value\n1,2,3\n",
    );
    let config = config_for(dir.path(), "data.csv", "model.bin");
    let err = run_training(&config, &mut NoopObserver).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(!config.paths.model_file.exists());
}

#[test]
fn predictor_reuses_loaded_model() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "data.csv", &shipments_csv(60));
    let config = config_for(dir.path(), "data.csv", "model.bin");
    run_training(&config, &mut NoopObserver).unwrap();

    let predictor = FreightPredictor::<RandomForestModel>::open(&config.paths.model_file).unwrap();
    let heavy = FeatureRow {
        product_weight_g: -10.0,
        ..example_row()
    };
    let scores = predictor.predict_many(&[example_row(), heavy]);
    assert_eq!(scores.len(), 2);
    assert!(scores.iter().all(|s| s.is_finite()));
    assert_eq!(
        scores[0].to_bits(),
        predict_freight(&example_row(), &config.paths.model_file).unwrap().to_bits()
    );
    assert_eq!(predictor.model().feature_names[1], "product_weight_g");
}

#[test]
fn loading_absent_model_is_not_found() {
    let dir = tempdir().unwrap();
    let err = predict_freight(&example_row(), &dir.path().join("missing.bin")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
