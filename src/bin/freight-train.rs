//! Train the freight cost model from a shipment CSV and write the model artifact.

use std::path::PathBuf;

use freight_pricing::config::{PipelineConfig, load_config};
use freight_pricing::logging::{self, LoggingOptions};
use freight_pricing::pipeline::{NoopObserver, PipelineObserver, TracingObserver, run_training};
use freight_pricing::PipelineError;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    data: Option<PathBuf>,
    model_out: Option<PathBuf>,
    report: Option<PathBuf>,
    seed: Option<u64>,
    trees: Option<usize>,
    jobs: Option<usize>,
    log_dir: Option<PathBuf>,
    quiet: bool,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let config = resolve_config(&options)?;

    let mut tracing_observer = TracingObserver;
    let mut silent = NoopObserver;
    let observer: &mut dyn PipelineObserver = if options.quiet {
        &mut silent
    } else {
        let logging_options = LoggingOptions {
            log_dir: options.log_dir.clone(),
            ..LoggingOptions::default()
        };
        if let Err(err) = logging::init(&logging_options) {
            eprintln!("Logging disabled: {err}");
        }
        &mut tracing_observer
    };

    let report = match run_training(&config, observer) {
        Ok(report) => report,
        Err(PipelineError::NotFound { path }) => {
            return Err(format!("Error: {} not found!", path.display()));
        }
        Err(err) => return Err(err.to_string()),
    };

    if let Some(report_path) = &config.paths.report_file {
        let bytes = serde_json::to_vec_pretty(&report).map_err(|err| err.to_string())?;
        std::fs::write(report_path, bytes).map_err(|err| {
            format!("Failed to write report {}: {err}", report_path.display())
        })?;
    }

    println!("model saved as: {}", report.artifact.path.display());
    println!("train R2: {:.4}", report.metrics.train_r2);
    println!("test R2:  {:.4}", report.metrics.test_r2);
    Ok(())
}

fn resolve_config(options: &CliOptions) -> Result<PipelineConfig, String> {
    let mut config = match &options.config {
        Some(path) if !path.is_file() => {
            return Err(format!("Config file not found: {}", path.display()));
        }
        Some(path) => load_config(path).map_err(|err| err.to_string())?,
        None => PipelineConfig::default(),
    };
    if let Some(data) = &options.data {
        config.paths.data_file = data.clone();
    }
    if let Some(out) = &options.model_out {
        config.paths.model_file = out.clone();
    }
    if let Some(report) = &options.report {
        config.paths.report_file = Some(report.clone());
    }
    if let Some(seed) = options.seed {
        config.training.seed = seed;
    }
    if let Some(trees) = options.trees {
        config.training.n_trees = trees;
    }
    if let Some(jobs) = options.jobs {
        config.training.n_jobs = jobs;
    }
    Ok(config.normalized())
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => return Err(help_text()),
            "-q" | "--quiet" => options.quiet = true,
            "--config" | "--data" | "--out" | "--report" | "--log-dir" | "--seed" | "--trees"
            | "--jobs" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| format!("{flag} requires a value"))?;
                match flag {
                    "--config" => options.config = Some(PathBuf::from(value)),
                    "--data" => options.data = Some(PathBuf::from(value)),
                    "--out" => options.model_out = Some(PathBuf::from(value)),
                    "--report" => options.report = Some(PathBuf::from(value)),
                    "--log-dir" => options.log_dir = Some(PathBuf::from(value)),
                    "--seed" => options.seed = Some(parse_number(flag, value)?),
                    "--trees" => options.trees = Some(parse_number(flag, value)?),
                    _ => options.jobs = Some(parse_number(flag, value)?),
                }
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn help_text() -> String {
    [
        "freight-train",
        "",
        "Trains a seeded random forest that estimates freight cost and saves it as a binary artifact.",
        "",
        "Usage:",
        "  freight-train [--data shipping_dataset.csv] [--out freight_pricing_model.bin] [options]",
        "",
        "Options:",
        "  --config <file>   TOML config with [paths] and [training] tables.",
        "  --data <file>     Input CSV (default: shipping_dataset.csv).",
        "  --out <file>      Output model path (default: freight_pricing_model.bin).",
        "  --report <file>   Also write a JSON training report.",
        "  --seed <n>        Seed for the split and the forest (default: 42).",
        "  --trees <n>       Number of trees (default: 100).",
        "  --jobs <n>        Worker threads, 0 for all cores (default: 0).",
        "  --log-dir <dir>   Directory for run logs (default: app config dir).",
        "  -q, --quiet       Suppress progress output.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn flags_override_defaults() {
        let options = parse_args(args(&["--data", "in.csv", "--trees", "7", "-q"])).unwrap();
        let config = resolve_config(&options).unwrap();
        assert_eq!(config.paths.data_file, PathBuf::from("in.csv"));
        assert_eq!(config.training.n_trees, 7);
        assert!(options.quiet);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_args(args(&["--seed", "abc"])).is_err());
        assert!(parse_args(args(&["--out"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
    }
}
