use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::model::{FOREST_MODEL_VERSION, Node, RandomForestModel, RegressionTree};
use crate::error::{PipelineError, Result};
use crate::ml::Regressor;

/// Training hyperparameters for the random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestOptions {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth; `None` grows until the other limits stop it.
    pub max_depth: Option<usize>,
    /// Minimum samples required to split an internal node.
    pub min_samples_split: usize,
    /// Minimum samples required on each side of a split.
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` considers all of them in a random order.
    pub max_features: Option<usize>,
    /// Fit each tree on a bootstrap resample of the rows.
    pub bootstrap: bool,
    /// Seed for bootstrap sampling and feature ordering.
    pub seed: u64,
    /// Worker threads; `None` uses every available core.
    pub n_jobs: Option<usize>,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: Some(20),
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
            n_jobs: None,
        }
    }
}

impl ForestOptions {
    fn worker_count(&self) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let requested = match self.n_jobs {
            Some(jobs) if jobs > 0 => jobs,
            _ => available,
        };
        requested.min(self.n_trees).max(1)
    }
}

impl Regressor for ForestOptions {
    type Model = RandomForestModel;

    fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<RandomForestModel> {
        let names = (0..x.ncols()).map(|idx| format!("f{idx}")).collect();
        train_random_forest(x, y, names, self)
    }
}

/// Column-major copy of the training data shared read-only by tree workers.
struct FitData {
    columns: Vec<Vec<f64>>,
    target: Vec<f64>,
}

impl FitData {
    fn n_rows(&self) -> usize {
        self.target.len()
    }
}

/// Fit a random forest on `x` (`[n_rows, n_features]`) and `y`.
pub fn train_random_forest(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    feature_names: Vec<String>,
    options: &ForestOptions,
) -> Result<RandomForestModel> {
    if x.nrows() != y.len() {
        return Err(PipelineError::Fit(format!(
            "Mismatched X/Y lengths: {} rows vs {} targets",
            x.nrows(),
            y.len()
        )));
    }
    if x.nrows() == 0 {
        return Err(PipelineError::Fit("Empty dataset".to_string()));
    }
    if x.ncols() == 0 || x.ncols() > u16::MAX as usize {
        return Err(PipelineError::Fit(format!(
            "Unsupported feature count {}",
            x.ncols()
        )));
    }
    if feature_names.len() != x.ncols() {
        return Err(PipelineError::Fit(format!(
            "{} feature names for {} columns",
            feature_names.len(),
            x.ncols()
        )));
    }
    if options.n_trees == 0 {
        return Err(PipelineError::Fit("Need at least 1 tree".to_string()));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(PipelineError::Fit(
            "Input contains NaN or infinite values".to_string(),
        ));
    }

    let data = FitData {
        columns: x.columns().into_iter().map(|col| col.to_vec()).collect(),
        target: y.to_vec(),
    };

    let mut rng = StdRng::seed_from_u64(options.seed);
    let seeds: Vec<u64> = (0..options.n_trees).map(|_| rng.random::<u64>()).collect();

    let workers = options.worker_count();
    let chunk_size = options.n_trees.div_ceil(workers);
    let mut slots: Vec<Option<RegressionTree>> = vec![None; options.n_trees];
    std::thread::scope(|scope| {
        for (chunk_idx, chunk) in slots.chunks_mut(chunk_size).enumerate() {
            let data = &data;
            let seeds = &seeds;
            scope.spawn(move || {
                for (offset, slot) in chunk.iter_mut().enumerate() {
                    let tree_idx = chunk_idx * chunk_size + offset;
                    *slot = Some(fit_tree(data, seeds[tree_idx], options));
                }
            });
        }
    });
    let trees: Vec<RegressionTree> = slots
        .into_iter()
        .collect::<Option<_>>()
        .ok_or_else(|| PipelineError::Fit("A tree worker did not finish".to_string()))?;

    tracing::debug!(
        "Fitted {} trees on {} rows with {workers} workers",
        trees.len(),
        data.n_rows()
    );
    Ok(RandomForestModel {
        model_version: FOREST_MODEL_VERSION,
        feature_names,
        options: options.clone(),
        trees,
    })
}

fn fit_tree(data: &FitData, seed: u64, options: &ForestOptions) -> RegressionTree {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = data.n_rows();
    let samples: Vec<usize> = if options.bootstrap {
        (0..n).map(|_| rng.random_range(0..n)).collect()
    } else {
        (0..n).collect()
    };
    let mut builder = TreeBuilder {
        data,
        options,
        rng,
        nodes: Vec::new(),
    };
    builder.grow(samples, 0);
    RegressionTree {
        nodes: builder.nodes,
    }
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

struct TreeBuilder<'a> {
    data: &'a FitData,
    options: &'a ForestOptions,
    rng: StdRng,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Append a node for `samples` (and its subtree) and return its index.
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> u32 {
        let idx = self.nodes.len() as u32;
        let value = samples.iter().map(|&s| self.data.target[s]).sum::<f64>() / samples.len() as f64;
        self.nodes.push(Node::Leaf { value });

        let Some(split) = self.best_split(&samples, depth) else {
            return idx;
        };
        let column = &self.data.columns[split.feature];
        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| column[s] <= split.threshold);
        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.nodes[idx as usize] = Node::Split {
            feature: split.feature as u16,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    fn best_split(&mut self, samples: &[usize], depth: usize) -> Option<BestSplit> {
        let n = samples.len();
        let min_leaf = self.options.min_samples_leaf.max(1);
        if self.options.max_depth.is_some_and(|max| depth >= max)
            || n < self.options.min_samples_split.max(2)
            || n < 2 * min_leaf
        {
            return None;
        }
        let first = self.data.target[samples[0]];
        if samples.iter().all(|&s| self.data.target[s] == first) {
            return None;
        }

        let n_features = self.data.columns.len();
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(&mut self.rng);
        let max_features = self
            .options
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features);

        let mut best: Option<BestSplit> = None;
        for &feature in features.iter().take(max_features) {
            if let Some(split) = self.best_split_for_feature(samples, feature, min_leaf)
                && best.is_none_or(|b| split.score > b.score)
            {
                best = Some(split);
            }
        }
        best
    }

    /// Best threshold on one feature, scored by `sum_l^2 / n_l + sum_r^2 / n_r`, which is
    /// maximal where the summed squared error of both children is minimal.
    fn best_split_for_feature(
        &self,
        samples: &[usize],
        feature: usize,
        min_leaf: usize,
    ) -> Option<BestSplit> {
        let column = &self.data.columns[feature];
        let mut pairs: Vec<(f64, f64)> = samples
            .iter()
            .map(|&s| (column[s], self.data.target[s]))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = pairs.len();
        let total: f64 = pairs.iter().map(|(_, y)| y).sum();
        let mut left_sum = 0.0f64;
        let mut best: Option<BestSplit> = None;
        for split_at in 1..n {
            left_sum += pairs[split_at - 1].1;
            let (lo, hi) = (pairs[split_at - 1].0, pairs[split_at].0);
            if lo == hi || split_at < min_leaf || n - split_at < min_leaf {
                continue;
            }
            let n_left = split_at as f64;
            let n_right = (n - split_at) as f64;
            let right_sum = total - left_sum;
            let score = left_sum * left_sum / n_left + right_sum * right_sum / n_right;
            if best.is_none_or(|b| score > b.score) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    score,
                });
            }
        }
        best
    }
}
