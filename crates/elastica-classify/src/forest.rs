//! Proximity Forest training and prediction.

use std::sync::Arc;

use elastica_data::{derive, Dataset};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::error::ClassifyError;
use crate::runtime::{child_seed, thread_pool, CancelToken};
use crate::splitter::{default_measures, SplitterMeasure, TrainContext, TransformId};
use crate::tree::{grow_tree, GrowSettings, PfTree};

/// Configuration for Proximity Forest training.
///
/// Construct via [`ProximityForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter        | Default                 |
/// |------------------|-------------------------|
/// | `nb_candidates`  | 5                       |
/// | `min_split_size` | 2                       |
/// | `seed`           | 42                      |
/// | `measures`       | the full measure set    |
#[derive(Debug, Clone)]
pub struct ProximityForestConfig {
    n_trees: usize,
    nb_candidates: usize,
    min_split_size: usize,
    seed: u64,
    measures: Vec<SplitterMeasure>,
}

impl ProximityForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, ClassifyError> {
        if n_trees == 0 {
            return Err(ClassifyError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            nb_candidates: 5,
            min_split_size: 2,
            seed: 42,
            measures: default_measures(),
        })
    }

    /// Set the number of candidate splitters evaluated per node.
    #[must_use]
    pub fn with_nb_candidates(mut self, nb_candidates: usize) -> Self {
        self.nb_candidates = nb_candidates;
        self
    }

    /// Set the node size below which a leaf is made unconditionally.
    #[must_use]
    pub fn with_min_split_size(mut self, min_split_size: usize) -> Self {
        self.min_split_size = min_split_size;
        self
    }

    /// Set the training seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Restrict the measure set splitters draw from.
    #[must_use]
    pub fn with_measures(mut self, measures: Vec<SplitterMeasure>) -> Self {
        self.measures = measures;
        self
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the number of candidate splitters per node.
    #[must_use]
    pub fn nb_candidates(&self) -> usize {
        self.nb_candidates
    }

    /// Return the training seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train the forest on a shared training set.
    ///
    /// Trees are grown in parallel on a pool of `nb_threads` workers
    /// (`0` auto-detects); each tree derives its own PRNG from the seed.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClassifyError::InvalidCandidateCount`] | `nb_candidates` is zero |
    /// | [`ClassifyError::EmptyMeasureSet`] | no measures enabled |
    /// | [`ClassifyError::PoolBuild`] | worker pool creation failed |
    /// | [`ClassifyError::Cancelled`] | the token was raised mid-run |
    #[instrument(skip_all, fields(n_trees = self.n_trees, n_samples = train.len()))]
    pub fn fit(
        &self,
        train: Arc<Dataset>,
        nb_threads: usize,
        cancel: &CancelToken,
    ) -> Result<ProximityForest, ClassifyError> {
        if self.nb_candidates == 0 {
            return Err(ClassifyError::InvalidCandidateCount {
                nb_candidates: self.nb_candidates,
            });
        }
        if self.measures.is_empty() {
            return Err(ClassifyError::EmptyMeasureSet);
        }

        let nb_classes = train.header().nb_classes();
        info!(
            n_trees = self.n_trees,
            nb_candidates = self.nb_candidates,
            n_samples = train.len(),
            nb_classes,
            "training proximity forest"
        );

        let ctx = TrainContext::new(train);

        // Per-tree seeds from the master RNG, then parallel growth.
        let mut master = ChaCha8Rng::seed_from_u64(self.seed);
        let tree_seeds: Vec<u64> = (0..self.n_trees).map(|_| master.gen()).collect();

        let settings = GrowSettings {
            nb_candidates: self.nb_candidates,
            min_split_size: self.min_split_size,
            measures: &self.measures,
        };

        let pool = thread_pool(nb_threads)?;
        let trees: Vec<PfTree> = pool.install(|| {
            tree_seeds
                .into_par_iter()
                .map(|seed| {
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);
                    grow_tree(&ctx, &settings, &mut rng, cancel)
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        debug!(n_trees_grown = trees.len(), "forest training complete");
        Ok(ProximityForest {
            trees,
            ctx,
            nb_classes,
        })
    }
}

/// A trained Proximity Forest. Holds its trees exclusively and the training
/// data behind shared read-only handles.
#[derive(Debug)]
pub struct ProximityForest {
    trees: Vec<PfTree>,
    ctx: TrainContext,
    nb_classes: usize,
}

impl ProximityForest {
    /// Class-probability rows for every test series, averaging the trees'
    /// leaf distributions with equal weight. Rows sum to one.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClassifyError::PoolBuild`] | worker pool creation failed |
    /// | [`ClassifyError::Cancelled`] | the token was raised mid-run |
    #[instrument(skip_all, fields(n_test = test.len()))]
    pub fn predict_proba(
        &self,
        test: &Dataset,
        seed: u64,
        nb_threads: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<Vec<f64>>, ClassifyError> {
        let derived = test.map_series(derive);
        let pool = thread_pool(nb_threads)?;
        pool.install(|| {
            (0..test.len())
                .into_par_iter()
                .map(|query| {
                    cancel.check()?;
                    let mut rng = ChaCha8Rng::seed_from_u64(child_seed(seed, query as u64));
                    let raw = test.series(query);
                    let deriv = derived.series(query);
                    let mut avg = vec![0.0f64; self.nb_classes];
                    for tree in &self.trees {
                        let proba = tree.predict_proba(&self.ctx, raw, deriv, &mut rng);
                        for (a, p) in avg.iter_mut().zip(proba) {
                            *a += p;
                        }
                    }
                    let n = self.trees.len() as f64;
                    avg.iter_mut().for_each(|v| *v /= n);
                    Ok(avg)
                })
                .collect()
        })
    }

    /// Predicted label indices: argmax of each probability row.
    ///
    /// # Errors
    ///
    /// As [`ProximityForest::predict_proba`].
    pub fn predict(
        &self,
        test: &Dataset,
        seed: u64,
        nb_threads: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<usize>, ClassifyError> {
        let proba = self.predict_proba(test, seed, nb_threads, cancel)?;
        Ok(proba
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(idx, _)| idx)
                    .unwrap_or(0)
            })
            .collect())
    }

    /// Number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of classes seen at training time.
    #[must_use]
    pub fn nb_classes(&self) -> usize {
        self.nb_classes
    }

    /// The raw training dataset.
    #[must_use]
    pub fn train_data(&self) -> &Arc<Dataset> {
        self.ctx.raw()
    }
}
