//! Leave-one-out cross-validation over an ordered distance parameter range.
//!
//! For each training row, a 1-NN scan runs per candidate parameter with a
//! per-parameter best-so-far as the distance cut-off. When the family is
//! monotone along its range, the neighbour distance found for one parameter
//! is an admissible starting bound for the next, so the schedule walks the
//! range in the direction that keeps bounds tight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use elastica_dist::{Band, DistanceInstance, Elastic, TimeSeriesView};
use elastica_data::Dataset;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::error::ClassifyError;
use crate::runtime::{child_seed, thread_pool, CancelToken};

/// How a family's distance moves along the parameter range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Monotony {
    /// Distance never decreases with the parameter index (e.g. ADTW's ω).
    Increasing,
    /// Distance never increases with the parameter index (e.g. DTW's window).
    Decreasing,
    /// No usable ordering; every parameter starts from `+∞`.
    None,
}

/// An ordered range of parameterisations of one distance measure.
pub trait LoocvFamily: Sync {
    /// Number of candidate parameter values.
    fn nb_params(&self) -> usize;

    /// Evaluate parameter `k` with a cut-off.
    fn eval(&self, k: usize, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64;

    /// Monotony of the distance along the range.
    fn monotony(&self) -> Monotony;

    /// The bound distance instance for parameter `k` (used for the test phase
    /// once a parameter has been selected).
    fn instance(&self, k: usize) -> DistanceInstance;
}

/// Outcome of a LOOCV run.
#[derive(Debug, Clone)]
pub struct LoocvResult {
    /// Correctly classified training rows, per parameter index.
    pub nb_correct: Vec<usize>,
    /// Selected parameter: lowest index among the maxima.
    pub best_index: usize,
    /// Wall time of the run.
    pub time: Duration,
}

/// Outcome of a train/test nearest-neighbour evaluation.
#[derive(Debug, Clone)]
pub struct EvalResult {
    /// Correctly classified test rows.
    pub nb_correct: usize,
    /// Wall time of the run.
    pub time: Duration,
}

/// Run leave-one-out 1-NN over the family's parameter range, in parallel over
/// training rows.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClassifyError::EmptyParameterRange`] | the family has no parameters |
/// | [`ClassifyError::PoolBuild`] | the worker pool cannot be built |
/// | [`ClassifyError::Cancelled`] | the token was raised mid-run |
#[instrument(skip_all, fields(n = train.len(), nb_params = family.nb_params()))]
pub fn loocv<F: LoocvFamily>(
    family: &F,
    train: &Dataset,
    seed: u64,
    nb_threads: usize,
    cancel: &CancelToken,
) -> Result<LoocvResult, ClassifyError> {
    let nb_params = family.nb_params();
    if nb_params == 0 {
        return Err(ClassifyError::EmptyParameterRange);
    }
    let started = Instant::now();
    let n = train.len();
    let nb_correct: Vec<AtomicUsize> = (0..nb_params).map(|_| AtomicUsize::new(0)).collect();

    // Walk the range so that each completed parameter bounds the next one.
    let schedule: Vec<usize> = match family.monotony() {
        Monotony::Increasing => (0..nb_params).rev().collect(),
        Monotony::Decreasing | Monotony::None => (0..nb_params).collect(),
    };
    let share_bounds = family.monotony() != Monotony::None;

    let pool = thread_pool(nb_threads)?;
    pool.install(|| {
        (0..n).into_par_iter().try_for_each(|query| {
            cancel.check()?;
            let mut rng = ChaCha8Rng::seed_from_u64(child_seed(seed, query as u64));
            let true_label = train.label(query);
            let mut carried = f64::INFINITY;
            for &k in &schedule {
                let init = if share_bounds { carried } else { f64::INFINITY };
                let (pred, bsf) = nn1_loocv(family, k, train, query, init, &mut rng);
                carried = bsf;
                if pred == Some(true_label) {
                    nb_correct[k].fetch_add(1, Ordering::Relaxed);
                }
            }
            Ok::<(), ClassifyError>(())
        })
    })?;

    let nb_correct: Vec<usize> = nb_correct.iter().map(|c| c.load(Ordering::Relaxed)).collect();
    let best_index = nb_correct
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        .map(|(k, _)| k)
        .unwrap_or(0);

    let result = LoocvResult {
        nb_correct,
        best_index,
        time: started.elapsed(),
    };
    info!(
        best_index = result.best_index,
        best_correct = result.nb_correct[result.best_index],
        "LOOCV complete"
    );
    Ok(result)
}

/// One leave-one-out 1-NN scan for parameter `k`, starting from an admissible
/// bound. Returns the predicted label and the neighbour distance found.
fn nn1_loocv<F: LoocvFamily, R: Rng>(
    family: &F,
    k: usize,
    train: &Dataset,
    query: usize,
    init_bound: f64,
    rng: &mut R,
) -> (Option<usize>, f64) {
    let q = train.series(query);
    let mut bsf = init_bound;
    let mut ties: Vec<usize> = Vec::new();
    let mut largest_label: Option<usize> = None;
    for row in 0..train.len() {
        if row == query {
            continue;
        }
        let label = train.label(row);
        largest_label = Some(largest_label.map_or(label, |l| l.max(label)));
        let d = family.eval(k, train.series(row), q, bsf);
        if d < bsf {
            ties.clear();
            ties.push(label);
            bsf = d;
        } else if d.is_finite() && d == bsf && !ties.contains(&label) {
            ties.push(label);
        }
    }
    let pred = match ties.len() {
        0 => largest_label,
        1 => Some(ties[0]),
        n => Some(ties[rng.gen_range(0..n)]),
    };
    (pred, bsf)
}

/// Classify every test row against the training set with 1-NN under a fixed
/// distance, in parallel over test rows.
///
/// # Errors
///
/// As [`loocv`], minus the parameter-range check.
#[instrument(skip_all, fields(n_test = test.len()))]
pub fn evaluate_1nn(
    train: &Dataset,
    test: &Dataset,
    distance: &DistanceInstance,
    seed: u64,
    nb_threads: usize,
    cancel: &CancelToken,
) -> Result<EvalResult, ClassifyError> {
    evaluate_knn(train, test, distance, 1, seed, nb_threads, cancel)
}

/// Classify every test row against the training set with k-NN majority vote
/// under a fixed distance, in parallel over test rows.
///
/// # Errors
///
/// As [`loocv`], minus the parameter-range check.
pub fn evaluate_knn(
    train: &Dataset,
    test: &Dataset,
    distance: &DistanceInstance,
    k: usize,
    seed: u64,
    nb_threads: usize,
    cancel: &CancelToken,
) -> Result<EvalResult, ClassifyError> {
    let started = Instant::now();
    let pool = thread_pool(nb_threads)?;
    let nb_correct = AtomicUsize::new(0);
    pool.install(|| {
        (0..test.len()).into_par_iter().try_for_each(|query| {
            cancel.check()?;
            let mut rng = ChaCha8Rng::seed_from_u64(child_seed(seed, query as u64));
            let candidates = (0..train.len()).map(|row| (train.label(row), train.series(row)));
            let pred = if k == 1 {
                crate::nn1::nn1_label(candidates, test.series(query), distance, &mut rng)
            } else {
                crate::nn1::knn_label(candidates, test.series(query), distance, k, &mut rng)
            };
            if pred == Some(test.label(query)) {
                nb_correct.fetch_add(1, Ordering::Relaxed);
            }
            Ok::<(), ClassifyError>(())
        })
    })?;
    debug!(
        nb_correct = nb_correct.load(Ordering::Relaxed),
        "test evaluation complete"
    );
    Ok(EvalResult {
        nb_correct: nb_correct.load(Ordering::Relaxed),
        time: started.elapsed(),
    })
}

/// DTW over the EE-style window range: 100 windows spread over
/// `0..length_max`, distance non-increasing with the window.
#[derive(Debug)]
pub struct DtwWindowFamily {
    windows: Vec<usize>,
    instances: Vec<DistanceInstance>,
}

impl DtwWindowFamily {
    /// Build the 100-point window range for series up to `length_max` long.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Distance`] when the exponent is invalid.
    pub fn new(exponent: f64, length_max: usize) -> Result<Self, ClassifyError> {
        let windows: Vec<usize> = (0..100).map(|k| length_max * k / 100).collect();
        let instances = windows
            .iter()
            .map(|&w| {
                DistanceInstance::new(
                    Elastic::Dtw {
                        exponent,
                        window: Band::Window(w),
                    },
                    length_max,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { windows, instances })
    }

    /// The window value at parameter index `k`.
    #[must_use]
    pub fn window(&self, k: usize) -> usize {
        self.windows[k]
    }
}

impl LoocvFamily for DtwWindowFamily {
    fn nb_params(&self) -> usize {
        self.instances.len()
    }

    fn eval(&self, k: usize, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64 {
        self.instances[k].eval(a, b, cutoff)
    }

    fn monotony(&self) -> Monotony {
        Monotony::Decreasing
    }

    fn instance(&self, k: usize) -> DistanceInstance {
        self.instances[k].clone()
    }
}

/// ADTW over its exponential penalty grid: `ω_k = ω_max · (k/100)^5` for
/// `k = 1..=100`, with `ω_max` estimated as the mean direct-alignment cost of
/// sampled training pairs. Distance non-decreasing with the penalty.
#[derive(Debug)]
pub struct AdtwPenaltyFamily {
    penalties: Vec<f64>,
    instances: Vec<DistanceInstance>,
}

impl AdtwPenaltyFamily {
    /// Number of sampled pairs for the `ω_max` estimate.
    const NB_SAMPLES: usize = 4000;

    /// Estimate the penalty scale from the training set and build the grid.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Distance`] when the exponent is invalid.
    pub fn sampled<R: Rng>(
        train: &Dataset,
        exponent: f64,
        rng: &mut R,
    ) -> Result<Self, ClassifyError> {
        let omega_max = Self::mean_direct_cost(train, exponent, rng);
        let penalties: Vec<f64> = (1..=100)
            .map(|k| omega_max * (k as f64 / 100.0).powi(5))
            .collect();
        let length_max = train.header().length_max();
        let instances = penalties
            .iter()
            .map(|&penalty| {
                DistanceInstance::new(Elastic::Adtw { exponent, penalty }, length_max)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            penalties,
            instances,
        })
    }

    /// The penalty value at parameter index `k`.
    #[must_use]
    pub fn penalty(&self, k: usize) -> f64 {
        self.penalties[k]
    }

    /// Mean direct-alignment cost over sampled row pairs, truncating the
    /// longer row when lengths differ.
    fn mean_direct_cost<R: Rng>(train: &Dataset, exponent: f64, rng: &mut R) -> f64 {
        let n = train.len();
        let mut acc = 0.0;
        let mut count = 0usize;
        for _ in 0..Self::NB_SAMPLES {
            let i = rng.gen_range(0..n);
            let j = rng.gen_range(0..n);
            if i == j {
                continue;
            }
            let a = train.series(i);
            let b = train.series(j);
            let len = a.len().min(b.len());
            if len == 0 {
                continue;
            }
            let d = elastica_dist::directa_univariate(
                &a.as_slice()[..len],
                &b.as_slice()[..len],
                exponent,
                f64::NAN,
            );
            acc += d;
            count += 1;
        }
        if count == 0 {
            1.0
        } else {
            acc / count as f64
        }
    }
}

impl LoocvFamily for AdtwPenaltyFamily {
    fn nb_params(&self) -> usize {
        self.instances.len()
    }

    fn eval(&self, k: usize, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64 {
        self.instances[k].eval(a, b, cutoff)
    }

    fn monotony(&self) -> Monotony {
        Monotony::Increasing
    }

    fn instance(&self, k: usize) -> DistanceInstance {
        self.instances[k].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elastica_dist::TimeSeries;

    fn toy_dataset() -> Dataset {
        // Two tight clusters; every leave-one-out neighbour shares the class.
        let series = vec![
            vec![0.0, 0.1, 0.0, 0.1],
            vec![0.1, 0.0, 0.1, 0.0],
            vec![0.0, 0.0, 0.1, 0.1],
            vec![5.0, 5.1, 5.0, 5.1],
            vec![5.1, 5.0, 5.1, 5.0],
            vec![5.0, 5.0, 5.1, 5.1],
        ];
        let labels = ["a", "a", "a", "b", "b", "b"];
        Dataset::new(
            series
                .into_iter()
                .map(|v| TimeSeries::new(v).unwrap())
                .collect(),
            labels.iter().map(ToString::to_string).collect(),
        )
        .unwrap()
    }

    #[test]
    fn separable_data_is_fully_correct() {
        let train = toy_dataset();
        let family = DtwWindowFamily::new(2.0, train.header().length_max()).unwrap();
        let result = loocv(&family, &train, 42, 1, &CancelToken::new()).unwrap();
        assert_eq!(result.nb_correct.len(), 100);
        for &nc in &result.nb_correct {
            assert_eq!(nc, train.len());
        }
        assert_eq!(result.best_index, 0);
    }

    #[test]
    fn bound_sharing_matches_fresh_bounds() {
        // The shared-bound schedule must count exactly what per-parameter
        // scans from +∞ count.
        struct Fresh<'a>(&'a DtwWindowFamily);
        impl LoocvFamily for Fresh<'_> {
            fn nb_params(&self) -> usize {
                self.0.nb_params()
            }
            fn eval(
                &self,
                k: usize,
                a: TimeSeriesView<'_>,
                b: TimeSeriesView<'_>,
                cutoff: f64,
            ) -> f64 {
                self.0.eval(k, a, b, cutoff)
            }
            fn monotony(&self) -> Monotony {
                Monotony::None
            }
            fn instance(&self, k: usize) -> DistanceInstance {
                self.0.instance(k)
            }
        }

        let train = toy_dataset();
        let family = DtwWindowFamily::new(2.0, train.header().length_max()).unwrap();
        let shared = loocv(&family, &train, 7, 1, &CancelToken::new()).unwrap();
        let fresh = loocv(&Fresh(&family), &train, 7, 1, &CancelToken::new()).unwrap();
        assert_eq!(shared.nb_correct, fresh.nb_correct);
    }

    #[test]
    fn nb_correct_bounded_by_n() {
        let train = toy_dataset();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let family = AdtwPenaltyFamily::sampled(&train, 2.0, &mut rng).unwrap();
        let result = loocv(&family, &train, 42, 2, &CancelToken::new()).unwrap();
        assert_eq!(result.nb_correct.len(), 100);
        for &nc in &result.nb_correct {
            assert!(nc <= train.len());
        }
        let max = result.nb_correct.iter().max().copied().unwrap();
        assert_eq!(result.nb_correct[result.best_index], max);
    }

    #[test]
    fn cancelled_run_errors() {
        let train = toy_dataset();
        let family = DtwWindowFamily::new(2.0, train.header().length_max()).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            loocv(&family, &train, 42, 1, &cancel),
            Err(ClassifyError::Cancelled)
        ));
    }

    #[test]
    fn test_evaluation_on_identical_split_is_perfect() {
        let train = toy_dataset();
        let instance = DistanceInstance::new(
            Elastic::Dtw {
                exponent: 2.0,
                window: Band::Full,
            },
            train.header().length_max(),
        )
        .unwrap();
        let result =
            evaluate_1nn(&train, &train, &instance, 1, 1, &CancelToken::new()).unwrap();
        assert_eq!(result.nb_correct, train.len());
    }
}
