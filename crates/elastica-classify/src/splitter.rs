//! Randomised 1-NN splitters for Proximity Forest nodes.
//!
//! A candidate splitter picks one exemplar row per class, draws a distance
//! measure from the enabled set and its parameters from measure-specific
//! distributions, and optionally works in derivative space. Rows route to the
//! branch of their nearest exemplar.

use std::sync::Arc;

use elastica_dist::{Band, DistanceInstance, Elastic};
use elastica_data::{derive, subset_stddev, ByClassMap, Dataset};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::nn1::nn1_label;

/// Distance measures a forest may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitterMeasure {
    /// Direct alignment (squared Euclidean).
    Direct,
    /// DTW with no window.
    DtwFull,
    /// DTW with a random window.
    Dtw,
    /// Amerced DTW with a random penalty from the exponential grid.
    Adtw,
    /// Weighted DTW with a random weight factor.
    Wdtw,
    /// ERP with a random gap value and window.
    Erp,
    /// LCSS with a random tolerance and window.
    Lcss,
    /// MSM with a random cost from the classic grid.
    Msm,
    /// TWE with random stiffness and penalty from the classic grids.
    Twe,
}

/// The measure set of the reference Proximity Forest configuration.
#[must_use]
pub fn default_measures() -> Vec<SplitterMeasure> {
    vec![
        SplitterMeasure::Direct,
        SplitterMeasure::DtwFull,
        SplitterMeasure::Dtw,
        SplitterMeasure::Adtw,
        SplitterMeasure::Wdtw,
        SplitterMeasure::Erp,
        SplitterMeasure::Lcss,
        SplitterMeasure::Msm,
        SplitterMeasure::Twe,
    ]
}

/// The classic 100-point MSM cost grid: four decades from 0.01 to 100, 25
/// evenly spaced values each.
#[must_use]
pub fn msm_costs() -> Vec<f64> {
    let mut costs = Vec::with_capacity(100);
    for i in 0..25 {
        costs.push(0.01 + i as f64 * 0.003_75);
    }
    for segment in 0..3 {
        let base = 10f64.powi(segment - 1);
        for i in 1..=25 {
            costs.push(base + i as f64 * base * 0.36);
        }
    }
    costs
}

/// The classic TWE stiffness grid.
#[must_use]
pub fn twe_nus() -> Vec<f64> {
    vec![
        0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
    ]
}

/// The classic TWE deletion-penalty grid: ten values from 0 to 0.1.
#[must_use]
pub fn twe_lambdas() -> Vec<f64> {
    (0..10).map(|i| i as f64 / 90.0).collect()
}

/// Which representation of the data a splitter works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformId {
    /// The series as loaded.
    Raw,
    /// Slope-average derivative.
    Derivative,
}

/// The training data in every representation splitters may draw.
#[derive(Debug, Clone)]
pub struct TrainContext {
    raw: Arc<Dataset>,
    derivative: Arc<Dataset>,
}

impl TrainContext {
    /// Precompute the derivative representation of a dataset.
    #[must_use]
    pub fn new(raw: Arc<Dataset>) -> Self {
        let derivative = Arc::new(raw.map_series(derive));
        Self { raw, derivative }
    }

    /// The dataset in the given representation.
    #[must_use]
    pub fn dataset(&self, transform: TransformId) -> &Dataset {
        match transform {
            TransformId::Raw => &self.raw,
            TransformId::Derivative => &self.derivative,
        }
    }

    /// The raw dataset.
    #[must_use]
    pub fn raw(&self) -> &Arc<Dataset> {
        &self.raw
    }
}

/// A bound splitter: exemplars, distance, and the representation it reads.
#[derive(Debug, Clone)]
pub struct Splitter {
    /// `(label, row)` per branch, ascending label order.
    pub(crate) exemplars: Vec<(usize, usize)>,
    pub(crate) distance: DistanceInstance,
    pub(crate) transform: TransformId,
}

impl Splitter {
    /// Draw a candidate splitter for the rows of `bcm`.
    pub(crate) fn draw<R: Rng>(
        ctx: &TrainContext,
        bcm: &ByClassMap,
        measures: &[SplitterMeasure],
        rng: &mut R,
    ) -> Self {
        let transform = if rng.gen_bool(0.5) {
            TransformId::Raw
        } else {
            TransformId::Derivative
        };
        let measure = *measures.choose(rng).expect("measure set is not empty");
        let exemplars = bcm.pick_one_by_class(rng);
        let dataset = ctx.dataset(transform);
        let length_max = dataset.header().length_max();
        let window_top = (length_max + 1) / 4;

        let elastic = match measure {
            SplitterMeasure::Direct => Elastic::Direct { exponent: 2.0 },
            SplitterMeasure::DtwFull => Elastic::Dtw {
                exponent: 2.0,
                window: Band::Full,
            },
            SplitterMeasure::Dtw => Elastic::Dtw {
                exponent: 2.0,
                window: Band::Window(rng.gen_range(0..=window_top)),
            },
            SplitterMeasure::Adtw => {
                let stddev = subset_stddev(dataset, &bcm.index_set());
                let scale = if stddev > 0.0 { stddev * stddev } else { 1.0 };
                let k = rng.gen_range(1..=100);
                Elastic::Adtw {
                    exponent: 2.0,
                    penalty: scale * (k as f64 / 100.0).powi(5),
                }
            }
            SplitterMeasure::Wdtw => Elastic::Wdtw {
                exponent: 2.0,
                g: rng.gen_range(0.0..1.0),
            },
            SplitterMeasure::Erp => {
                let stddev = subset_stddev(dataset, &bcm.index_set()).max(f64::MIN_POSITIVE);
                Elastic::Erp {
                    exponent: 2.0,
                    gap_value: rng.gen_range(0.2 * stddev..=stddev),
                    window: Band::Window(rng.gen_range(0..=window_top)),
                }
            }
            SplitterMeasure::Lcss => {
                let stddev = subset_stddev(dataset, &bcm.index_set()).max(f64::MIN_POSITIVE);
                Elastic::Lcss {
                    epsilon: rng.gen_range(0.2 * stddev..=stddev),
                    window: Band::Window(rng.gen_range(0..=window_top)),
                }
            }
            SplitterMeasure::Msm => Elastic::Msm {
                cost: *msm_costs().choose(rng).expect("grid is not empty"),
            },
            SplitterMeasure::Twe => Elastic::Twe {
                exponent: 2.0,
                nu: *twe_nus().choose(rng).expect("grid is not empty"),
                lambda: *twe_lambdas().choose(rng).expect("grid is not empty"),
            },
        };

        let distance = DistanceInstance::new(elastic, length_max)
            .expect("drawn parameters are always in range");
        Splitter {
            exemplars,
            distance,
            transform,
        }
    }

    /// Number of branches (one per exemplar).
    #[must_use]
    pub fn nb_branches(&self) -> usize {
        self.exemplars.len()
    }

    /// Route one row of the training context to a branch index.
    pub(crate) fn route_train<R: Rng>(&self, ctx: &TrainContext, row: usize, rng: &mut R) -> usize {
        let dataset = ctx.dataset(self.transform);
        self.route_view(ctx, dataset.series(row), rng)
    }

    /// Route an external query (already in the representation matching
    /// `self.transform`) to a branch index.
    pub(crate) fn route_view<R: Rng>(
        &self,
        ctx: &TrainContext,
        query: elastica_dist::TimeSeriesView<'_>,
        rng: &mut R,
    ) -> usize {
        let dataset = ctx.dataset(self.transform);
        let candidates = self
            .exemplars
            .iter()
            .enumerate()
            .map(|(branch, &(_, row))| (branch, dataset.series(row)));
        // The fallback label is the largest branch index, which carries the
        // largest stored label.
        nn1_label(candidates, query, &self.distance, rng)
            .expect("splitters always hold at least one exemplar")
    }

    /// The representation this splitter reads.
    #[must_use]
    pub fn transform(&self) -> TransformId {
        self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elastica_dist::TimeSeries;
    use elastica_data::IndexSet;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn context() -> TrainContext {
        let series = vec![
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.1, 0.0, 0.1, 0.0],
            vec![9.0, 9.0, 9.0, 9.0],
            vec![9.1, 9.0, 9.1, 9.0],
        ];
        let labels = ["lo", "lo", "hi", "hi"];
        let ds = Dataset::new(
            series
                .into_iter()
                .map(|v| TimeSeries::new(v).unwrap())
                .collect(),
            labels.iter().map(ToString::to_string).collect(),
        )
        .unwrap();
        TrainContext::new(Arc::new(ds))
    }

    #[test]
    fn msm_grid_shape() {
        let costs = msm_costs();
        assert_eq!(costs.len(), 100);
        assert!((costs[0] - 0.01).abs() < 1e-12);
        assert!((costs[24] - 0.1).abs() < 1e-9);
        assert!((costs[99] - 100.0).abs() < 1e-9);
        for pair in costs.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn twe_grids_shape() {
        assert_eq!(twe_nus().len(), 10);
        let lambdas = twe_lambdas();
        assert_eq!(lambdas.len(), 10);
        assert_eq!(lambdas[0], 0.0);
        assert!((lambdas[9] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn draw_is_deterministic_under_seed() {
        let ctx = context();
        let bcm = ByClassMap::from_dataset(ctx.raw(), &IndexSet::all(4));
        let measures = default_measures();
        let a = Splitter::draw(&ctx, &bcm, &measures, &mut ChaCha8Rng::seed_from_u64(11));
        let b = Splitter::draw(&ctx, &bcm, &measures, &mut ChaCha8Rng::seed_from_u64(11));
        assert_eq!(a.exemplars, b.exemplars);
        assert_eq!(a.transform, b.transform);
        assert_eq!(a.distance.name(), b.distance.name());
    }

    #[test]
    fn exemplars_cover_each_class_once() {
        let ctx = context();
        let bcm = ByClassMap::from_dataset(ctx.raw(), &IndexSet::all(4));
        let s = Splitter::draw(
            &ctx,
            &bcm,
            &default_measures(),
            &mut ChaCha8Rng::seed_from_u64(3),
        );
        assert_eq!(s.nb_branches(), 2);
        assert_eq!(s.exemplars[0].0, 0);
        assert_eq!(s.exemplars[1].0, 1);
    }

    #[test]
    fn routing_sends_rows_to_their_cluster() {
        let ctx = context();
        let bcm = ByClassMap::from_dataset(ctx.raw(), &IndexSet::all(4));
        // Force a raw DTW splitter with the first row of each class.
        let splitter = Splitter {
            exemplars: vec![(0, 0), (1, 2)],
            distance: DistanceInstance::new(
                Elastic::Dtw {
                    exponent: 2.0,
                    window: Band::Full,
                },
                4,
            )
            .unwrap(),
            transform: TransformId::Raw,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(splitter.route_train(&ctx, 1, &mut rng), 0);
        assert_eq!(splitter.route_train(&ctx, 3, &mut rng), 1);
        let _ = bcm;
    }
}
