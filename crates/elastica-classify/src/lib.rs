//! Time series classifiers over elastic distances: a Proximity Forest
//! ensemble, nearest-neighbour primitives, and a parallel LOOCV tuner with
//! bound sharing across monotone parameter ranges.

mod error;
mod forest;
mod loocv;
mod nn1;
mod runtime;
mod splitter;
mod tree;

pub use error::ClassifyError;
pub use forest::{ProximityForest, ProximityForestConfig};
pub use loocv::{
    evaluate_1nn, evaluate_knn, loocv, AdtwPenaltyFamily, DtwWindowFamily, EvalResult,
    LoocvFamily, LoocvResult, Monotony,
};
pub use nn1::{knn_label, nn1_label};
pub use runtime::{child_seed, thread_pool, CancelToken};
pub use splitter::{
    default_measures, msm_costs, twe_lambdas, twe_nus, SplitterMeasure, TrainContext,
    TransformId,
};
pub use tree::PfTree;
