//! Error types for classifier configuration and execution.

/// Errors from Proximity Forest and LOOCV operations.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when nb_candidates is zero.
    #[error("nb_candidates must be at least 1, got {nb_candidates}")]
    InvalidCandidateCount {
        /// The invalid nb_candidates value provided.
        nb_candidates: usize,
    },

    /// Returned when a forest is configured with no distance measures.
    #[error("the enabled measure set is empty")]
    EmptyMeasureSet,

    /// Returned when a LOOCV family carries no parameter values.
    #[error("the parameter range is empty")]
    EmptyParameterRange,

    /// Returned when the worker pool cannot be constructed.
    #[error("failed to build the worker pool")]
    PoolBuild {
        /// The underlying rayon error.
        source: rayon::ThreadPoolBuildError,
    },

    /// Returned when the cooperative cancellation flag was raised.
    #[error("cancelled")]
    Cancelled,

    /// Wraps a distance configuration error.
    #[error(transparent)]
    Distance(#[from] elastica_dist::DistError),
}
