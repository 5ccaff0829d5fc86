//! Error types for dataset construction.

use elastica_dist::DistError;

/// Errors from dataset assembly and label encoding.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Returned when a dataset is built with zero rows.
    #[error("dataset has zero rows")]
    EmptyDataset,

    /// Returned when the number of labels differs from the number of series.
    #[error("{series} series but {labels} labels")]
    LabelCountMismatch {
        /// Number of series provided.
        series: usize,
        /// Number of labels provided.
        labels: usize,
    },

    /// Returned when a series has a different channel count than the first.
    #[error("row {row} has {got} channels, expected {expected}")]
    DimensionMismatch {
        /// Zero-based row index of the offending series.
        row: usize,
        /// Expected channel count (from the first series).
        expected: usize,
        /// Actual channel count.
        got: usize,
    },

    /// Returned when a label is absent from the encoder this dataset must share.
    #[error("label \"{label}\" (row {row}) not present in the shared encoder")]
    UnknownLabel {
        /// The unencodable label.
        label: String,
        /// Zero-based row index carrying it.
        row: usize,
    },

    /// Wraps a series validation error.
    #[error(transparent)]
    Series(#[from] DistError),
}
