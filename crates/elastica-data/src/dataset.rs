//! Labelled time series datasets.
//!
//! A dataset is an ordered sequence of `(series, label index)` pairs plus a
//! header carrying the label encoder and length statistics. Datasets are
//! immutable after construction and meant to be shared behind an `Arc`;
//! subsets are expressed as index collections, never as copies.

use std::collections::HashMap;

use elastica_dist::{TimeSeries, TimeSeriesView};
use tracing::debug;

use crate::error::DataError;

/// Dataset metadata: label encoder and shape statistics.
#[derive(Debug, Clone)]
pub struct DatasetHeader {
    label_names: Vec<String>,
    label_to_index: HashMap<String, usize>,
    dim: usize,
    length_min: usize,
    length_max: usize,
    size: usize,
}

impl DatasetHeader {
    /// Label strings in encoder order.
    #[must_use]
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Encode a label string, if known.
    #[must_use]
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.label_to_index.get(label).copied()
    }

    /// Number of distinct labels in the encoder.
    #[must_use]
    pub fn nb_classes(&self) -> usize {
        self.label_names.len()
    }

    /// Channel count shared by every series.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Shortest series length.
    #[must_use]
    pub fn length_min(&self) -> usize {
        self.length_min
    }

    /// Longest series length.
    #[must_use]
    pub fn length_max(&self) -> usize {
        self.length_max
    }

    /// Number of rows.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }
}

/// An immutable labelled dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    series: Vec<TimeSeries>,
    labels: Vec<usize>,
    header: DatasetHeader,
}

impl Dataset {
    /// Build a dataset, deriving the label encoder from the labels seen
    /// (sorted lexicographically for a deterministic encoding).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DataError::EmptyDataset`] | `series` is empty |
    /// | [`DataError::LabelCountMismatch`] | label and series counts differ |
    /// | [`DataError::DimensionMismatch`] | channel counts differ across rows |
    pub fn new(series: Vec<TimeSeries>, labels: Vec<String>) -> Result<Self, DataError> {
        let mut names: Vec<String> = labels.to_vec();
        names.sort();
        names.dedup();
        Self::with_encoder(series, labels, &names)
    }

    /// Build a dataset against an existing label encoder, e.g. a test split
    /// encoded with its training split's labels.
    ///
    /// # Errors
    ///
    /// As [`Dataset::new`], plus [`DataError::UnknownLabel`] when a label is
    /// not present in `label_names`.
    pub fn with_encoder(
        series: Vec<TimeSeries>,
        labels: Vec<String>,
        label_names: &[String],
    ) -> Result<Self, DataError> {
        if series.is_empty() {
            return Err(DataError::EmptyDataset);
        }
        if series.len() != labels.len() {
            return Err(DataError::LabelCountMismatch {
                series: series.len(),
                labels: labels.len(),
            });
        }
        let dim = series[0].dim();
        for (row, s) in series.iter().enumerate() {
            if s.dim() != dim {
                return Err(DataError::DimensionMismatch {
                    row,
                    expected: dim,
                    got: s.dim(),
                });
            }
        }

        let label_to_index: HashMap<String, usize> = label_names
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        let encoded = labels
            .iter()
            .enumerate()
            .map(|(row, l)| {
                label_to_index
                    .get(l)
                    .copied()
                    .ok_or_else(|| DataError::UnknownLabel {
                        label: l.clone(),
                        row,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let length_min = series.iter().map(TimeSeries::len).min().unwrap_or(0);
        let length_max = series.iter().map(TimeSeries::len).max().unwrap_or(0);
        let header = DatasetHeader {
            label_names: label_names.to_vec(),
            label_to_index,
            dim,
            length_min,
            length_max,
            size: series.len(),
        };
        debug!(
            size = header.size,
            classes = header.nb_classes(),
            length_min,
            length_max,
            "dataset assembled"
        );
        Ok(Self {
            series,
            labels: encoded,
            header,
        })
    }

    /// Apply a series-to-series transform to every row, keeping labels and
    /// encoder, recomputing length statistics.
    #[must_use]
    pub fn map_series<F>(&self, f: F) -> Self
    where
        F: Fn(&TimeSeries) -> TimeSeries,
    {
        let series: Vec<TimeSeries> = self.series.iter().map(f).collect();
        let length_min = series.iter().map(TimeSeries::len).min().unwrap_or(0);
        let length_max = series.iter().map(TimeSeries::len).max().unwrap_or(0);
        let header = DatasetHeader {
            length_min,
            length_max,
            ..self.header.clone()
        };
        Self {
            series,
            labels: self.labels.clone(),
            header,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Always false: construction rejects empty datasets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Borrow row `row` as a view.
    #[must_use]
    pub fn series(&self, row: usize) -> TimeSeriesView<'_> {
        self.series[row].as_view()
    }

    /// Label index of row `row`.
    #[must_use]
    pub fn label(&self, row: usize) -> usize {
        self.labels[row]
    }

    /// All encoded labels, row order.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Dataset metadata.
    #[must_use]
    pub fn header(&self) -> &DatasetHeader {
        &self.header
    }
}

/// An ordered, duplicate-free collection of row indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSet(Vec<usize>);

impl IndexSet {
    /// All rows `0..n`.
    #[must_use]
    pub fn all(n: usize) -> Self {
        Self((0..n).collect())
    }

    /// Build from arbitrary indices, sorting and deduplicating.
    #[must_use]
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self(indices)
    }

    /// Number of rows referenced.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no rows are referenced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Borrow the indices as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}
