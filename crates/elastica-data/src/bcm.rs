//! By-class maps: rows grouped by their label index.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::dataset::{Dataset, IndexSet};

/// A mapping from label index to the ordered rows carrying it. Key order is
/// deterministic (ascending label index).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByClassMap {
    map: BTreeMap<usize, Vec<usize>>,
}

impl ByClassMap {
    /// Group the given rows of a dataset by label.
    #[must_use]
    pub fn from_dataset(dataset: &Dataset, rows: &IndexSet) -> Self {
        let mut map: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for row in rows.iter() {
            map.entry(dataset.label(row)).or_default().push(row);
        }
        Self { map }
    }

    /// Build directly from `(label, rows)` entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (usize, Vec<usize>)>) -> Self {
        Self {
            map: entries.into_iter().collect(),
        }
    }

    /// The label indices present, in ascending order.
    pub fn classes(&self) -> impl Iterator<Item = usize> + '_ {
        self.map.keys().copied()
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn nb_classes(&self) -> usize {
        self.map.len()
    }

    /// Total number of rows across all labels.
    #[must_use]
    pub fn size(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    /// True when exactly one label is present.
    #[must_use]
    pub fn is_pure(&self) -> bool {
        self.map.len() == 1
    }

    /// Rows carrying `label`, if any.
    #[must_use]
    pub fn rows(&self, label: usize) -> Option<&[usize]> {
        self.map.get(&label).map(Vec::as_slice)
    }

    /// Iterate `(label, rows)` in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        self.map.iter().map(|(&l, v)| (l, v.as_slice()))
    }

    /// All rows, flattened into an ordered [`IndexSet`].
    #[must_use]
    pub fn index_set(&self) -> IndexSet {
        IndexSet::from_indices(self.map.values().flatten().copied().collect())
    }

    /// Draw one exemplar row per class, uniformly at random. Classes with no
    /// rows are skipped. Returns `(label, row)` pairs in ascending label
    /// order.
    #[must_use]
    pub fn pick_one_by_class<R: Rng>(&self, rng: &mut R) -> Vec<(usize, usize)> {
        self.map
            .iter()
            .filter_map(|(&label, rows)| rows.choose(rng).map(|&row| (label, row)))
            .collect()
    }

    /// Per-class row counts as a dense distribution over `nb_classes` labels,
    /// normalised to sum to one.
    #[must_use]
    pub fn distribution(&self, nb_classes: usize) -> Vec<f64> {
        let mut counts = vec![0.0f64; nb_classes];
        for (&label, rows) in &self.map {
            counts[label] = rows.len() as f64;
        }
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            counts.iter_mut().for_each(|c| *c /= total);
        }
        counts
    }
}
