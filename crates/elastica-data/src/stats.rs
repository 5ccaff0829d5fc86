//! Pooled statistics over dataset subsets, used to scale distance parameter
//! distributions (gap values, tolerances, penalties).

use crate::dataset::{Dataset, IndexSet};

/// Pooled mean over every value of the referenced rows.
#[must_use]
pub fn subset_mean(dataset: &Dataset, rows: &IndexSet) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for row in rows.iter() {
        let s = dataset.series(row);
        sum += s.as_slice().iter().sum::<f64>();
        count += s.as_slice().len();
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Pooled sample standard deviation over every value of the referenced rows.
/// Zero when fewer than two values are pooled.
#[must_use]
pub fn subset_stddev(dataset: &Dataset, rows: &IndexSet) -> f64 {
    let mean = subset_mean(dataset, rows);
    let mut acc = 0.0;
    let mut count = 0usize;
    for row in rows.iter() {
        for &v in dataset.series(row).as_slice() {
            acc += (v - mean) * (v - mean);
            count += 1;
        }
    }
    if count < 2 {
        0.0
    } else {
        (acc / (count - 1) as f64).sqrt()
    }
}
