//! Labelled time series datasets, class maps, transforms and subset
//! statistics. Pure data layer shared by the classifiers; no file I/O here.

mod bcm;
mod dataset;
mod error;
mod stats;
mod transform;

pub use bcm::ByClassMap;
pub use dataset::{Dataset, DatasetHeader, IndexSet};
pub use error::DataError;
pub use stats::{subset_mean, subset_stddev};
pub use transform::{derive, meannorm, minmax, unitlength, zscore};
