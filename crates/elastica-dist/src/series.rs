//! Time series types with validation guarantees.
//!
//! A series stores `dim` parallel channels interleaved by timestep: the value
//! of channel `d` at time `t` sits at offset `t * dim + d`. Univariate series
//! (`dim == 1`) are the common case and index directly.

use std::ops::Index;

use crate::error::DistError;

/// Owned, validated time series. All values are finite; the buffer length is a
/// multiple of the channel count. May have zero timesteps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    values: Vec<f64>,
    dim: usize,
}

impl TimeSeries {
    /// Create a univariate series, validating that all values are finite.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(values: Vec<f64>) -> Result<Self, DistError> {
        Self::multivariate(values, 1)
    }

    /// Create a series with `dim` interleaved channels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistError::ZeroDimension`] | `dim == 0` |
    /// | [`DistError::ChannelMismatch`] | `values.len() % dim != 0` |
    /// | [`DistError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn multivariate(values: Vec<f64>, dim: usize) -> Result<Self, DistError> {
        if dim == 0 {
            return Err(DistError::ZeroDimension);
        }
        if values.len() % dim != 0 {
            return Err(DistError::ChannelMismatch {
                len: values.len(),
                dim,
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(DistError::NonFiniteValue { index });
        }
        Ok(Self { values, dim })
    }

    /// Borrow this series as a zero-copy view.
    #[must_use]
    pub fn as_view(&self) -> TimeSeriesView<'_> {
        TimeSeriesView {
            values: &self.values,
            dim: self.dim,
        }
    }

    /// Return the number of timesteps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len() / self.dim
    }

    /// Return true if the series has no timesteps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return the number of channels.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Return the raw interleaved value buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Consume and return the inner vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}

impl AsRef<[f64]> for TimeSeries {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

impl TryFrom<Vec<f64>> for TimeSeries {
    type Error = DistError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

/// Borrowed, validated view into a time series. Zero-copy reference.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesView<'a> {
    values: &'a [f64],
    dim: usize,
}

impl<'a> TimeSeriesView<'a> {
    /// Create a univariate view, validating that all values are finite.
    ///
    /// # Errors
    ///
    /// Returns [`DistError::NonFiniteValue`] if any value is NaN or infinite.
    pub fn new(values: &'a [f64]) -> Result<Self, DistError> {
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(DistError::NonFiniteValue { index });
        }
        Ok(Self { values, dim: 1 })
    }

    /// Return the number of timesteps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len() / self.dim
    }

    /// Return true if the view has no timesteps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return the number of channels.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Return the raw interleaved value buffer.
    #[must_use]
    pub fn as_slice(&self) -> &'a [f64] {
        self.values
    }
}

impl Index<usize> for TimeSeriesView<'_> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl AsRef<[f64]> for TimeSeriesView<'_> {
    fn as_ref(&self) -> &[f64] {
        self.values
    }
}
