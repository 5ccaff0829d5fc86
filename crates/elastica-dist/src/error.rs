//! Error types for series validation and distance configuration.

/// Errors from time series validation and distance instance construction.
#[derive(Debug, thiserror::Error)]
pub enum DistError {
    /// Returned when a series is declared with zero channels.
    #[error("series must have at least one channel")]
    ZeroDimension,

    /// Returned when the value buffer length is not a multiple of the channel count.
    #[error("value buffer of length {len} does not split into {dim} channels")]
    ChannelMismatch {
        /// Length of the raw value buffer.
        len: usize,
        /// Declared number of channels.
        dim: usize,
    },

    /// Returned when a series contains NaN, infinity, or negative infinity.
    #[error("series contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when a distance name is not recognised.
    #[error("unknown distance \"{name}\"")]
    UnknownDistance {
        /// The name that failed to resolve.
        name: String,
    },

    /// Returned when a colon-packed distance specification has the wrong
    /// field count or an unparseable number.
    #[error("malformed distance specification \"{spec}\"")]
    MalformedSpec {
        /// The specification that failed to parse.
        spec: String,
    },

    /// Returned when a distance parameter is outside its valid range.
    #[error("invalid value {value} for parameter \"{param}\"")]
    InvalidParameter {
        /// Name of the offending parameter.
        param: &'static str,
        /// The rejected value.
        value: f64,
    },
}
