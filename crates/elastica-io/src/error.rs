//! I/O error types for elastica-io.

use std::path::PathBuf;

use elastica_data::DataError;

/// Errors from TS file reading and report writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("cannot read file {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a TS file line cannot be parsed.
    #[error("parse error in {path} line {line}: {message}")]
    Parse {
        /// Path to the TS file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Returned when a TS file contains a header but no data rows.
    #[error("no data rows in {path}")]
    EmptyFile {
        /// Path to the TS file.
        path: PathBuf,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Wraps a dataset assembly error.
    #[error(transparent)]
    Data(#[from] DataError),
}
