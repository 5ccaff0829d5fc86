//! JSON run reports: one object per run, written whole or not at all.

use std::path::Path;
use std::time::Duration;

use elastica_data::DatasetHeader;
use serde::Serialize;
use tracing::info;

use crate::error::IoError;

/// Shape summary of one dataset split.
#[derive(Debug, Clone, Serialize)]
pub struct SplitInfo {
    /// Number of rows.
    pub size: usize,
    /// Number of classes in the encoder.
    pub nb_classes: usize,
    /// Shortest series length.
    pub length_min: usize,
    /// Longest series length.
    pub length_max: usize,
    /// Channel count.
    pub dim: usize,
}

impl SplitInfo {
    /// Summarise a dataset header.
    #[must_use]
    pub fn from_header(header: &DatasetHeader) -> Self {
        Self {
            size: header.size(),
            nb_classes: header.nb_classes(),
            length_min: header.length_min(),
            length_max: header.length_max(),
            dim: header.dim(),
        }
    }
}

/// Both splits of a named dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    /// Dataset name as on disk.
    pub name: String,
    /// Training split summary.
    pub train: SplitInfo,
    /// Test split summary.
    pub test: SplitInfo,
}

/// One classification phase (LOOCV selection or test evaluation).
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    /// Correctly classified rows.
    pub nb_correct: usize,
    /// Rows evaluated.
    pub total: usize,
    /// `nb_correct / total`.
    pub accuracy: f64,
    /// Wall time in nanoseconds.
    pub time_ns: u128,
    /// Human-readable wall time.
    pub time: String,
}

impl PhaseReport {
    /// Build a phase report from raw counts and elapsed time.
    #[must_use]
    pub fn new(nb_correct: usize, total: usize, time: Duration) -> Self {
        Self {
            nb_correct,
            total,
            accuracy: if total == 0 {
                0.0
            } else {
                nb_correct as f64 / total as f64
            },
            time_ns: time.as_nanos(),
            time: format!("{time:.3?}"),
        }
    }
}

/// Selected distance of a LOOCV run.
#[derive(Debug, Clone, Serialize)]
pub struct DistanceReport {
    /// Distance name with bound parameters.
    pub name: String,
    /// Index of the selected parameter in the range.
    pub selected_index: usize,
    /// The selected parameter value.
    pub selected_param: f64,
}

/// Run status recorded in every report.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// The run completed and its results are present.
    Success,
    /// The run failed; `status_message` says why.
    Error,
}

/// Full record of a LOOCV tool run.
#[derive(Debug, Clone, Serialize)]
pub struct LoocvRunReport {
    /// Dataset summary.
    pub dataset: DatasetInfo,
    /// Success or error.
    pub status: RunStatus,
    /// Failure description, present on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    /// Selected distance, absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<DistanceReport>,
    /// Training-phase results, absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loocv_train: Option<PhaseReport>,
    /// Test-phase results, absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loocv_test: Option<PhaseReport>,
}

impl LoocvRunReport {
    /// An error record carrying only the dataset summary and the message.
    #[must_use]
    pub fn error(dataset: DatasetInfo, message: String) -> Self {
        Self {
            dataset,
            status: RunStatus::Error,
            status_message: Some(message),
            distance: None,
            loocv_train: None,
            loocv_test: None,
        }
    }
}

/// Full record of an `nnk` tool run.
#[derive(Debug, Clone, Serialize)]
pub struct NnkRunReport {
    /// Dataset summary.
    pub dataset: DatasetInfo,
    /// Success or error.
    pub status: RunStatus,
    /// Failure description, present on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    /// Distance name with parameters.
    pub distance: String,
    /// Normalisation applied before the transform.
    pub normalisation: String,
    /// Transform applied to the series.
    pub transform: String,
    /// Number of neighbours.
    pub k: usize,
    /// Run seed.
    pub seed: u64,
    /// Test results, absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PhaseReport>,
}

/// Serialize a report as pretty JSON into `path`.
///
/// # Errors
///
/// Returns [`IoError::WriteFile`] when the file cannot be written.
pub fn write_json<T: Serialize>(path: &Path, report: &T) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(report).expect("reports serialize infallibly");
    std::fs::write(path, json + "\n").map_err(|source| IoError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "report written");
    Ok(())
}
