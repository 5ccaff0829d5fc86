//! Dataset loading (UCR TS format) and JSON run reports for the elastica
//! command line tools.

mod error;
mod report;
mod ts;

pub use error::IoError;
pub use report::{
    write_json, DatasetInfo, DistanceReport, LoocvRunReport, NnkRunReport, PhaseReport,
    RunStatus, SplitInfo,
};
pub use ts::{load_ucr_pair, read_ts_file, TrainTest, TsFile};
