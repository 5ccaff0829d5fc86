//! Elastic distance measures for time series, computed with early abandoning
//! and pruning (EAP).
//!
//! Pure math library — zero I/O. Every kernel shares the same double-buffered
//! O(n) skeleton with per-line pruning pointers: cells left of `next_start`
//! and right of the previous line's pruning point are implicitly infinite,
//! and the computation abandons with `+∞` as soon as no cell on a line can
//! stay under the caller's upper bound. A finite result is always bit-for-bit
//! equal to the full dynamic program.
//!
//! The upper bound convention, shared by all kernels:
//! - finite value — prune and abandon against it;
//! - `+∞` — prune against a feasible diagonal/L-shaped walk bound;
//! - `NaN` — compute the full dynamic program.

mod adtw;
mod cdtw;
mod cost;
mod direct;
mod dtw;
mod erp;
mod error;
mod instance;
mod lcss;
mod msm;
mod series;
mod twe;
mod util;
mod wdtw;

pub use adtw::{adtw, adtw_univariate};
pub use cdtw::{cdtw, cdtw_univariate};
pub use cost::{ad1, ade, adegv, sqe};
pub use direct::{directa, directa_univariate, lorentzian, minkowski};
pub use dtw::{dtw, dtw_univariate};
pub use erp::{erp, erp_univariate};
pub use error::DistError;
pub use instance::{Band, DistanceInstance, Elastic};
pub use lcss::{lcss, lcss_univariate};
pub use msm::{msm, msm_cost, msm_univariate};
pub use series::{TimeSeries, TimeSeriesView};
pub use twe::{twe, twe_univariate};
pub use wdtw::{generate_weights, wdtw, wdtw_univariate, WDTW_MAX_WEIGHT};
