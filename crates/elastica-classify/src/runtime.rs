//! Worker pool sizing, deterministic seed derivation and cooperative
//! cancellation.
//!
//! Work items (trees, LOOCV queries) run on a fixed-size rayon pool; each
//! item derives its own PRNG from the run seed and its identifier, so results
//! do not depend on scheduling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ClassifyError;

/// Build a worker pool with `nb_threads` threads; `0` auto-detects.
///
/// # Errors
///
/// Returns [`ClassifyError::PoolBuild`] when the pool cannot be created.
pub fn thread_pool(nb_threads: usize) -> Result<rayon::ThreadPool, ClassifyError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(nb_threads)
        .build()
        .map_err(|source| ClassifyError::PoolBuild { source })
}

/// Derive a child seed from the run seed and a work item identifier.
#[must_use]
pub fn child_seed(seed: u64, index: u64) -> u64 {
    seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Cooperative cancellation flag, checked between work items. Cloning shares
/// the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, unraised token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag; running work stops at the next check point.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once the flag has been raised.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Error when the flag has been raised, unit otherwise.
    pub(crate) fn check(&self) -> Result<(), ClassifyError> {
        if self.is_cancelled() {
            Err(ClassifyError::Cancelled)
        } else {
            Ok(())
        }
    }
}
