// cancel.rs - Cooperative cancellation for long-running loops

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{MsaError, Result};

/// A token for cooperative cancellation.
///
/// Parallel loops check it at row-block, column, partition and window
/// boundaries. Results are only published after a full pass, so an aborted
/// pass leaves the caller's data unchanged.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Cancellation checkpoint
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MsaError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
