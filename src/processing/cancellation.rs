// src/processing/cancellation.rs
//! Cooperative cancellation for long-running spectral work

use crate::error::{EegError, EegResult, ProcessingStage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag
///
/// Clones observe the same flag. Work checks it between channels and segments
/// and returns [`EegError::Cancelled`] instead of partial data.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once the token has fired
    pub fn check(&self, stage: ProcessingStage) -> EegResult<()> {
        if self.is_cancelled() {
            Err(EegError::Cancelled { stage })
        } else {
            Ok(())
        }
    }
}
