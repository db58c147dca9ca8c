//! Buffer pool errors.

use silt_common::types::PageId;
use thiserror::Error;

use crate::file::IoError;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer pool operations.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum BufferError {
    /// Every resident frame is pinned; no eviction victim can be chosen.
    #[error("buffer is full: all {page_count} frames are pinned")]
    BufferFull { page_count: usize },

    /// `unfix` of a frame that is not pinned or does not belong to this
    /// pool.
    #[error("invalid unfix of page {page_id}")]
    InvalidUnfix { page_id: PageId },

    /// I/O error from the segment file layer.
    #[error("file I/O error: {0}")]
    Io(#[from] IoError),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl BufferError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if this is a transient error that can be retried once
    /// some fixes have been released.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BufferFull { .. })
    }
}
