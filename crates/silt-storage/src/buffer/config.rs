//! Buffer pool configuration.

use std::path::PathBuf;

use silt_common::constants::{DEFAULT_PAGE_SIZE, DEFAULT_POOL_PAGES};

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Size in bytes of every page.
    pub page_size: usize,
    /// Maximum number of pages resident in memory at the same time.
    pub page_count: usize,
    /// Directory holding the segment files.
    pub directory: PathBuf,
}

impl BufferPoolConfig {
    /// Creates a new configuration with the given page size and frame
    /// count, rooted at the current directory.
    pub fn new(page_size: usize, page_count: usize) -> Self {
        Self {
            page_size,
            page_count,
            directory: PathBuf::from("."),
        }
    }

    /// Sets the directory holding the segment files.
    #[must_use]
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Returns the total memory used by the frame buffers.
    pub fn memory_usage(&self) -> usize {
        self.page_count * self.page_size
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.page_size == 0 {
            return Err("page_size must be > 0");
        }
        if self.page_count == 0 {
            return Err("page_count must be > 0");
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_POOL_PAGES)
    }
}
