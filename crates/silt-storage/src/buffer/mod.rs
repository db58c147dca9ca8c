//! Buffer pool manager for silt.
//!
//! The buffer pool manages a fixed-size pool of in-memory page frames,
//! providing cached, pinned access to disk pages:
//!
//! - **Fix/Unfix**: pin counting plus a per-frame reader/writer latch held
//!   for the lifetime of each fix
//! - **Dirty Tracking**: modified pages are written back at eviction and at
//!   pool destruction
//! - **Two-Queue Replacement**: an admission FIFO filters one-shot scans;
//!   re-referenced pages graduate to a hot LRU
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                      BufferPool                       │
//! │   page table           frames             replacer    │
//! │  HashMap<PageId,   [Frame 0..N-1]      FIFO ++ LRU    │
//! │    FrameId>        data | pin | dirty  (page ids)     │
//! └───────────────────────────┬───────────────────────────┘
//!                             │ read_block / write_block
//!                             ▼
//!                 segment files ("0", "1", …)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use silt_storage::buffer::{AccessMode, BufferPool, BufferPoolConfig};
//! use silt_common::types::PageId;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BufferPoolConfig::new(8192, 1000).with_directory("/var/lib/silt");
//!     let pool = BufferPool::new(config)?;
//!
//!     // Fix a page exclusively, modify it, release it dirty.
//!     let mut page = pool.fix(PageId::new(42), AccessMode::Exclusive)?;
//!     page.data_mut()[0] = 1;
//!     pool.unfix(page, true)?;
//!
//!     // Dropping the pool writes dirty pages back.
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod eviction;
mod frame;
mod latch;
mod pool;

pub use config::BufferPoolConfig;
pub use error::{BufferError, BufferResult};
pub use eviction::TwoQueueReplacer;
pub use frame::{BufferFrame, FrameId};
pub use latch::{AccessMode, FixedPage};
pub use pool::BufferPool;

/// Statistics for buffer pool monitoring.
#[derive(Debug, Clone, Default)]
pub struct BufferPoolStats {
    /// Total number of fixes.
    pub fetches: u64,
    /// Number of fixes served from memory.
    pub hits: u64,
    /// Number of fixes that required a disk read.
    pub misses: u64,
    /// Number of pages evicted.
    pub evictions: u64,
    /// Number of dirty pages written back at eviction.
    pub flushes: u64,
    /// Current number of pinned frames.
    pub pinned_frames: usize,
    /// Current number of dirty frames.
    pub dirty_frames: usize,
}

impl BufferPoolStats {
    /// Returns the cache hit ratio (0.0 to 1.0).
    pub fn hit_ratio(&self) -> f64 {
        if self.fetches == 0 {
            0.0
        } else {
            self.hits as f64 / self.fetches as f64
        }
    }
}
