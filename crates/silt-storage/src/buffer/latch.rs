//! Fixed-page handles.
//!
//! A [`FixedPage`] is the handle returned by [`BufferPool::fix`]: it keeps
//! the frame pinned and holds the frame latch in the requested mode until
//! the handle is passed back to [`BufferPool::unfix`].

use std::sync::Arc;

use silt_common::types::PageId;

use super::frame::{BufferFrame, FrameReadGuard, FrameWriteGuard};
use super::pool::BufferPool;

/// Requested access mode for [`BufferPool::fix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Shared access: any number of concurrent readers.
    Shared,
    /// Exclusive access: a single writer, no concurrent readers.
    Exclusive,
}

impl AccessMode {
    /// Returns true for [`AccessMode::Exclusive`].
    #[inline]
    pub fn is_exclusive(self) -> bool {
        matches!(self, Self::Exclusive)
    }
}

/// The held frame latch, in whichever mode the fix requested.
pub(crate) enum PageLatch {
    Shared(FrameReadGuard),
    Exclusive(FrameWriteGuard),
}

/// A pinned, latched page handle returned by [`BufferPool::fix`].
///
/// The handle keeps the frame pinned (so it cannot be evicted) and holds
/// the frame's reader/writer latch for the lifetime of the fix. Pass it to
/// [`BufferPool::unfix`] to release it and record whether the page was
/// modified; a handle that is merely dropped releases its pin and latch
/// without marking the page dirty.
pub struct FixedPage<'a> {
    pub(crate) pool: &'a BufferPool,
    pub(crate) frame: Arc<BufferFrame>,
    /// `None` only after `unfix` has taken the latch; the handle is
    /// consumed at that point.
    pub(crate) latch: Option<PageLatch>,
}

impl<'a> FixedPage<'a> {
    pub(crate) fn new(pool: &'a BufferPool, frame: Arc<BufferFrame>, latch: PageLatch) -> Self {
        Self {
            pool,
            frame,
            latch: Some(latch),
        }
    }

    /// Returns the id of the fixed page.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.frame.page_id()
    }

    /// Returns true if the page is held exclusively.
    #[inline]
    pub fn is_exclusive(&self) -> bool {
        matches!(self.latch, Some(PageLatch::Exclusive(_)))
    }

    /// Returns the page bytes (exactly `page_size` long).
    pub fn data(&self) -> &[u8] {
        match &self.latch {
            Some(PageLatch::Shared(guard)) => guard,
            Some(PageLatch::Exclusive(guard)) => guard,
            None => unreachable!("latch held for the lifetime of the handle"),
        }
    }

    /// Returns the page bytes for modification.
    ///
    /// # Panics
    ///
    /// Panics if the page was fixed in shared mode.
    pub fn data_mut(&mut self) -> &mut [u8] {
        match &mut self.latch {
            Some(PageLatch::Exclusive(guard)) => guard,
            Some(PageLatch::Shared(_)) => panic!("data_mut on a page fixed in shared mode"),
            None => unreachable!("latch held for the lifetime of the handle"),
        }
    }
}

impl Drop for FixedPage<'_> {
    fn drop(&mut self) {
        // Dropped without an explicit unfix: release the pin and latch
        // without marking the page dirty.
        if let Some(latch) = self.latch.take() {
            let _ = self.pool.finish_unfix(&self.frame, latch, false);
        }
    }
}

impl std::fmt::Debug for FixedPage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedPage")
            .field("page_id", &self.page_id())
            .field("frame_id", &self.frame.frame_id())
            .field("exclusive", &self.is_exclusive())
            .finish()
    }
}
