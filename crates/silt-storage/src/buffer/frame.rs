//! Buffer frame - a slot in the buffer pool that holds a page.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock, RwLockReadGuard};
use silt_common::types::PageId;

/// Owned shared guard over a frame's bytes, held for the lifetime of a fix.
pub(crate) type FrameReadGuard = ArcRwLockReadGuard<RawRwLock, Box<[u8]>>;

/// Owned exclusive guard over a frame's bytes, held for the lifetime of a
/// fix (and by the loader while the page is read from disk).
pub(crate) type FrameWriteGuard = ArcRwLockWriteGuard<RawRwLock, Box<[u8]>>;

/// Frame identifier - index into the buffer pool's frame array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(usize);

impl FrameId {
    /// Creates a new frame ID.
    #[inline]
    pub(crate) const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Returns the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A buffer frame holds a single page in memory.
///
/// Each frame has a data buffer of exactly `page_size` bytes behind a
/// reader/writer latch, plus identity and residency metadata. The metadata
/// fields are atomics so statistics can read them without a lock, but they
/// are only mutated while the pool lock is held.
///
/// `page_id` and `dirty` are meaningful only while the frame is mapped in
/// the pool's page table; a free slot carries leftovers from its previous
/// residency.
pub struct BufferFrame {
    /// Frame ID (index in the frame array).
    frame_id: FrameId,
    /// Page data buffer, behind the frame latch.
    data: Arc<RwLock<Box<[u8]>>>,
    /// Page ID currently carried by this frame.
    page_id: AtomicU64,
    /// Pin count (number of outstanding fixes).
    pin_count: AtomicU32,
    /// Whether the page was modified since it was loaded or last written
    /// back.
    dirty: AtomicBool,
}

impl BufferFrame {
    /// Creates a new empty buffer frame with a zeroed buffer.
    pub(crate) fn new(frame_id: FrameId, page_size: usize) -> Self {
        Self {
            frame_id,
            data: Arc::new(RwLock::new(vec![0u8; page_size].into_boxed_slice())),
            page_id: AtomicU64::new(0),
            pin_count: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
        }
    }

    /// Returns the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the page ID carried by this frame.
    #[inline]
    pub fn page_id(&self) -> PageId {
        PageId::new(self.page_id.load(Ordering::Acquire))
    }

    /// Assigns the frame to a page. Requires pin count zero.
    #[inline]
    pub(crate) fn set_page_id(&self, page_id: PageId) {
        self.page_id.store(page_id.as_u64(), Ordering::Release);
    }

    /// Returns the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Increments the pin count and returns the new value.
    #[inline]
    pub(crate) fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value.
    #[inline]
    pub(crate) fn unpin(&self) -> u32 {
        let old = self.pin_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(old > 0, "unpinned frame with pin_count = 0");
        old - 1
    }

    /// Returns true if the frame is pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Returns true if the frame is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Sets or clears the dirty flag.
    #[inline]
    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::Release);
    }

    /// Acquires the frame latch in shared mode, as an owned guard.
    pub(crate) fn latch_shared(&self) -> FrameReadGuard {
        self.data.read_arc()
    }

    /// Acquires the frame latch in exclusive mode, as an owned guard.
    pub(crate) fn latch_exclusive(&self) -> FrameWriteGuard {
        self.data.write_arc()
    }

    /// Borrows the page bytes for reading.
    ///
    /// Used for write-back, where the frame is unpinned and therefore has
    /// no latch holders.
    pub(crate) fn read_data(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.data.read()
    }
}

impl std::fmt::Debug for BufferFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferFrame")
            .field("frame_id", &self.frame_id)
            .field("page_id", &self.page_id())
            .field("pin_count", &self.pin_count())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
