//! Buffer pool implementation.
//!
//! The buffer pool manages a fixed-size cache of pages in memory,
//! handling page fixing, eviction, and write-back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use silt_common::types::PageId;
use tracing::{debug, error};

use super::config::BufferPoolConfig;
use super::error::{BufferError, BufferResult};
use super::eviction::TwoQueueReplacer;
use super::frame::{BufferFrame, FrameId, FrameWriteGuard};
use super::latch::{AccessMode, FixedPage, PageLatch};
use super::BufferPoolStats;
use crate::file::{FileHandle, SegmentManager};

/// The buffer pool mediates between fixed-size page frames in memory and
/// per-segment files on disk.
///
/// It provides:
/// - `fix`/`unfix`: pinned, latched access to page bytes
/// - Two-queue (2Q) replacement: admission FIFO plus hot LRU
/// - Dirty page tracking with write-back at eviction and destruction
///
/// # Locking
///
/// A single pool mutex protects the page table, both replacement queues
/// and every pin-count transition. Frame latches are acquired after the
/// pool lock is released, so holding a page never blocks unrelated pages.
/// The two exceptions are deliberate: a freshly repurposed frame's
/// exclusive latch is taken before the mapping is published (it has no
/// other holder, so this cannot block), and a dirty victim is written
/// back under the pool lock (it is unpinned and about to leave the map,
/// so no fixer can reach it).
pub struct BufferPool {
    /// Configuration.
    config: BufferPoolConfig,
    /// Array of buffer frames; slots are repurposed across residencies.
    frames: Vec<Arc<BufferFrame>>,
    /// Page table, replacement queues and free slots.
    state: Mutex<PoolState>,
    /// Per-segment backing files.
    segments: SegmentManager,
    /// Fix counter for statistics.
    fetch_count: AtomicU64,
    /// Hit counter for statistics.
    hit_count: AtomicU64,
    /// Miss counter for statistics.
    miss_count: AtomicU64,
    /// Eviction counter for statistics.
    eviction_count: AtomicU64,
    /// Write-back counter for statistics.
    flush_count: AtomicU64,
}

/// Mutable pool state, all guarded by the pool mutex.
struct PoolState {
    /// Maps a page id to the frame slot carrying it.
    page_table: HashMap<PageId, FrameId>,
    /// Replacement queues; tracks exactly the keys of `page_table`.
    replacer: TwoQueueReplacer,
    /// Slots not carrying any page.
    free_frames: Vec<FrameId>,
}

impl BufferPool {
    /// Creates a new buffer pool with the given configuration.
    pub fn new(config: BufferPoolConfig) -> BufferResult<Self> {
        config.validate().map_err(BufferError::config)?;

        let frames: Vec<Arc<BufferFrame>> = (0..config.page_count)
            .map(|i| Arc::new(BufferFrame::new(FrameId::new(i), config.page_size)))
            .collect();

        // Popped from the back, so slot 0 is handed out first.
        let free_frames: Vec<FrameId> = (0..config.page_count).rev().map(FrameId::new).collect();

        let segments = SegmentManager::new(&config.directory)?;

        Ok(Self {
            frames,
            state: Mutex::new(PoolState {
                page_table: HashMap::with_capacity(config.page_count),
                replacer: TwoQueueReplacer::new(config.page_count),
                free_frames,
            }),
            segments,
            config,
            fetch_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
        })
    }

    /// Fixes a page in the requested access mode.
    ///
    /// If the page is resident, its frame is pinned and latched directly.
    /// Otherwise it is loaded into a free slot, evicting an unpinned page
    /// (written back first if dirty) when the pool is at capacity.
    ///
    /// Blocks while another fix holds the page's latch in an incompatible
    /// mode. Fails with [`BufferError::BufferFull`] when every resident
    /// frame is pinned, without touching pool state.
    pub fn fix(&self, page_id: PageId, mode: AccessMode) -> BufferResult<FixedPage<'_>> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        loop {
            let mut state = self.state.lock();

            let Some(frame_id) = state.page_table.get(&page_id).copied() else {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                return self.load_and_fix(state, page_id, mode);
            };

            let frame = Arc::clone(&self.frames[frame_id.index()]);
            frame.pin();
            state.replacer.record_access(page_id);
            drop(state);

            // May block behind the loading fix or an exclusive holder.
            let latch = match mode {
                AccessMode::Shared => PageLatch::Shared(frame.latch_shared()),
                AccessMode::Exclusive => PageLatch::Exclusive(frame.latch_exclusive()),
            };

            // A failed load may have rolled the mapping back while we
            // waited on the latch; re-check before handing out the frame.
            let mut state = self.state.lock();
            if state.page_table.get(&page_id) == Some(&frame_id) {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                drop(state);
                return Ok(FixedPage::new(self, frame, latch));
            }

            // Back out and retry; the last waiter returns the orphaned
            // slot to the free list.
            if frame.unpin() == 0 {
                state.free_frames.push(frame_id);
            }
            drop(latch);
            drop(state);
        }
    }

    /// Releases a fix, merging `mark_dirty` into the frame's dirty flag
    /// and refreshing the page's LRU position.
    ///
    /// Fails with [`BufferError::InvalidUnfix`] if the handle belongs to a
    /// different pool; the handle is still released against its own pool.
    pub fn unfix(&self, mut page: FixedPage<'_>, mark_dirty: bool) -> BufferResult<()> {
        if !std::ptr::eq(page.pool, self) {
            return Err(BufferError::InvalidUnfix {
                page_id: page.page_id(),
            });
        }

        let frame = Arc::clone(&page.frame);
        match page.latch.take() {
            Some(latch) => self.finish_unfix(&frame, latch, mark_dirty),
            None => Err(BufferError::InvalidUnfix {
                page_id: frame.page_id(),
            }),
        }
    }

    /// Returns the page ids currently in the admission FIFO, head first.
    ///
    /// Diagnostic; consistent but not atomic with concurrent fixes.
    pub fn fifo_snapshot(&self) -> Vec<PageId> {
        self.state.lock().replacer.fifo_pages()
    }

    /// Returns the page ids currently in the hot LRU, head first.
    ///
    /// Diagnostic; consistent but not atomic with concurrent fixes.
    pub fn lru_snapshot(&self) -> Vec<PageId> {
        self.state.lock().replacer.lru_pages()
    }

    /// Returns true if a page is resident.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.state.lock().page_table.contains_key(&page_id)
    }

    /// Returns the page size in bytes.
    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// Returns the number of frames in the pool.
    pub fn page_count(&self) -> usize {
        self.config.page_count
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let mut pinned = 0;
        let mut dirty = 0;

        for frame in &self.frames {
            if frame.is_pinned() {
                pinned += 1;
            }
            if frame.is_dirty() {
                dirty += 1;
            }
        }

        BufferPoolStats {
            fetches: self.fetch_count.load(Ordering::Relaxed),
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            evictions: self.eviction_count.load(Ordering::Relaxed),
            flushes: self.flush_count.load(Ordering::Relaxed),
            pinned_frames: pinned,
            dirty_frames: dirty,
        }
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    /// Loads `page_id` into a free or evicted slot and returns it fixed.
    ///
    /// Entered with the pool lock held and the page absent from the table.
    fn load_and_fix<'p>(
        &'p self,
        mut state: MutexGuard<'_, PoolState>,
        page_id: PageId,
        mode: AccessMode,
    ) -> BufferResult<FixedPage<'p>> {
        let frame_id = match state.free_frames.pop() {
            Some(frame_id) => frame_id,
            None => self.evict_into_free(&mut state)?,
        };

        let frame = Arc::clone(&self.frames[frame_id.index()]);
        debug_assert_eq!(frame.pin_count(), 0, "repurposed a pinned slot");
        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.pin();
        state.page_table.insert(page_id, frame_id);
        state.replacer.admit(page_id);

        // Take the exclusive latch before publishing the mapping further:
        // the slot has no other holder, so this cannot block. Fixers that
        // find the mapping will queue on the latch until the load is done.
        let mut load_latch = frame.latch_exclusive();
        drop(state);

        if let Err(err) = self.read_page(page_id, &mut load_latch[..]) {
            // Roll the half-created residency back before surfacing the
            // error, so the bytes are never observable under the new id.
            let mut state = self.state.lock();
            state.page_table.remove(&page_id);
            state.replacer.remove(page_id);
            if frame.unpin() == 0 {
                state.free_frames.push(frame_id);
            }
            drop(load_latch);
            drop(state);
            return Err(err);
        }

        debug!(page_id = %page_id, frame = frame_id.index(), "page loaded");

        let latch = match mode {
            AccessMode::Exclusive => PageLatch::Exclusive(load_latch),
            AccessMode::Shared => PageLatch::Shared(FrameWriteGuard::downgrade(load_latch)),
        };
        Ok(FixedPage::new(self, frame, latch))
    }

    /// Evicts an unpinned page and returns its freed slot.
    ///
    /// The victim comes from the FIFO head first, then the LRU head. A
    /// dirty victim is written back before its mapping is removed. Fails
    /// with [`BufferError::BufferFull`] when every resident frame is
    /// pinned, leaving the pool state untouched.
    fn evict_into_free(&self, state: &mut PoolState) -> BufferResult<FrameId> {
        let victim = {
            let page_table = &state.page_table;
            let replacer = &state.replacer;
            replacer.select_victim(|page_id| {
                page_table
                    .get(&page_id)
                    .copied()
                    .filter(|frame_id| self.frames[frame_id.index()].pin_count() == 0)
            })
        };

        let Some((victim_id, frame_id)) = victim else {
            return Err(BufferError::BufferFull {
                page_count: self.config.page_count,
            });
        };

        let frame = &self.frames[frame_id.index()];
        if frame.is_dirty() {
            self.write_back(frame)?;
            frame.set_dirty(false);
            self.flush_count.fetch_add(1, Ordering::Relaxed);
        }

        state.page_table.remove(&victim_id);
        state.replacer.remove(victim_id);
        self.eviction_count.fetch_add(1, Ordering::Relaxed);
        debug!(page_id = %victim_id, frame = frame_id.index(), "page evicted");

        Ok(frame_id)
    }

    /// Completes an unfix: pin decrement, dirty merge, LRU refresh, latch
    /// release, all under the pool lock.
    pub(crate) fn finish_unfix(
        &self,
        frame: &Arc<BufferFrame>,
        latch: PageLatch,
        mark_dirty: bool,
    ) -> BufferResult<()> {
        let mut state = self.state.lock();

        if frame.pin_count() == 0 {
            return Err(BufferError::InvalidUnfix {
                page_id: frame.page_id(),
            });
        }

        if mark_dirty {
            // Dirtiness is monotonic within a residency; only a successful
            // write-back clears it.
            frame.set_dirty(true);
        }
        frame.unpin();
        state.replacer.record_release(frame.page_id());
        drop(latch);
        drop(state);
        Ok(())
    }

    /// Fills `buf` with the page's on-disk bytes; unwritten ranges read as
    /// zeros.
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> BufferResult<()> {
        let file = self.segments.segment_file(page_id.segment())?;
        let offset = page_id.local() * self.config.page_size as u64;
        file.read_block(buf, offset)?;
        Ok(())
    }

    /// Writes a frame's bytes back to its segment file.
    ///
    /// The frame must be unpinned (write-back) or the pool must be shutting
    /// down, so the data borrow cannot block.
    fn write_back(&self, frame: &BufferFrame) -> BufferResult<()> {
        let page_id = frame.page_id();
        let file = self.segments.segment_file(page_id.segment())?;
        let offset = page_id.local() * self.config.page_size as u64;
        let data = frame.read_data();
        file.write_block(&data, offset)?;
        Ok(())
    }
}

impl Drop for BufferPool {
    /// Writes every dirty resident page back to its segment file.
    ///
    /// Outstanding fixes at destruction are a programming error; a
    /// write-back failure is logged and does not prevent the remaining
    /// frames from being flushed.
    fn drop(&mut self) {
        let state = self.state.lock();
        for (&page_id, &frame_id) in &state.page_table {
            let frame = &self.frames[frame_id.index()];
            debug_assert_eq!(
                frame.pin_count(),
                0,
                "page {page_id} still fixed at pool destruction"
            );
            if frame.is_dirty() {
                if let Err(err) = self.write_back(frame) {
                    error!(page_id = %page_id, error = %err, "failed to write back dirty page at shutdown");
                }
            }
        }
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("page_size", &self.config.page_size)
            .field("page_count", &self.config.page_count)
            .field("resident_pages", &self.state.lock().page_table.len())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_common::types::SegmentId;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn create_test_pool(page_size: usize, page_count: usize) -> (BufferPool, TempDir) {
        let dir = tempdir().unwrap();
        let config = BufferPoolConfig::new(page_size, page_count).with_directory(dir.path());
        (BufferPool::new(config).unwrap(), dir)
    }

    fn ids(raw: &[u64]) -> Vec<PageId> {
        raw.iter().copied().map(PageId::new).collect()
    }

    fn fix_unfix(pool: &BufferPool, page_id: u64) {
        let page = pool.fix(PageId::new(page_id), AccessMode::Shared).unwrap();
        pool.unfix(page, false).unwrap();
    }

    #[test]
    fn test_pool_creation() {
        let (pool, _dir) = create_test_pool(16, 3);
        assert_eq!(pool.page_size(), 16);
        assert_eq!(pool.page_count(), 3);
        assert!(pool.fifo_snapshot().is_empty());
        assert!(pool.lru_snapshot().is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = BufferPoolConfig::new(0, 3);
        assert!(matches!(
            BufferPool::new(config),
            Err(BufferError::Config { .. })
        ));
    }

    #[test]
    fn test_first_fix_enters_fifo() {
        let (pool, _dir) = create_test_pool(16, 3);

        let page = pool.fix(PageId::new(1), AccessMode::Shared).unwrap();
        assert_eq!(page.page_id(), PageId::new(1));
        assert_eq!(page.data().len(), 16);
        pool.unfix(page, false).unwrap();

        assert_eq!(pool.fifo_snapshot(), ids(&[1]));
        assert!(pool.lru_snapshot().is_empty());
        assert_eq!(pool.stats().dirty_frames, 0);
    }

    #[test]
    fn test_second_reference_promotes_to_lru() {
        let (pool, _dir) = create_test_pool(16, 3);

        fix_unfix(&pool, 1);
        fix_unfix(&pool, 1);

        assert!(pool.fifo_snapshot().is_empty());
        assert_eq!(pool.lru_snapshot(), ids(&[1]));

        // Further references keep it in the LRU.
        fix_unfix(&pool, 1);
        assert!(pool.fifo_snapshot().is_empty());
        assert_eq!(pool.lru_snapshot(), ids(&[1]));
    }

    #[test]
    fn test_clean_eviction_follows_fifo_order() {
        let (pool, dir) = create_test_pool(16, 3);

        fix_unfix(&pool, 1);
        fix_unfix(&pool, 2);
        fix_unfix(&pool, 3);
        assert_eq!(pool.fifo_snapshot(), ids(&[1, 2, 3]));

        fix_unfix(&pool, 4);
        assert_eq!(pool.fifo_snapshot(), ids(&[2, 3, 4]));
        assert!(pool.lru_snapshot().is_empty());
        assert!(!pool.contains(PageId::new(1)));

        // Page 1 was clean, so nothing was written to its segment file.
        let segment = dir.path().join("0");
        assert_eq!(std::fs::metadata(segment).unwrap().len(), 0);
    }

    #[test]
    fn test_exclusive_fixes_serialize() {
        let (pool, _dir) = create_test_pool(16, 3);
        let pool = std::sync::Arc::new(pool);

        let (started_tx, started_rx) = mpsc::channel();
        let writer = {
            let pool = std::sync::Arc::clone(&pool);
            thread::spawn(move || {
                let mut page = pool.fix(PageId::new(1), AccessMode::Exclusive).unwrap();
                started_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(50));
                page.data_mut()[0] = 7;
                pool.unfix(page, true).unwrap();
            })
        };

        started_rx.recv().unwrap();
        let reader = {
            let pool = std::sync::Arc::clone(&pool);
            thread::spawn(move || {
                // Blocks until the writer's unfix releases the latch.
                let page = pool.fix(PageId::new(1), AccessMode::Exclusive).unwrap();
                assert_eq!(page.data()[0], 7);
                pool.unfix(page, false).unwrap();
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();

        assert_eq!(pool.stats().pinned_frames, 0);
        // The second fix was a re-reference, so the page sits at the LRU
        // tail.
        assert_eq!(pool.lru_snapshot(), ids(&[1]));
    }

    #[test]
    fn test_buffer_full_when_everything_pinned() {
        let (pool, _dir) = create_test_pool(16, 3);

        let p1 = pool.fix(PageId::new(1), AccessMode::Shared).unwrap();
        let p2 = pool.fix(PageId::new(2), AccessMode::Shared).unwrap();
        let p3 = pool.fix(PageId::new(3), AccessMode::Shared).unwrap();

        let err = pool.fix(PageId::new(99), AccessMode::Shared).unwrap_err();
        assert!(matches!(err, BufferError::BufferFull { page_count: 3 }));

        // Pool state is unchanged by the failed fix.
        assert_eq!(pool.fifo_snapshot(), ids(&[1, 2, 3]));
        assert!(pool.lru_snapshot().is_empty());
        assert!(!pool.contains(PageId::new(99)));

        // Progress resumes once a pin is released.
        pool.unfix(p2, false).unwrap();
        let p99 = pool.fix(PageId::new(99), AccessMode::Shared).unwrap();
        pool.unfix(p99, false).unwrap();
        pool.unfix(p1, false).unwrap();
        pool.unfix(p3, false).unwrap();
    }

    #[test]
    fn test_dirty_eviction_writes_back_and_reloads() {
        let (pool, dir) = create_test_pool(16, 3);

        let mut page = pool.fix(PageId::new(1), AccessMode::Exclusive).unwrap();
        page.data_mut()[..5].copy_from_slice(b"hello");
        pool.unfix(page, true).unwrap();
        assert_eq!(pool.stats().dirty_frames, 1);

        // Fill the pool with other pages until page 1 is evicted.
        fix_unfix(&pool, 2);
        fix_unfix(&pool, 3);
        fix_unfix(&pool, 4);
        assert!(!pool.contains(PageId::new(1)));

        // The eviction wrote the bytes to segment 0 at offset local * 16.
        let raw = std::fs::read(dir.path().join("0")).unwrap();
        assert_eq!(&raw[16..21], b"hello");

        // Fixing the page again reloads it from disk.
        let page = pool.fix(PageId::new(1), AccessMode::Shared).unwrap();
        assert_eq!(&page.data()[..5], b"hello");
        assert!(page.data()[5..].iter().all(|&b| b == 0));
        pool.unfix(page, false).unwrap();
    }

    #[test]
    fn test_eviction_skips_pinned_fifo_head() {
        let (pool, _dir) = create_test_pool(16, 3);

        let pinned = pool.fix(PageId::new(1), AccessMode::Shared).unwrap();
        fix_unfix(&pool, 2);
        fix_unfix(&pool, 3);

        // Page 1 heads the FIFO but is pinned, so page 2 is the victim.
        fix_unfix(&pool, 4);
        assert!(pool.contains(PageId::new(1)));
        assert!(!pool.contains(PageId::new(2)));
        assert_eq!(pool.fifo_snapshot(), ids(&[1, 3, 4]));

        pool.unfix(pinned, false).unwrap();
    }

    #[test]
    fn test_lru_victim_after_fifo_exhausted() {
        let (pool, _dir) = create_test_pool(16, 2);

        // Promote both resident pages into the LRU.
        fix_unfix(&pool, 1);
        fix_unfix(&pool, 2);
        fix_unfix(&pool, 1);
        fix_unfix(&pool, 2);
        assert!(pool.fifo_snapshot().is_empty());
        assert_eq!(pool.lru_snapshot(), ids(&[1, 2]));

        // The LRU head goes first.
        fix_unfix(&pool, 3);
        assert!(!pool.contains(PageId::new(1)));
        assert!(pool.contains(PageId::new(2)));
        assert_eq!(pool.fifo_snapshot(), ids(&[3]));
    }

    #[test]
    fn test_unfix_refreshes_lru_position() {
        let (pool, _dir) = create_test_pool(16, 3);

        // LRU = [1, 2] after promoting both.
        fix_unfix(&pool, 1);
        fix_unfix(&pool, 2);
        fix_unfix(&pool, 1);
        fix_unfix(&pool, 2);
        assert_eq!(pool.lru_snapshot(), ids(&[1, 2]));

        // Releasing page 1 again moves it behind page 2.
        fix_unfix(&pool, 1);
        assert_eq!(pool.lru_snapshot(), ids(&[2, 1]));
    }

    #[test]
    fn test_cross_pool_unfix_is_invalid() {
        let (pool_a, _dir_a) = create_test_pool(16, 3);
        let (pool_b, _dir_b) = create_test_pool(16, 3);

        let page = pool_a.fix(PageId::new(1), AccessMode::Shared).unwrap();
        let err = pool_b.unfix(page, false).unwrap_err();
        assert!(matches!(err, BufferError::InvalidUnfix { .. }));

        // The handle was still released against its own pool on drop.
        assert_eq!(pool_a.stats().pinned_frames, 0);
    }

    #[test]
    fn test_drop_without_unfix_releases_cleanly() {
        let (pool, _dir) = create_test_pool(16, 3);

        {
            let _page = pool.fix(PageId::new(1), AccessMode::Exclusive).unwrap();
        }

        assert_eq!(pool.stats().pinned_frames, 0);
        // An implicit release never marks the page dirty.
        assert_eq!(pool.stats().dirty_frames, 0);

        // The frame is usable again.
        fix_unfix(&pool, 1);
        assert_eq!(pool.lru_snapshot(), ids(&[1]));
    }

    #[test]
    fn test_read_failure_rolls_back_residency() {
        let (pool, dir) = create_test_pool(16, 3);

        // Make segment 7 unopenable by occupying its file name with a
        // directory.
        std::fs::create_dir(dir.path().join("7")).unwrap();

        let bad = PageId::from_parts(SegmentId::new(7), 0);
        let err = pool.fix(bad, AccessMode::Shared).unwrap_err();
        assert!(matches!(err, BufferError::Io(_)));

        // The half-created residency was rolled back.
        assert!(!pool.contains(bad));
        assert!(pool.fifo_snapshot().is_empty());
        assert_eq!(pool.stats().pinned_frames, 0);

        // All three slots are still usable.
        fix_unfix(&pool, 1);
        fix_unfix(&pool, 2);
        fix_unfix(&pool, 3);
        assert_eq!(pool.fifo_snapshot(), ids(&[1, 2, 3]));
    }

    #[test]
    fn test_round_trip_through_eviction() {
        let (pool, _dir) = create_test_pool(16, 3);

        for id in 0..6u64 {
            let mut page = pool.fix(PageId::new(id), AccessMode::Exclusive).unwrap();
            page.data_mut().fill(id as u8 + 1);
            pool.unfix(page, true).unwrap();
        }

        // Only three pages fit, so the first three went through eviction.
        for id in 0..6u64 {
            let page = pool.fix(PageId::new(id), AccessMode::Shared).unwrap();
            assert!(
                page.data().iter().all(|&b| b == id as u8 + 1),
                "page {id} lost its bytes"
            );
            pool.unfix(page, false).unwrap();
        }
    }

    #[test]
    fn test_clean_unfix_does_not_clear_dirty() {
        let (pool, dir) = create_test_pool(16, 3);

        let mut page = pool.fix(PageId::new(1), AccessMode::Exclusive).unwrap();
        page.data_mut()[0] = 9;
        pool.unfix(page, true).unwrap();

        // A later clean release must not undo the earlier dirty mark.
        fix_unfix(&pool, 1);
        assert_eq!(pool.stats().dirty_frames, 1);

        // Promote the other residents so the FIFO drains and page 1 heads
        // the LRU, then force an eviction.
        fix_unfix(&pool, 2);
        fix_unfix(&pool, 3);
        fix_unfix(&pool, 2);
        fix_unfix(&pool, 3);
        assert!(pool.fifo_snapshot().is_empty());
        assert_eq!(pool.lru_snapshot(), ids(&[1, 2, 3]));

        fix_unfix(&pool, 4);
        assert!(!pool.contains(PageId::new(1)));
        let raw = std::fs::read(dir.path().join("0")).unwrap();
        assert_eq!(raw[16], 9);
    }

    #[test]
    fn test_pages_span_segments() {
        let (pool, dir) = create_test_pool(16, 3);

        let in_seg_2 = PageId::from_parts(SegmentId::new(2), 5);
        let mut page = pool.fix(in_seg_2, AccessMode::Exclusive).unwrap();
        page.data_mut()[..3].copy_from_slice(b"seg");
        pool.unfix(page, true).unwrap();

        fix_unfix(&pool, 1);
        fix_unfix(&pool, 2);
        fix_unfix(&pool, 3);
        assert!(!pool.contains(in_seg_2));

        let raw = std::fs::read(dir.path().join("2")).unwrap();
        assert_eq!(&raw[5 * 16..5 * 16 + 3], b"seg");
    }

    #[test]
    fn test_drop_flushes_dirty_pages() {
        let dir = tempdir().unwrap();

        {
            let config = BufferPoolConfig::new(16, 3).with_directory(dir.path());
            let pool = BufferPool::new(config).unwrap();
            let mut page = pool.fix(PageId::new(1), AccessMode::Exclusive).unwrap();
            page.data_mut()[..4].copy_from_slice(b"bye!");
            pool.unfix(page, true).unwrap();
            // No eviction happened; the drop must write the page back.
        }

        let raw = std::fs::read(dir.path().join("0")).unwrap();
        assert_eq!(&raw[16..20], b"bye!");
    }

    #[test]
    fn test_structural_invariants_hold() {
        let (pool, _dir) = create_test_pool(16, 3);

        // A mixed workload: admissions, promotions, evictions.
        for id in [1u64, 2, 1, 3, 4, 2, 5, 1, 6, 3] {
            fix_unfix(&pool, id);
        }

        let fifo = pool.fifo_snapshot();
        let lru = pool.lru_snapshot();

        assert!(fifo.len() + lru.len() <= pool.page_count());
        assert!(fifo.iter().all(|p| !lru.contains(p)));
        for page_id in fifo.iter().chain(lru.iter()) {
            assert!(pool.contains(*page_id));
        }
    }

    #[test]
    fn test_concurrent_fix_unfix_hammer() {
        let (pool, _dir) = create_test_pool(16, 8);
        let pool = std::sync::Arc::new(pool);

        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let pool = std::sync::Arc::clone(&pool);
                thread::spawn(move || {
                    for i in 0..200u64 {
                        let page_id = PageId::new((i * 7 + t) % 16);
                        if i % 3 == 0 {
                            let mut page =
                                pool.fix(page_id, AccessMode::Exclusive).unwrap();
                            page.data_mut()[0] = t as u8;
                            pool.unfix(page, true).unwrap();
                        } else {
                            let page = pool.fix(page_id, AccessMode::Shared).unwrap();
                            assert_eq!(page.data().len(), 16);
                            pool.unfix(page, false).unwrap();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pool.stats().pinned_frames, 0);
        let fifo = pool.fifo_snapshot();
        let lru = pool.lru_snapshot();
        assert!(fifo.len() + lru.len() <= pool.page_count());
        assert!(fifo.iter().all(|p| !lru.contains(p)));
        for page_id in fifo.iter().chain(lru.iter()) {
            assert!(pool.contains(*page_id));
        }
    }

    #[test]
    fn test_shared_fixes_run_concurrently() {
        let (pool, _dir) = create_test_pool(16, 3);
        let pool = std::sync::Arc::new(pool);

        // Two shared fixes of the same page may be held at once.
        let first = pool.fix(PageId::new(1), AccessMode::Shared).unwrap();
        let second = pool.fix(PageId::new(1), AccessMode::Shared).unwrap();
        assert_eq!(pool.stats().pinned_frames, 1);

        pool.unfix(first, false).unwrap();
        pool.unfix(second, false).unwrap();
        assert_eq!(pool.stats().pinned_frames, 0);
    }

    #[test]
    fn test_stats_counters() {
        let (pool, _dir) = create_test_pool(16, 3);

        fix_unfix(&pool, 1);
        fix_unfix(&pool, 1);
        fix_unfix(&pool, 2);

        let stats = pool.stats();
        assert_eq!(stats.fetches, 3);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert!((stats.hit_ratio() - 1.0 / 3.0).abs() < f64::EPSILON);
    }
}
