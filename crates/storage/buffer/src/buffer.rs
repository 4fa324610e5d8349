//! Provides the implementation for the buffer pool manager at the heart of
//! the storage engine.

use crate::frame::{FrameHeader, FrameId};
use crate::guards::{ReadPageGuard, WritePageGuard};
use crate::replacer::{AccessType, LruKReplacer};
use disk::api::DiskManager;
use disk::scheduler::{DiskRequest, DiskScheduler};
use page::page_id::PageId;
use page::{zeroed_page_buf, PageBuf};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Bookkeeping protected by the pool latch: the resident-page table and the
/// free-frame list.
#[derive(Debug)]
pub(crate) struct PoolState {
    /// Maps each resident page to the frame holding it.
    page_table: HashMap<PageId, FrameId>,
    /// Frames currently holding no page.
    free_frames: VecDeque<FrameId>,
}

/// The buffer pool manager: mediates between a bounded pool of in-memory
/// frames and the disk, handing out scoped page guards.
///
/// All public operations are safe to call from any number of threads. A
/// single pool latch protects the page table, the free list and all replacer
/// mutations; the per-frame latches protect the page bytes and are held for
/// the lifetime of each guard. The latch order is pool latch, then frame
/// latch — never the reverse.
///
/// Miss handling performs eviction and load I/O while the pool latch is
/// held, so concurrent requests for a page being brought in simply queue on
/// the latch.
#[derive(Debug)]
pub struct BufferPoolManager<D: DiskManager> {
    num_frames: usize,
    next_page_id: AtomicI64,
    frames: Vec<FrameHeader>,
    /// The pool latch.
    state: Mutex<PoolState>,
    /// Locked only while the pool latch is held.
    replacer: Mutex<LruKReplacer>,
    disk_scheduler: DiskScheduler,
    disk_manager: Arc<D>,
}

impl<D: DiskManager + 'static> BufferPoolManager<D> {
    /// Creates a pool of `num_frames` frames over `disk_manager`, evicting
    /// with LRU-K for the given `k_dist`.
    pub fn new(num_frames: usize, disk_manager: Arc<D>, k_dist: usize) -> Self {
        let mut frames = Vec::with_capacity(num_frames);
        let mut free_frames = VecDeque::with_capacity(num_frames);
        for frame_id in 0..num_frames {
            frames.push(FrameHeader::new(frame_id));
            free_frames.push_back(frame_id);
        }

        Self {
            num_frames,
            next_page_id: AtomicI64::new(0),
            frames,
            state: Mutex::new(PoolState {
                page_table: HashMap::with_capacity(num_frames),
                free_frames,
            }),
            replacer: Mutex::new(LruKReplacer::new(num_frames, k_dist)),
            disk_scheduler: DiskScheduler::new(Arc::clone(&disk_manager)),
            disk_manager,
        }
    }

    /// Number of frames this pool manages.
    pub fn size(&self) -> usize {
        self.num_frames
    }

    /// Allocates a fresh page and returns exclusive access to it, or `None`
    /// if every frame is pinned.
    ///
    /// The returned page is resident, zero-filled, pinned, and write-locked
    /// by the returned guard. Page ids are handed out by a monotonic
    /// counter; the frame is secured before the id is taken so a failed call
    /// burns no id.
    pub fn checked_new_page(&self) -> Option<WritePageGuard<'_>> {
        let mut state = self.lock_state();

        let frame_id = self.obtain_frame_id(&mut state)?;
        let frame = &self.frames[frame_id];
        let mut data = frame
            .data
            .write()
            .expect("frame poisoned: another thread panicked while holding the frame latch");
        self.evict_resident(&mut state, frame, &data);

        let page_id = PageId::new(self.next_page_id.fetch_add(1, Ordering::Relaxed));
        if let Err(error) = self.disk_manager.allocate_page(page_id) {
            panic!("could not allocate disk space for page {page_id}: {error}");
        }
        tracing::trace!(page = %page_id, frame = frame_id, "allocated new page");

        data.fill(0);
        self.install(&mut state, page_id, frame, AccessType::Lookup);
        drop(data);
        drop(state);

        Some(WritePageGuard::new(page_id, frame, &self.state, &self.replacer))
    }

    /// A wrapper around [`Self::checked_new_page`] that panics if the pool
    /// is out of frames. Testing and ergonomics only.
    pub fn new_page(&self) -> WritePageGuard<'_> {
        self.checked_new_page()
            .unwrap_or_else(|| panic!("failed to allocate a new page: every frame is pinned"))
    }

    /// Acquires shared access to `page_id`, bringing the page into the pool
    /// if needed. `None` when the id is the invalid sentinel or no frame can
    /// be obtained (every frame pinned).
    pub fn checked_read_page(&self, page_id: PageId) -> Option<ReadPageGuard<'_>> {
        self.checked_read_page_with_access(page_id, AccessType::default())
    }

    /// [`Self::checked_read_page`] with an explicit [`AccessType`], letting
    /// sequential scans opt out of replacement history.
    pub fn checked_read_page_with_access(
        &self,
        page_id: PageId,
        access_type: AccessType,
    ) -> Option<ReadPageGuard<'_>> {
        let frame = self.fetch_frame(page_id, access_type)?;
        Some(ReadPageGuard::new(page_id, frame, &self.state, &self.replacer))
    }

    /// Acquires exclusive access to `page_id`, bringing the page into the
    /// pool if needed. Same failure policy as
    /// [`Self::checked_read_page`].
    pub fn checked_write_page(&self, page_id: PageId) -> Option<WritePageGuard<'_>> {
        self.checked_write_page_with_access(page_id, AccessType::default())
    }

    /// [`Self::checked_write_page`] with an explicit [`AccessType`].
    pub fn checked_write_page_with_access(
        &self,
        page_id: PageId,
        access_type: AccessType,
    ) -> Option<WritePageGuard<'_>> {
        let frame = self.fetch_frame(page_id, access_type)?;
        Some(WritePageGuard::new(page_id, frame, &self.state, &self.replacer))
    }

    /// A wrapper around [`Self::checked_read_page`] that panics when the
    /// pool is out of frames. Testing and ergonomics only.
    pub fn read_page(&self, page_id: PageId) -> ReadPageGuard<'_> {
        self.checked_read_page(page_id)
            .unwrap_or_else(|| panic!("failed to bring page {page_id} into the pool"))
    }

    /// A wrapper around [`Self::checked_write_page`] that panics when the
    /// pool is out of frames. Testing and ergonomics only.
    pub fn write_page(&self, page_id: PageId) -> WritePageGuard<'_> {
        self.checked_write_page(page_id)
            .unwrap_or_else(|| panic!("failed to bring page {page_id} into the pool"))
    }

    /// Removes a page from the pool and releases its disk space.
    ///
    /// Returns `false` if the page is resident and pinned. Returns `true`
    /// otherwise, including when the page is not resident at all.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        if !page_id.is_valid() {
            return true;
        }

        let mut state = self.lock_state();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            let frame = &self.frames[frame_id];
            if frame.pins() > 0 {
                return false;
            }

            state.page_table.remove(&page_id);
            self.lock_replacer().remove(frame_id);
            state.free_frames.push_back(frame_id);
            frame.reset();
            tracing::trace!(page = %page_id, frame = frame_id, "deleted resident page");
        }

        if let Err(error) = self.disk_manager.deallocate_page(page_id) {
            panic!("could not deallocate page {page_id}: {error}");
        }
        true
    }

    /// Writes the page's current contents to disk and clears its dirty flag.
    /// Returns `false` if the page is not resident.
    ///
    /// The frame is pinned for the duration so it cannot be evicted, and the
    /// shared frame latch keeps any writer out of the flush window: a
    /// successful return means the flushed bytes reached the disk manager
    /// with no writer mid-flight.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        let frame = {
            let state = self.lock_state();
            let Some(&frame_id) = state.page_table.get(&page_id) else {
                return false;
            };
            let frame = &self.frames[frame_id];
            frame.pin();
            self.lock_replacer().set_evictable(frame_id, false);
            frame
        };

        let data = frame
            .data
            .read()
            .expect("frame poisoned: another thread panicked while holding the frame latch");
        tracing::debug!(page = %page_id, frame = frame.frame_id, "flushing page");
        self.write_through_scheduler(page_id, &data);
        frame.clear_dirty();

        // Unpin with the departing-guard protocol: bookkeeping under the
        // pool latch first, frame latch released after.
        {
            let _state = self.lock_state();
            if frame.unpin() == 0 {
                self.lock_replacer().set_evictable(frame.frame_id, true);
            }
        }
        drop(data);
        true
    }

    /// Flushes every page currently resident in the pool. Pages that drop
    /// out of residency between the snapshot and their flush are skipped.
    pub fn flush_all_pages(&self) {
        let resident: Vec<PageId> = {
            let state = self.lock_state();
            state.page_table.keys().copied().collect()
        };

        for page_id in resident {
            self.flush_page(page_id);
        }
    }

    /// Pin count of a resident page, or `None` if the page is not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.lock_state();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(self.frames[frame_id].pins())
    }

    /// Number of frames the replacer currently considers evictable. Intended
    /// for tests and introspection.
    pub fn evictable_count(&self) -> usize {
        let _state = self.lock_state();
        self.lock_replacer().size()
    }

    /// Resolves `page_id` to a pinned, non-evictable frame, loading the page
    /// from disk on a miss. `None` when the id is invalid or every frame is
    /// pinned.
    fn fetch_frame(&self, page_id: PageId, access_type: AccessType) -> Option<&FrameHeader> {
        if !page_id.is_valid() {
            return None;
        }

        let mut state = self.lock_state();

        // The page is already resident.
        if let Some(&frame_id) = state.page_table.get(&page_id) {
            let frame = &self.frames[frame_id];
            frame.pin();
            let mut replacer = self.lock_replacer();
            replacer.record_access(frame_id, access_type);
            replacer.set_evictable(frame_id, false);
            return Some(frame);
        }

        // Miss: claim a frame and bring the page in while still holding the
        // pool latch. Taking the frame latch here follows the allowed latch
        // order and can only wait out a departing guard.
        let frame_id = self.obtain_frame_id(&mut state)?;
        let frame = &self.frames[frame_id];
        tracing::trace!(page = %page_id, frame = frame_id, "loading page on miss");

        let mut data = frame
            .data
            .write()
            .expect("frame poisoned: another thread panicked while holding the frame latch");
        self.evict_resident(&mut state, frame, &data);
        self.read_through_scheduler(page_id, &mut data);
        self.install(&mut state, page_id, frame, access_type);
        drop(data);

        Some(frame)
    }

    /// Claims a frame for an incoming page: the free list first, then the
    /// replacer. `None` when every frame is pinned.
    fn obtain_frame_id(&self, state: &mut PoolState) -> Option<FrameId> {
        if let Some(frame_id) = state.free_frames.pop_front() {
            return Some(frame_id);
        }

        let victim = self.lock_replacer().evict();
        if victim.is_none() {
            tracing::debug!("out of frames: free list empty and no evictable victim");
        }
        victim
    }

    /// Detaches whatever page is resident in `frame`, writing it back first
    /// if dirty. No-op for a frame fresh off the free list.
    fn evict_resident(&self, state: &mut PoolState, frame: &FrameHeader, data: &PageBuf) {
        let Some(old_page) = frame
            .page_id
            .write()
            .expect("frame poisoned: another thread panicked while holding the page id lock")
            .take()
        else {
            return;
        };

        if frame.is_dirty() {
            tracing::trace!(page = %old_page, frame = frame.frame_id, "writing back dirty victim");
            self.write_through_scheduler(old_page, data);
            frame.clear_dirty();
        }

        state.page_table.remove(&old_page);
    }

    /// Installs `page_id` into `frame` and pins it for the caller.
    fn install(
        &self,
        state: &mut PoolState,
        page_id: PageId,
        frame: &FrameHeader,
        access_type: AccessType,
    ) {
        *frame
            .page_id
            .write()
            .expect("frame poisoned: another thread panicked while holding the page id lock") =
            Some(page_id);
        frame.pin_count.store(1, Ordering::Release);
        frame.clear_dirty();
        state.page_table.insert(page_id, frame.frame_id);

        let mut replacer = self.lock_replacer();
        replacer.record_access(frame.frame_id, access_type);
        replacer.set_evictable(frame.frame_id, false);
    }

    /// Blocking write of one page through the disk scheduler. Fatal on disk
    /// error: losing the write would leave the page table inconsistent with
    /// the disk.
    fn write_through_scheduler(&self, page_id: PageId, bytes: &PageBuf) {
        let mut buffer = zeroed_page_buf();
        buffer.copy_from_slice(bytes);

        let (completion, done) = DiskScheduler::create_completion();
        self.disk_scheduler.schedule(DiskRequest {
            is_write: true,
            page_id,
            data: buffer,
            completion,
        });

        if let Err(error) = done.recv().expect("disk scheduler worker exited") {
            panic!("failed to write page {page_id} to disk: {error}");
        }
    }

    /// Blocking read of one page through the disk scheduler into `data`.
    /// Fatal on disk error.
    fn read_through_scheduler(&self, page_id: PageId, data: &mut PageBuf) {
        let (completion, done) = DiskScheduler::create_completion();
        self.disk_scheduler.schedule(DiskRequest {
            is_write: false,
            page_id,
            data: zeroed_page_buf(),
            completion,
        });

        match done.recv().expect("disk scheduler worker exited") {
            Ok(filled) => data.copy_from_slice(&filled[..]),
            Err(error) => panic!("failed to read page {page_id} from disk: {error}"),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state
            .lock()
            .expect("buffer pool poisoned: another thread panicked while holding the pool latch")
    }

    fn lock_replacer(&self) -> MutexGuard<'_, LruKReplacer> {
        self.replacer
            .lock()
            .expect("replacer poisoned: another thread panicked while holding its latch")
    }
}
