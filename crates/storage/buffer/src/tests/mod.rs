use crate::buffer::BufferPoolManager;
use disk::api::DiskManager;
use disk::errors::DiskResult;
use disk::memory_disk_manager::MemoryDiskManager;
use page::page_id::PageId;
use std::sync::{Arc, Mutex};

mod concurrency_tests;

/// In-memory disk manager that records every write so tests can assert on
/// the exact traffic the pool produced.
pub(super) struct RecordingDiskManager {
    inner: MemoryDiskManager,
    writes: Mutex<Vec<(PageId, Vec<u8>)>>,
}

impl RecordingDiskManager {
    pub(super) fn new() -> Self {
        Self {
            inner: MemoryDiskManager::new(),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// The writes observed so far, in order.
    pub(super) fn writes(&self) -> Vec<(PageId, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }

    pub(super) fn written_pages(&self) -> Vec<PageId> {
        self.writes().into_iter().map(|(page_id, _)| page_id).collect()
    }
}

impl DiskManager for RecordingDiskManager {
    fn read_page(&self, page_id: PageId, destination: &mut [u8]) -> DiskResult<()> {
        self.inner.read_page(page_id, destination)
    }

    fn write_page(&self, page_id: PageId, page_data: &[u8]) -> DiskResult<()> {
        self.writes
            .lock()
            .unwrap()
            .push((page_id, page_data.to_vec()));
        self.inner.write_page(page_id, page_data)
    }

    fn allocate_page(&self, page_id: PageId) -> DiskResult<()> {
        self.inner.allocate_page(page_id)
    }

    fn deallocate_page(&self, page_id: PageId) -> DiskResult<()> {
        self.inner.deallocate_page(page_id)
    }
}

/// A pool over a plain in-memory disk manager.
pub(super) fn pool_of(num_frames: usize, k_dist: usize) -> BufferPoolManager<MemoryDiskManager> {
    BufferPoolManager::new(num_frames, Arc::new(MemoryDiskManager::new()), k_dist)
}

/// A pool over a recording disk manager, returning both.
pub(super) fn recording_pool_of(
    num_frames: usize,
    k_dist: usize,
) -> (
    BufferPoolManager<RecordingDiskManager>,
    Arc<RecordingDiskManager>,
) {
    let disk_manager = Arc::new(RecordingDiskManager::new());
    let pool = BufferPoolManager::new(num_frames, Arc::clone(&disk_manager), k_dist);
    (pool, disk_manager)
}
