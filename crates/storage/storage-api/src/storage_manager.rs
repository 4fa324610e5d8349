//! The storage manager

use buffer::buffer::BufferPoolManager;
use buffer::guards::{ReadPageGuard, WritePageGuard};
use disk::api::DiskManager;
use page::page_id::PageId;
use std::sync::Arc;

/// The storage manager: the surface upper layers use to get at pages.
///
/// All page access flows through the buffer pool's guards, so data access is
/// thread-safe by construction.
#[derive(Debug)]
pub struct StorageManager<D: DiskManager> {
    buffer_pool: Arc<BufferPoolManager<D>>,
}

impl<D: DiskManager + 'static> StorageManager<D> {
    /// Creates a new instance of the `StorageManager`.
    pub fn new(buffer_pool: Arc<BufferPoolManager<D>>) -> Self {
        Self { buffer_pool }
    }

    /// Obtain shared access to `page_id` via a `ReadPageGuard`.
    pub fn read_page(&self, page_id: PageId) -> ReadPageGuard<'_> {
        self.buffer_pool.read_page(page_id)
    }

    /// Obtain exclusive access to `page_id` via a `WritePageGuard`.
    pub fn write_page(&self, page_id: PageId) -> WritePageGuard<'_> {
        self.buffer_pool.write_page(page_id)
    }

    /// Allocate a new page and obtain exclusive access to it.
    pub fn new_page(&self) -> WritePageGuard<'_> {
        self.buffer_pool.new_page()
    }

    /// Remove a page from the pool and the disk. `false` if the page is
    /// still pinned.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        self.buffer_pool.delete_page(page_id)
    }

    /// Write every resident page back to disk.
    pub fn flush_all(&self) {
        self.buffer_pool.flush_all_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disk::memory_disk_manager::MemoryDiskManager;

    fn storage_of(num_frames: usize) -> StorageManager<MemoryDiskManager> {
        let disk_manager = Arc::new(MemoryDiskManager::new());
        let buffer_pool = Arc::new(BufferPoolManager::new(num_frames, disk_manager, 2));
        StorageManager::new(buffer_pool)
    }

    #[test]
    fn new_page_then_read_round_trips() {
        let storage = storage_of(4);

        let page_id = {
            let mut guard = storage.new_page();
            guard[0] = 0x77;
            guard.page_id()
        };

        let guard = storage.read_page(page_id);
        assert_eq!(guard[0], 0x77);
    }

    #[test]
    fn delete_page_refuses_while_guard_is_live() {
        let storage = storage_of(4);
        let guard = storage.new_page();
        let page_id = guard.page_id();

        assert!(!storage.delete_page(page_id));
        drop(guard);
        assert!(storage.delete_page(page_id));
    }

    #[test]
    fn flush_all_persists_every_page() {
        let storage = storage_of(4);
        for i in 0..3u8 {
            let mut guard = storage.new_page();
            guard[0] = i;
        }

        storage.flush_all();
    }
}
