use page::page_id::PageId;
use page::{zeroed_page_buf, PageBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::RwLock;

/// The ID of a frame is its index in the pool's frame vector.
pub(crate) type FrameId = usize;

/// A buffer frame is a memory allocation designed to store the contents of a
/// data page in memory, along with the metadata needed by the buffer pool.
///
/// The page bytes are protected by a `RwLock` — the frame latch. Read guards
/// hold it shared, write guards hold it exclusively, each for their entire
/// lifetime. The resident page id is `Option<PageId>` so that a free frame
/// is directly representable.
///
/// Frames are constructed once at pool creation with zeroed data and reused
/// indefinitely; access to a `FrameHeader` outside the buffer pool manager
/// happens only through the guard structs.
#[derive(Debug)]
pub(crate) struct FrameHeader {
    /// Index of this frame in the pool. Immutable after construction.
    pub(crate) frame_id: FrameId,

    /// The `PageId` currently resident in this frame, `None` while the frame
    /// is free. Mutated only under the pool latch.
    pub(crate) page_id: RwLock<Option<PageId>>,

    /// Number of live guards (and in-flight flushes) pinning this frame.
    /// Atomic so the count can be read without any latch.
    pub(crate) pin_count: AtomicU32,

    /// Whether the in-memory page is newer than its on-disk copy.
    pub(crate) dirty: AtomicBool,

    /// The page bytes, guarded by the frame latch.
    pub(crate) data: RwLock<Box<PageBuf>>,
}

impl FrameHeader {
    pub(crate) fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            page_id: RwLock::new(None),
            pin_count: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
            data: RwLock::new(zeroed_page_buf()),
        }
    }

    /// Increments the pin count, returning the previous value.
    pub(crate) fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel)
    }

    /// Decrements the pin count, returning the new value.
    pub(crate) fn unpin(&self) -> u32 {
        let previous = self.pin_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "unpinned a frame with pin count 0");
        previous - 1
    }

    pub(crate) fn pins(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub(crate) fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub(crate) fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::Release);
    }

    /// Returns the frame to its pristine free state: no page, no pins, clean,
    /// zeroed data. Callers must guarantee no live guard references the
    /// frame.
    pub(crate) fn reset(&self) {
        *self
            .page_id
            .write()
            .expect("frame poisoned: another thread panicked while holding the page id lock") = None;
        self.pin_count.store(0, Ordering::Release);
        self.clear_dirty();
        self.data
            .write()
            .expect("frame poisoned: another thread panicked while holding the frame latch")
            .fill(0);
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_frame_is_free_and_clean() {
        let frame = FrameHeader::new(3);

        assert_eq!(frame.frame_id, 3);
        assert_eq!(*frame.page_id.read().unwrap(), None);
        assert_eq!(frame.pins(), 0);
        assert!(!frame.is_dirty());
        assert!(frame.data.read().unwrap().iter().all(|b| *b == 0));
    }

    #[test]
    fn pin_and_unpin_track_the_count() {
        let frame = FrameHeader::new(0);

        assert_eq!(frame.pin(), 0);
        assert_eq!(frame.pin(), 1);
        assert_eq!(frame.pins(), 2);
        assert_eq!(frame.unpin(), 1);
        assert_eq!(frame.unpin(), 0);
    }

    #[test]
    fn reset_clears_all_state() {
        let frame = FrameHeader::new(1);
        *frame.page_id.write().unwrap() = Some(PageId::new(9));
        frame.pin();
        frame.mark_dirty();
        frame.data.write().unwrap().fill(0xCD);

        frame.reset();

        assert_eq!(*frame.page_id.read().unwrap(), None);
        assert_eq!(frame.pins(), 0);
        assert!(!frame.is_dirty());
        assert!(frame.data.read().unwrap().iter().all(|b| *b == 0));
    }
}
