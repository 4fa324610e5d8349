//! RAII access tokens over a single buffer frame.
//!
//! Guards are created only by the buffer pool manager, after it has pinned
//! the frame and marked it non-evictable under the pool latch. A guard owns
//! the frame latch (shared or exclusive) together with the obligation to
//! unpin the frame when it goes out of scope.

use crate::buffer::PoolState;
use crate::frame::FrameHeader;
use crate::replacer::LruKReplacer;
use page::page_id::PageId;
use page::{PageBuf, PAGE_SIZE};
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, RwLockReadGuard, RwLockWriteGuard};

/// Shared, read-only access to one resident page.
///
/// Any number of read guards may coexist on the same frame; none may coexist
/// with a write guard. Dropping the guard decrements the frame's pin count
/// and, once it reaches zero, reports the frame back to the replacer as
/// evictable.
#[derive(Debug)]
pub struct ReadPageGuard<'a> {
    page_id: PageId,
    frame: &'a FrameHeader,
    pool_latch: &'a Mutex<PoolState>,
    replacer: &'a Mutex<LruKReplacer>,
    /// `Some` while the guard is live; taken exactly once on release.
    data: Option<RwLockReadGuard<'a, Box<PageBuf>>>,
}

impl<'a> ReadPageGuard<'a> {
    /// Acquires the frame latch in shared mode. The pin increment and
    /// replacer bookkeeping have already happened under the pool latch.
    pub(crate) fn new(
        page_id: PageId,
        frame: &'a FrameHeader,
        pool_latch: &'a Mutex<PoolState>,
        replacer: &'a Mutex<LruKReplacer>,
    ) -> Self {
        let data = frame
            .data
            .read()
            .expect("frame poisoned: another thread panicked while holding the frame latch");

        Self {
            page_id,
            frame,
            pool_latch,
            replacer,
            data: Some(data),
        }
    }

    /// The id of the page this guard is protecting.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// The page bytes.
    pub fn data(&self) -> &[u8] {
        let data = self.data.as_ref().expect("read guard already released");
        &data[..]
    }

    /// Whether the underlying frame holds modifications not yet on disk.
    pub fn is_dirty(&self) -> bool {
        self.frame.is_dirty()
    }

    /// Reinterprets the page bytes as a `T` for zero-copy access.
    ///
    /// # Safety
    ///
    /// `T` must be valid for any bit pattern, must not require alignment
    /// stricter than the page buffer's, and must fit within `PAGE_SIZE`
    /// bytes.
    pub unsafe fn cast<T>(&self) -> &T {
        debug_assert!(mem::size_of::<T>() <= PAGE_SIZE);
        &*self.data().as_ptr().cast::<T>()
    }
}

impl Deref for ReadPageGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data()
    }
}

impl Drop for ReadPageGuard<'_> {
    fn drop(&mut self) {
        let Some(data) = self.data.take() else { return };

        {
            let _pool = self
                .pool_latch
                .lock()
                .expect("buffer pool poisoned: another thread panicked while holding the pool latch");
            if self.frame.unpin() == 0 {
                self.replacer
                    .lock()
                    .expect("replacer poisoned: another thread panicked while holding its latch")
                    .set_evictable(self.frame.frame_id, true);
            }
        }

        // The frame latch drops only after the pin and replacer bookkeeping,
        // so a thread that sees the frame as evictable can at worst wait out
        // this release.
        drop(data);
    }
}

/// Exclusive, mutable access to one resident page.
///
/// Exactly one write guard may exist on a frame at a time, with no
/// coexisting read guards. Obtaining the mutable bytes marks the frame
/// dirty. Dropping the guard follows the same protocol as
/// [`ReadPageGuard`].
#[derive(Debug)]
pub struct WritePageGuard<'a> {
    page_id: PageId,
    frame: &'a FrameHeader,
    pool_latch: &'a Mutex<PoolState>,
    replacer: &'a Mutex<LruKReplacer>,
    /// `Some` while the guard is live; taken exactly once on release.
    data: Option<RwLockWriteGuard<'a, Box<PageBuf>>>,
}

impl<'a> WritePageGuard<'a> {
    /// Acquires the frame latch in exclusive mode. The pin increment and
    /// replacer bookkeeping have already happened under the pool latch.
    pub(crate) fn new(
        page_id: PageId,
        frame: &'a FrameHeader,
        pool_latch: &'a Mutex<PoolState>,
        replacer: &'a Mutex<LruKReplacer>,
    ) -> Self {
        let data = frame
            .data
            .write()
            .expect("frame poisoned: another thread panicked while holding the frame latch");

        Self {
            page_id,
            frame,
            pool_latch,
            replacer,
            data: Some(data),
        }
    }

    /// The id of the page this guard is protecting.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// The page bytes.
    pub fn data(&self) -> &[u8] {
        let data = self.data.as_ref().expect("write guard already released");
        &data[..]
    }

    /// The page bytes, mutably. Marks the frame dirty.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.frame.mark_dirty();
        let data = self.data.as_mut().expect("write guard already released");
        &mut data[..]
    }

    /// Whether the underlying frame holds modifications not yet on disk.
    pub fn is_dirty(&self) -> bool {
        self.frame.is_dirty()
    }

    /// Reinterprets the page bytes as a `T` for zero-copy access.
    ///
    /// # Safety
    ///
    /// See [`ReadPageGuard::cast`].
    pub unsafe fn cast<T>(&self) -> &T {
        debug_assert!(mem::size_of::<T>() <= PAGE_SIZE);
        &*self.data().as_ptr().cast::<T>()
    }

    /// Reinterprets the page bytes as a mutable `T`. Marks the frame dirty.
    ///
    /// # Safety
    ///
    /// See [`ReadPageGuard::cast`].
    pub unsafe fn cast_mut<T>(&mut self) -> &mut T {
        debug_assert!(mem::size_of::<T>() <= PAGE_SIZE);
        &mut *self.data_mut().as_mut_ptr().cast::<T>()
    }
}

impl Deref for WritePageGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data()
    }
}

impl DerefMut for WritePageGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data_mut()
    }
}

impl Drop for WritePageGuard<'_> {
    fn drop(&mut self) {
        let Some(data) = self.data.take() else { return };

        {
            let _pool = self
                .pool_latch
                .lock()
                .expect("buffer pool poisoned: another thread panicked while holding the pool latch");
            if self.frame.unpin() == 0 {
                self.replacer
                    .lock()
                    .expect("replacer poisoned: another thread panicked while holding its latch")
                    .set_evictable(self.frame.frame_id, true);
            }
        }

        drop(data);
    }
}
