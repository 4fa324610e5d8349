//! Public API for the `disk` crate

use crate::errors::DiskResult;
use page::page_id::PageId;

/// Disk manager public API
///
/// A `DiskManager` manages a collection of fixed-size pages addressed by
/// `PageId`. Implementations are free to choose the backing storage layout;
/// the trait itself documents method-level expectations. All methods must be
/// safe to call from multiple threads.
pub trait DiskManager: Send + Sync {
    /// Definition
    /// Read the page identified by `page_id` into `destination`.
    ///
    /// Params
    /// - `page_id`: Identifier of the page to read.
    /// - `destination`: Caller-provided buffer to receive the page bytes. The
    ///   buffer length must equal the storage page size.
    ///
    /// Return
    /// - `DiskResult<()>`: `Ok` once the buffer holds the page contents. A
    ///   page that was never written reads back as all zeros.
    fn read_page(&self, page_id: PageId, destination: &mut [u8]) -> DiskResult<()>;

    /// Definition
    /// Write the contents of `page_data` as the page for `page_id`.
    ///
    /// Params
    /// - `page_id`: Identifier of the page to write.
    /// - `page_data`: Byte slice containing exactly one page worth of data.
    ///   The length must equal the storage page size.
    ///
    /// Return
    /// - `DiskResult<()>`: `Ok` once every byte has been handed to the
    ///   backing store.
    fn write_page(&self, page_id: PageId, page_data: &[u8]) -> DiskResult<()>;

    /// Definition
    /// Ensure backing storage exists for `page_id`, growing the store if
    /// needed. Called on the new-page path before the page is ever written.
    ///
    /// Params
    /// - `page_id`: Identifier of the page to make room for.
    ///
    /// Return
    /// - `DiskResult<()>`: `Ok` once the store can hold the page.
    fn allocate_page(&self, page_id: PageId) -> DiskResult<()>;

    /// Definition
    /// Release the backing storage for `page_id`. Implementations may treat
    /// this as a hint and keep allocating upward.
    ///
    /// Params
    /// - `page_id`: Identifier of the page to release.
    ///
    /// Return
    /// - `DiskResult<()>`: `Ok` once the page may no longer be read back.
    fn deallocate_page(&self, page_id: PageId) -> DiskResult<()>;
}
