//! This crate provides page identifiers and the fixed page geometry shared
//! by the storage crates.

/// Page identity types.
pub mod page_id;

/// Size in bytes of a single page, both on disk and in a buffer frame.
pub const PAGE_SIZE: usize = 4096;

/// One page worth of raw bytes.
pub type PageBuf = [u8; PAGE_SIZE];

/// Allocates a zeroed page buffer on the heap.
pub fn zeroed_page_buf() -> Box<PageBuf> {
    Box::new([0u8; PAGE_SIZE])
}
