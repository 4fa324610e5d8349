use page::page_id::PageId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the disk managers.
#[derive(Debug, Error)]
pub enum DiskError {
    #[error("i/o failure on page {page_id}")]
    Io {
        page_id: PageId,
        #[source]
        source: std::io::Error,
    },
    #[error("could not open backing file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("wrote 0 bytes to page {page_id}")]
    WriteStalled { page_id: PageId },
    #[error("buffer length {actual} does not match the page size {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Result type of disk manager operations.
pub type DiskResult<T> = Result<T, DiskError>;
