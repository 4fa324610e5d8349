use crate::api::DiskManager;
use crate::errors::{DiskError, DiskResult};
use page::page_id::PageId;
use page::PAGE_SIZE;
use std::fs;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[cfg(unix)]
use std::os::unix::fs::FileExt;
#[cfg(windows)]
use std::os::windows::fs::FileExt;

/// A disk based manager backed by a single file.
///
/// Pages live at `page_id * PAGE_SIZE`. Reads and writes use positional I/O
/// so no seek state is shared between threads.
#[derive(Debug)]
pub struct FileDiskManager {
    file: File,
    path: PathBuf,
    // Serializes the check-then-grow in `allocate_page`.
    grow_latch: Mutex<()>,
}

impl FileDiskManager {
    /// Opens (creating if needed) the backing file at `path`.
    pub fn new<P>(path: P) -> DiskResult<Self>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();

        Self::ensure_parent_dir(&path).map_err(|source| DiskError::Open {
            path: path.clone(),
            source,
        })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| DiskError::Open {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            file,
            path,
            grow_latch: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn offset_of(page_id: PageId) -> u64 {
        debug_assert!(page_id.is_valid());
        (page_id.0 as u64) * (PAGE_SIZE as u64)
    }

    #[inline]
    fn read_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
        #[cfg(unix)]
        {
            file.read_at(buf, offset)
        }

        #[cfg(windows)]
        {
            file.seek_read(buf, offset)
        }
    }

    #[inline]
    fn write_at(file: &File, buf: &[u8], offset: u64) -> std::io::Result<usize> {
        #[cfg(unix)]
        {
            file.write_at(buf, offset)
        }

        #[cfg(windows)]
        {
            file.seek_write(buf, offset)
        }
    }

    fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, destination: &mut [u8]) -> DiskResult<()> {
        if destination.len() != PAGE_SIZE {
            return Err(DiskError::BufferSize {
                expected: PAGE_SIZE,
                actual: destination.len(),
            });
        }

        let offset = Self::offset_of(page_id);

        let mut filled = 0;
        while filled < PAGE_SIZE {
            let n = Self::read_at(&self.file, &mut destination[filled..], offset + filled as u64)
                .map_err(|source| DiskError::Io { page_id, source })?;

            if n == 0 {
                // Reached end of file; the tail of the page was never written.
                break;
            }

            filled += n;
        }

        destination[filled..].fill(0);
        Ok(())
    }

    fn write_page(&self, page_id: PageId, page_data: &[u8]) -> DiskResult<()> {
        if page_data.len() != PAGE_SIZE {
            return Err(DiskError::BufferSize {
                expected: PAGE_SIZE,
                actual: page_data.len(),
            });
        }

        let offset = Self::offset_of(page_id);

        let mut written = 0;
        while written < PAGE_SIZE {
            let n = Self::write_at(&self.file, &page_data[written..], offset + written as u64)
                .map_err(|source| DiskError::Io { page_id, source })?;

            if n == 0 {
                return Err(DiskError::WriteStalled { page_id });
            }

            written += n;
        }

        Ok(())
    }

    fn allocate_page(&self, page_id: PageId) -> DiskResult<()> {
        let _guard = self
            .grow_latch
            .lock()
            .expect("FileDiskManager poisoned: another thread panicked while growing the file");

        let needed = Self::offset_of(page_id) + PAGE_SIZE as u64;
        let current = self
            .file
            .metadata()
            .map_err(|source| DiskError::Io { page_id, source })?
            .len();

        if current < needed {
            tracing::debug!(page = %page_id, bytes = needed, "growing backing file");
            self.file
                .set_len(needed)
                .map_err(|source| DiskError::Io { page_id, source })?;
        }

        Ok(())
    }

    fn deallocate_page(&self, page_id: PageId) -> DiskResult<()> {
        // Disk space is allocated upward and never reclaimed; the slot will
        // simply be overwritten if the id is ever reused.
        tracing::trace!(page = %page_id, "deallocate requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_db_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("ferrodb_{}_{}.db", name, std::process::id()))
    }

    #[test]
    fn write_then_read_round_trips() {
        // Arrange
        let path = temp_db_path("round_trip");
        let manager = FileDiskManager::new(&path).unwrap();
        let payload = [7u8; PAGE_SIZE];

        // Act
        manager.allocate_page(PageId::new(3)).unwrap();
        manager.write_page(PageId::new(3), &payload).unwrap();

        let mut readback = [0u8; PAGE_SIZE];
        manager.read_page(PageId::new(3), &mut readback).unwrap();

        // Assert
        assert_eq!(readback, payload);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unwritten_page_reads_as_zeros() {
        let path = temp_db_path("zero_fill");
        let manager = FileDiskManager::new(&path).unwrap();

        let mut readback = [0xAAu8; PAGE_SIZE];
        manager.read_page(PageId::new(9), &mut readback).unwrap();

        assert!(readback.iter().all(|b| *b == 0));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn allocate_grows_the_file() {
        let path = temp_db_path("allocate");
        let manager = FileDiskManager::new(&path).unwrap();

        manager.allocate_page(PageId::new(4)).unwrap();

        let len = fs::metadata(&path).unwrap().len();
        assert_eq!(len, 5 * PAGE_SIZE as u64);

        // Allocating a lower page must not shrink the file.
        manager.allocate_page(PageId::new(0)).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 5 * PAGE_SIZE as u64);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn data_survives_reopen() {
        let path = temp_db_path("reopen");
        let payload = [0x42u8; PAGE_SIZE];

        {
            let manager = FileDiskManager::new(&path).unwrap();
            manager.write_page(PageId::new(1), &payload).unwrap();
        }

        let manager = FileDiskManager::new(&path).unwrap();
        let mut readback = [0u8; PAGE_SIZE];
        manager.read_page(PageId::new(1), &mut readback).unwrap();
        assert_eq!(readback, payload);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn short_buffer_is_rejected() {
        let path = temp_db_path("short_buffer");
        let manager = FileDiskManager::new(&path).unwrap();

        let mut small = [0u8; 16];
        let result = manager.read_page(PageId::new(0), &mut small);

        assert!(matches!(
            result,
            Err(DiskError::BufferSize { expected, actual }) if expected == PAGE_SIZE && actual == 16
        ));

        fs::remove_file(&path).unwrap();
    }
}
