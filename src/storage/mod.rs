//! Storage adapter contract consumed by the buffer pool.
//!
//! The buffer pool never touches a file descriptor directly. Instead it is
//! handed anything implementing [`StorageAdapter`] — a trait covering
//! exactly the four operations spec'd for the external storage manager:
//! `ensure_capacity`, `read_block`, `write_block`, plus a fixed
//! [`PAGE_SIZE`]. `open_page_file` is modeled as a constructor on each
//! concrete adapter rather than a trait method, since its signature (path,
//! flags, ...) is adapter-specific.
//!
//! Two adapters ship with this crate:
//!
//! * [`FileStorageAdapter`] — byte-exact block I/O over a real file.
//! * [`mock::MockStorageAdapter`] — an in-memory adapter for fast,
//!   deterministic tests that also counts reads/writes so test suites can
//!   assert exact I/O volumes.

pub mod mock;

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{BufferPoolError, Result};

/// Every page is exactly this many bytes.
pub const PAGE_SIZE: usize = 4096;

/// A zero-based page number. Pages are addressed by non-negative integers.
pub type PageId = u32;

/// A fixed-size page buffer.
pub type PageBuf = [u8; PAGE_SIZE];

/// The interface the buffer pool consumes from its storage backend.
///
/// Implementors own the on-disk (or in-memory) representation of a flat,
/// block-addressed page file. They know nothing about frames, pins, or
/// replacement policy — that is the buffer pool's job.
pub trait StorageAdapter {
    /// Grow the underlying storage, if necessary, so that `page_num` is a
    /// valid, readable/writable block. A no-op if the page is already
    /// within bounds.
    fn ensure_capacity(&mut self, page_num: PageId) -> Result<()>;

    /// Fill `buf` with exactly [`PAGE_SIZE`] bytes read from `page_num`.
    fn read_block(&mut self, page_num: PageId, buf: &mut PageBuf) -> Result<()>;

    /// Persist exactly [`PAGE_SIZE`] bytes of `buf` to `page_num`.
    fn write_block(&mut self, page_num: PageId, buf: &PageBuf) -> Result<()>;

    /// Flush any OS-level buffering so that previously written blocks are
    /// durable. Adapters with no such concept (e.g. an in-memory mock) may
    /// treat this as a no-op.
    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

/// Byte-exact block I/O over a real file on disk.
///
/// Grounded on a flat, header-free page file: page `n` lives at byte
/// offset `n * PAGE_SIZE`. The file is grown one or more pages at a time
/// by [`ensure_capacity`](StorageAdapter::ensure_capacity), zero-filling
/// every newly created page so callers never observe uninitialized bytes.
#[derive(Debug)]
pub struct FileStorageAdapter {
    file: File,
    page_count: u64,
    read_only: bool,
}

impl FileStorageAdapter {
    /// Open an existing page file, or create a new (empty) one.
    ///
    /// # Errors
    ///
    /// * [`BufferPoolError::Io`] — the file could not be opened or created.
    /// * [`BufferPoolError::CorruptStorage`] — the file's length is not a
    ///   whole multiple of [`PAGE_SIZE`].
    pub fn open(path: &Path, read_only: bool) -> Result<Self> {
        let file = if read_only {
            OpenOptions::new().read(true).open(path)?
        } else {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(path)?
        };

        let file_len = file.metadata()?.len();
        if file_len % PAGE_SIZE as u64 != 0 {
            return Err(BufferPoolError::CorruptStorage(format!(
                "file length {file_len} is not a multiple of PAGE_SIZE ({PAGE_SIZE})"
            )));
        }

        Ok(FileStorageAdapter {
            file,
            page_count: file_len / PAGE_SIZE as u64,
            read_only,
        })
    }

    /// Total number of pages currently backed by the file.
    #[inline]
    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    #[inline]
    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            Err(BufferPoolError::ReadOnly(
                "cannot mutate a read-only storage adapter".into(),
            ))
        } else {
            Ok(())
        }
    }

    fn ensure_in_bounds(&self, page_num: PageId) -> Result<()> {
        if page_num as u64 >= self.page_count {
            Err(BufferPoolError::CorruptStorage(format!(
                "page {page_num} is beyond the end of the file ({} pages)",
                self.page_count
            )))
        } else {
            Ok(())
        }
    }
}

impl StorageAdapter for FileStorageAdapter {
    fn ensure_capacity(&mut self, page_num: PageId) -> Result<()> {
        let needed = page_num as u64 + 1;
        if needed <= self.page_count {
            return Ok(());
        }
        self.ensure_writable()?;

        // Extend the file one page at a time, zero-filling each new page so
        // a subsequent read never observes uninitialized bytes.
        let blank = [0u8; PAGE_SIZE];
        for page in self.page_count..needed {
            let offset = page * PAGE_SIZE as u64;
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.write_all(&blank)?;
        }
        self.page_count = needed;
        Ok(())
    }

    fn read_block(&mut self, page_num: PageId, buf: &mut PageBuf) -> Result<()> {
        self.ensure_in_bounds(page_num)?;
        let offset = page_num as u64 * PAGE_SIZE as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&mut self, page_num: PageId, buf: &PageBuf) -> Result<()> {
        self.ensure_writable()?;
        self.ensure_in_bounds(page_num)?;
        let offset = page_num as u64 * PAGE_SIZE as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)?;
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn new_adapter() -> (FileStorageAdapter, NamedTempFile) {
        let tmp = NamedTempFile::new().expect("failed to create temp file");
        let adapter =
            FileStorageAdapter::open(tmp.path(), false).expect("failed to open adapter");
        (adapter, tmp)
    }

    #[test]
    fn new_file_has_no_pages() {
        let (adapter, _tmp) = new_adapter();
        assert_eq!(adapter.page_count(), 0);
    }

    #[test]
    fn ensure_capacity_zero_fills_new_pages() {
        let (mut adapter, _tmp) = new_adapter();
        adapter.ensure_capacity(2).unwrap();
        assert_eq!(adapter.page_count(), 3);

        let mut buf = [0u8; PAGE_SIZE];
        adapter.read_block(0, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
        adapter.read_block(2, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn ensure_capacity_is_idempotent() {
        let (mut adapter, _tmp) = new_adapter();
        adapter.ensure_capacity(5).unwrap();
        assert_eq!(adapter.page_count(), 6);
        adapter.ensure_capacity(2).unwrap();
        assert_eq!(adapter.page_count(), 6);
    }

    #[test]
    fn write_then_read_roundtrips() {
        let (mut adapter, _tmp) = new_adapter();
        adapter.ensure_capacity(0).unwrap();

        let mut data = [0u8; PAGE_SIZE];
        data[0] = 0xCA;
        data[PAGE_SIZE - 1] = 0xFE;
        adapter.write_block(0, &data).unwrap();

        let mut read_back = [0u8; PAGE_SIZE];
        adapter.read_block(0, &mut read_back).unwrap();
        assert_eq!(read_back[0], 0xCA);
        assert_eq!(read_back[PAGE_SIZE - 1], 0xFE);
    }

    #[test]
    fn read_out_of_range_is_corrupt_storage() {
        let (mut adapter, _tmp) = new_adapter();
        let mut buf = [0u8; PAGE_SIZE];
        let err = adapter.read_block(3, &mut buf).unwrap_err();
        assert!(matches!(err, BufferPoolError::CorruptStorage(_)));
    }

    #[test]
    fn read_only_rejects_writes_but_allows_reads() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut adapter = FileStorageAdapter::open(tmp.path(), false).unwrap();
            adapter.ensure_capacity(0).unwrap();
        }

        let mut adapter = FileStorageAdapter::open(tmp.path(), true).unwrap();
        let mut buf = [0u8; PAGE_SIZE];
        assert!(adapter.read_block(0, &mut buf).is_ok());

        let err = adapter.write_block(0, &buf).unwrap_err();
        assert!(matches!(err, BufferPoolError::ReadOnly(_)));

        let err = adapter.ensure_capacity(5).unwrap_err();
        assert!(matches!(err, BufferPoolError::ReadOnly(_)));
    }

    #[test]
    fn rejects_truncated_file() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut f = File::create(tmp.path()).unwrap();
            f.write_all(&[0u8; 50]).unwrap();
            f.sync_all().unwrap();
        }

        let err = FileStorageAdapter::open(tmp.path(), false).unwrap_err();
        assert!(matches!(err, BufferPoolError::CorruptStorage(_)));
    }

    #[test]
    fn reopen_preserves_page_count() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut adapter = FileStorageAdapter::open(tmp.path(), false).unwrap();
            adapter.ensure_capacity(2).unwrap();
            adapter.sync().unwrap();
        }

        let adapter = FileStorageAdapter::open(tmp.path(), true).unwrap();
        assert_eq!(adapter.page_count(), 3);
    }
}
