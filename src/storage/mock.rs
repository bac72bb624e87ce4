//! An in-memory [`StorageAdapter`] for tests.
//!
//! Keeping every page in a `Vec` lets unit and integration tests drive the
//! buffer pool's pin/evict/flush paths without touching a filesystem, and
//! lets them assert exact I/O counts: the number of reads and writes the
//! pool issues against a given page sequence.

use super::{PageBuf, PageId, StorageAdapter, PAGE_SIZE};
use crate::error::{BufferPoolError, Result};

/// A `StorageAdapter` backed by a plain `Vec<PageBuf>` instead of a file.
#[derive(Debug, Default)]
pub struct MockStorageAdapter {
    pages: Vec<PageBuf>,
    /// Number of times [`read_block`](StorageAdapter::read_block) was called.
    pub read_count: usize,
    /// Number of times [`write_block`](StorageAdapter::write_block) was called.
    pub write_count: usize,
}

impl MockStorageAdapter {
    /// Create an empty mock adapter (zero pages).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock adapter pre-populated with `num_pages` zeroed pages.
    pub fn with_pages(num_pages: usize) -> Self {
        Self {
            pages: vec![[0u8; PAGE_SIZE]; num_pages],
            read_count: 0,
            write_count: 0,
        }
    }

    /// Total number of pages currently backed by the mock.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Inspect the raw bytes of a page without going through the trait
    /// (and thus without bumping `read_count`). Handy for assertions.
    pub fn peek(&self, page_num: PageId) -> Option<&PageBuf> {
        self.pages.get(page_num as usize)
    }
}

impl StorageAdapter for MockStorageAdapter {
    fn ensure_capacity(&mut self, page_num: PageId) -> Result<()> {
        let needed = page_num as usize + 1;
        if self.pages.len() < needed {
            self.pages.resize(needed, [0u8; PAGE_SIZE]);
        }
        Ok(())
    }

    fn read_block(&mut self, page_num: PageId, buf: &mut PageBuf) -> Result<()> {
        self.read_count += 1;
        let idx = page_num as usize;
        let page = self.pages.get(idx).ok_or_else(|| {
            BufferPoolError::CorruptStorage(format!(
                "page {page_num} is beyond the end of the mock file ({} pages)",
                self.pages.len()
            ))
        })?;
        buf.copy_from_slice(page);
        Ok(())
    }

    fn write_block(&mut self, page_num: PageId, buf: &PageBuf) -> Result<()> {
        self.write_count += 1;
        let idx = page_num as usize;
        let page = self.pages.get_mut(idx).ok_or_else(|| {
            BufferPoolError::CorruptStorage(format!(
                "page {page_num} is beyond the end of the mock file ({} pages)",
                self.pages.len()
            ))
        })?;
        page.copy_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_capacity_grows_in_place() {
        let mut mock = MockStorageAdapter::new();
        mock.ensure_capacity(3).unwrap();
        assert_eq!(mock.page_count(), 4);
    }

    #[test]
    fn read_and_write_count_separately() {
        let mut mock = MockStorageAdapter::with_pages(2);
        let mut buf = [0u8; PAGE_SIZE];
        mock.read_block(0, &mut buf).unwrap();
        mock.write_block(1, &buf).unwrap();
        assert_eq!(mock.read_count, 1);
        assert_eq!(mock.write_count, 1);
    }

    #[test]
    fn write_then_peek_without_counting_a_read() {
        let mut mock = MockStorageAdapter::with_pages(1);
        let mut data = [0u8; PAGE_SIZE];
        data[10] = 77;
        mock.write_block(0, &data).unwrap();
        assert_eq!(mock.read_count, 0);
        assert_eq!(mock.peek(0).unwrap()[10], 77);
    }

    #[test]
    fn out_of_range_access_errors() {
        let mut mock = MockStorageAdapter::new();
        let mut buf = [0u8; PAGE_SIZE];
        assert!(mock.read_block(0, &mut buf).is_err());
        assert!(mock.write_block(0, &buf).is_err());
    }
}
