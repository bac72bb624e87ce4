//! # bufferpool
//!
//! A page-oriented buffer pool manager: a bounded, in-memory cache of
//! fixed-size pages sitting between a client and a block-addressed page
//! file. Tracks pins so in-use pages are never evicted, records
//! dirtiness, chooses eviction victims via a pluggable replacement
//! policy (FIFO, LRU, LRU-K, LFU, CLOCK), and counts read/write I/O.
//!
//! The pool is single-threaded and synchronous: every operation runs to
//! completion before the next begins, and there is no transactional log,
//! undo/redo, or concurrent multi-client access — those are out of scope
//! for this crate, left to whatever sits on top of it.
//!
//! ```no_run
//! use bufferpool::{BufferPool, ReplacementStrategy};
//! use bufferpool::storage::FileStorageAdapter;
//! use std::path::Path;
//!
//! # fn main() -> bufferpool::Result<()> {
//! let storage = FileStorageAdapter::open(Path::new("data.pages"), false)?;
//! let pool = BufferPool::init(Box::new(storage), 64, ReplacementStrategy::Lru)?;
//!
//! let handle = pool.pin_page(0)?;
//! handle.data_mut()[0] = 42;
//! handle.unpin()?;
//!
//! pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod error;
pub mod storage;

pub use buffer::{BufferPool, BufferPoolBuilder, BufferPoolStats, PageHandle, ReplacementStrategy, NO_PAGE};
pub use error::{BufferPoolError, Result};
pub use storage::{FileStorageAdapter, PageBuf, PageId, StorageAdapter, PAGE_SIZE};
