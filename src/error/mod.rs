//! Unified error handling for the buffer pool crate.
//!
//! This module defines [`BufferPoolError`], the single error type propagated
//! throughout every layer of the crate — from the storage adapter up
//! through the pool controller.
//!
//! A convenience [`Result<T>`] type alias is re-exported so that callers can
//! write `Result<T>` instead of `std::result::Result<T, BufferPoolError>`.

use std::fmt;
use std::io;

use crate::storage::PageId;

/// The canonical error type for all buffer pool operations.
///
/// Every fallible function in the crate returns this type (via the
/// [`Result`] alias). Variants are organised by subsystem so that callers
/// can match on the error category without inspecting free-form strings.
#[derive(Debug)]
pub enum BufferPoolError {
    /// An I/O error originating from the storage adapter.
    Io(io::Error),

    /// The on-disk page file is corrupt or contains an unrecognised
    /// format (e.g. bad magic bytes, truncated header).
    CorruptStorage(String),

    /// A write was attempted against a storage adapter opened read-only.
    ReadOnly(String),

    /// An operation was attempted on a pool that has not been initialized,
    /// or that has already been shut down.
    PoolNotOpen,

    /// `shutdown` was called on a pool that was never opened.
    PoolShutdownError,

    /// `shutdown` was called while one or more frames still have
    /// `fix_count > 0`.
    PinnedPagesInBuffer,

    /// `pin_page` was called with a negative page number.
    NegativePageNum(i64),

    /// `unpin_page` or `force_page` referenced a page that is not resident
    /// in any frame.
    PageNotInFramelist(PageId),

    /// `unpin_page` was called on a page whose `fix_count` is already zero.
    PageNotPinned(PageId),

    /// A miss occurred but every frame has `fix_count > 0`, so no frame is
    /// eligible for eviction.
    NoEvictableFrame,

    /// An internal invariant was violated. This usually indicates a bug in
    /// the pool itself and should be reported.
    Internal(String),
}

impl fmt::Display for BufferPoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferPoolError::Io(err) => write!(f, "I/O error: {err}"),
            BufferPoolError::CorruptStorage(msg) => write!(f, "corrupt storage: {msg}"),
            BufferPoolError::ReadOnly(msg) => write!(f, "read-only: {msg}"),
            BufferPoolError::PoolNotOpen => write!(f, "buffer pool is not open"),
            BufferPoolError::PoolShutdownError => {
                write!(f, "cannot shut down a pool that was never initialized")
            }
            BufferPoolError::PinnedPagesInBuffer => {
                write!(f, "cannot shut down: one or more pages are still pinned")
            }
            BufferPoolError::NegativePageNum(n) => {
                write!(f, "negative page number: {n}")
            }
            BufferPoolError::PageNotInFramelist(id) => {
                write!(f, "page {id} is not resident in any frame")
            }
            BufferPoolError::PageNotPinned(id) => {
                write!(f, "page {id} is not currently pinned")
            }
            BufferPoolError::NoEvictableFrame => {
                write!(f, "no evictable frame: every frame is pinned")
            }
            BufferPoolError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for BufferPoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BufferPoolError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for BufferPoolError {
    fn from(err: io::Error) -> Self {
        BufferPoolError::Io(err)
    }
}

/// A specialised [`Result`] type for buffer pool operations.
///
/// This is defined as a convenience so that every function in the crate
/// can simply return `Result<T>` rather than spelling out the full
/// `std::result::Result<T, BufferPoolError>`.
pub type Result<T> = std::result::Result<T, BufferPoolError>;
