//! # Buffer Pool
//!
//! The buffer pool is an in-memory page cache that sits between a client and
//! a block-addressed page file served by a [`StorageAdapter`]. It caches a
//! bounded number of fixed-size pages in frames, tracks pins so that
//! in-use pages are never evicted, records dirtiness, and chooses eviction
//! victims via a pluggable [`ReplacementStrategy`].
//!
//! All page access goes through [`BufferPool::pin_page`], which returns a
//! [`PageHandle`] — a scoped guard that unpins its page automatically when
//! dropped.

pub mod policy;

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace, warn};

use crate::error::{BufferPoolError, Result};
use crate::storage::{PageBuf, PageId, StorageAdapter, PAGE_SIZE};

pub use policy::ReplacementStrategy;

/// Sentinel reported by [`BufferPool::get_frame_contents`] for empty frames.
pub const NO_PAGE: i64 = -1;

/// A single cache slot. Empty when `page_num` is `None`, in which case it
/// holds no allocated buffer, `fix_count == 0`, and `dirty == false`.
#[derive(Debug)]
pub(crate) struct Frame {
    pub(crate) page_num: Option<PageId>,
    pub(crate) data: Option<Box<PageBuf>>,
    pub(crate) fix_count: u32,
    pub(crate) dirty: bool,
    /// LRU/LRU-K timestamp, or CLOCK's reference bit (0/1).
    pub(crate) hit_num: i64,
    /// LFU reference count.
    pub(crate) ref_num: u32,
}

impl Frame {
    pub(crate) fn empty() -> Self {
        Frame {
            page_num: None,
            data: None,
            fix_count: 0,
            dirty: false,
            hit_num: 0,
            ref_num: 0,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.page_num.is_none()
    }
}

/// The mutable state shared between a [`BufferPool`] handle and every
/// [`PageHandle`] pinned from it.
struct PoolInner {
    storage: Box<dyn StorageAdapter>,
    frames: Vec<Frame>,
    page_table: HashMap<PageId, usize>,
    strategy: ReplacementStrategy,
    rear_index: u64,
    global_tick: i64,
    clock_hand: usize,
    lfu_hand: usize,
    write_count: u64,
    open: bool,
}

impl PoolInner {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(BufferPoolError::PoolNotOpen)
        }
    }

    fn flush_frame(&mut self, idx: usize) -> Result<()> {
        let page_num = self.frames[idx]
            .page_num
            .ok_or_else(|| BufferPoolError::Internal(format!("flush of empty frame {idx}")))?;
        let data = self.frames[idx]
            .data
            .as_ref()
            .ok_or_else(|| BufferPoolError::Internal(format!("frame {idx} has no data")))?;
        self.storage.write_block(page_num, data)?;
        self.frames[idx].dirty = false;
        self.write_count += 1;
        Ok(())
    }

    fn flush_all(&mut self) -> Result<()> {
        self.ensure_open()?;
        for idx in 0..self.frames.len() {
            if self.frames[idx].fix_count == 0 && self.frames[idx].dirty {
                self.flush_frame(idx)?;
            }
        }
        Ok(())
    }

    fn mark_dirty(&mut self, page_num: PageId) -> Result<()> {
        self.ensure_open()?;
        let idx = *self
            .page_table
            .get(&page_num)
            .ok_or(BufferPoolError::PageNotInFramelist(page_num))?;
        self.frames[idx].dirty = true;
        Ok(())
    }

    fn unpin_page(&mut self, page_num: PageId) -> Result<()> {
        self.ensure_open()?;
        let idx = *self
            .page_table
            .get(&page_num)
            .ok_or(BufferPoolError::PageNotInFramelist(page_num))?;
        if self.frames[idx].fix_count == 0 {
            return Err(BufferPoolError::PageNotPinned(page_num));
        }
        self.frames[idx].fix_count -= 1;
        Ok(())
    }

    fn force_page(&mut self, page_num: PageId) -> Result<()> {
        self.ensure_open()?;
        let idx = *self
            .page_table
            .get(&page_num)
            .ok_or(BufferPoolError::PageNotInFramelist(page_num))?;
        self.flush_frame(idx)
    }

    /// Load `page_num` from storage into frame `idx`, replacing whatever
    /// that frame previously held. Storage calls happen before any of the
    /// frame's fields are touched, so a failed `ensure_capacity`/`read_block`
    /// leaves the frame exactly as it was (no partially-populated frame).
    fn install_into_frame(&mut self, idx: usize, page_num: PageId) -> Result<()> {
        self.storage.ensure_capacity(page_num)?;
        let mut buf: Box<PageBuf> = Box::new([0u8; PAGE_SIZE]);
        self.storage.read_block(page_num, &mut buf)?;

        if let Some(old) = self.frames[idx].page_num {
            self.page_table.remove(&old);
        }

        self.rear_index += 1;
        self.global_tick += 1;

        self.frames[idx].page_num = Some(page_num);
        self.frames[idx].data = Some(buf);
        self.frames[idx].fix_count = 1;
        self.frames[idx].dirty = false;

        let tick = self.global_tick;
        self.strategy.on_install(&mut self.frames[idx], tick);
        self.page_table.insert(page_num, idx);
        Ok(())
    }

    fn pin_page(&mut self, page_num_raw: i64) -> Result<PageId> {
        self.ensure_open()?;
        if page_num_raw < 0 {
            return Err(BufferPoolError::NegativePageNum(page_num_raw));
        }
        let page_num = page_num_raw as PageId;

        if let Some(&idx) = self.page_table.get(&page_num) {
            trace!("buffer pool hit: page {page_num} in frame {idx}");
            self.global_tick += 1;
            let tick = self.global_tick;
            if matches!(self.strategy, ReplacementStrategy::Lfu) {
                self.frames[idx].ref_num += 1;
            }
            self.frames[idx].fix_count += 1;
            self.strategy.on_pin(&mut self.frames[idx], tick);
            return Ok(page_num);
        }

        if let Some(idx) = self.frames.iter().position(Frame::is_empty) {
            debug!("buffer pool miss: installing page {page_num} into empty frame {idx}");
            self.install_into_frame(idx, page_num)?;
            return Ok(page_num);
        }

        let choice = match self.strategy {
            ReplacementStrategy::Clock => {
                ReplacementStrategy::select_clock_mut(&mut self.frames, self.clock_hand)
            }
            _ => self
                .strategy
                .select_victim(&self.frames, self.rear_index, self.clock_hand),
        }
        .ok_or(BufferPoolError::NoEvictableFrame)?;

        if let Some(hand) = choice.new_clock_hand {
            self.clock_hand = hand;
        }
        if let Some(hand) = choice.new_lfu_hand {
            self.lfu_hand = hand;
        }

        let idx = choice.index;
        if self.frames[idx].dirty {
            self.flush_frame(idx)?;
        }
        debug!(
            "buffer pool eviction: frame {idx} (was page {:?}) -> page {page_num}",
            self.frames[idx].page_num
        );
        self.install_into_frame(idx, page_num)?;
        Ok(page_num)
    }

    fn shutdown(&mut self) -> Result<()> {
        if !self.open {
            return Err(BufferPoolError::PoolShutdownError);
        }
        if self.frames.iter().any(|f| f.fix_count > 0) {
            return Err(BufferPoolError::PinnedPagesInBuffer);
        }
        self.flush_all()?;
        for frame in &mut self.frames {
            *frame = Frame::empty();
        }
        self.page_table.clear();
        self.storage.sync()?;
        self.open = false;
        Ok(())
    }

    fn frame_contents(&self) -> Vec<i64> {
        self.frames
            .iter()
            .map(|f| f.page_num.map(|p| p as i64).unwrap_or(NO_PAGE))
            .collect()
    }

    fn dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.dirty).collect()
    }

    fn fix_counts(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.fix_count).collect()
    }

    fn num_read_io(&self) -> u64 {
        // Legacy convention: one more than the number of distinct pages
        // actually loaded from disk since init.
        self.rear_index + 1
    }

    fn num_write_io(&self) -> u64 {
        self.write_count
    }
}

/// Page-oriented cache of fixed-size frames backed by a [`StorageAdapter`].
///
/// Cloning a `BufferPool` is cheap (it shares the same underlying state via
/// `Rc<RefCell<..>>`) and is how [`PageHandle`]s reach back into the pool to
/// auto-unpin themselves on drop.
#[derive(Clone)]
pub struct BufferPool {
    inner: Rc<RefCell<PoolInner>>,
}

impl BufferPool {
    /// Initialize a pool with a fixed frame table of `num_pages` frames,
    /// all empty, with every counter zeroed.
    pub fn init(
        storage: Box<dyn StorageAdapter>,
        num_pages: usize,
        strategy: ReplacementStrategy,
    ) -> Result<Self> {
        if num_pages == 0 {
            return Err(BufferPoolError::Internal(
                "buffer pool must have at least one frame".into(),
            ));
        }
        let frames = (0..num_pages).map(|_| Frame::empty()).collect();
        Ok(BufferPool {
            inner: Rc::new(RefCell::new(PoolInner {
                storage,
                frames,
                page_table: HashMap::with_capacity(num_pages),
                strategy,
                rear_index: 0,
                global_tick: 0,
                clock_hand: 0,
                lfu_hand: 0,
                write_count: 0,
                open: true,
            })),
        })
    }

    /// Start building a pool with [`BufferPoolBuilder`].
    pub fn builder() -> BufferPoolBuilder {
        BufferPoolBuilder::default()
    }

    /// Pin `page_num`, returning a scoped [`PageHandle`]. Negative page
    /// numbers fail with [`BufferPoolError::NegativePageNum`].
    pub fn pin_page(&self, page_num: i64) -> Result<PageHandle> {
        let page_num = self.inner.borrow_mut().pin_page(page_num)?;
        Ok(PageHandle {
            pool: Rc::clone(&self.inner),
            page_num,
            released: false,
        })
    }

    /// Write back every unpinned dirty frame; pinned dirty frames are
    /// skipped even though they are dirty.
    pub fn flush_all(&self) -> Result<()> {
        self.inner.borrow_mut().flush_all()
    }

    /// Fail if any frame is still pinned; otherwise flush and release every
    /// frame buffer and close the pool.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.borrow_mut().shutdown()
    }

    /// Unpin `page_num` directly, without going through a [`PageHandle`].
    ///
    /// Fails with [`BufferPoolError::PageNotInFramelist`] if the page is not
    /// resident, or [`BufferPoolError::PageNotPinned`] if it is resident but
    /// already has a fix count of zero. A [`PageHandle`] obtained from
    /// [`BufferPool::pin_page`] still owns its own pin and will try to unpin
    /// again on drop unless released first with [`PageHandle::unpin`].
    pub fn unpin_page(&self, page_num: i64) -> Result<()> {
        let page_id = page_num as PageId;
        self.inner.borrow_mut().unpin_page(page_id)
    }

    pub fn get_frame_contents(&self) -> Vec<i64> {
        self.inner.borrow().frame_contents()
    }

    pub fn get_dirty_flags(&self) -> Vec<bool> {
        self.inner.borrow().dirty_flags()
    }

    pub fn get_fix_counts(&self) -> Vec<u32> {
        self.inner.borrow().fix_counts()
    }

    /// Legacy convention: `rear_index + 1`, not the raw read count.
    pub fn get_num_read_io(&self) -> u64 {
        self.inner.borrow().num_read_io()
    }

    pub fn get_num_write_io(&self) -> u64 {
        self.inner.borrow().num_write_io()
    }

    /// A single snapshot of the five introspection getters plus pool shape,
    /// for callers who want one call instead of five.
    pub fn stats(&self) -> BufferPoolStats {
        let inner = self.inner.borrow();
        BufferPoolStats {
            num_read_io: inner.num_read_io(),
            num_write_io: inner.num_write_io(),
            num_frames: inner.frames.len(),
            num_occupied: inner.frames.iter().filter(|f| !f.is_empty()).count(),
            num_pinned: inner.frames.iter().filter(|f| f.fix_count > 0).count(),
        }
    }
}

/// A scoped, non-owning view of a pinned page.
///
/// Dropping a `PageHandle` unpins its page automatically. This closes a gap
/// present in handle types that merely borrow the pool by reference: since
/// the pool's state lives behind `Rc<RefCell<..>>`, many handles can be
/// pinned concurrently (each holding its own clone of the `Rc`) and each
/// still mutates the shared pool from `Drop`.
pub struct PageHandle {
    pool: Rc<RefCell<PoolInner>>,
    page_num: PageId,
    released: bool,
}

impl PageHandle {
    /// The page number this handle is pinning.
    pub fn page_num(&self) -> i64 {
        self.page_num as i64
    }

    /// Borrow the page's bytes for reading.
    pub fn data(&self) -> Ref<'_, PageBuf> {
        Ref::map(self.pool.borrow(), |inner| {
            let idx = inner.page_table[&self.page_num];
            inner.frames[idx]
                .data
                .as_deref()
                .expect("a pinned frame always holds data")
        })
    }

    /// Borrow the page's bytes for writing. Marks the frame dirty
    /// unconditionally, since any mutable access may have changed the page.
    pub fn data_mut(&self) -> RefMut<'_, PageBuf> {
        RefMut::map(self.pool.borrow_mut(), |inner| {
            let idx = inner.page_table[&self.page_num];
            inner.frames[idx].dirty = true;
            inner.frames[idx]
                .data
                .as_deref_mut()
                .expect("a pinned frame always holds data")
        })
    }

    /// Explicitly mark this page dirty without taking a mutable borrow of
    /// its data.
    pub fn mark_dirty(&self) -> Result<()> {
        self.pool.borrow_mut().mark_dirty(self.page_num)
    }

    /// Write this page back unconditionally, regardless of its dirty bit.
    pub fn force(&self) -> Result<()> {
        self.pool.borrow_mut().force_page(self.page_num)
    }

    /// Unpin explicitly, surfacing any error instead of logging it from
    /// `Drop`. Prefer this over relying on drop order when the unpin result
    /// matters to the caller.
    pub fn unpin(mut self) -> Result<()> {
        self.released = true;
        self.pool.borrow_mut().unpin_page(self.page_num)
    }
}

impl Drop for PageHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match self.pool.try_borrow_mut() {
            Ok(mut inner) => {
                if let Err(err) = inner.unpin_page(self.page_num) {
                    warn!("auto-unpin of page {} failed: {err}", self.page_num);
                }
            }
            Err(_) => {
                warn!(
                    "could not auto-unpin page {}: pool already borrowed",
                    self.page_num
                );
            }
        }
    }
}

/// A single-call snapshot of pool-wide counters and occupancy, built from
/// the same individual introspection getters exposed on [`BufferPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolStats {
    pub num_read_io: u64,
    pub num_write_io: u64,
    pub num_frames: usize,
    pub num_occupied: usize,
    pub num_pinned: usize,
}

/// Builder for [`BufferPool`], for callers who'd rather set fields
/// incrementally than call [`BufferPool::init`] with positional arguments.
#[derive(Default)]
pub struct BufferPoolBuilder {
    num_pages: Option<usize>,
    strategy: Option<ReplacementStrategy>,
    storage: Option<Box<dyn StorageAdapter>>,
}

impl BufferPoolBuilder {
    pub fn num_pages(mut self, num_pages: usize) -> Self {
        self.num_pages = Some(num_pages);
        self
    }

    pub fn strategy(mut self, strategy: ReplacementStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn storage(mut self, storage: Box<dyn StorageAdapter>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn build(self) -> Result<BufferPool> {
        let num_pages = self
            .num_pages
            .ok_or_else(|| BufferPoolError::Internal("num_pages is required".into()))?;
        let storage = self
            .storage
            .ok_or_else(|| BufferPoolError::Internal("a storage adapter is required".into()))?;
        let strategy = self.strategy.unwrap_or(ReplacementStrategy::Lru);
        BufferPool::init(storage, num_pages, strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::mock::MockStorageAdapter;

    fn pool(num_pages: usize, strategy: ReplacementStrategy) -> BufferPool {
        let storage = Box::new(MockStorageAdapter::new());
        BufferPool::init(storage, num_pages, strategy).unwrap()
    }

    #[test]
    fn init_starts_with_all_empty_frames() {
        let p = pool(3, ReplacementStrategy::Fifo);
        assert_eq!(p.get_frame_contents(), vec![NO_PAGE, NO_PAGE, NO_PAGE]);
        assert_eq!(p.get_fix_counts(), vec![0, 0, 0]);
        assert_eq!(p.get_dirty_flags(), vec![false, false, false]);
    }

    #[test]
    fn pin_miss_then_hit_does_not_reload() {
        let p = pool(2, ReplacementStrategy::Lru);
        let h1 = p.pin_page(1).unwrap();
        assert_eq!(h1.page_num(), 1);
        h1.unpin().unwrap();

        let h2 = p.pin_page(1).unwrap();
        assert_eq!(p.get_num_read_io(), 2); // rear_index(1) + 1, only one real load
        drop(h2);
    }

    #[test]
    fn negative_page_num_is_rejected() {
        let p = pool(1, ReplacementStrategy::Fifo);
        let err = p.pin_page(-1).unwrap_err();
        assert!(matches!(err, BufferPoolError::NegativePageNum(-1)));
    }

    #[test]
    fn unpin_without_pin_fails() {
        let p = pool(1, ReplacementStrategy::Fifo);
        let h = p.pin_page(0).unwrap();
        h.unpin().unwrap();
        let err = p.inner.borrow_mut().unpin_page(0).unwrap_err();
        assert!(matches!(err, BufferPoolError::PageNotPinned(0)));
    }

    #[test]
    fn fully_pinned_pool_refuses_eviction() {
        let p = pool(1, ReplacementStrategy::Fifo);
        let _h = p.pin_page(0).unwrap();
        let err = p.pin_page(1).unwrap_err();
        assert!(matches!(err, BufferPoolError::NoEvictableFrame));
    }

    #[test]
    fn dirty_frame_is_written_back_on_eviction() {
        let p = pool(1, ReplacementStrategy::Fifo);
        let h = p.pin_page(0).unwrap();
        h.data_mut()[0] = 7;
        h.unpin().unwrap();
        assert_eq!(p.get_num_write_io(), 0);

        drop(p.pin_page(1).unwrap());
        assert_eq!(p.get_num_write_io(), 1);
    }

    #[test]
    fn shutdown_fails_with_pinned_page_then_succeeds_after_unpin() {
        let p = pool(2, ReplacementStrategy::Fifo);
        let h = p.pin_page(0).unwrap();
        assert!(matches!(
            p.shutdown(),
            Err(BufferPoolError::PinnedPagesInBuffer)
        ));
        h.unpin().unwrap();
        p.shutdown().unwrap();
        assert_eq!(p.get_frame_contents(), vec![NO_PAGE, NO_PAGE]);
    }

    #[test]
    fn drop_auto_unpins() {
        let p = pool(1, ReplacementStrategy::Fifo);
        {
            let _h = p.pin_page(0).unwrap();
            assert_eq!(p.get_fix_counts(), vec![1]);
        }
        assert_eq!(p.get_fix_counts(), vec![0]);
    }

    #[test]
    fn force_page_writes_back_even_when_clean() {
        let p = pool(1, ReplacementStrategy::Fifo);
        let h = p.pin_page(0).unwrap();
        h.force().unwrap();
        assert_eq!(p.get_num_write_io(), 1);
        assert!(!p.get_dirty_flags()[0]);
    }
}
