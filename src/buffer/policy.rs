//! Replacement policies for the buffer pool.
//!
//! Modeled as a closed, tagged variant over the five supported strategies
//! rather than an open trait-object hierarchy — the set is fixed by
//! design, and a single-threaded pool gains nothing from dynamic dispatch.
//! Each arm implements its own selection rule (CLOCK's circular
//! sweep-and-clear, LRU's recency timestamp, LFU's reference count,
//! FIFO's insertion cursor) behind a plain `match` since nothing here runs
//! concurrently.

use super::Frame;

/// The replacement strategy a [`super::BufferPool`] was configured with.
///
/// `LruK`'s `k` is accepted so callers can request a particular history
/// depth, but is not yet consulted by [`ReplacementStrategy::select_victim`];
/// LRU-K currently behaves identically to LRU, tracking only the single
/// most recent access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementStrategy {
    Fifo,
    Lru,
    LruK { k: usize },
    Lfu,
    Clock,
}

impl ReplacementStrategy {
    /// Update the frame's policy-specific metadata after it is pinned,
    /// whether that pin was a hit or a fresh install from disk.
    ///
    /// `global_tick` is the pool's monotonic counter, already incremented
    /// by the caller for this pin.
    pub(super) fn on_pin(&self, frame: &mut Frame, global_tick: i64) {
        match self {
            ReplacementStrategy::Fifo => {
                // FIFO orders purely by rear_index / insertion slot; no
                // per-frame bookkeeping beyond what the controller tracks.
            }
            ReplacementStrategy::Lru | ReplacementStrategy::LruK { .. } => {
                frame.hit_num = global_tick;
            }
            ReplacementStrategy::Lfu => {
                // ref_num is bumped on hit by the caller (it must not be
                // bumped on a fresh install); nothing to do here.
            }
            ReplacementStrategy::Clock => {
                frame.hit_num = 1;
            }
        }
    }

    /// Reset the metadata of a frame that was just installed from disk
    /// (fresh miss, not a hit).
    pub(super) fn on_install(&self, frame: &mut Frame, global_tick: i64) {
        frame.ref_num = 0;
        self.on_pin(frame, global_tick);
    }

    /// Select the victim frame index for eviction, given the pool's
    /// current hand/cursor state. Returns the victim index and, for CLOCK,
    /// the new hand position the caller should store back (CLOCK advances
    /// its hand as part of the scan, independent of whether a victim was
    /// found).
    ///
    /// Ties are always broken by the lowest frame index.
    pub(super) fn select_victim(
        &self,
        frames: &[Frame],
        rear_index: u64,
        clock_hand: usize,
    ) -> Option<VictimChoice> {
        if frames.is_empty() {
            return None;
        }
        match self {
            ReplacementStrategy::Fifo => Self::select_fifo(frames, rear_index),
            ReplacementStrategy::Lru | ReplacementStrategy::LruK { .. } => Self::select_lru(frames),
            ReplacementStrategy::Lfu => Self::select_lfu(frames),
            ReplacementStrategy::Clock => Self::select_clock(frames, clock_hand),
        }
    }

    fn select_fifo(frames: &[Frame], rear_index: u64) -> Option<VictimChoice> {
        let n = frames.len();
        let start = (rear_index as usize) % n;
        for offset in 0..n {
            let idx = (start + offset) % n;
            if frames[idx].fix_count == 0 {
                return Some(VictimChoice {
                    index: idx,
                    new_clock_hand: None,
                    new_lfu_hand: None,
                });
            }
        }
        None
    }

    fn select_lru(frames: &[Frame]) -> Option<VictimChoice> {
        frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.fix_count == 0)
            .min_by_key(|(idx, f)| (f.hit_num, *idx))
            .map(|(idx, _)| VictimChoice {
                index: idx,
                new_clock_hand: None,
                new_lfu_hand: None,
            })
    }

    fn select_lfu(frames: &[Frame]) -> Option<VictimChoice> {
        let n = frames.len();
        frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.fix_count == 0)
            .min_by_key(|(idx, f)| (f.ref_num, *idx))
            .map(|(idx, _)| VictimChoice {
                index: idx,
                new_clock_hand: None,
                new_lfu_hand: Some((idx + 1) % n),
            })
    }

    fn select_clock(frames: &[Frame], clock_hand: usize) -> Option<VictimChoice> {
        let n = frames.len();
        if n == 0 {
            return None;
        }
        let mut hand = clock_hand % n;
        // Guaranteed to terminate within 2*n steps when at least one
        // unpinned frame exists.
        for _ in 0..(2 * n) {
            let frame = &frames[hand];
            if frame.fix_count > 0 {
                hand = (hand + 1) % n;
                continue;
            }
            if frame.hit_num == 0 {
                let victim = hand;
                return Some(VictimChoice {
                    index: victim,
                    new_clock_hand: Some((hand + 1) % n),
                    new_lfu_hand: None,
                });
            }
            // Give it a second chance: clear the reference bit and move on.
            // The caller is responsible for actually clearing frames[hand]
            // since select_victim only takes a shared slice; see
            // BufferPool::pin_page for the mutable sweep.
            hand = (hand + 1) % n;
        }
        None
    }

    /// CLOCK needs to mutate reference bits while scanning, which
    /// `select_victim`'s shared-slice signature cannot do. This variant
    /// performs the full second-chance sweep against a mutable slice and
    /// is what [`super::BufferPool::pin_page`] actually calls for the
    /// `Clock` strategy.
    pub(super) fn select_clock_mut(frames: &mut [Frame], clock_hand: usize) -> Option<VictimChoice> {
        let n = frames.len();
        if n == 0 {
            return None;
        }
        let mut hand = clock_hand % n;
        for _ in 0..(2 * n) {
            if frames[hand].fix_count > 0 {
                hand = (hand + 1) % n;
                continue;
            }
            if frames[hand].hit_num == 0 {
                let victim = hand;
                return Some(VictimChoice {
                    index: victim,
                    new_clock_hand: Some((hand + 1) % n),
                    new_lfu_hand: None,
                });
            }
            frames[hand].hit_num = 0;
            hand = (hand + 1) % n;
        }
        None
    }
}

/// The outcome of a victim search: which frame to evict, and any hand/cursor
/// updates the pool controller should apply after the eviction completes.
pub(super) struct VictimChoice {
    pub index: usize,
    pub new_clock_hand: Option<usize>,
    pub new_lfu_hand: Option<usize>,
}
