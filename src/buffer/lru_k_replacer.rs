use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use priority_queue::PriorityQueue;

use crate::common::{AccessType, BufferPoolError, FrameId, Result, Timestamp};

/// Eviction priority of a frame, ordered so that [`PriorityQueue::pop`]
/// always returns the frame LRU-K would evict next.
///
/// Variant declaration order backs the derived `Ord`: every `Infinite`
/// outranks every `Finite`, matching the rule that frames with fewer than
/// `k` accesses are evicted before any frame with a real k-distance. Within
/// `Infinite`, `Reverse` makes the earliest timestamp sort highest. Within
/// `Finite`, the larger k-distance sorts highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Priority {
    Finite(Timestamp),
    Infinite(Reverse<Timestamp>),
}

/// Access history for a single frame, capped at the last `k` timestamps.
#[derive(Debug, Default)]
struct FrameAccessInfo {
    history: VecDeque<Timestamp>,
    is_evictable: bool,
}

impl FrameAccessInfo {
    fn record_access(&mut self, timestamp: Timestamp, k: usize) {
        self.history.push_back(timestamp);
        while self.history.len() > k {
            self.history.pop_front();
        }
    }

    fn priority(&self, current_ts: Timestamp, k: usize) -> Priority {
        if self.history.len() < k {
            let earliest = self.history.front().copied().unwrap_or(current_ts);
            Priority::Infinite(Reverse(earliest))
        } else {
            let kth_previous = self.history[self.history.len() - k];
            Priority::Finite(current_ts - kth_previous)
        }
    }
}

struct Inner {
    frame_info: HashMap<FrameId, FrameAccessInfo>,
    /// Ordered index over evictable frames only. Non-evictable frames live
    /// in `frame_info` but are absent here, so `evict` never has to scan
    /// past pinned frames.
    queue: PriorityQueue<FrameId, Priority>,
}

/// LRU-K replacement policy.
///
/// Evicts the evictable frame with the largest backward k-distance: the gap
/// between now and the k-th most recent access to that frame. A frame with
/// fewer than `k` accesses has a backward k-distance of infinity and is
/// always preferred for eviction over a frame with a finite distance; ties
/// among infinite-distance frames go to the one accessed longest ago.
pub struct LruKReplacer {
    k: usize,
    max_frames: usize,
    current_timestamp: AtomicU64,
    inner: Mutex<Inner>,
}

impl LruKReplacer {
    /// Creates a new LRU-K replacer tracking up to `max_frames` frames.
    pub fn new(k: usize, max_frames: usize) -> Self {
        Self {
            k,
            max_frames,
            current_timestamp: AtomicU64::new(0),
            inner: Mutex::new(Inner {
                frame_info: HashMap::new(),
                queue: PriorityQueue::new(),
            }),
        }
    }

    /// Evicts and returns the frame with the largest backward k-distance.
    /// Returns `None` if there are no evictable frames.
    pub fn evict(&self) -> Option<FrameId> {
        let mut inner = self.inner.lock();
        let victim = inner.queue.pop().map(|(frame_id, _)| frame_id);
        if let Some(frame_id) = victim {
            inner.frame_info.remove(&frame_id);
            tracing::debug!(?frame_id, "replacer evicted frame");
        }
        victim
    }

    /// Records that `frame_id` was accessed at the current timestamp.
    ///
    /// `access_type` is accepted so callers can distinguish scans, index
    /// probes, and point lookups; this policy does not yet branch on it.
    ///
    /// Returns [`BufferPoolError::InvalidFrameId`] if `frame_id` is out of
    /// range for this replacer.
    pub fn record_access(&self, frame_id: FrameId, access_type: AccessType) -> Result<()> {
        let _ = access_type;
        if frame_id.as_usize() >= self.max_frames {
            return Err(BufferPoolError::InvalidFrameId(frame_id));
        }

        let timestamp = self.current_timestamp.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.lock();
        let info = inner.frame_info.entry(frame_id).or_default();
        info.record_access(timestamp, self.k);

        if info.is_evictable {
            let priority = info.priority(timestamp, self.k);
            inner.queue.push(frame_id, priority);
        }

        Ok(())
    }

    /// Marks a frame as evictable or non-evictable, adding/removing it from
    /// the ordered index accordingly.
    pub fn set_evictable(&self, frame_id: FrameId, is_evictable: bool) -> Result<()> {
        if frame_id.as_usize() >= self.max_frames {
            return Err(BufferPoolError::InvalidFrameId(frame_id));
        }

        let mut inner = self.inner.lock();
        let current_ts = self.current_timestamp.load(Ordering::Relaxed);
        let info = inner.frame_info.entry(frame_id).or_default();

        if info.is_evictable == is_evictable {
            return Ok(());
        }
        info.is_evictable = is_evictable;

        if is_evictable {
            let priority = info.priority(current_ts, self.k);
            inner.queue.push(frame_id, priority);
        } else {
            inner.queue.remove(&frame_id);
        }

        Ok(())
    }

    /// Removes a frame from the replacer entirely, forgetting its history.
    ///
    /// Returns [`BufferPoolError::InvariantViolation`] if the frame is
    /// currently tracked and non-evictable: removing a pinned frame from the
    /// replacer without going through `set_evictable` first would silently
    /// drop bookkeeping the buffer pool manager still depends on.
    pub fn remove(&self, frame_id: FrameId) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.frame_info.get(&frame_id) {
            None => return Ok(()),
            Some(info) if !info.is_evictable => {
                return Err(BufferPoolError::InvariantViolation(
                    "cannot remove a non-evictable frame from the replacer",
                ));
            }
            Some(_) => {}
        }

        inner.frame_info.remove(&frame_id);
        inner.queue.remove(&frame_id);
        Ok(())
    }

    /// Returns the number of evictable frames currently tracked.
    pub fn size(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Returns the k value of this replacer.
    pub fn k(&self) -> usize {
        self.k
    }
}
