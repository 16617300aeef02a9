//! Integration tests for the LRU-K replacer

use pageframe::buffer::LruKReplacer;
use pageframe::common::{AccessType, FrameId};

#[test]
fn test_lru_k_eviction_order() {
    let replacer = LruKReplacer::new(2, 10);

    for i in 0..5 {
        replacer.record_access(FrameId::new(i), AccessType::Unknown).unwrap();
        replacer.set_evictable(FrameId::new(i), true).unwrap();
    }

    assert_eq!(replacer.size(), 5);

    // All frames have only 1 access (< k=2), so all have +inf distance;
    // eviction proceeds in order of earliest timestamp (FIFO).
    for i in 0..5 {
        assert_eq!(replacer.evict(), Some(FrameId::new(i)));
    }

    assert_eq!(replacer.size(), 0);
    assert_eq!(replacer.evict(), None);
}

#[test]
fn test_lru_k_respects_k_distance() {
    let replacer = LruKReplacer::new(2, 10);

    // Frame 0: accessed once (+inf k-distance)
    replacer.record_access(FrameId::new(0), AccessType::Unknown).unwrap();

    // Frame 1: accessed twice (finite k-distance)
    replacer.record_access(FrameId::new(1), AccessType::Unknown).unwrap();
    replacer.record_access(FrameId::new(1), AccessType::Unknown).unwrap();

    // Frame 2: accessed twice, more recently
    replacer.record_access(FrameId::new(2), AccessType::Unknown).unwrap();
    replacer.record_access(FrameId::new(2), AccessType::Unknown).unwrap();

    replacer.set_evictable(FrameId::new(0), true).unwrap();
    replacer.set_evictable(FrameId::new(1), true).unwrap();
    replacer.set_evictable(FrameId::new(2), true).unwrap();

    // Frame 0 has +inf k-distance, evicted first.
    assert_eq!(replacer.evict(), Some(FrameId::new(0)));

    // Between frames 1 and 2, frame 1 has the larger k-distance.
    assert_eq!(replacer.evict(), Some(FrameId::new(1)));

    assert_eq!(replacer.evict(), Some(FrameId::new(2)));
}

#[test]
fn test_lru_k_pinned_frames_not_evicted() {
    let replacer = LruKReplacer::new(2, 10);

    replacer.record_access(FrameId::new(0), AccessType::Unknown).unwrap();
    replacer.record_access(FrameId::new(1), AccessType::Unknown).unwrap();
    replacer.record_access(FrameId::new(2), AccessType::Unknown).unwrap();

    // Only mark frames 1 and 2 as evictable.
    replacer.set_evictable(FrameId::new(1), true).unwrap();
    replacer.set_evictable(FrameId::new(2), true).unwrap();

    assert_eq!(replacer.size(), 2);

    // Frame 0 should never be evicted.
    assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    assert_eq!(replacer.evict(), Some(FrameId::new(2)));
    assert_eq!(replacer.evict(), None);
}

#[test]
fn test_lru_k_toggle_evictable() {
    let replacer = LruKReplacer::new(2, 10);

    replacer.record_access(FrameId::new(0), AccessType::Unknown).unwrap();
    replacer.set_evictable(FrameId::new(0), true).unwrap();
    assert_eq!(replacer.size(), 1);

    replacer.set_evictable(FrameId::new(0), false).unwrap();
    assert_eq!(replacer.size(), 0);
    assert_eq!(replacer.evict(), None);

    replacer.set_evictable(FrameId::new(0), true).unwrap();
    assert_eq!(replacer.size(), 1);
    assert_eq!(replacer.evict(), Some(FrameId::new(0)));
}

#[test]
fn test_lru_k_remove() {
    let replacer = LruKReplacer::new(2, 10);

    replacer.record_access(FrameId::new(0), AccessType::Unknown).unwrap();
    replacer.record_access(FrameId::new(1), AccessType::Unknown).unwrap();
    replacer.set_evictable(FrameId::new(0), true).unwrap();
    replacer.set_evictable(FrameId::new(1), true).unwrap();

    assert_eq!(replacer.size(), 2);

    replacer.remove(FrameId::new(0)).unwrap();
    assert_eq!(replacer.size(), 1);

    assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    assert_eq!(replacer.evict(), None);
}

#[test]
fn test_lru_k_remove_pinned_frame_is_an_invariant_violation() {
    let replacer = LruKReplacer::new(2, 10);

    replacer.record_access(FrameId::new(0), AccessType::Unknown).unwrap();
    // Never marked evictable.

    assert!(replacer.remove(FrameId::new(0)).is_err());
}

#[test]
fn test_lru_k_multiple_inf_distance() {
    let replacer = LruKReplacer::new(3, 10);

    // All frames have fewer than k=3 accesses.
    replacer.record_access(FrameId::new(0), AccessType::Unknown).unwrap();

    replacer.record_access(FrameId::new(1), AccessType::Unknown).unwrap();
    replacer.record_access(FrameId::new(1), AccessType::Unknown).unwrap();

    replacer.record_access(FrameId::new(2), AccessType::Unknown).unwrap();

    for i in 0..3 {
        replacer.set_evictable(FrameId::new(i), true).unwrap();
    }

    // All have +inf k-distance, so eviction goes by earliest timestamp.
    assert_eq!(replacer.evict(), Some(FrameId::new(0)));
    assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    assert_eq!(replacer.evict(), Some(FrameId::new(2)));
}

#[test]
fn test_lru_k_history_limit() {
    let replacer = LruKReplacer::new(2, 10);

    for _ in 0..10 {
        replacer.record_access(FrameId::new(0), AccessType::Unknown).unwrap();
    }

    replacer.record_access(FrameId::new(1), AccessType::Unknown).unwrap();
    replacer.record_access(FrameId::new(1), AccessType::Unknown).unwrap();

    replacer.set_evictable(FrameId::new(0), true).unwrap();
    replacer.set_evictable(FrameId::new(1), true).unwrap();

    // Frame 0's k-distance is based only on its most recent k accesses, so
    // it is still treated as the least recently touched frame.
    assert_eq!(replacer.evict(), Some(FrameId::new(0)));
    assert_eq!(replacer.evict(), Some(FrameId::new(1)));
}

#[test]
fn test_lru_k_concurrent_access() {
    use std::sync::Arc;
    use std::thread;

    let replacer = Arc::new(LruKReplacer::new(2, 100));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let replacer = Arc::clone(&replacer);
            thread::spawn(move || {
                for i in 0..25 {
                    let frame_id = FrameId::new((t * 25 + i) as u32);
                    replacer.record_access(frame_id, AccessType::Unknown).unwrap();
                    replacer.set_evictable(frame_id, true).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(replacer.size(), 100);

    for _ in 0..100 {
        assert!(replacer.evict().is_some());
    }

    assert_eq!(replacer.size(), 0);
}
