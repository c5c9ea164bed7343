//! Frame replacement policy for the buffer pool.

#[cfg(debug_assertions)]
use std::collections::HashSet;
use std::collections::VecDeque;

use super::frame::FrameId;

/// LRU (least recently used) frame replacement.
///
/// Tracks frames eligible for eviction. Frames become evictable when their
/// pin count drops to zero and leave the candidate set when pinned again.
///
/// # Usage Contract
///
/// - `unpin(frame_id)`: called when pin_count transitions 1 → 0
/// - `pin(frame_id)`: called when pin_count transitions 0 → 1
/// - Each method is called exactly once per transition
///
/// Evicts the least recently unpinned frame. Debug builds verify the
/// contract with a shadow set.
pub struct LruReplacer {
    /// Frames in LRU order (front = LRU).
    lru_list: VecDeque<FrameId>,

    /// Frame set for contract verification (debug only).
    #[cfg(debug_assertions)]
    frame_set: HashSet<FrameId>,
}

impl LruReplacer {
    /// Creates a new LRU replacer with pre-allocated capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            lru_list: VecDeque::with_capacity(capacity),
            #[cfg(debug_assertions)]
            frame_set: HashSet::with_capacity(capacity),
        }
    }

    /// Marks a frame as evictable (pin_count 1 → 0).
    pub fn unpin(&mut self, frame_id: FrameId) {
        #[cfg(debug_assertions)]
        {
            let was_inserted = self.frame_set.insert(frame_id);
            debug_assert!(was_inserted, "unpin called on frame already in replacer");
        }
        self.lru_list.push_back(frame_id);
    }

    /// Removes a frame from eviction candidates (pin_count 0 → 1).
    pub fn pin(&mut self, frame_id: FrameId) {
        #[cfg(debug_assertions)]
        {
            let was_removed = self.frame_set.remove(&frame_id);
            debug_assert!(was_removed, "pin called on frame not in replacer");
        }
        self.lru_list.retain(|&id| id != frame_id);
    }

    /// Evicts and returns the LRU frame, or `None` if none are evictable.
    pub fn evict(&mut self) -> Option<FrameId> {
        let frame_id = self.lru_list.pop_front()?;
        #[cfg(debug_assertions)]
        {
            let was_removed = self.frame_set.remove(&frame_id);
            debug_assert!(was_removed, "evicted frame not in frame_set");
        }
        Some(frame_id)
    }

    /// Returns the number of evictable frames.
    pub fn size(&self) -> usize {
        self.lru_list.len()
    }
}
