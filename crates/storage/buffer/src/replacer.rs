use crate::frame::FrameId;
use std::collections::{HashMap, VecDeque};

/// How a page access should be treated by the replacement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessType {
    /// A point access; counts toward the frame's reuse history.
    #[default]
    Lookup,
    /// A sequential-scan access. Not recorded, so one-off scans do not
    /// pollute the history of hot pages.
    Scan,
}

/// Per-frame replacement bookkeeping: the last `k` access timestamps in
/// arrival order, plus the evictable flag.
#[derive(Debug, Default)]
struct LruKNode {
    history: VecDeque<u64>,
    is_evictable: bool,
}

/// LRU-K replacement over the pool's frames.
///
/// The victim is the evictable frame with the largest backward k-distance:
/// the difference between the current logical time and the frame's k-th most
/// recent access. Frames with fewer than `k` recorded accesses have infinite
/// distance and outrank every fully-warmed frame; among those the frame with
/// the oldest recorded access goes first, and a frame with no recorded
/// accesses at all goes before everything. Remaining ties break toward the
/// lowest frame id.
///
/// Operations are O(number of tracked frames), which is bounded by the pool
/// capacity. The pool wraps the replacer in a `Mutex` that is only taken
/// while the pool latch is held.
#[derive(Debug)]
pub(crate) struct LruKReplacer {
    node_store: HashMap<FrameId, LruKNode>,
    // Starts at 1 so an empty history (treated as time 0) is strictly the
    // oldest.
    current_timestamp: u64,
    curr_size: usize,
    replacer_size: usize,
    k: usize,
}

impl LruKReplacer {
    pub(crate) fn new(num_frames: usize, k: usize) -> Self {
        assert!(k >= 1, "LRU-K needs k >= 1");
        Self {
            node_store: HashMap::with_capacity(num_frames),
            current_timestamp: 1,
            curr_size: 0,
            replacer_size: num_frames,
            k,
        }
    }

    /// Selects the eviction victim, dropping its bookkeeping. `None` if no
    /// frame is evictable.
    pub(crate) fn evict(&mut self) -> Option<FrameId> {
        let mut victim: Option<(bool, u64, FrameId)> = None;

        for (&frame_id, node) in &self.node_store {
            if !node.is_evictable {
                continue;
            }

            let warm = node.history.len() >= self.k;
            let oldest = node.history.front().copied().unwrap_or(0);
            let candidate = (warm, oldest, frame_id);

            if victim.map_or(true, |best| candidate < best) {
                victim = Some(candidate);
            }
        }

        let (_, _, frame_id) = victim?;
        self.node_store.remove(&frame_id);
        self.curr_size -= 1;
        Some(frame_id)
    }

    /// Records an access to `frame_id` at the current logical time. `Scan`
    /// accesses start tracking the frame but leave its history untouched.
    pub(crate) fn record_access(&mut self, frame_id: FrameId, access_type: AccessType) {
        assert!(
            frame_id < self.replacer_size,
            "frame id {frame_id} is out of range for this replacer"
        );

        let node = self.node_store.entry(frame_id).or_default();
        if access_type == AccessType::Scan {
            return;
        }

        if node.history.len() == self.k {
            node.history.pop_front();
        }
        node.history.push_back(self.current_timestamp);
        self.current_timestamp += 1;
    }

    /// Flips the evictable flag, keeping the evictable count in sync. No-op
    /// if the flag already has the requested value.
    pub(crate) fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        assert!(
            frame_id < self.replacer_size,
            "frame id {frame_id} is out of range for this replacer"
        );

        let node = self.node_store.entry(frame_id).or_default();
        if node.is_evictable == evictable {
            return;
        }

        node.is_evictable = evictable;
        if evictable {
            self.curr_size += 1;
        } else {
            self.curr_size -= 1;
        }
    }

    /// Drops all bookkeeping for `frame_id`. No-op for an untracked frame.
    ///
    /// Panics if the frame is tracked and not evictable: removing a pinned
    /// frame would desynchronize the pool's accounting.
    pub(crate) fn remove(&mut self, frame_id: FrameId) {
        let Some(node) = self.node_store.get(&frame_id) else {
            return;
        };
        assert!(
            node.is_evictable,
            "removed frame {frame_id} from the replacer while it is not evictable"
        );

        self.node_store.remove(&frame_id);
        self.curr_size -= 1;
    }

    /// Number of currently evictable frames.
    pub(crate) fn size(&self) -> usize {
        self.curr_size
    }
}
