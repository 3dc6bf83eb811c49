//! Per-frame write queue. Transform and position writes are batched and
//! applied on the next animation frame; the last write per field wins.

use std::collections::BTreeMap;

use story_player_core::surface::{FrameTransform, StoryPosition};

/// Pending writes for one entry's frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameWrite {
    /// Transform to apply, if any.
    pub transform: Option<FrameTransform>,
    /// Position marker to apply, if any.
    pub position: Option<StoryPosition>,
}

/// Writes waiting for the next animation frame, keyed by entry index.
#[derive(Debug, Default)]
pub struct AnimationQueue {
    pending: BTreeMap<usize, FrameWrite>,
}

impl AnimationQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a transform for the entry at `index`.
    pub fn transform(&mut self, index: usize, transform: FrameTransform) {
        self.pending.entry(index).or_default().transform = Some(transform);
    }

    /// Queues a position marker for the entry at `index`. Repositioning also
    /// clears any drag transform.
    pub fn position(&mut self, index: usize, position: StoryPosition) {
        let write = self.pending.entry(index).or_default();
        write.transform = Some(FrameTransform::Reset);
        write.position = Some(position);
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Takes every queued write, in index order.
    pub fn drain(&mut self) -> Vec<(usize, FrameWrite)> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }
}
