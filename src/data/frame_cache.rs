use std::{collections::VecDeque, sync::Arc};

use crate::{
    foundation::error::{ColorizerError, ColorizerResult},
    loaders::frame::Frame,
};

/// Bounded store of decoded frames for a sequence of fixed length.
///
/// Eviction is by insertion order (FIFO), not by access. Every frame leaving the cache has its
/// texture released before the cache drops its reference.
#[derive(Debug)]
pub struct FrameCache {
    slots: Vec<Option<Arc<Frame>>>,
    order: VecDeque<usize>, // oldest first
    capacity: usize,
    disposed: bool,
}

impl FrameCache {
    pub fn new(len: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![None; len],
            order: VecDeque::with_capacity(capacity.min(len) + 1),
            capacity,
            disposed: false,
        }
    }

    /// Store `frame` at `index`, evicting the oldest other entry when over capacity.
    ///
    /// Returns the evicted index, if any.
    pub fn insert(&mut self, index: usize, frame: Arc<Frame>) -> ColorizerResult<Option<usize>> {
        if self.disposed {
            frame.release();
            return Err(ColorizerError::Disposed);
        }
        let len = self.slots.len();
        let Some(slot) = self.slots.get_mut(index) else {
            return Err(ColorizerError::validation(format!(
                "frame index {index} out of range for {len} frames"
            )));
        };

        if let Some(prev) = slot.replace(Arc::clone(&frame)) {
            if !Arc::ptr_eq(&prev, &frame) {
                prev.release();
            }
            self.order.retain(|&i| i != index);
        }
        self.order.push_back(index);

        let mut evicted = None;
        while self.order.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(old) = self.slots[oldest].take() {
                old.release();
                tracing::debug!(evicted = oldest, inserted = index, "frame cache eviction");
                evicted = Some(oldest);
            }
        }
        Ok(evicted)
    }

    /// Resident frame at `index`. Never triggers a load.
    pub fn get(&self, index: usize) -> Option<Arc<Frame>> {
        self.slots.get(index)?.clone()
    }

    pub fn contains(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Length of the frame sequence, independent of residency.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of frames currently resident.
    pub fn resident(&self) -> usize {
        self.order.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resident indices, oldest insertion first.
    pub fn resident_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }

    /// Release every resident frame. Later inserts fail with [`ColorizerError::Disposed`].
    pub fn dispose(&mut self) {
        let released = self.order.len();
        for index in self.order.drain(..) {
            if let Some(frame) = self.slots[index].take() {
                frame.release();
            }
        }
        if !self.disposed {
            tracing::debug!(released, "frame cache disposed");
        }
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/frame_cache.rs"]
mod tests;
