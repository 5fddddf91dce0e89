use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::SlotId;

/// A shared stack of unused pool slot indices.
///
/// This is the only piece of pool state that several per-slot workers may
/// touch at once, so it is safe to [`FreeList::push`] and
/// [`FreeList::try_pop`] through a shared reference from any thread. Every
/// other slot field is owned by its slot.
#[derive(Debug, Default)]
pub struct FreeList {
    stack: Mutex<Vec<SlotId>>,
}

impl FreeList {
    /// Creates an empty free list with room for `capacity` indices.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stack: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Creates a free list holding every index in `[0, capacity)`.
    ///
    /// Indices are stored highest first so that [`FreeList::try_pop`] hands
    /// out slot `0` first.
    pub fn full(capacity: usize) -> Self {
        let list = Self::with_capacity(capacity);
        list.refill((0..capacity as SlotId).rev());
        list
    }

    // A panic while the lock is held cannot leave the Vec half-written, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Vec<SlotId>> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a single `id` to the list.
    ///
    /// [`ParticlePool`](crate::pool::ParticlePool) never releases slots one
    /// at a time; its `collect` pass rebuilds the whole list with
    /// [`FreeList::refill`].
    pub fn push(&self, id: SlotId) {
        self.lock().push(id);
    }

    /// Takes the most recently pushed index, or `None` when exhausted.
    pub fn try_pop(&self) -> Option<SlotId> {
        self.lock().pop()
    }

    /// Takes two indices at once, or none at all.
    ///
    /// When only one index is available it stays on the list.
    pub fn try_pop_pair(&self) -> Option<(SlotId, SlotId)> {
        let mut stack = self.lock();
        if stack.len() < 2 {
            return None;
        }
        let a = stack.pop()?;
        let b = stack.pop()?;
        Some((a, b))
    }

    /// Replaces the whole content with `ids`, in iteration order.
    pub fn refill(&self, ids: impl IntoIterator<Item = SlotId>) {
        let mut stack = self.lock();
        stack.clear();
        stack.extend(ids);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current content, bottom of the stack first.
    pub fn to_vec(&self) -> Vec<SlotId> {
        self.lock().clone()
    }
}
