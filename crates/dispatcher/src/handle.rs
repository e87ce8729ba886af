//! Per-slot generation counters backing [`DispatchHandle`] issuance

use contracts::DispatchHandle;

/// Generation counter per arena slot.
///
/// A handle is `(slot, generation)`. Releasing a slot bumps its generation so
/// any handle issued before the release stops matching. A slot whose counter
/// is exhausted is retired instead of wrapping.
#[derive(Debug, Default)]
pub(crate) struct Generations {
    counters: Vec<u32>,
}

impl Generations {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            counters: Vec::with_capacity(capacity),
        }
    }

    /// Handle for a freshly occupied slot
    ///
    /// Slots stay below `MAX_CAPACITY`, so the index always fits in `u32`.
    pub(crate) fn issue(&mut self, slot: usize) -> DispatchHandle {
        if slot >= self.counters.len() {
            self.counters.resize(slot + 1, 0);
        }
        DispatchHandle::new(slot as u32, self.counters[slot])
    }

    /// Invalidate every outstanding handle for `slot`
    ///
    /// Returns `false` when the counter is exhausted and the slot must never
    /// be handed out again.
    pub(crate) fn release(&mut self, slot: usize) -> bool {
        match self.counters[slot].checked_add(1) {
            Some(next) => {
                self.counters[slot] = next;
                true
            }
            None => false,
        }
    }

    /// Does `handle` carry the current generation of its slot
    #[inline]
    pub(crate) fn is_current(&self, handle: DispatchHandle) -> bool {
        self.counters
            .get(handle.index() as usize)
            .is_some_and(|g| *g == handle.generation())
    }

    #[cfg(test)]
    pub(crate) fn force(&mut self, slot: usize, generation: u32) {
        self.issue(slot);
        self.counters[slot] = generation;
    }
}
