//! DispatchTable - registry of live child registrations.
//!
//! Storage is split the same way as a packet buffer with index separation:
//! - a fixed-capacity `Slab` arena owns the registrations
//! - per sub-type buckets hold only slab keys, in registration order
//!
//! Buckets exist only while non-empty. Handles are slab keys paired with a
//! generation, so validating a handle is one bounds check and one compare.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{DispatchHandle, OwnerId, SmiHandler, SmiType, MAX_CAPACITY};
use slab::Slab;

use crate::handle::Generations;

/// One live child registration; immutable after insertion
pub struct Registration<C> {
    pub(crate) handle: DispatchHandle,
    pub(crate) smi_type: SmiType,
    pub(crate) owner: Option<OwnerId>,
    pub(crate) handler: Box<dyn SmiHandler<C>>,
    pub(crate) context: C,
}

impl<C> Registration<C> {
    pub fn handle(&self) -> DispatchHandle {
        self.handle
    }

    pub fn smi_type(&self) -> SmiType {
        self.smi_type
    }

    pub fn owner(&self) -> Option<&OwnerId> {
        self.owner.as_ref()
    }

    pub fn context(&self) -> &C {
        &self.context
    }
}

impl<C> fmt::Debug for Registration<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("handle", &self.handle)
            .field("smi_type", &self.smi_type)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

enum Slot<C> {
    Live(Registration<C>),
    /// Generation counter exhausted; the slot is never reused
    Retired,
}

impl<C> Slot<C> {
    #[inline]
    fn live(&self) -> Option<&Registration<C>> {
        match self {
            Slot::Live(reg) => Some(reg),
            Slot::Retired => None,
        }
    }
}

/// Result of removing a registration
pub(crate) struct Removed<C> {
    pub(crate) registration: Registration<C>,
    /// The sub-type has no registrations left
    pub(crate) last_of_type: bool,
}

/// Registry of live registrations keyed by sub-type
pub struct DispatchTable<C> {
    slots: Slab<Slot<C>>,
    generations: Generations,
    buckets: BTreeMap<SmiType, Vec<usize>>,
    capacity: usize,
    retired: usize,
}

impl<C> DispatchTable<C> {
    /// Create a table with room for `capacity` registrations, at most [`MAX_CAPACITY`]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_CAPACITY);
        Self {
            slots: Slab::with_capacity(capacity),
            generations: Generations::with_capacity(capacity),
            buckets: BTreeMap::new(),
            capacity,
            retired: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        self.slots.len() - self.retired
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// No slot left for another registration
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Does the sub-type have at least one registration
    #[inline]
    pub fn has_type(&self, smi_type: SmiType) -> bool {
        self.buckets.contains_key(&smi_type)
    }

    /// Sub-types with at least one registration, in raw-value order
    pub fn active_types(&self) -> impl Iterator<Item = SmiType> + '_ {
        self.buckets.keys().copied()
    }

    /// Number of registrations for `smi_type`
    pub fn count_for(&self, smi_type: SmiType) -> usize {
        self.buckets.get(&smi_type).map_or(0, Vec::len)
    }

    /// Look up a live registration by handle
    pub fn get(&self, handle: DispatchHandle) -> Option<&Registration<C>> {
        if !self.generations.is_current(handle) {
            return None;
        }
        self.slots
            .get(handle.index() as usize)
            .and_then(Slot::live)
            .filter(|reg| reg.handle == handle)
    }

    pub fn contains(&self, handle: DispatchHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Registrations for `smi_type` in registration order
    ///
    /// Does not allocate.
    pub fn iter_type(&self, smi_type: SmiType) -> impl Iterator<Item = &Registration<C>> + '_ {
        self.buckets
            .get(&smi_type)
            .into_iter()
            .flatten()
            .filter_map(move |key| self.slots.get(*key).and_then(Slot::live))
    }

    /// Handles of every registration tagged with `owner`, in slot order
    pub fn handles_owned_by(&self, owner: &OwnerId) -> Vec<DispatchHandle> {
        self.slots
            .iter()
            .filter_map(|(_, slot)| slot.live())
            .filter(|reg| reg.owner.as_ref() == Some(owner))
            .map(|reg| reg.handle)
            .collect()
    }

    /// Append a registration to the end of its sub-type's bucket
    ///
    /// Returns `None` when the arena is full.
    pub(crate) fn insert(
        &mut self,
        smi_type: SmiType,
        owner: Option<OwnerId>,
        handler: Box<dyn SmiHandler<C>>,
        context: C,
    ) -> Option<DispatchHandle> {
        if self.is_full() {
            return None;
        }

        let entry = self.slots.vacant_entry();
        let key = entry.key();
        let handle = self.generations.issue(key);
        entry.insert(Slot::Live(Registration {
            handle,
            smi_type,
            owner,
            handler,
            context,
        }));
        self.buckets.entry(smi_type).or_default().push(key);
        Some(handle)
    }

    /// Remove a live registration, preserving the order of the rest
    pub(crate) fn remove(&mut self, handle: DispatchHandle) -> Option<Removed<C>> {
        let smi_type = self.get(handle)?.smi_type;
        let key = handle.index() as usize;

        let last_of_type = match self.buckets.get_mut(&smi_type) {
            Some(bucket) => {
                if let Some(pos) = bucket.iter().position(|k| *k == key) {
                    bucket.remove(pos);
                }
                bucket.is_empty()
            }
            None => true,
        };
        if last_of_type {
            self.buckets.remove(&smi_type);
        }

        let slot = if self.generations.release(key) {
            self.slots.remove(key)
        } else {
            self.retired += 1;
            std::mem::replace(&mut self.slots[key], Slot::Retired)
        };

        match slot {
            Slot::Live(registration) => Some(Removed {
                registration,
                last_of_type,
            }),
            Slot::Retired => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn generations_mut(&mut self) -> &mut Generations {
        &mut self.generations
    }
}

impl<C> fmt::Debug for DispatchTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("live", &self.len())
            .field("capacity", &self.capacity)
            .field("active_types", &self.buckets.keys().collect::<Vec<_>>())
            .finish()
    }
}
