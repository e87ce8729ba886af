//! DispatchHandle - names one live registration.

use std::fmt;

/// Handle issued by the dispatcher for a registration.
///
/// `index` addresses a slot in the dispatcher's arena and `generation` is the
/// slot's counter at issue time. A slot's generation is bumped on every
/// unregister, so a handle kept after unregistration never matches again even
/// if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DispatchHandle {
    index: u32,
    generation: u32,
}

impl DispatchHandle {
    /// Create a handle from its raw parts
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at issue time
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into a single opaque value (generation in the high half)
    #[inline]
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    /// Inverse of [`to_bits`](Self::to_bits)
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Display for DispatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "smi#{}.{}", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_keep_both_halves() {
        let handle = DispatchHandle::new(7, 3);
        assert_eq!(handle.to_bits(), (3u64 << 32) | 7);
        assert_eq!(DispatchHandle::from_bits(handle.to_bits()), handle);
    }

    #[test]
    fn test_same_slot_different_generation_differs() {
        assert_ne!(DispatchHandle::new(0, 0), DispatchHandle::new(0, 1));
        assert_eq!(DispatchHandle::new(4, 2).to_string(), "smi#4.2");
    }
}
