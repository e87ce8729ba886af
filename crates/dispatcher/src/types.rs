//! SmiTypeSet - fixed-size bit set over [`SmiType`]

use std::fmt;

use contracts::SmiType;

const _: () = assert!(SmiType::COUNT <= 64);

/// Set of sub-types backed by a single `u64`; never allocates
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SmiTypeSet(u64);

impl SmiTypeSet {
    /// Empty set
    pub const EMPTY: Self = Self(0);

    /// Every defined sub-type
    pub fn all() -> Self {
        SmiType::ALL.iter().copied().collect()
    }

    #[inline]
    const fn bit(smi_type: SmiType) -> u64 {
        1u64 << smi_type.as_raw()
    }

    #[inline]
    pub fn insert(&mut self, smi_type: SmiType) -> bool {
        let was = self.contains(smi_type);
        self.0 |= Self::bit(smi_type);
        !was
    }

    #[inline]
    pub fn remove(&mut self, smi_type: SmiType) -> bool {
        let was = self.contains(smi_type);
        self.0 &= !Self::bit(smi_type);
        was
    }

    #[inline]
    pub const fn contains(&self, smi_type: SmiType) -> bool {
        self.0 & Self::bit(smi_type) != 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Members in raw-value order
    pub fn iter(&self) -> impl Iterator<Item = SmiType> + '_ {
        SmiType::ALL.iter().copied().filter(|t| self.contains(*t))
    }
}

impl FromIterator<SmiType> for SmiTypeSet {
    fn from_iter<I: IntoIterator<Item = SmiType>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for ty in iter {
            set.insert(ty);
        }
        set
    }
}

impl fmt::Debug for SmiTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
