//! Ordinal newtypes for the key registries. Both start at 1 and are never
//! reused within a process, per the source's `_ext_idx`/`_kd_idx` counters.

use std::num::NonZeroU32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtKeyOrdinal(NonZeroU32);

impl ExtKeyOrdinal {
    pub fn first() -> Self {
        Self(NonZeroU32::new(1).unwrap())
    }

    pub fn next(self) -> Self {
        Self(NonZeroU32::new(self.0.get() + 1).unwrap())
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SealedKeyOrdinal(NonZeroU32);

impl SealedKeyOrdinal {
    pub fn first() -> Self {
        Self(NonZeroU32::new(1).unwrap())
    }

    pub fn next(self) -> Self {
        Self(NonZeroU32::new(self.0.get() + 1).unwrap())
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}
