//! Cubism Core version identifier.
//!
//! The SDK reports its version as a packed `u32`: major in bits 31..24, minor
//! in bits 23..16 and patch in bits 15..0. Hosts compare against this layout, so
//! it must not change.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct CoreVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u16,
}

impl CoreVersion {
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Self {
            major: (raw >> 24) as u8,
            minor: ((raw >> 16) & 0xFF) as u8,
            patch: (raw & 0xFFFF) as u16,
        }
    }

    #[inline]
    pub fn to_raw(self) -> u32 {
        ((self.major as u32) << 24) | ((self.minor as u32) << 16) | self.patch as u32
    }
}

impl From<u32> for CoreVersion {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for CoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
