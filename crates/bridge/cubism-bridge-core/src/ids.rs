//! Identifiers for bridge-owned resources and a simple allocator for them.

use serde::{Deserialize, Serialize};

/// Token for the bridge-owned allocator. Never zero.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AllocatorId(pub u32);

/// Generation-checked index into the model table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ModelId {
    pub index: u32,
    pub generation: u32,
}

/// Renderer token handed back to the host. Currently always the configured sentinel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RendererId(pub usize);

/// Opaque host device address (e.g. a GPU device object). Never dereferenced.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DeviceHandle(pub usize);

impl ModelId {
    /// Pack into a non-zero integer suitable for an opaque C handle.
    /// Layout: generation in the high 32 bits, `index + 1` in the low 32 bits.
    #[inline]
    pub fn to_raw(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64 + 1)
    }

    /// Inverse of [`ModelId::to_raw`]. Returns `None` for zero or a zero low word.
    #[inline]
    pub fn from_raw(raw: u64) -> Option<Self> {
        let low = (raw & 0xFFFF_FFFF) as u32;
        if low == 0 {
            return None;
        }
        Some(Self {
            index: low - 1,
            generation: (raw >> 32) as u32,
        })
    }
}

/// Monotonic allocator for AllocatorId. Starts at 1 so ids double as non-null handles.
#[derive(Debug)]
pub struct IdAllocator {
    next_allocator: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next_allocator: 1 }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_allocator(&mut self) -> AllocatorId {
        let id = AllocatorId(self.next_allocator);
        self.next_allocator = self.next_allocator.wrapping_add(1).max(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic_and_non_zero() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_allocator(), AllocatorId(1));
        assert_eq!(alloc.alloc_allocator(), AllocatorId(2));
    }

    #[test]
    fn allocator_ids_skip_zero_on_wrap() {
        let mut alloc = IdAllocator {
            next_allocator: u32::MAX,
        };
        assert_eq!(alloc.alloc_allocator(), AllocatorId(u32::MAX));
        assert_eq!(alloc.alloc_allocator(), AllocatorId(1));
    }

    #[test]
    fn model_id_raw_is_never_zero() {
        let id = ModelId {
            index: 0,
            generation: 0,
        };
        assert_eq!(id.to_raw(), 1);
        assert_eq!(ModelId::from_raw(1), Some(id));
        assert_eq!(ModelId::from_raw(0), None);
        // generation set but low word empty is not a handle we ever produced
        assert_eq!(ModelId::from_raw(3 << 32), None);
    }

    #[test]
    fn model_id_raw_keeps_generation() {
        let id = ModelId {
            index: 7,
            generation: 42,
        };
        let back = ModelId::from_raw(id.to_raw()).unwrap();
        assert_eq!(back, id);
    }
}
