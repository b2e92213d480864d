//! Allocator the bridge hands to the Cubism Core for moc and model memory.
//!
//! The core requires moc memory aligned to 64 bytes and model memory aligned to
//! 16 bytes. Blocks are owned values that release themselves on drop; the
//! allocator keeps a registry of live blocks so leaks show up when it is released.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard};

use hashbrown::HashMap;
use log::{trace, warn};

use crate::config::AllocatorCfg;
use crate::error::{BridgeError, Result};

/// `csmAlignofMoc`
pub const MOC_ALIGNMENT: usize = 64;
/// `csmAlignofModel`
pub const MODEL_ALIGNMENT: usize = 16;

#[derive(Debug, Default)]
struct Registry {
    live: HashMap<usize, Layout>,
    bytes: usize,
    peak: usize,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Snapshot of allocator usage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    pub live_blocks: usize,
    pub live_bytes: usize,
    pub peak_bytes: usize,
}

#[derive(Debug)]
pub struct BridgeAllocator {
    registry: Arc<Mutex<Registry>>,
    max_bytes: Option<usize>,
}

impl BridgeAllocator {
    /// Fails only when the block registry cannot reserve `cfg.initial_capacity` entries.
    pub fn new(cfg: &AllocatorCfg) -> Result<Self> {
        let mut registry = Registry::default();
        registry
            .live
            .try_reserve(cfg.initial_capacity)
            .map_err(|e| BridgeError::AllocationFailed(format!("allocator registry: {e:?}")))?;
        Ok(Self {
            registry: Arc::new(Mutex::new(registry)),
            max_bytes: cfg.max_bytes,
        })
    }

    /// Allocate `size` bytes with model alignment.
    pub fn allocate(&self, size: usize) -> Result<AlignedBlock> {
        self.allocate_aligned(size, MODEL_ALIGNMENT)
    }

    /// Allocate `size` zeroed bytes aligned to `align` (a power of two).
    pub fn allocate_aligned(&self, size: usize, align: usize) -> Result<AlignedBlock> {
        if size == 0 {
            return Err(BridgeError::invalid("allocation size must be non-zero"));
        }
        let layout = Layout::from_size_align(size, align)
            .map_err(|_| BridgeError::invalid(format!("bad alignment {align} for {size} bytes")))?;

        let mut reg = lock(&self.registry);
        if let Some(max) = self.max_bytes {
            if reg.bytes.saturating_add(size) > max {
                return Err(BridgeError::AllocationFailed(format!(
                    "{size} bytes exceeds budget ({} of {max} in use)",
                    reg.bytes
                )));
            }
        }

        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw)
            .ok_or_else(|| BridgeError::AllocationFailed(format!("out of memory for {size} bytes")))?;

        reg.live.insert(ptr.as_ptr() as usize, layout);
        reg.bytes += size;
        reg.peak = reg.peak.max(reg.bytes);
        trace!("allocated {size} bytes (align {align}) at {:p}", ptr);

        Ok(AlignedBlock {
            ptr,
            layout,
            registry: Arc::clone(&self.registry),
        })
    }

    pub fn stats(&self) -> AllocatorStats {
        let reg = lock(&self.registry);
        AllocatorStats {
            live_blocks: reg.live.len(),
            live_bytes: reg.bytes,
            peak_bytes: reg.peak,
        }
    }
}

impl Drop for BridgeAllocator {
    fn drop(&mut self) {
        let reg = lock(&self.registry);
        if !reg.live.is_empty() {
            warn!(
                "allocator released with {} live blocks ({} bytes)",
                reg.live.len(),
                reg.bytes
            );
        }
    }
}

/// Owned, zero-initialized, aligned memory block.
#[derive(Debug)]
pub struct AlignedBlock {
    ptr: NonNull<u8>,
    layout: Layout,
    registry: Arc<Mutex<Registry>>,
}

// SAFETY: the block exclusively owns its memory; the registry is behind a Mutex.
unsafe impl Send for AlignedBlock {}

impl AlignedBlock {
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for layout.size() initialized (zeroed) bytes.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and &mut self guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for AlignedBlock {
    fn drop(&mut self) {
        {
            let mut reg = lock(&self.registry);
            if reg.live.remove(&(self.ptr.as_ptr() as usize)).is_some() {
                reg.bytes -= self.layout.size();
            }
        }
        // SAFETY: allocated in allocate_aligned with this exact layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator(max_bytes: Option<usize>) -> BridgeAllocator {
        BridgeAllocator::new(&AllocatorCfg {
            initial_capacity: 4,
            max_bytes,
        })
        .unwrap()
    }

    #[test]
    fn moc_blocks_are_aligned_and_zeroed() {
        let a = allocator(None);
        let block = a.allocate_aligned(100, MOC_ALIGNMENT).unwrap();
        assert_eq!(block.as_ptr() as usize % MOC_ALIGNMENT, 0);
        assert_eq!(block.len(), 100);
        assert!(block.as_slice().iter().all(|b| *b == 0));
    }

    #[test]
    fn stats_track_live_blocks() {
        let a = allocator(None);
        let b1 = a.allocate(32).unwrap();
        let b2 = a.allocate(64).unwrap();
        assert_eq!(
            a.stats(),
            AllocatorStats {
                live_blocks: 2,
                live_bytes: 96,
                peak_bytes: 96
            }
        );
        drop(b1);
        assert_eq!(a.stats().live_bytes, 64);
        drop(b2);
        let s = a.stats();
        assert_eq!(s.live_blocks, 0);
        assert_eq!(s.live_bytes, 0);
        assert_eq!(s.peak_bytes, 96);
    }

    #[test]
    fn budget_is_enforced() {
        let a = allocator(Some(128));
        let _b = a.allocate(100).unwrap();
        assert!(matches!(
            a.allocate(64),
            Err(BridgeError::AllocationFailed(_))
        ));
        assert!(a.allocate(28).is_ok());
    }

    #[test]
    fn rejects_bad_requests() {
        let a = allocator(None);
        assert!(matches!(a.allocate(0), Err(BridgeError::InvalidArgument(_))));
        assert!(matches!(
            a.allocate_aligned(8, 3),
            Err(BridgeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn block_outlives_allocator() {
        let a = allocator(None);
        let mut block = a.allocate(8).unwrap();
        drop(a);
        block.as_mut_slice()[0] = 7;
        assert_eq!(block.as_slice()[0], 7);
    }

    #[test]
    fn oversized_registry_fails() {
        let err = BridgeAllocator::new(&AllocatorCfg {
            initial_capacity: usize::MAX,
            max_bytes: None,
        })
        .unwrap_err();
        assert!(matches!(err, BridgeError::AllocationFailed(_)));
    }
}
