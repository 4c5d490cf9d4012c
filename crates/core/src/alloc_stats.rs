//! Heap allocation accounting
//!
//! [`CountingAllocator`] wraps the system allocator and counts every
//! allocation and the bytes requested. A binary opts in with
//!
//! ```rust,ignore
//! #[global_allocator]
//! static GLOBAL: heat_stencil_core::CountingAllocator = heat_stencil_core::CountingAllocator;
//! ```
//!
//! Without it the counters never move and every [`AllocationStats`] delta is
//! zero. Counters are process-wide, so allocations made by worker threads
//! (or by unrelated threads) during a phase are included.

use serde::Serialize;
use std::alloc::{GlobalAlloc, Layout, System};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static ALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static BYTES: AtomicU64 = AtomicU64::new(0);

fn record(size: usize) {
    ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    BYTES.fetch_add(size as u64, Ordering::Relaxed);
}

/// System allocator that counts allocations and requested bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            record(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            record(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            record(new_size);
        }
        new_ptr
    }
}

/// Allocation count and requested bytes, either totals or a phase delta
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocationStats {
    pub allocations: u64,
    pub bytes: u64,
}

impl AllocationStats {
    /// Current process-wide totals
    #[must_use]
    pub fn snapshot() -> Self {
        Self {
            allocations: ALLOCATIONS.load(Ordering::Relaxed),
            bytes: BYTES.load(Ordering::Relaxed),
        }
    }

    /// What was allocated between `earlier` and `self`
    #[must_use]
    pub fn since(self, earlier: Self) -> Self {
        Self {
            allocations: self.allocations.saturating_sub(earlier.allocations),
            bytes: self.bytes.saturating_sub(earlier.bytes),
        }
    }
}

impl fmt::Display for AllocationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} allocations: {} bytes", self.allocations, self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[global_allocator]
    static GLOBAL: CountingAllocator = CountingAllocator;

    #[test]
    fn test_snapshot_counts_vec_allocation() {
        let before = AllocationStats::snapshot();
        let data: Vec<f64> = Vec::with_capacity(1024);
        std::hint::black_box(&data);
        let delta = AllocationStats::snapshot().since(before);
        drop(data);

        assert!(delta.allocations >= 1);
        assert!(delta.bytes >= 1024 * 8);
    }

    #[test]
    fn test_since_saturates() {
        let later = AllocationStats {
            allocations: 1,
            bytes: 8,
        };
        let earlier = AllocationStats {
            allocations: 5,
            bytes: 64,
        };
        assert_eq!(later.since(earlier), AllocationStats::default());
    }

    #[test]
    fn test_display() {
        let stats = AllocationStats {
            allocations: 3,
            bytes: 4096,
        };
        assert_eq!(stats.to_string(), "3 allocations: 4096 bytes");
    }
}
