/*!
 * Heap Allocator
 * malloc/free/realloc/calloc on top of the locked heap state
 */

use super::super::types::{HeapError, HeapPressure, HeapResult};
use super::state::{Allocation, HeapState, Release};
use super::ByteArrayHeap;
use crate::core::types::{reference_of, Reference, Size};
use log::{debug, info, warn};

impl ByteArrayHeap {
    /// Allocate `size` bytes and return the block's reference
    ///
    /// Reuses the first large-enough free block (splitting it if larger),
    /// otherwise carves a new block at the frontier.
    pub fn malloc(&self, size: Size) -> HeapResult<Reference> {
        let mut state = self.state.lock();
        let result = state.allocate(size);
        self.after_allocation(&state, size, result)
    }

    /// Free the block at `reference` and coalesce free neighbours
    pub fn free(&self, reference: Reference) -> HeapResult<()> {
        let mut state = self.state.lock();
        let result = state.release(reference);
        self.after_release(&state, reference, result)
    }

    /// Copy out the block at `reference` and free it under a single lock
    ///
    /// Returns `None` when the reference does not name a live block. No other
    /// caller can free and reallocate the offset between the read and the free.
    pub fn take(&self, reference: Reference) -> Option<(Vec<u8>, HeapResult<()>)> {
        let mut state = self.state.lock();
        let (data, result) = state.take(reference)?;
        let released = self.after_release(&state, reference, result);
        Some((data, released))
    }

    /// Resize a block by moving it
    ///
    /// A negative reference behaves as `malloc(size)`. Blocks never shrink: if
    /// the block already holds `size` bytes its reference is returned as is.
    pub fn realloc(&self, reference: Reference, size: Size) -> HeapResult<Reference> {
        let mut state = self.state.lock();
        let result = state.reallocate(reference, size);
        if let Ok(ref allocation) = result {
            if reference_of(allocation.offset) == reference {
                return Ok(reference);
            }
            debug!(
                "Reallocated block {} to {} ({} bytes)",
                reference, allocation.offset, size
            );
        }
        self.after_allocation(&state, size, result)
    }

    /// Allocate `nelem * elsize` bytes, zero-filled
    ///
    /// Freed blocks are not scrubbed, so the region is zeroed explicitly.
    pub fn calloc(&self, nelem: Size, elsize: Size) -> HeapResult<Reference> {
        let mut state = self.state.lock();
        let Some(size) = nelem.checked_mul(elsize) else {
            let result = Err(HeapError::InsufficientMemory {
                requested: Size::MAX,
                available: state.free_at_top(),
            });
            return self.after_allocation(&state, Size::MAX, result);
        };

        let result = state.allocate(size);
        if let Ok(ref allocation) = result {
            state.zero(allocation.offset, allocation.size);
        }
        self.after_allocation(&state, size, result)
    }

    fn after_release(
        &self,
        state: &HeapState,
        reference: Reference,
        result: HeapResult<Release>,
    ) -> HeapResult<()> {
        match result {
            Ok(release) => {
                debug!(
                    "Freed block {} ({} bytes), merge removed {} ledger entries{}",
                    reference,
                    release.size,
                    release.merged,
                    if release.trimmed {
                        format!(", top rewound to {}", state.top)
                    } else {
                        String::new()
                    }
                );
                if let Some(ref collector) = self.collector() {
                    collector.block_freed(reference, release.size);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Heap free({}) rejected: {}", reference, e);
                Err(e)
            }
        }
    }

    /// Log and emit events for an allocation attempt
    fn after_allocation(
        &self,
        state: &HeapState,
        size: Size,
        result: HeapResult<Allocation>,
    ) -> HeapResult<Reference> {
        let collector = self.collector();

        let allocation = match result {
            Ok(allocation) => allocation,
            Err(e) => {
                if let HeapError::InsufficientMemory {
                    requested,
                    available,
                } = e
                {
                    warn!(
                        "Heap exhausted: requested {} bytes, {} bytes free at top {} of {} (elastic: {})",
                        requested,
                        available,
                        state.top,
                        state.memory.len(),
                        state.elastic
                    );
                    if let Some(ref collector) = collector {
                        collector.allocation_failed(requested, available);
                    }
                }
                return Err(e);
            }
        };

        if let Some((from, to)) = allocation.grown {
            info!("Heap grown from {} to {} bytes for a {} byte block", from, to, size);
            if let Some(ref collector) = collector {
                collector.heap_grown(from, to);
            }
        }

        let reference = reference_of(allocation.offset);
        if let Some(ref collector) = collector {
            collector.block_allocated(reference, allocation.size, allocation.reused);
        }

        let capacity = state.memory.len();
        let ratio = state.top as f64 / capacity.max(1) as f64;
        match HeapPressure::from_ratio(ratio) {
            level @ (HeapPressure::High | HeapPressure::Critical) => {
                warn!(
                    "Heap pressure {}: allocated {} bytes at {} (top {} of {})",
                    level, allocation.size, reference, state.top, capacity
                );
                if let Some(ref collector) = collector {
                    collector.heap_pressure(
                        (ratio.min(1.0) * 100.0) as u8,
                        state.top,
                        capacity,
                    );
                }
            }
            _ => debug!(
                "Allocated {} bytes at {} ({})",
                allocation.size,
                reference,
                if allocation.reused { "reused" } else { "frontier" }
            ),
        }

        Ok(reference)
    }
}
