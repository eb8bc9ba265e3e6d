/*!
 * Heap Traits
 * Allocator interface consumed by request and transport layers
 */

use super::block::HeapBlock;
use super::types::HeapResult;
use crate::core::types::{Reference, Size};
use crate::monitoring::Collector;
use std::sync::Arc;

/// A dynamically managed memory region addressed by integer references
///
/// Implementations must be safe to share between threads; every operation is
/// atomic with respect to every other.
pub trait Heap: Send + Sync {
    /// Allocate `size` bytes, reusing freed blocks where possible
    fn malloc(&self, size: Size) -> HeapResult<Reference>;

    /// Free a block; negative, unknown and already-free references fail distinctly
    fn free(&self, reference: Reference) -> HeapResult<()>;

    /// Grow a block, moving it if needed; negative references allocate
    fn realloc(&self, reference: Reference, size: Size) -> HeapResult<Reference>;

    /// Allocate `nelem * elsize` zeroed bytes
    fn calloc(&self, nelem: Size, elsize: Size) -> HeapResult<Reference>;

    /// Write data to the start of a block, returning the bytes written
    fn write(&self, reference: Reference, data: &[u8]) -> HeapResult<Size>;

    /// Independent copy of a block's bytes, or `None` if the reference is not live
    fn read(&self, reference: Reference) -> Option<Vec<u8>>;

    /// Copy out a live block and free it, returning the bytes and the free result
    ///
    /// The default reads and frees in two separate steps. Implementations with
    /// one lock should override it so the pair is atomic.
    fn take(&self, reference: Reference) -> Option<(Vec<u8>, HeapResult<()>)> {
        let data = self.read(reference)?;
        Some((data, self.free(reference)))
    }

    fn get_block(&self, reference: Reference) -> Option<HeapBlock>;

    /// Current buffer length
    fn get_size(&self) -> Size;

    fn get_n_blocks(&self) -> usize;

    fn get_blocks(&self) -> Vec<HeapBlock>;

    /// Observability sink for failures reported outside the heap
    fn collector(&self) -> Option<Arc<Collector>> {
        None
    }
}
