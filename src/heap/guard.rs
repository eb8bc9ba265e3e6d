/*!
 * Block Guards
 *
 * Consume-once access to heap blocks: read a block and release it, either in
 * one call ([`take_block_data`]) or through an RAII guard that frees the block
 * when dropped.
 */

use super::factory;
use super::traits::Heap;
use super::types::{HeapError, HeapResult};
use crate::core::types::{Reference, Size};
use crate::monitoring::{global_collector, span_operation};
use log::error;

/// Read a block's bytes and free it
///
/// Nothing is freed unless the reference names a live block. The read and the
/// free go through [`Heap::take`], which is atomic for [`ByteArrayHeap`](super::ByteArrayHeap).
/// A failed free is logged and reported to the heap's collector (or the global
/// one) but does not change the returned bytes.
pub fn take_block_data<H>(heap: &H, reference: Reference, accessor: &str) -> Option<Vec<u8>>
where
    H: Heap + ?Sized,
{
    let span = span_operation("take_block_data");
    let _entered = span.enter();
    span.record_reference(reference);

    let Some((data, released)) = heap.take(reference) else {
        span.record_result(false);
        return None;
    };

    span.record_bytes(data.len());
    match released {
        Ok(()) => span.record_result(true),
        Err(e) => {
            span.record_error(&e.to_string());
            report_release_failure(heap, reference, &e, accessor);
        }
    }
    Some(data)
}

/// [`take_block_data`] against the process-wide heap
pub fn take_block_data_global(reference: Reference, accessor: &str) -> Option<Vec<u8>> {
    take_block_data(&factory::instance(), reference, accessor)
}

fn report_release_failure<H>(heap: &H, reference: Reference, e: &HeapError, accessor: &str)
where
    H: Heap + ?Sized,
{
    error!(
        "{}: unsuccessful call to free({}) on heap: {}",
        accessor, reference, e
    );
    if let Some(collector) = heap.collector() {
        collector.release_failed(reference, e.to_string(), accessor);
    } else if let Some(collector) = global_collector() {
        collector.release_failed(reference, e.to_string(), accessor);
    }
}

/// Scoped heap block with automatic release
///
/// # Example
///
/// ```ignore
/// let guard = BlockGuard::allocate(heap.clone(), 1024)?;
/// guard.write(b"payload")?;
/// let reference = guard.reference();
/// // Freed on drop unless taken or released earlier
/// ```
pub struct BlockGuard<H: Heap> {
    heap: H,
    reference: Reference,
    accessor: String,
    active: bool,
}

impl<H: Heap> BlockGuard<H> {
    /// Guard an already allocated block
    pub fn new(heap: H, reference: Reference) -> Self {
        Self {
            heap,
            reference,
            accessor: String::from("block-guard"),
            active: true,
        }
    }

    /// Allocate a block and guard it
    pub fn allocate(heap: H, size: Size) -> HeapResult<Self> {
        let reference = heap.malloc(size)?;
        Ok(Self::new(heap, reference))
    }

    /// Name reported in logs and events when releasing fails
    pub fn with_accessor(mut self, accessor: impl Into<String>) -> Self {
        self.accessor = accessor.into();
        self
    }

    #[inline]
    pub fn reference(&self) -> Reference {
        self.reference
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn write(&self, data: &[u8]) -> HeapResult<Size> {
        self.heap.write(self.reference, data)
    }

    pub fn read(&self) -> Option<Vec<u8>> {
        self.heap.read(self.reference)
    }

    /// Read the block and release it
    pub fn take(mut self) -> Option<Vec<u8>> {
        self.active = false;
        take_block_data(&self.heap, self.reference, &self.accessor)
    }

    /// Stop guarding the block and hand its reference to the caller
    pub fn into_reference(mut self) -> Reference {
        self.active = false;
        self.reference
    }

    /// Free the block now
    pub fn release(&mut self) -> HeapResult<()> {
        if !self.active {
            return Err(HeapError::AlreadyFree(self.reference));
        }
        self.active = false;
        self.heap.free(self.reference)
    }
}

impl<H: Heap> Drop for BlockGuard<H> {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.release() {
                report_release_failure(&self.heap, self.reference, &e, &self.accessor);
            }
        }
    }
}
