/*!
 * byte-heap
 * Reference-addressed heap over a contiguous byte buffer
 */

pub mod core;
pub mod heap;
pub mod monitoring;

// Re-exports
pub use crate::core::types::{Reference, Size};
pub use heap::{
    erase, instance, take_block_data, take_block_data_global, BlockGuard, ByteArrayHeap, Heap,
    HeapBlock, HeapConfig, HeapError, HeapFactory, HeapResult, HeapStats, INSUFFICIENT_MEMORY,
    INVALID_REFERENCE, NULL_REFERENCE,
};
pub use monitoring::{init_tracing, Collector};
