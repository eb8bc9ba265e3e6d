/*!
 * Heap Engine
 *
 * A heap backed by one contiguous `Vec<u8>`, handing out integer references
 * (byte offsets) instead of pointers.
 *
 * ## Allocation
 *
 * - **First fit** in ledger order: the first free block large enough wins
 * - **Splitting**: a larger free block keeps the requested size and the
 *   remainder (minus one gap byte) becomes a new free block
 * - **Frontier**: with no reusable block, new blocks are carved at `top`,
 *   which advances by `size + 1`
 * - **Elastic growth**: an elastic heap grows by exactly one fixed step when
 *   the frontier overflows, and only if that one step is enough
 *
 * ## Freeing
 *
 * Freed blocks stay in the ledger and are coalesced with their free ledger
 * neighbours; a trailing free block at the frontier is dropped and the frontier
 * rewound. See [`CoalescePolicy`](super::CoalescePolicy).
 *
 * ## Concurrency
 *
 * One coarse lock guards the whole heap. Every public operation, including the
 * malloc/free steps inside calloc and realloc, runs in a single critical section.
 */

mod allocator;
mod state;
mod storage;

use super::block::HeapBlock;
use super::config::HeapConfig;
use super::traits::Heap;
use super::types::{HeapResult, HeapStats};
use crate::core::types::{Reference, Size};
use crate::monitoring::Collector;
use log::info;
use parking_lot::Mutex;
use state::HeapState;
use std::sync::Arc;

/// Heap over a contiguous byte buffer
///
/// Cheap to clone: clones are handles to the same heap.
pub struct ByteArrayHeap {
    pub(super) state: Arc<Mutex<HeapState>>,
    collector: Option<Arc<Collector>>,
}

impl ByteArrayHeap {
    /// Heap of the default capacity, not elastic
    pub fn new() -> Self {
        Self::from_config(HeapConfig::default())
    }

    /// Heap with a custom buffer length (useful for testing)
    pub fn with_capacity(capacity: Size) -> Self {
        Self::from_config(HeapConfig::default().with_capacity(capacity))
    }

    pub fn from_config(config: HeapConfig) -> Self {
        info!(
            "Heap initialized with {} bytes (growth step {} bytes, elastic: {}, coalesce: {:?})",
            config.capacity, config.growth_step, config.elastic, config.coalesce
        );
        Self {
            state: Arc::new(Mutex::new(HeapState::new(&config))),
            collector: None,
        }
    }

    /// Use an existing buffer as the memory source
    pub fn from_bytes(memory: Vec<u8>) -> Self {
        let config = HeapConfig::default().with_capacity(memory.len());
        info!("Heap initialized over an existing {} byte buffer", memory.len());
        Self {
            state: Arc::new(Mutex::new(HeapState::with_memory(memory, &config))),
            collector: None,
        }
    }

    /// Add observability collector
    pub fn with_collector(mut self, collector: Arc<Collector>) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Set collector after construction
    pub fn set_collector(&mut self, collector: Arc<Collector>) {
        self.collector = Some(collector);
    }

    /// Get collector reference
    pub fn collector(&self) -> Option<Arc<Collector>> {
        self.collector.clone()
    }

    /// Builder form of [`set_elastic`](Self::set_elastic)
    pub fn elastic(self, elastic: bool) -> Self {
        self.set_elastic(elastic);
        self
    }

    /// Allow or forbid buffer growth
    pub fn set_elastic(&self, elastic: bool) {
        self.state.lock().elastic = elastic;
    }

    pub fn is_elastic(&self) -> bool {
        self.state.lock().elastic
    }

    /// Whether two handles refer to the same heap
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.state, &b.state)
    }

    /// Snapshot of the block at `reference`, free or live
    pub fn get_block(&self, reference: Reference) -> Option<HeapBlock> {
        let state = self.state.lock();
        state.position(reference).map(|idx| state.blocks[idx].clone())
    }

    /// Current buffer length
    pub fn get_size(&self) -> Size {
        self.state.lock().memory.len()
    }

    /// Number of ledger entries
    pub fn get_n_blocks(&self) -> usize {
        self.state.lock().blocks.len()
    }

    /// Snapshot of the ledger, in ledger order
    pub fn get_blocks(&self) -> Vec<HeapBlock> {
        self.state.lock().blocks.clone()
    }

    /// Current allocation frontier
    pub fn top(&self) -> Size {
        self.state.lock().top
    }

    pub fn stats(&self) -> HeapStats {
        let state = self.state.lock();
        let (free, live): (Vec<&HeapBlock>, Vec<&HeapBlock>) =
            state.blocks.iter().partition(|b| b.is_free());

        HeapStats {
            capacity: state.memory.len(),
            top: state.top,
            blocks: state.blocks.len(),
            free_blocks: free.len(),
            allocated_bytes: live.iter().map(|b| b.size()).sum(),
            free_bytes: free.iter().map(|b| b.size()).sum::<Size>() + state.free_at_top(),
            growth_count: state.growth_count,
            elastic: state.elastic,
            events_evicted: self
                .collector
                .as_ref()
                .map_or(0, |collector| collector.stream_stats().evicted),
        }
    }
}

impl Heap for ByteArrayHeap {
    fn malloc(&self, size: Size) -> HeapResult<Reference> {
        ByteArrayHeap::malloc(self, size)
    }

    fn free(&self, reference: Reference) -> HeapResult<()> {
        ByteArrayHeap::free(self, reference)
    }

    fn realloc(&self, reference: Reference, size: Size) -> HeapResult<Reference> {
        ByteArrayHeap::realloc(self, reference, size)
    }

    fn calloc(&self, nelem: Size, elsize: Size) -> HeapResult<Reference> {
        ByteArrayHeap::calloc(self, nelem, elsize)
    }

    fn write(&self, reference: Reference, data: &[u8]) -> HeapResult<Size> {
        ByteArrayHeap::write(self, reference, data)
    }

    fn read(&self, reference: Reference) -> Option<Vec<u8>> {
        ByteArrayHeap::read(self, reference)
    }

    fn take(&self, reference: Reference) -> Option<(Vec<u8>, HeapResult<()>)> {
        ByteArrayHeap::take(self, reference)
    }

    fn get_block(&self, reference: Reference) -> Option<HeapBlock> {
        ByteArrayHeap::get_block(self, reference)
    }

    fn get_size(&self) -> Size {
        ByteArrayHeap::get_size(self)
    }

    fn get_n_blocks(&self) -> usize {
        ByteArrayHeap::get_n_blocks(self)
    }

    fn get_blocks(&self) -> Vec<HeapBlock> {
        ByteArrayHeap::get_blocks(self)
    }

    fn collector(&self) -> Option<Arc<Collector>> {
        ByteArrayHeap::collector(self)
    }
}

impl Clone for ByteArrayHeap {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            collector: self.collector.as_ref().map(Arc::clone),
        }
    }
}

impl Default for ByteArrayHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ByteArrayHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ByteArrayHeap")
            .field("size", &state.memory.len())
            .field("top", &state.top)
            .field("blocks", &state.blocks.len())
            .field("elastic", &state.elastic)
            .finish()
    }
}
