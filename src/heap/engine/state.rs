/*!
 * Heap State
 * Buffer, frontier and block ledger, plus the split/merge/growth algorithms
 *
 * Everything here runs under the engine's single lock.
 */

use super::super::block::HeapBlock;
use super::super::config::HeapConfig;
use super::super::types::{CoalescePolicy, HeapError, HeapResult};
use crate::core::limits::BLOCK_GAP;
use crate::core::types::{offset_of, Offset, Reference, Size};
use log::{debug, trace};

/// Outcome of a successful allocation, used for logging and events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Allocation {
    pub offset: Offset,
    pub size: Size,
    /// Served from a free ledger entry rather than the frontier
    pub reused: bool,
    /// Buffer length before and after growth, if this allocation grew the heap
    pub grown: Option<(Size, Size)>,
}

/// Outcome of a successful free
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Release {
    pub size: Size,
    /// Blocks removed from the ledger by merge
    pub merged: usize,
    /// Whether the frontier was rewound
    pub trimmed: bool,
}

#[derive(Debug)]
pub(crate) struct HeapState {
    pub(super) memory: Vec<u8>,
    pub(super) top: Offset,
    pub(super) blocks: Vec<HeapBlock>,
    pub(super) elastic: bool,
    pub(super) growth_step: Size,
    pub(super) coalesce: CoalescePolicy,
    pub(super) growth_count: u64,
}

impl HeapState {
    pub fn new(config: &HeapConfig) -> Self {
        Self::with_memory(vec![0u8; config.capacity], config)
    }

    pub fn with_memory(memory: Vec<u8>, config: &HeapConfig) -> Self {
        Self {
            memory,
            top: 0,
            blocks: Vec::new(),
            elastic: config.elastic,
            growth_step: config.growth_step,
            coalesce: config.coalesce,
            growth_count: 0,
        }
    }

    /// Bytes between the frontier and the end of the buffer
    #[inline]
    pub fn free_at_top(&self) -> Size {
        self.memory.len().saturating_sub(self.top)
    }

    /// Ledger index of the block at `reference`, free or not
    pub fn position(&self, reference: Reference) -> Option<usize> {
        let offset = offset_of(reference)?;
        self.blocks.iter().position(|b| b.offset == offset)
    }

    /// Ledger index of the live block at `reference`
    pub fn live_position(&self, reference: Reference) -> Option<usize> {
        self.position(reference).filter(|&idx| !self.blocks[idx].free)
    }

    /// First free block in ledger order that can hold `size` bytes
    pub fn find_free_block(&self, size: Size) -> Option<usize> {
        self.blocks.iter().position(|b| b.free && b.size >= size)
    }

    /// Carve a new block out of the frontier, growing the buffer by one step if allowed
    pub fn request_memory(&mut self, size: Size) -> HeapResult<Allocation> {
        let insufficient = || HeapError::InsufficientMemory {
            requested: size,
            available: self.free_at_top(),
        };

        let end = self.top.checked_add(size).ok_or_else(insufficient)?;
        let mut grown = None;

        if end > self.memory.len() {
            let from = self.memory.len();
            let to = from.checked_add(self.growth_step).ok_or_else(insufficient)?;

            // One step per call: grow only if that single step is enough
            if !self.elastic || end > to {
                return Err(insufficient());
            }

            self.memory.resize(to, 0);
            self.growth_count += 1;
            grown = Some((from, to));
        }

        self.blocks.push(HeapBlock::new(self.top, size));
        let offset = self.top;
        self.top = end + BLOCK_GAP;

        trace!(
            "Frontier block at {} ({} bytes), top now {} of {}",
            offset,
            size,
            self.top,
            self.memory.len()
        );

        Ok(Allocation {
            offset,
            size,
            reused: false,
            grown,
        })
    }

    /// Shrink the block at `idx` to `size` bytes and record the remainder as a free block
    pub fn split(&mut self, idx: usize, size: Size) {
        let block = &mut self.blocks[idx];
        debug_assert!(block.size > size);

        let remainder = HeapBlock::free_at(
            block.offset + size + BLOCK_GAP,
            block.size - size - BLOCK_GAP,
        );
        block.size = size;

        debug!(
            "Split block {}: keeping {} bytes, {} bytes free at {}",
            block.offset, size, remainder.size, remainder.offset
        );

        match self.coalesce {
            CoalescePolicy::LedgerOrder => self.blocks.push(remainder),
            CoalescePolicy::AddressOrder => self.blocks.insert(idx + 1, remainder),
        }
    }

    /// Single linear pass over the ledger coalescing neighbouring free blocks
    ///
    /// A free block absorbs the free blocks that directly follow it in the ledger
    /// as long as each one starts where the absorber ends. A free block left at
    /// the end of the ledger that also ends at the frontier is dropped and the
    /// frontier rewound to its offset.
    pub fn merge(&mut self) -> (usize, bool) {
        let mut removed = 0;
        let mut idx = 0;

        while idx < self.blocks.len() {
            if !self.blocks[idx].free {
                idx += 1;
                continue;
            }

            while idx + 1 < self.blocks.len() {
                let next = &self.blocks[idx + 1];
                if !next.free || next.offset != self.blocks[idx].end() {
                    break;
                }
                let absorbed = self.blocks.remove(idx + 1);
                self.blocks[idx].size += absorbed.size + BLOCK_GAP;
                removed += 1;
            }

            if idx + 1 == self.blocks.len() && self.blocks[idx].end() == self.top {
                let tail = self.blocks.remove(idx);
                self.top = tail.offset;
                return (removed + 1, true);
            }

            idx += 1;
        }

        (removed, false)
    }

    pub fn allocate(&mut self, size: Size) -> HeapResult<Allocation> {
        if size == 0 {
            return Err(HeapError::NullReference);
        }

        let Some(idx) = self.find_free_block(size) else {
            return self.request_memory(size);
        };

        if self.blocks[idx].size > size {
            self.split(idx, size);
        }
        let block = &mut self.blocks[idx];
        block.free = false;

        Ok(Allocation {
            offset: block.offset,
            size,
            reused: true,
            grown: None,
        })
    }

    pub fn release(&mut self, reference: Reference) -> HeapResult<Release> {
        if reference < 0 {
            return Err(HeapError::NullReference);
        }

        let idx = self.position(reference).ok_or(HeapError::BlockNotFound {
            reference,
            blocks: self.blocks.len(),
        })?;

        let block = &mut self.blocks[idx];
        if block.free {
            return Err(HeapError::AlreadyFree(reference));
        }

        block.free = true;
        block.clear_access_log();
        let size = block.size;

        let (merged, trimmed) = self.merge();
        Ok(Release {
            size,
            merged,
            trimmed,
        })
    }

    /// Grow a block by moving it; never shrinks
    pub fn reallocate(&mut self, reference: Reference, size: Size) -> HeapResult<Allocation> {
        if reference < 0 {
            return self.allocate(size);
        }

        let idx = self
            .live_position(reference)
            .ok_or(HeapError::InvalidReference(reference))?;
        let old = self.blocks[idx].clone();

        if old.size >= size {
            return Ok(Allocation {
                offset: old.offset,
                size: old.size,
                reused: true,
                grown: None,
            });
        }

        let allocation = self.allocate(size)?;
        let count = old.size.min(size);
        self.memory
            .copy_within(old.offset..old.offset + count, allocation.offset);
        self.release(reference)?;

        Ok(allocation)
    }

    pub fn zero(&mut self, offset: Offset, size: Size) {
        self.memory[offset..offset + size].fill(0);
    }

    pub fn write(&mut self, reference: Reference, data: &[u8]) -> HeapResult<Size> {
        if reference < 0 {
            return Err(HeapError::NullReference);
        }

        let idx = self
            .live_position(reference)
            .ok_or(HeapError::InvalidReference(reference))?;
        let block = &self.blocks[idx];

        if data.len() > block.size {
            return Err(HeapError::InsufficientMemory {
                requested: data.len(),
                available: block.size,
            });
        }

        let offset = block.offset;
        self.memory[offset..offset + data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    pub fn read(&self, reference: Reference) -> Option<Vec<u8>> {
        let idx = self.live_position(reference)?;
        let block = &self.blocks[idx];
        self.memory
            .get(block.offset..block.offset + block.size)
            .map(<[u8]>::to_vec)
    }

    pub fn record_access(&mut self, reference: Reference, accessor: &str) -> HeapResult<()> {
        let idx = self
            .live_position(reference)
            .ok_or(HeapError::InvalidReference(reference))?;
        self.blocks[idx].add_access(accessor);
        Ok(())
    }

    /// Copy out a live block and free it in the same critical section
    pub fn take(&mut self, reference: Reference) -> Option<(Vec<u8>, HeapResult<Release>)> {
        let data = self.read(reference)?;
        let released = self.release(reference);
        Some((data, released))
    }
}
