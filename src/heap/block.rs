/*!
 * Heap Block
 * Ledger entry describing one region of the heap buffer
 */

use crate::core::limits::BLOCK_GAP;
use crate::core::types::{reference_of, Offset, Reference, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata of one heap block
///
/// Created by the engine on allocation or split, mutated by free/split/merge.
/// Callers only ever see snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapBlock {
    pub(crate) offset: Offset,
    pub(crate) size: Size,
    pub(crate) free: bool,
    access_log: Vec<String>,
}

impl HeapBlock {
    /// New allocated block
    pub(crate) fn new(offset: Offset, size: Size) -> Self {
        Self {
            offset,
            size,
            free: false,
            access_log: Vec::new(),
        }
    }

    /// New free block, as produced by split
    pub(crate) fn free_at(offset: Offset, size: Size) -> Self {
        Self {
            free: true,
            ..Self::new(offset, size)
        }
    }

    /// Reference handed out to callers for this block
    #[inline]
    pub fn reference(&self) -> Reference {
        reference_of(self.offset)
    }

    #[inline]
    pub fn offset(&self) -> Offset {
        self.offset
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    /// First offset past this block and its gap byte
    #[inline]
    pub fn end(&self) -> Offset {
        self.offset + self.size + BLOCK_GAP
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.free
    }

    /// Names of the entities that accessed this block since it was allocated
    pub fn access_log(&self) -> &[String] {
        &self.access_log
    }

    /// Add a name to the access log
    pub fn add_access(&mut self, name: impl Into<String>) {
        self.access_log.push(name.into());
    }

    pub fn clear_access_log(&mut self) {
        self.access_log.clear();
    }
}

impl fmt::Display for HeapBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HeapBlock[reference: {}, size: {}, free: {}, access log: {:?}]",
            self.offset, self.size, self.free, self.access_log
        )
    }
}
