/*!
 * Heap Types
 * Errors, sentinel codes and statistics shared by the heap
 */

use crate::core::limits::{PRESSURE_CRITICAL_RATIO, PRESSURE_HIGH_RATIO, PRESSURE_MEDIUM_RATIO};
use crate::core::types::{Reference, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel: memory cannot be allocated, or the reference is null/negative
pub const NULL_REFERENCE: Reference = -1;

/// Sentinel: not enough room in the heap
pub const INSUFFICIENT_MEMORY: Reference = -2;

/// Sentinel: the reference does not name a live block
pub const INVALID_REFERENCE: Reference = -3;

/// Heap operation result
pub type HeapResult<T> = Result<T, HeapError>;

/// Heap errors
///
/// A failed operation leaves the ledger, the frontier and the buffer untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeapError {
    #[error("Null reference: size must be positive and references non-negative")]
    NullReference,

    #[error("Insufficient memory: requested {requested} bytes, {available} bytes available")]
    InsufficientMemory { requested: Size, available: Size },

    #[error("Invalid reference: {0} does not name a live block")]
    InvalidReference(Reference),

    #[error("Memory block {reference} could not be found in heap of {blocks} blocks")]
    BlockNotFound { reference: Reference, blocks: usize },

    #[error("Memory block {0} has already been freed")]
    AlreadyFree(Reference),
}

impl HeapError {
    /// Sentinel code for callers that branch on integers
    pub fn code(&self) -> Reference {
        match self {
            HeapError::NullReference => NULL_REFERENCE,
            HeapError::InsufficientMemory { .. } => INSUFFICIENT_MEMORY,
            HeapError::InvalidReference(_)
            | HeapError::BlockNotFound { .. }
            | HeapError::AlreadyFree(_) => INVALID_REFERENCE,
        }
    }

    /// Capacity errors may succeed on retry; reference and input errors never do
    pub fn is_recoverable(&self) -> bool {
        matches!(self, HeapError::InsufficientMemory { .. })
    }
}

/// Flatten an allocation result into the sentinel-coded integer form
#[inline]
pub fn to_code(result: HeapResult<Reference>) -> Reference {
    match result {
        Ok(reference) => reference,
        Err(e) => e.code(),
    }
}

/// Flatten a write result into bytes written or a sentinel code
#[inline]
pub fn written_to_code(result: HeapResult<Size>) -> Reference {
    match result {
        Ok(written) => written as Reference,
        Err(e) => e.code(),
    }
}

/// How merge() decides which free blocks are neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoalescePolicy {
    /// Split remainders go to the ledger tail and merge walks ledger order.
    ///
    /// This is stricter than plain ledger adjacency. A free block absorbs its
    /// ledger successor only if the successor starts where it ends, and a
    /// trailing free block is trimmed only if it ends at the frontier. With a
    /// remainder at the tail, ledger order and buffer order diverge: in
    /// `[(0, 40, live), (101, 10, free), (41, 59, free)]` with top 112,
    /// letting 101 absorb 41 by ledger position alone would stretch it past
    /// the frontier, and trimming 41 would rewind top below the block at 101.
    #[default]
    LedgerOrder,
    /// Split remainders are inserted after their head so ledger order always
    /// equals address order.
    AddressOrder,
}

impl std::str::FromStr for CoalescePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ledger" | "ledger_order" => Ok(CoalescePolicy::LedgerOrder),
            "address" | "address_order" => Ok(CoalescePolicy::AddressOrder),
            other => Err(format!("unknown coalesce policy: {}", other)),
        }
    }
}

/// Heap statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeapStats {
    pub capacity: Size,
    pub top: Size,
    pub blocks: usize,
    pub free_blocks: usize,
    pub allocated_bytes: Size,
    pub free_bytes: Size,
    pub growth_count: u64,
    pub elastic: bool,
    /// Events the attached collector evicted unread (0 without a collector)
    pub events_evicted: u64,
}

impl HeapStats {
    /// Share of the buffer below the allocation frontier, in percent
    pub fn usage_percentage(&self) -> f64 {
        if self.capacity == 0 {
            return 100.0;
        }
        (self.top.min(self.capacity) as f64 / self.capacity as f64) * 100.0
    }

    pub fn pressure(&self) -> HeapPressure {
        HeapPressure::from_ratio(self.usage_percentage() / 100.0)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Heap pressure levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeapPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl HeapPressure {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= PRESSURE_CRITICAL_RATIO {
            HeapPressure::Critical
        } else if ratio >= PRESSURE_HIGH_RATIO {
            HeapPressure::High
        } else if ratio >= PRESSURE_MEDIUM_RATIO {
            HeapPressure::Medium
        } else {
            HeapPressure::Low
        }
    }
}

impl std::fmt::Display for HeapPressure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            HeapPressure::Low => write!(f, "LOW"),
            HeapPressure::Medium => write!(f, "MEDIUM"),
            HeapPressure::High => write!(f, "HIGH"),
            HeapPressure::Critical => write!(f, "CRITICAL"),
        }
    }
}
