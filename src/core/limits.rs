/*!
 * Heap Limits and Constants
 *
 * Centralized location for the heap's sizing constants and thresholds.
 * Environment overrides live in `heap::config`; these are the defaults.
 */

// =============================================================================
// HEAP SIZING
// =============================================================================

/// Default heap buffer capacity (170MB)
/// Used as the initial buffer length for every new heap
pub const DEFAULT_MAX_MEM_SIZE: usize = 170 * 1024 * 1024;

/// Elastic growth step (10MB)
/// An elastic heap grows by exactly one step per allocation, never by the requested amount
pub const DEFAULT_MEM_STEP: usize = 10 * 1024 * 1024;

/// Gap between consecutive blocks (1 byte)
/// Honored by frontier advance, split remainder placement and merge arithmetic
pub const BLOCK_GAP: usize = 1;

// =============================================================================
// MEMORY PRESSURE
// =============================================================================

/// High pressure threshold (80% of buffer below the frontier)
pub const PRESSURE_HIGH_RATIO: f64 = 0.80;

/// Critical pressure threshold (95% of buffer below the frontier)
pub const PRESSURE_CRITICAL_RATIO: f64 = 0.95;

/// Medium pressure threshold (60%)
pub const PRESSURE_MEDIUM_RATIO: f64 = 0.60;

// =============================================================================
// MONITORING & OBSERVABILITY
// =============================================================================

/// Event stream ring buffer size (4096 events)
/// [PERF] Must be power of 2 for lock-free ring buffer
pub const EVENT_RING_SIZE: usize = 4096;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Convert bytes to megabytes for human-readable output
#[inline]
pub const fn bytes_to_mb(bytes: usize) -> usize {
    bytes / (1024 * 1024)
}

/// Convert megabytes to bytes
#[inline]
pub const fn mb_to_bytes(mb: usize) -> usize {
    mb * 1024 * 1024
}
