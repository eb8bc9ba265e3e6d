/*!
 * Core Types
 * Common types used across the heap
 */

/// Handle to a heap block: the block's byte offset inside the heap buffer.
///
/// Signed because negative values are sentinel codes at the caller boundary.
pub type Reference = i64;

/// Size type for heap operations
pub type Size = usize;

/// Byte offset inside the heap buffer
pub type Offset = usize;

/// Convert a caller reference into a buffer offset, rejecting negatives
#[inline]
pub fn offset_of(reference: Reference) -> Option<Offset> {
    Offset::try_from(reference).ok()
}

/// Convert a buffer offset back into a caller reference
#[inline]
pub fn reference_of(offset: Offset) -> Reference {
    offset as Reference
}
