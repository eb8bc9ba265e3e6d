/*!
 * Heap Allocation Tests
 * malloc/free/realloc/calloc behaviour, frontier placement and elastic growth
 */

use crate::common::{assert_ledger_consistent, elastic_heap, fixed_heap, MIB};
use byte_heap::heap::to_code;
use byte_heap::{ByteArrayHeap, HeapError, INSUFFICIENT_MEMORY, NULL_REFERENCE};
use pretty_assertions::assert_eq;

#[test]
fn test_default_heap() {
    let heap = ByteArrayHeap::new();
    assert_eq!(heap.get_size(), 170 * MIB);
    assert!(!heap.is_elastic());
    assert_eq!(heap.get_n_blocks(), 0);
}

#[test]
fn test_references_follow_frontier_with_gap() {
    let heap = fixed_heap(8 * MIB);

    assert_eq!(heap.malloc(MIB), Ok(0));
    assert_eq!(heap.malloc(2 * MIB), Ok((MIB + 1) as i64));
    assert_eq!(heap.malloc(2 * MIB), Ok((MIB + 1 + 2 * MIB + 1) as i64));
    assert_eq!(heap.top(), 5 * MIB + 3);
}

#[test]
fn test_zero_size_is_null_reference() {
    let heap = fixed_heap(1024);

    assert_eq!(heap.malloc(0), Err(HeapError::NullReference));
    assert_eq!(to_code(heap.malloc(0)), NULL_REFERENCE);
    assert_eq!(heap.get_n_blocks(), 0);
    assert_eq!(heap.top(), 0);
}

#[test]
fn test_non_elastic_overflow() {
    let heap = fixed_heap(1024);

    let result = heap.malloc(1025);
    assert_eq!(
        result,
        Err(HeapError::InsufficientMemory {
            requested: 1025,
            available: 1024
        })
    );
    assert_eq!(to_code(result), INSUFFICIENT_MEMORY);
    assert_eq!(heap.get_size(), 1024);
    assert_eq!(heap.get_n_blocks(), 0);
}

#[test]
fn test_exact_fill_without_growth() {
    let heap = fixed_heap(1024);
    assert_eq!(heap.malloc(1024), Ok(0));
    assert_eq!(heap.top(), 1025);
    assert!(heap.malloc(1).is_err());
}

#[test]
fn test_elastic_growth_one_step_at_a_time() {
    let heap = elastic_heap(1024, 256);

    // Beyond capacity but within one step
    let big = heap.malloc(1025).unwrap();
    assert_eq!(big, 0);
    assert_eq!(heap.get_block(big).unwrap().size(), 1025);
    assert_eq!(heap.get_size(), 1024 + 256);

    // More than free space plus one step: refused, nothing changes
    let top = heap.top();
    assert!(matches!(
        heap.malloc(2048),
        Err(HeapError::InsufficientMemory { .. })
    ));
    assert_eq!(heap.get_size(), 1024 + 256);
    assert_eq!(heap.top(), top);
    assert_eq!(heap.get_n_blocks(), 1);

    // Fits in what is left
    heap.malloc(200).unwrap();
    assert_eq!(heap.get_size(), 1280);

    // Needs exactly one more step
    heap.malloc(300).unwrap();
    assert_eq!(heap.get_size(), 1536);
    assert_eq!(heap.stats().growth_count, 2);
    assert_ledger_consistent(&heap);
}

#[test]
fn test_growth_preserves_contents() {
    let heap = elastic_heap(64, 64);
    let first = heap.malloc(32).unwrap();
    heap.write(first, &[9u8; 32]).unwrap();

    let second = heap.malloc(64).unwrap();
    assert_eq!(heap.get_size(), 128);
    assert_eq!(heap.read(first), Some(vec![9u8; 32]));
    assert_eq!(heap.read(second), Some(vec![0u8; 64]));
}

#[test]
fn test_free_errors_are_distinct() {
    let heap = fixed_heap(1024);
    let reference = heap.malloc(16).unwrap();
    heap.malloc(16).unwrap();

    assert_eq!(heap.free(-5), Err(HeapError::NullReference));
    assert!(matches!(
        heap.free(500),
        Err(HeapError::BlockNotFound { reference: 500, .. })
    ));

    heap.free(reference).unwrap();
    assert_eq!(heap.free(reference), Err(HeapError::AlreadyFree(reference)));
}

#[test]
fn test_free_last_block_rewinds_top() {
    let heap = fixed_heap(1024);
    heap.malloc(100).unwrap();
    let last = heap.malloc(100).unwrap();
    let blocks = heap.get_n_blocks();

    heap.free(last).unwrap();
    assert_eq!(heap.top(), last as usize);
    assert_eq!(heap.get_n_blocks(), blocks - 1);

    assert_eq!(heap.malloc(100), Ok(last));
}

#[test]
fn test_first_fit_in_ledger_order() {
    let heap = fixed_heap(4096);
    let a = heap.malloc(300).unwrap();
    heap.malloc(10).unwrap();
    let b = heap.malloc(100).unwrap();
    heap.malloc(10).unwrap();

    heap.free(a).unwrap();
    heap.free(b).unwrap();

    // Both fit; the first in ledger order wins even though b fits better
    assert_eq!(heap.malloc(100), Ok(a));
}

#[test]
fn test_exact_size_reuse_does_not_split() {
    let heap = fixed_heap(1024);
    let a = heap.malloc(50).unwrap();
    heap.malloc(50).unwrap();
    heap.free(a).unwrap();

    let blocks = heap.get_n_blocks();
    assert_eq!(heap.malloc(50), Ok(a));
    assert_eq!(heap.get_n_blocks(), blocks);
}

#[test]
fn test_realloc_null_reference_is_malloc() {
    let heap = fixed_heap(1024);
    let other = fixed_heap(1024);

    assert_eq!(heap.realloc(NULL_REFERENCE, 64), other.malloc(64));
    assert_eq!(heap.realloc(-7, 32), other.malloc(32));
    assert_eq!(heap.get_blocks(), other.get_blocks());
    assert_eq!(heap.realloc(NULL_REFERENCE, 0), Err(HeapError::NullReference));
}

#[test]
fn test_realloc_moves_and_copies_old_size() {
    let heap = fixed_heap(1024);
    let old = heap.malloc(4).unwrap();
    let fence = heap.malloc(4).unwrap();
    heap.write(old, b"data").unwrap();
    heap.write(fence, b"XXXX").unwrap();

    let new = heap.realloc(old, 8).unwrap();
    assert_ne!(new, old);

    let bytes = heap.read(new).unwrap();
    assert_eq!(&bytes[..4], b"data");
    // Nothing past the old block (gap byte, fence) leaked into the copy
    assert_eq!(&bytes[4..], &[0u8; 4]);
    assert!(heap.get_block(old).unwrap().is_free());
    assert_eq!(heap.read(fence).as_deref(), Some(&b"XXXX"[..]));
}

#[test]
fn test_realloc_failure_keeps_old_block() {
    let heap = fixed_heap(64);
    let reference = heap.malloc(16).unwrap();
    heap.write(reference, &[1u8; 16]).unwrap();

    assert!(matches!(
        heap.realloc(reference, 1000),
        Err(HeapError::InsufficientMemory { .. })
    ));
    assert_eq!(heap.read(reference), Some(vec![1u8; 16]));
    assert_eq!(heap.get_n_blocks(), 1);
}

#[test]
fn test_realloc_unknown_reference() {
    let heap = fixed_heap(64);
    assert_eq!(heap.realloc(10, 4), Err(HeapError::InvalidReference(10)));
}

#[test]
fn test_calloc() {
    let heap = fixed_heap(1024);
    let reference = heap.calloc(4, 8).unwrap();
    assert_eq!(heap.get_block(reference).unwrap().size(), 32);
    assert_eq!(heap.read(reference), Some(vec![0u8; 32]));

    assert_eq!(heap.calloc(0, 8), Err(HeapError::NullReference));
}

#[test]
fn test_stats_json() {
    let heap = fixed_heap(1024);
    heap.malloc(10).unwrap();
    let json = heap.stats().to_json().unwrap();
    assert!(json.contains("\"capacity\":1024"));
    assert!(json.contains("\"top\":11"));
}
