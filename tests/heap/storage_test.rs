/*!
 * Heap Storage Tests
 */

use crate::common::fixed_heap;
use byte_heap::heap::written_to_code;
use byte_heap::{HeapError, INVALID_REFERENCE};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn test_partial_write_keeps_tail() {
    let heap = fixed_heap(1024);
    let reference = heap.malloc(8).unwrap();
    heap.write(reference, &[0xAA; 8]).unwrap();

    assert_eq!(heap.write(reference, &[1, 2, 3]), Ok(3));
    assert_eq!(
        heap.read(reference),
        Some(vec![1, 2, 3, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA])
    );
}

#[test]
fn test_oversize_write_is_rejected_untouched() {
    let heap = fixed_heap(1024);
    let reference = heap.malloc(4).unwrap();
    let neighbour = heap.malloc(4).unwrap();
    heap.write(reference, b"keep").unwrap();
    heap.write(neighbour, b"next").unwrap();

    let result = heap.write(reference, b"overflowing");
    assert_eq!(
        result,
        Err(HeapError::InsufficientMemory {
            requested: 11,
            available: 4
        })
    );
    assert_eq!(heap.read(reference).as_deref(), Some(&b"keep"[..]));
    assert_eq!(heap.read(neighbour).as_deref(), Some(&b"next"[..]));
}

#[test]
fn test_write_to_free_block_fails() {
    let heap = fixed_heap(1024);
    let reference = heap.malloc(4).unwrap();
    heap.malloc(4).unwrap();
    heap.free(reference).unwrap();

    let result = heap.write(reference, b"x");
    assert_eq!(result, Err(HeapError::InvalidReference(reference)));
    assert_eq!(written_to_code(result), INVALID_REFERENCE);
    assert_eq!(heap.read(reference), None);
}

#[test]
fn test_read_invalid_references() {
    let heap = fixed_heap(1024);
    heap.malloc(16).unwrap();

    assert_eq!(heap.read(-1), None);
    assert_eq!(heap.read(3), None);
    assert_eq!(heap.read(10_000), None);
}

#[test]
fn test_empty_write() {
    let heap = fixed_heap(64);
    let reference = heap.malloc(4).unwrap();
    assert_eq!(heap.write(reference, &[]), Ok(0));
}

#[test]
fn test_read_is_a_snapshot() {
    let heap = fixed_heap(64);
    let reference = heap.malloc(4).unwrap();
    heap.write(reference, b"abcd").unwrap();

    let before = heap.read(reference).unwrap();
    heap.write(reference, b"wxyz").unwrap();

    assert_eq!(before, b"abcd");
    assert_eq!(heap.read(reference).as_deref(), Some(&b"wxyz"[..]));
}

proptest! {
    #[test]
    fn prop_blocks_hold_their_own_bytes(payloads in prop::collection::vec(
        prop::collection::vec(any::<u8>(), 1..64),
        1..16,
    )) {
        let heap = fixed_heap(4096);
        let refs: Vec<_> = payloads
            .iter()
            .map(|payload| {
                let reference = heap.malloc(payload.len()).unwrap();
                heap.write(reference, payload).unwrap();
                reference
            })
            .collect();

        for (reference, payload) in refs.iter().zip(&payloads) {
            let read = heap.read(*reference);
            prop_assert_eq!(read.as_ref(), Some(payload));
        }
    }
}
