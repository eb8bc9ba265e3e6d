/*!
 * Heap Factory Tests
 * Process-wide instance, erase and read-then-release
 */

use crate::common::init_logging;
use byte_heap::heap::factory;
use byte_heap::monitoring::{Category, Collector, EventFilter};
use byte_heap::{
    erase, instance, take_block_data, take_block_data_global, BlockGuard, ByteArrayHeap,
    HeapConfig, HeapFactory,
};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::sync::Arc;

#[test]
#[serial]
fn test_global_instance_is_shared() {
    init_logging();
    erase();

    let a = instance();
    let b = instance();
    assert!(ByteArrayHeap::ptr_eq(&a, &b));
    assert!(a.is_elastic());

    let reference = a.malloc(8).unwrap();
    assert!(b.get_block(reference).is_some());
}

#[test]
#[serial]
fn test_erase_gives_fresh_heap() {
    init_logging();
    let before = instance();
    before.malloc(128).unwrap();

    erase();
    assert!(!factory::global().is_initialized());

    let after = instance();
    assert!(!ByteArrayHeap::ptr_eq(&before, &after));
    assert_eq!(after.get_n_blocks(), 0);
    assert_eq!(after.top(), 0);

    // The old handle still works on the detached heap
    assert!(before.get_n_blocks() > 0);
}

#[test]
#[serial]
fn test_take_block_data_global() {
    init_logging();
    erase();

    let heap = instance();
    let keep = heap.malloc(4).unwrap();
    let reference = heap.malloc(5).unwrap();
    heap.malloc(4).unwrap();
    heap.write(reference, b"hello").unwrap();

    assert_eq!(
        take_block_data_global(reference, "transport").as_deref(),
        Some(&b"hello"[..])
    );
    assert!(heap.get_block(reference).unwrap().is_free());
    assert!(!heap.get_block(keep).unwrap().is_free());

    // Second take finds nothing and frees nothing
    assert_eq!(take_block_data_global(reference, "transport"), None);
    assert_eq!(take_block_data_global(-1, "transport"), None);
}

#[test]
fn test_injected_factory() {
    init_logging();
    let collector = Arc::new(Collector::new());
    let factory = HeapFactory::new(HeapConfig::default().with_capacity(256))
        .with_collector(Arc::clone(&collector));

    let heap = factory.get();
    assert_eq!(heap.get_size(), 256);
    assert!(!heap.is_elastic());

    let mut sub = collector.subscribe();
    let guard = BlockGuard::allocate(heap.clone(), 16).unwrap();
    guard.write(b"scoped").unwrap();
    drop(guard);

    let releases = sub.filter(&EventFilter::new().category(Category::Release));
    assert_eq!(releases.len(), 1);
    assert_eq!(heap.get_n_blocks(), 0);
}

#[test]
fn test_take_block_data_on_injected_heap() {
    init_logging();
    let heap = ByteArrayHeap::with_capacity(128);
    let reference = heap.calloc(2, 3).unwrap();
    heap.write(reference, &[1, 2]).unwrap();

    assert_eq!(
        take_block_data(&heap, reference, "dispatcher"),
        Some(vec![1, 2, 0, 0, 0, 0])
    );
    assert_eq!(heap.get_n_blocks(), 0);
}
