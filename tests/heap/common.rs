/*!
 * Shared test helpers
 */

use byte_heap::{ByteArrayHeap, HeapBlock, HeapConfig};

pub const MIB: usize = 1024 * 1024;

/// Route heap `log` output through the test harness (RUST_LOG=debug to see it)
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Non-elastic heap of `capacity` bytes
pub fn fixed_heap(capacity: usize) -> ByteArrayHeap {
    init_logging();
    ByteArrayHeap::with_capacity(capacity)
}

/// Elastic heap of `capacity` bytes growing by `step`
pub fn elastic_heap(capacity: usize, step: usize) -> ByteArrayHeap {
    init_logging();
    ByteArrayHeap::from_config(
        HeapConfig::default()
            .with_capacity(capacity)
            .with_growth_step(step)
            .with_elastic(true),
    )
}

/// Assert that no two ledger entries overlap and every entry sits below the frontier
pub fn assert_ledger_consistent(heap: &ByteArrayHeap) {
    let top = heap.top();
    let mut blocks: Vec<HeapBlock> = heap.get_blocks();
    blocks.sort_by_key(|b| b.offset());

    for block in &blocks {
        assert!(
            block.end() <= top,
            "block {} ends at {} past top {}",
            block.offset(),
            block.end(),
            top
        );
    }
    for pair in blocks.windows(2) {
        assert!(
            pair[0].end() <= pair[1].offset(),
            "block {} overlaps block {}",
            pair[0].offset(),
            pair[1].offset()
        );
    }
    assert!(top <= heap.get_size() + 1);
}
