/*!
 * heapd - Heap exerciser
 *
 * Runs producer threads that allocate and fill blocks, hands the references to
 * consumer threads over a channel, and lets consumers read-then-release them,
 * the way request and transport layers share the process-wide heap.
 *
 * Environment variables:
 * - HEAPD_PRODUCERS: producer threads (default 4)
 * - HEAPD_CONSUMERS: consumer threads (default 4)
 * - HEAPD_MESSAGES: blocks per producer (default 1000)
 * - HEAP_*: heap overrides, see `HeapConfig::from_env`
 */

use anyhow::{anyhow, Context, Result};
use byte_heap::heap::{factory, take_block_data_global};
use byte_heap::monitoring::{init_collector, init_tracing, span_operation, Collector};
use byte_heap::Reference;
use std::thread;
use tracing::{info, warn};

fn env_usize(key: &str, default: usize) -> Result<usize> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a positive integer, got {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

fn main() -> Result<()> {
    init_tracing();

    let producers = env_usize("HEAPD_PRODUCERS", 4)?;
    let consumers = env_usize("HEAPD_CONSUMERS", 4)?;
    let messages = env_usize("HEAPD_MESSAGES", 1000)?;

    let collector = init_collector(Collector::new());
    let factory = factory::global();
    info!(config = ?factory.config(), "heapd starting");

    let heap = factory::instance();
    let (tx, rx) = flume::bounded::<(Reference, Vec<u8>)>(1024);

    let producer_handles: Vec<_> = (0..producers)
        .map(|id| {
            let heap = heap.clone();
            let tx = tx.clone();
            thread::Builder::new()
                .name(format!("producer-{}", id))
                .spawn(move || -> Result<usize> {
                    let mut sent = 0;
                    for n in 0..messages {
                        let payload = format!("producer {} message {}", id, n).into_bytes();
                        let span = span_operation("produce");
                        let reference = heap.malloc(payload.len())?;
                        span.record_reference(reference);
                        heap.write(reference, &payload)?;
                        heap.record_access(reference, &format!("producer-{}", id))?;
                        tx.send((reference, payload))
                            .map_err(|_| anyhow!("consumers hung up"))?;
                        sent += 1;
                    }
                    Ok(sent)
                })
        })
        .collect::<std::io::Result<_>>()?;
    drop(tx);

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|id| {
            let rx = rx.clone();
            thread::Builder::new()
                .name(format!("consumer-{}", id))
                .spawn(move || {
                    let accessor = format!("consumer-{}", id);
                    let mut mismatches = 0usize;
                    for (reference, expected) in rx.iter() {
                        match take_block_data_global(reference, &accessor) {
                            Some(data) if data == expected => {}
                            _ => mismatches += 1,
                        }
                    }
                    mismatches
                })
        })
        .collect::<std::io::Result<_>>()?;

    let mut produced = 0;
    for handle in producer_handles {
        produced += handle
            .join()
            .map_err(|_| anyhow!("producer thread panicked"))??;
    }

    let mut mismatches = 0;
    for handle in consumer_handles {
        mismatches += handle
            .join()
            .map_err(|_| anyhow!("consumer thread panicked"))?;
    }

    let stats = heap.stats();
    info!(
        produced,
        mismatches,
        blocks = stats.blocks,
        top = stats.top,
        capacity = stats.capacity,
        growths = stats.growth_count,
        pressure = %stats.pressure(),
        problems = collector.problem_count(),
        "heapd finished"
    );
    println!("{}", stats.to_json()?);

    if mismatches > 0 {
        warn!(mismatches, "consumers saw unexpected block contents");
        return Err(anyhow!("{} blocks did not round-trip", mismatches));
    }
    Ok(())
}
