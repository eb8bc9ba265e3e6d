/*!
 * Collector
 * Observability sink for heap events
 */

use crate::core::types::{Reference, Size};
use crate::monitoring::events::{Category, Event, Payload, Severity};
use crate::monitoring::streaming::{EventStream, StreamStats, Subscriber};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unified observability collector
pub struct Collector {
    stream: EventStream,
    /// Events at `Severity::Warn` or above
    problems: Arc<AtomicU64>,
}

impl Collector {
    /// Create a new collector
    pub fn new() -> Self {
        Self::with_stream(EventStream::new())
    }

    /// Create a collector publishing into an existing stream
    pub fn with_stream(stream: EventStream) -> Self {
        Self {
            stream,
            problems: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event (primary API)
    #[inline]
    pub fn emit(&self, event: Event) {
        if event.severity >= Severity::Warn {
            self.problems.fetch_add(1, Ordering::Relaxed);
        }
        let _ = self.stream.publish(event);
    }

    /// Subscribe to event stream
    pub fn subscribe(&self) -> Subscriber {
        self.stream.subscribe()
    }

    /// Get stream statistics
    pub fn stream_stats(&self) -> StreamStats {
        self.stream.stats()
    }

    /// Number of warning-or-worse events seen so far
    pub fn problem_count(&self) -> u64 {
        self.problems.load(Ordering::Relaxed)
    }

    pub fn block_allocated(&self, reference: Reference, size: Size, reused: bool) {
        self.emit(Event::new(
            Severity::Debug,
            Category::Allocation,
            Payload::BlockAllocated {
                reference,
                size,
                reused,
            },
        ));
    }

    pub fn block_freed(&self, reference: Reference, size: Size) {
        self.emit(Event::new(
            Severity::Debug,
            Category::Release,
            Payload::BlockFreed { reference, size },
        ));
    }

    pub fn block_accessed(&self, reference: Reference, accessor: &str) {
        self.emit(
            Event::new(
                Severity::Trace,
                Category::Access,
                Payload::BlockAccessed { reference },
            )
            .with_accessor(accessor),
        );
    }

    pub fn allocation_failed(&self, requested: Size, available: Size) {
        self.emit(Event::new(
            Severity::Warn,
            Category::Allocation,
            Payload::AllocationFailed {
                requested,
                available,
            },
        ));
    }

    /// Report a free that failed after the block's bytes were already consumed
    pub fn release_failed(&self, reference: Reference, error: String, accessor: &str) {
        self.emit(
            Event::new(
                Severity::Error,
                Category::Release,
                Payload::ReleaseFailed { reference, error },
            )
            .with_accessor(accessor),
        );
    }

    pub fn heap_grown(&self, from: Size, to: Size) {
        self.emit(Event::new(
            Severity::Info,
            Category::Growth,
            Payload::HeapGrown { from, to },
        ));
    }

    pub fn heap_pressure(&self, usage_pct: u8, top: Size, capacity: Size) {
        self.emit(Event::new(
            Severity::Warn,
            Category::Pressure,
            Payload::HeapPressure {
                usage_pct,
                top,
                capacity,
            },
        ));
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Collector {
    fn clone(&self) -> Self {
        Self {
            stream: self.stream.clone(),
            problems: Arc::clone(&self.problems),
        }
    }
}
