/*!
 * Event Ring
 * Bounded buffer of recent heap events
 *
 * Publishing never blocks a heap operation. Once the ring is full the oldest
 * event is evicted, so subscribers always see the latest heap activity.
 */

use crate::core::limits::EVENT_RING_SIZE;
use crate::monitoring::events::{Event, EventFilter};
use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters for one ring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub published: u64,
    pub consumed: u64,
    /// Events pushed out unread by newer ones
    pub evicted: u64,
    pub subscribers: usize,
}

struct Ring {
    events: ArrayQueue<Event>,
    published: AtomicU64,
    consumed: AtomicU64,
    evicted: AtomicU64,
    subscribers: AtomicUsize,
}

/// Shared handle to a ring of heap events
///
/// Clones publish into and consume from the same ring.
#[derive(Clone)]
pub struct EventStream {
    ring: Arc<Ring>,
}

impl EventStream {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_RING_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ring: Arc::new(Ring {
                events: ArrayQueue::new(capacity.max(1)),
                published: AtomicU64::new(0),
                consumed: AtomicU64::new(0),
                evicted: AtomicU64::new(0),
                subscribers: AtomicUsize::new(0),
            }),
        }
    }

    /// Append an event, evicting the oldest one if the ring is full
    ///
    /// Returns the evicted event, if any.
    #[inline]
    pub fn publish(&self, event: Event) -> Option<Event> {
        self.ring.published.fetch_add(1, Ordering::Relaxed);
        let evicted = self.ring.events.force_push(event);
        if evicted.is_some() {
            self.ring.evicted.fetch_add(1, Ordering::Relaxed);
        }
        evicted
    }

    /// Take the oldest unread event
    #[inline]
    pub fn try_consume(&self) -> Option<Event> {
        let event = self.ring.events.pop()?;
        self.ring.consumed.fetch_add(1, Ordering::Relaxed);
        Some(event)
    }

    pub fn subscribe(&self) -> Subscriber {
        self.ring.subscribers.fetch_add(1, Ordering::Relaxed);
        Subscriber {
            stream: self.clone(),
        }
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            published: self.ring.published.load(Ordering::Relaxed),
            consumed: self.ring.consumed.load(Ordering::Relaxed),
            evicted: self.ring.evicted.load(Ordering::Relaxed),
            subscribers: self.ring.subscribers.load(Ordering::Relaxed),
        }
    }

    /// Unread events currently held
    pub fn pending(&self) -> usize {
        self.ring.events.len()
    }
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader over an event ring
///
/// Subscribers share the ring: an event read by one is gone for the others.
pub struct Subscriber {
    stream: EventStream,
}

impl Subscriber {
    #[inline]
    pub fn next(&mut self) -> Option<Event> {
        self.stream.try_consume()
    }

    /// Read every pending event
    pub fn drain(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.next()).collect()
    }

    /// Read every pending event, keeping those that match `filter`
    pub fn filter(&mut self, filter: &EventFilter) -> Vec<Event> {
        std::iter::from_fn(|| self.next())
            .filter(|event| event.matches(filter))
            .collect()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.stream.ring.subscribers.fetch_sub(1, Ordering::Relaxed);
    }
}
