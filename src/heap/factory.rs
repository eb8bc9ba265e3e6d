/*!
 * Heap Factory
 * Lazily constructed, resettable heap instance
 *
 * `HeapFactory` can be created and injected like any other value; the
 * process-wide factory behind [`instance`] and [`erase`] is one such value.
 */

use super::config::HeapConfig;
use super::engine::ByteArrayHeap;
use crate::monitoring::Collector;
use log::info;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

/// Owner of at most one heap at a time
pub struct HeapFactory {
    config: HeapConfig,
    collector: Option<Arc<Collector>>,
    current: Mutex<Option<ByteArrayHeap>>,
}

impl HeapFactory {
    pub fn new(config: HeapConfig) -> Self {
        Self {
            config,
            collector: None,
            current: Mutex::new(None),
        }
    }

    /// Attach a collector to every heap this factory builds
    pub fn with_collector(mut self, collector: Arc<Collector>) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Handle to the current heap, building it on first use
    pub fn get(&self) -> ByteArrayHeap {
        let mut current = self.current.lock();
        current
            .get_or_insert_with(|| {
                let heap = ByteArrayHeap::from_config(self.config.clone());
                match self.collector {
                    Some(ref collector) => heap.with_collector(Arc::clone(collector)),
                    None => heap,
                }
            })
            .clone()
    }

    /// Discard the current heap; the next `get` builds a fresh, empty one
    ///
    /// Handles obtained earlier keep the old heap alive until dropped.
    pub fn reset(&self) {
        if self.current.lock().take().is_some() {
            info!("Heap instance erased");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.current.lock().is_some()
    }
}

impl Default for HeapFactory {
    fn default() -> Self {
        Self::new(HeapConfig::shared())
    }
}

static GLOBAL_FACTORY: OnceLock<HeapFactory> = OnceLock::new();

/// Process-wide factory, configured from defaults plus `HEAP_*` environment overrides
pub fn global() -> &'static HeapFactory {
    GLOBAL_FACTORY.get_or_init(|| HeapFactory::new(HeapConfig::shared().from_env()))
}

/// The process-wide heap (elastic by default)
pub fn instance() -> ByteArrayHeap {
    global().get()
}

/// Erase the process-wide heap
pub fn erase() {
    global().reset()
}
