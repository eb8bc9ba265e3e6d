/*!
 * Bridge
 * Process-wide collector used when no collector is injected
 */

use super::collector::Collector;
use crate::monitoring::events::Event;
use std::sync::Arc;

static GLOBAL_COLLECTOR: std::sync::OnceLock<Arc<Collector>> = std::sync::OnceLock::new();

/// Initialize the global collector; later calls keep the first one
pub fn init_collector(collector: Collector) -> Arc<Collector> {
    Arc::clone(GLOBAL_COLLECTOR.get_or_init(|| Arc::new(collector)))
}

/// Get global collector if initialized
#[inline]
pub fn collector() -> Option<&'static Arc<Collector>> {
    GLOBAL_COLLECTOR.get()
}

/// Emit an event to the global collector, if any
#[inline]
pub fn emit_global(event: Event) {
    if let Some(collector) = collector() {
        collector.emit(event);
    }
}
