/*!
 * Collection
 * Central orchestration for observability data collection
 */

mod bridge;
mod collector;

pub use bridge::{collector as global_collector, emit_global, init_collector};
pub use collector::Collector;
