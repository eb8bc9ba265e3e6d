/*!
 * Monitoring
 * Heap events, event streaming, collection and tracing
 */

mod collection;
mod events;
mod streaming;
mod tracer;

pub use collection::{emit_global, global_collector, init_collector, Collector};
pub use events::{Category, Event, EventFilter, Payload, Severity};
pub use streaming::{EventStream, StreamStats, Subscriber};
pub use tracer::{generate_trace_id, init_tracing, span_operation, OperationSpan};
