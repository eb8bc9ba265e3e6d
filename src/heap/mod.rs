/*!
 * Heap Module
 * Private, dynamically managed memory region addressed by integer references
 */

pub mod block;
pub mod config;
pub mod engine;
pub mod factory;
pub mod guard;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use block::HeapBlock;
pub use config::HeapConfig;
pub use engine::ByteArrayHeap;
pub use factory::{erase, instance, HeapFactory};
pub use guard::{take_block_data, take_block_data_global, BlockGuard};
pub use traits::Heap;
pub use types::*;
