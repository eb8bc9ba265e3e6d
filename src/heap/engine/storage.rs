/*!
 * Heap Storage Operations
 * Byte-level read/write access to allocated blocks
 */

use super::super::types::HeapResult;
use super::ByteArrayHeap;
use crate::core::types::{Reference, Size};
use log::{debug, warn};

impl ByteArrayHeap {
    /// Write `data` at the start of the block at `reference`
    ///
    /// Returns the number of bytes written. Data longer than the block is
    /// rejected without touching the buffer.
    pub fn write(&self, reference: Reference, data: &[u8]) -> HeapResult<Size> {
        let mut state = self.state.lock();
        match state.write(reference, data) {
            Ok(written) => {
                debug!("Wrote {} bytes to block {}", written, reference);
                Ok(written)
            }
            Err(e) => {
                warn!("Heap write({}, {} bytes) rejected: {}", reference, data.len(), e);
                Err(e)
            }
        }
    }

    /// Copy out the whole block at `reference`
    ///
    /// Returns `None` for negative, unknown or free references. The copy has no
    /// link back to the heap.
    pub fn read(&self, reference: Reference) -> Option<Vec<u8>> {
        let state = self.state.lock();
        let data = state.read(reference);
        match data {
            Some(ref bytes) => debug!("Read {} bytes from block {}", bytes.len(), reference),
            None => debug!("Read of block {} found no live block", reference),
        }
        data
    }

    /// Append the name of an accessing entity to a live block's access log
    pub fn record_access(&self, reference: Reference, accessor: &str) -> HeapResult<()> {
        self.state.lock().record_access(reference, accessor)?;
        if let Some(ref collector) = self.collector() {
            collector.block_accessed(reference, accessor);
        }
        Ok(())
    }
}
