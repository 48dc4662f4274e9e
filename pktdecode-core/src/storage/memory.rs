//! In-memory sinks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::PacketSink;
use crate::error::StorageError;
use crate::pipeline::BatchRecord;

/// Collects records in a shared vector.
///
/// Clones share storage, so a caller can keep one handle and hand another
/// to the pipeline, then inspect what was written.
#[derive(Debug, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<BatchRecord>>>,
    batches: Arc<AtomicU64>,
    bulk: bool,
}

impl MemorySink {
    /// Sink that accepts bulk writes.
    pub fn new() -> Self {
        Self {
            records: Arc::default(),
            batches: Arc::default(),
            bulk: true,
        }
    }

    /// Sink that receives records one at a time.
    pub fn per_record() -> Self {
        Self {
            bulk: false,
            ..Self::new()
        }
    }

    /// Copy of everything written so far.
    pub fn records(&self) -> Vec<BatchRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `save_batch` calls received.
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn save_packet(&mut self, record: &BatchRecord) -> Result<(), StorageError> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn supports_batch(&self) -> bool {
        self.bulk
    }

    fn save_batch(&mut self, records: &[BatchRecord]) -> Result<(), StorageError> {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.records.lock().extend_from_slice(records);
        Ok(())
    }
}

/// Accepts and discards every record, counting them.
#[derive(Debug, Clone, Default)]
pub struct NullSink {
    accepted: Arc<AtomicU64>,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }
}

impl PacketSink for NullSink {
    fn name(&self) -> &'static str {
        "null"
    }

    fn save_packet(&mut self, _record: &BatchRecord) -> Result<(), StorageError> {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn supports_batch(&self) -> bool {
        true
    }

    fn save_batch(&mut self, records: &[BatchRecord]) -> Result<(), StorageError> {
        self.accepted.fetch_add(records.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}
