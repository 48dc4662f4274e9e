//! Storage backends for persisted packet records.
//!
//! The batch pipeline's consumer thread owns its sink exclusively, so
//! sinks take `&mut self` and only need to be [`Send`].

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::{MemorySink, NullSink};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSink;

use crate::error::StorageError;
use crate::pipeline::BatchRecord;

/// Destination for persisted records.
pub trait PacketSink: Send {
    /// Backend name, used in log messages.
    fn name(&self) -> &'static str;

    /// Persist a single record.
    fn save_packet(&mut self, record: &BatchRecord) -> Result<(), StorageError>;

    /// Whether [`save_batch`](Self::save_batch) is cheaper than per-record saves.
    fn supports_batch(&self) -> bool {
        false
    }

    /// Persist a batch of records.
    ///
    /// The default saves them one at a time and stops at the first failure.
    fn save_batch(&mut self, records: &[BatchRecord]) -> Result<(), StorageError> {
        for record in records {
            self.save_packet(record)?;
        }
        Ok(())
    }
}

impl<S: PacketSink + ?Sized> PacketSink for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn save_packet(&mut self, record: &BatchRecord) -> Result<(), StorageError> {
        (**self).save_packet(record)
    }

    fn supports_batch(&self) -> bool {
        (**self).supports_batch()
    }

    fn save_batch(&mut self, records: &[BatchRecord]) -> Result<(), StorageError> {
        (**self).save_batch(records)
    }
}
