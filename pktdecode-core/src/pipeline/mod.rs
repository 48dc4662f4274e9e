//! Batch persistence pipeline.
//!
//! The hot path derives a [`BatchRecord`] from each decoded packet and
//! pushes it onto a bounded [`BatchQueue`]. A single consumer thread owned
//! by [`BatchWriter`] drains the queue and hands batches to a
//! [`PacketSink`](crate::storage::PacketSink).
//!
//! ```text
//! producers ──push──▶ [ bounded queue, drop-oldest ] ──recv_timeout──▶ consumer ──batch──▶ sink
//! ```
//!
//! Enqueue never blocks. The consumer flushes when `batch_size` records
//! have accumulated or `batch_timeout` has elapsed since the last flush.
//! Shutdown enqueues a sentinel; the consumer drains what remains, flushes
//! and exits.

mod queue;
mod record;
mod writer;

pub use queue::{BatchQueue, PushOutcome};
pub use record::{BatchRecord, UNKNOWN_PROTOCOL};
pub use writer::{BatchWriter, PipelineStatus};
