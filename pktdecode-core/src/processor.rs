//! End-to-end packet processing.
//!
//! One call to [`PacketProcessor::process`] runs the whole data flow for a
//! frame: cache-checked decode, synchronous statistics update, derivation
//! of a [`BatchRecord`] and a non-blocking enqueue for persistence.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::CacheStats;
use crate::config::ProcessorConfig;
use crate::decoder::Decoder;
use crate::error::Result;
use crate::packet::DecodedPacket;
use crate::pipeline::{BatchQueue, BatchRecord, BatchWriter, PipelineStatus};
use crate::stats::TrafficStats;
use crate::storage::PacketSink;

/// Decoder, statistics and persistence pipeline behind one handle.
///
/// `process` takes `&self`, so a processor can be shared across capture
/// threads behind an `Arc`.
#[derive(Debug)]
pub struct PacketProcessor {
    decoder: Decoder,
    stats: Mutex<TrafficStats>,
    producer: BatchQueue,
    /// Only locked for status and shutdown, never on the hot path.
    writer: Mutex<BatchWriter>,
    session_id: Option<i64>,
    store_raw: bool,
}

impl PacketProcessor {
    /// Validate the config, build the decoder and start the writer thread.
    pub fn new<S>(config: ProcessorConfig, sink: S) -> Result<Self>
    where
        S: PacketSink + 'static,
    {
        config.validate()?;
        let decoder = Decoder::new(config.decoder)?;
        let writer = BatchWriter::start(sink, config.pipeline)?;

        Ok(Self {
            decoder,
            stats: Mutex::new(TrafficStats::new()),
            producer: writer.producer(),
            writer: Mutex::new(writer),
            session_id: config.session_id,
            store_raw: config.store_raw,
        })
    }

    /// Decode one frame, account for it, and queue it for storage.
    ///
    /// `timestamp` is the capture time in seconds since the Unix epoch.
    pub fn process(&self, raw: &[u8], timestamp: f64) -> Result<Arc<DecodedPacket>> {
        let packet = self.decoder.decode(raw)?;

        self.stats.lock().record(&packet, timestamp);

        if self.producer.is_closed() {
            debug!("pipeline closed, record not persisted");
        } else {
            let record =
                BatchRecord::from_packet(&packet, timestamp, self.store_raw, self.session_id);
            self.producer.push(record);
        }

        Ok(packet)
    }

    /// Snapshot of the running statistics.
    pub fn stats(&self) -> TrafficStats {
        self.stats.lock().clone()
    }

    pub fn reset_stats(&self) {
        self.stats.lock().reset();
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.decoder.cache_stats()
    }

    pub fn pipeline_status(&self) -> PipelineStatus {
        self.writer.lock().status()
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Flush pending records and stop the writer thread.
    ///
    /// Returns false if the writer did not stop within its shutdown timeout.
    pub fn shutdown(&self) -> bool {
        self.writer.lock().shutdown()
    }
}
