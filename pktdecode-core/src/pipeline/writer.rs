//! Background batch writer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, error, info, warn};

use super::queue::{BatchQueue, PushOutcome, QueueItem};
use super::BatchRecord;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::storage::PacketSink;

/// How long `shutdown` waits for room to enqueue the sentinel.
const SENTINEL_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct WriterShared {
    consumer_alive: AtomicBool,
    flushes: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time view of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStatus {
    pub queue_len: usize,
    pub queue_capacity: usize,
    /// False once shutdown has begun.
    pub running: bool,
    pub consumer_alive: bool,
    pub enqueued: u64,
    pub dropped: u64,
    pub flushes: u64,
    /// Records the sink accepted.
    pub written: u64,
    /// Records lost to sink errors.
    pub failed: u64,
}

/// Owner of the persistence queue and its single consumer thread.
///
/// Records are batched and handed to the sink when `batch_size` of them
/// have accumulated or `batch_timeout` has passed since the last flush,
/// whichever comes first. Dropping the writer shuts it down.
#[derive(Debug)]
pub struct BatchWriter {
    queue: BatchQueue,
    shared: Arc<WriterShared>,
    config: PipelineConfig,
    handle: Option<JoinHandle<()>>,
    done: Receiver<()>,
}

impl BatchWriter {
    /// Validate the config and spawn the consumer thread.
    pub fn start<S>(sink: S, config: PipelineConfig) -> Result<Self>
    where
        S: PacketSink + 'static,
    {
        config.validate()?;

        let running = Arc::new(AtomicBool::new(true));
        let (queue, rx) = BatchQueue::bounded(config.queue_capacity, Arc::clone(&running));
        let shared = Arc::new(WriterShared {
            consumer_alive: AtomicBool::new(true),
            flushes: AtomicU64::new(0),
            written: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        });
        let (done_tx, done) = crossbeam_channel::bounded(1);

        let sink_name = sink.name();
        let consumer = Consumer {
            rx,
            sink,
            batch_size: config.batch_size,
            batch_timeout: config.batch_timeout,
            running,
            shared: Arc::clone(&shared),
        };

        let handle = thread::Builder::new()
            .name("pktdecode-writer".to_string())
            .spawn(move || {
                consumer.run();
                let _ = done_tx.send(());
            })?;

        info!(
            sink = sink_name,
            queue_capacity = config.queue_capacity,
            batch_size = config.batch_size,
            batch_timeout_ms = config.batch_timeout.as_millis() as u64,
            "batch writer started"
        );

        Ok(Self {
            queue,
            shared,
            config,
            handle: Some(handle),
            done,
        })
    }

    /// Queue a record for persistence. Never blocks.
    pub fn enqueue(&self, record: BatchRecord) -> PushOutcome {
        self.queue.push(record)
    }

    /// Cloneable handle for producers on other threads. Pushes through it
    /// return [`PushOutcome::Closed`] once [`shutdown`](Self::shutdown) starts.
    pub fn producer(&self) -> BatchQueue {
        self.queue.clone()
    }

    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            queue_len: self.queue.len(),
            queue_capacity: self.queue.capacity(),
            running: !self.queue.is_closed(),
            consumer_alive: self.shared.consumer_alive.load(Ordering::Acquire),
            enqueued: self.queue.enqueued(),
            dropped: self.queue.dropped(),
            flushes: self.shared.flushes.load(Ordering::Relaxed),
            written: self.shared.written.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting records, let the consumer drain and flush, and wait
    /// for it to exit.
    ///
    /// Returns false if the consumer did not finish within
    /// `shutdown_timeout`; it is then left to finish detached.
    pub fn shutdown(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return true;
        };

        self.queue.close();
        if !self.queue.push_shutdown(SENTINEL_TIMEOUT) {
            warn!("could not enqueue shutdown sentinel, consumer will stop on its next timeout");
        }

        match self.done.recv_timeout(self.config.shutdown_timeout) {
            // Disconnected: the thread ended without signalling (it panicked)
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    error!("batch writer thread panicked");
                }
                info!(
                    written = self.shared.written.load(Ordering::Relaxed),
                    dropped = self.queue.dropped(),
                    "batch writer stopped"
                );
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                    "batch writer did not stop in time"
                );
                false
            }
        }
    }
}

impl Drop for BatchWriter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Consumer<S> {
    rx: Receiver<QueueItem>,
    sink: S,
    batch_size: usize,
    batch_timeout: Duration,
    running: Arc<AtomicBool>,
    shared: Arc<WriterShared>,
}

impl<S: PacketSink> Consumer<S> {
    fn run(mut self) {
        let mut batch = Vec::with_capacity(self.batch_size);
        let mut last_flush = Instant::now();

        loop {
            let wait = (last_flush + self.batch_timeout).saturating_duration_since(Instant::now());

            match self.rx.recv_timeout(wait) {
                Ok(QueueItem::Record(record)) => {
                    batch.push(record);
                    if !self.running.load(Ordering::Acquire) {
                        // Shutdown began; the drain below picks up the rest
                        break;
                    }
                    if batch.len() >= self.batch_size || last_flush.elapsed() >= self.batch_timeout {
                        self.flush(&mut batch);
                        last_flush = Instant::now();
                    }
                }
                Ok(QueueItem::Shutdown) => break,
                Err(RecvTimeoutError::Timeout) => {
                    // Idle for a full interval: write out the partial batch
                    self.flush(&mut batch);
                    last_flush = Instant::now();
                    if !self.running.load(Ordering::Acquire) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("record queue disconnected");
                    break;
                }
            }
        }

        // Drain whatever is still queued
        while let Ok(item) = self.rx.try_recv() {
            if let QueueItem::Record(record) = item {
                batch.push(record);
                if batch.len() >= self.batch_size {
                    self.flush(&mut batch);
                }
            }
        }
        self.flush(&mut batch);

        self.shared.consumer_alive.store(false, Ordering::Release);
        debug!("batch writer consumer exiting");
    }

    fn flush(&mut self, batch: &mut Vec<BatchRecord>) {
        if batch.is_empty() {
            return;
        }

        let start = Instant::now();
        let count = batch.len() as u64;

        let written = if self.sink.supports_batch() {
            match self.sink.save_batch(batch) {
                Ok(()) => count,
                Err(e) => {
                    error!(sink = self.sink.name(), records = count, "failed to save batch: {}", e);
                    0
                }
            }
        } else {
            let mut ok = 0;
            for record in batch.iter() {
                match self.sink.save_packet(record) {
                    Ok(()) => ok += 1,
                    Err(e) => error!(sink = self.sink.name(), "failed to save record: {}", e),
                }
            }
            ok
        };

        batch.clear();
        self.shared.flushes.fetch_add(1, Ordering::Relaxed);
        self.shared.written.fetch_add(written, Ordering::Relaxed);
        self.shared.failed.fetch_add(count - written, Ordering::Relaxed);

        debug!(
            "Flushed {} records ({} failed) to {} in {:?}",
            count,
            count - written,
            self.sink.name(),
            start.elapsed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemorySink;

    fn record(n: usize) -> BatchRecord {
        BatchRecord {
            timestamp: n as f64,
            src_ip: None,
            dst_ip: None,
            src_port: None,
            dst_port: None,
            protocol: "TCP",
            length: n,
            raw_data: None,
            session_id: None,
        }
    }

    fn config(batch_size: usize, batch_timeout: Duration) -> PipelineConfig {
        PipelineConfig {
            queue_capacity: 100,
            batch_size,
            batch_timeout,
            shutdown_timeout: Duration::from_secs(5),
        }
    }

    /// Sink that rejects every write.
    struct BrokenSink;

    impl PacketSink for BrokenSink {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn save_packet(&mut self, _record: &BatchRecord) -> std::result::Result<(), StorageError> {
            Err(StorageError::Backend {
                backend: "broken",
                reason: "disk on fire".to_string(),
            })
        }
    }

    #[test]
    fn test_flush_on_batch_size() {
        let sink = MemorySink::new();
        let mut writer = BatchWriter::start(sink.clone(), config(5, Duration::from_secs(60))).unwrap();

        for n in 0..5 {
            assert_eq!(writer.enqueue(record(n)), PushOutcome::Accepted);
        }

        // Wait for the consumer without relying on the timeout path
        let deadline = Instant::now() + Duration::from_secs(5);
        while sink.len() < 5 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(sink.batches(), 1);
        assert_eq!(sink.len(), 5);
        assert!(writer.shutdown());
        assert_eq!(writer.status().flushes, 1);
    }

    #[test]
    fn test_flush_on_timeout() {
        let sink = MemorySink::new();
        let writer = BatchWriter::start(sink.clone(), config(50, Duration::from_millis(100))).unwrap();

        writer.enqueue(record(1));
        thread::sleep(Duration::from_millis(400));

        assert_eq!(sink.batches(), 1);
        assert_eq!(sink.records()[0].length, 1);
        assert_eq!(writer.status().written, 1);
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let sink = MemorySink::new();
        let mut writer = BatchWriter::start(sink.clone(), config(1000, Duration::from_secs(60))).unwrap();

        for n in 0..20 {
            writer.enqueue(record(n));
        }
        assert!(writer.shutdown());

        assert_eq!(sink.len(), 20);
        let status = writer.status();
        assert!(!status.running);
        assert!(!status.consumer_alive);
        assert_eq!(writer.enqueue(record(99)), PushOutcome::Closed);
    }

    #[test]
    fn test_producer_handles_see_shutdown() {
        let sink = MemorySink::new();
        let mut writer = BatchWriter::start(sink.clone(), config(1000, Duration::from_secs(60))).unwrap();
        let producer = writer.producer();

        let worker = thread::spawn(move || {
            for n in 0..10 {
                assert_eq!(producer.push(record(n)), PushOutcome::Accepted);
            }
            producer
        });
        let producer = worker.join().unwrap();

        assert!(writer.shutdown());
        assert_eq!(producer.push(record(10)), PushOutcome::Closed);
        assert_eq!(sink.len(), 10);
        assert_eq!(writer.status().enqueued, 10);
    }

    #[test]
    fn test_per_record_sink() {
        let sink = MemorySink::per_record();
        let mut writer = BatchWriter::start(sink.clone(), config(3, Duration::from_secs(60))).unwrap();

        for n in 0..3 {
            writer.enqueue(record(n));
        }
        writer.shutdown();

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.batches(), 0);
    }

    #[test]
    fn test_sink_failures_do_not_stop_consumer() {
        let mut writer = BatchWriter::start(BrokenSink, config(2, Duration::from_secs(60))).unwrap();

        for n in 0..4 {
            writer.enqueue(record(n));
        }
        assert!(writer.shutdown());

        let status = writer.status();
        assert_eq!(status.written, 0);
        assert_eq!(status.failed, 4);
        assert_eq!(status.flushes, 2);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = BatchWriter::start(MemorySink::new(), config(0, Duration::from_secs(1)));
        assert!(result.is_err());
    }
}
