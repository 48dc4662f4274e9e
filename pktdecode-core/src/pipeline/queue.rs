//! Bounded drop-oldest record queue.
//!
//! Producers never block. When the queue is full the single oldest record
//! is discarded to make room, so under sustained overload storage falls
//! behind by dropping history rather than stalling capture.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use tracing::warn;

use super::BatchRecord;

/// Message carried from producers to the consumer thread.
#[derive(Debug)]
pub(crate) enum QueueItem {
    Record(BatchRecord),
    /// Sentinel: drain what is queued, flush, exit.
    Shutdown,
}

/// Result of [`BatchQueue::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The record was queued.
    Accepted,
    /// The record was queued after discarding the oldest queued record.
    DisplacedOldest,
    /// The pipeline is shut down; the record was discarded.
    Closed,
}

#[derive(Debug, Default)]
struct QueueCounters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
}

/// Cloneable producer handle onto the persistence queue.
///
/// Holds a receiver clone alongside the sender so a producer can evict
/// the head of a full queue itself. Every clone shares the writer's
/// `running` flag and refuses records once it is cleared.
#[derive(Debug, Clone)]
pub struct BatchQueue {
    tx: Sender<QueueItem>,
    rx: Receiver<QueueItem>,
    capacity: usize,
    counters: Arc<QueueCounters>,
    running: Arc<AtomicBool>,
}

impl BatchQueue {
    /// Create a queue and the receiver the consumer drains.
    pub(crate) fn bounded(
        capacity: usize,
        running: Arc<AtomicBool>,
    ) -> (Self, Receiver<QueueItem>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        let queue = Self {
            tx,
            rx: rx.clone(),
            capacity,
            counters: Arc::default(),
            running,
        };
        (queue, rx)
    }

    /// Queue a record without blocking.
    ///
    /// Returns [`PushOutcome::Closed`] once shutdown has begun, so a full
    /// queue never evicts records that were queued before it.
    pub fn push(&self, record: BatchRecord) -> PushOutcome {
        if self.is_closed() {
            return PushOutcome::Closed;
        }

        let mut item = QueueItem::Record(record);
        let mut displaced = false;

        loop {
            match self.tx.try_send(item) {
                Ok(()) => {
                    self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                    return if displaced {
                        PushOutcome::DisplacedOldest
                    } else {
                        PushOutcome::Accepted
                    };
                }
                Err(TrySendError::Full(back)) => {
                    item = back;
                    match self.rx.try_recv() {
                        Ok(QueueItem::Record(_)) => {
                            displaced = true;
                            let dropped = self.counters.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                            warn!(
                                capacity = self.capacity,
                                dropped, "persistence queue full, dropped oldest record"
                            );
                        }
                        Ok(QueueItem::Shutdown) => {
                            // Lost a race with shutdown. If the sentinel cannot go
                            // back, the consumer still stops on the cleared flag.
                            let _ = self.tx.try_send(QueueItem::Shutdown);
                            return PushOutcome::Closed;
                        }
                        // Consumer emptied the queue in between; retry the send
                        Err(TryRecvError::Empty) => {}
                        Err(TryRecvError::Disconnected) => return PushOutcome::Closed,
                    }
                }
                Err(TrySendError::Disconnected(_)) => return PushOutcome::Closed,
            }
        }
    }

    /// Refuse further records on every handle.
    pub(crate) fn close(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Whether shutdown has begun.
    pub fn is_closed(&self) -> bool {
        !self.running.load(Ordering::Acquire)
    }

    /// Enqueue the shutdown sentinel, waiting at most `timeout` for room.
    pub(crate) fn push_shutdown(&self, timeout: Duration) -> bool {
        self.tx.send_timeout(QueueItem::Shutdown, timeout).is_ok()
    }

    /// Records currently queued.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records accepted since creation.
    pub fn enqueued(&self) -> u64 {
        self.counters.enqueued.load(Ordering::Relaxed)
    }

    /// Records discarded to make room.
    pub fn dropped(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }
}
