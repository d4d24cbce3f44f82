//! Background record writer.
//!
//! Request handlers submit finished records through an unbounded channel
//! and never wait on disk I/O. The recorder task drains the channel and
//! writes up to `MAX_CONCURRENT_WRITES` records at once; failures are
//! reported and dropped, never retried.
//!
//! The queue itself is unbounded: if the disk stays slower than the request
//! rate, queued records (with their captured bodies) accumulate in memory
//! until it catches up.

use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;

use crate::observability::metrics;
use crate::recorder::record::TransactionRecord;
use crate::recorder::store::RecordStore;

/// Record writes in flight at once.
pub const MAX_CONCURRENT_WRITES: usize = 16;

/// Cheap, cloneable submission side of the recorder.
#[derive(Debug, Clone)]
pub struct RecorderHandle {
    tx: mpsc::UnboundedSender<TransactionRecord>,
}

impl RecorderHandle {
    /// Queue a record for persistence. Never blocks and never fails the caller.
    pub fn submit(&self, record: TransactionRecord) {
        if self.tx.send(record).is_err() {
            tracing::error!("Recorder stopped, transaction record dropped");
            metrics::record_persistence_failure();
        }
    }
}

/// Owns the receiving side; run it on the runtime to persist records.
#[derive(Debug)]
pub struct Recorder {
    store: RecordStore,
    rx: mpsc::UnboundedReceiver<TransactionRecord>,
}

impl Recorder {
    pub fn new(store: RecordStore) -> (RecorderHandle, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (RecorderHandle { tx }, Self { store, rx })
    }

    /// Write records until every handle is dropped and the queue is drained.
    pub async fn run(self) {
        let Self { store, rx } = self;
        tracing::info!(log_dir = %store.root().display(), "Recorder started");

        let store = &store;
        stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|record| (record, rx))
        })
        .for_each_concurrent(MAX_CONCURRENT_WRITES, move |record| persist(store, record))
        .await;

        tracing::info!("Recorder drained");
    }
}

async fn persist(store: &RecordStore, record: TransactionRecord) {
    match store.write(&record).await {
        Ok(path) => {
            tracing::debug!(
                path = %path.display(),
                status = record.response.status_code,
                "Transaction recorded"
            );
            metrics::record_persisted();
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                url = %record.request.url,
                "Failed to record transaction"
            );
            metrics::record_persistence_failure();
        }
    }
}
