//! Public façade of the write-behind indexer

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::JoinHandle;

use super::queue::WriteBehindQueue;
use super::service::{Flusher, panic_message};
use super::signal::FlushSignal;
use super::stats::{FailureLog, FlushFailure, FlushStats, FlushStatsSnapshot};
use super::types::IndexerState;
use crate::config::{IndexerConfig, ShutdownMode};
use crate::errors::{IndexerError, IndexerResult};
use crate::indexer::{EncodedBatch, KvIndexer};
use crate::storage::{RedbEngine, StorageEngine};

/// Key/document index whose writes are applied by a background thread
///
/// `add` returns as soon as the batch is queued. `query` reads the store once
/// no write is in flight; batches still in the queue are not visible to it.
/// Use [`AsyncIndexer::flush`] when a read must observe everything added so
/// far.
pub struct AsyncIndexer<K, D, E: StorageEngine = RedbEngine> {
    indexer: Arc<KvIndexer<K, D, E>>,
    queue: Arc<WriteBehindQueue>,
    signal: Arc<FlushSignal>,
    stats: Arc<FlushStats>,
    failures: Arc<FailureLog>,
    running: Arc<AtomicBool>,
    state: AtomicU8,
    /// Held shared by `add` across its state check and enqueue, exclusively
    /// by `close` across the state transition
    lifecycle: RwLock<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shutdown_mode: ShutdownMode,
}

impl<K, D, E: StorageEngine> std::fmt::Debug for AsyncIndexer<K, D, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncIndexer")
            .field("state", &IndexerState::from_u8(self.state.load(Ordering::Acquire)))
            .field("queued", &self.queue.len())
            .field("busy", &self.signal.is_busy())
            .finish()
    }
}

impl<K, D> AsyncIndexer<K, D, RedbEngine>
where
    K: 'static,
    D: 'static,
{
    /// Open the persistent store described by `config` and start the flusher
    pub fn open(config: &IndexerConfig) -> IndexerResult<Self> {
        let indexer = KvIndexer::open(config)?;
        Self::start(indexer, config)
    }
}

impl<K, D, E> AsyncIndexer<K, D, E>
where
    K: 'static,
    D: 'static,
    E: StorageEngine,
{
    /// Start a flusher over an already opened engine
    pub fn with_engine(engine: E, config: &IndexerConfig) -> IndexerResult<Self> {
        Self::start(KvIndexer::with_engine(engine, config.data_path()), config)
    }

    fn start(indexer: KvIndexer<K, D, E>, config: &IndexerConfig) -> IndexerResult<Self> {
        let indexer = Arc::new(indexer);
        let queue = Arc::new(WriteBehindQueue::new());
        let signal = Arc::new(FlushSignal::new());
        let stats = Arc::new(FlushStats::new());
        let failures = Arc::new(FailureLog::new(config.max_recorded_failures()));
        let running = Arc::new(AtomicBool::new(true));

        let flusher = Flusher {
            indexer: indexer.clone(),
            queue: queue.clone(),
            signal: signal.clone(),
            stats: stats.clone(),
            failures: failures.clone(),
            running: running.clone(),
            retry: config.retry().clone(),
        };

        let worker = match flusher.spawn(config.worker_thread_name()) {
            Ok(handle) => handle,
            Err(e) => {
                // Nothing else holds the store yet; release it before reporting
                if let Err(close_err) = indexer.close() {
                    tracing::warn!(error = %close_err, "Failed to close store after spawn failure");
                }
                return Err(e);
            }
        };

        tracing::info!(
            path = %config.data_path().display(),
            shutdown_mode = ?config.shutdown_mode(),
            "Started write-behind indexer"
        );

        Ok(Self {
            indexer,
            queue,
            signal,
            stats,
            failures,
            running,
            state: AtomicU8::new(IndexerState::Running as u8),
            lifecycle: RwLock::new(()),
            worker: Mutex::new(Some(worker)),
            shutdown_mode: config.shutdown_mode(),
        })
    }
}

impl<K, D, E: StorageEngine> AsyncIndexer<K, D, E> {
    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> IndexerState {
        IndexerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn ensure_running(&self) -> IndexerResult<()> {
        match self.state() {
            IndexerState::Running => Ok(()),
            IndexerState::Closing | IndexerState::Closed => Err(IndexerError::Closed),
        }
    }

    /// Batches added but not yet written or discarded
    #[must_use]
    pub fn pending(&self) -> usize {
        self.signal.pending()
    }

    /// True while the flusher is inside a batch write
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.signal.is_busy()
    }

    /// Snapshot of the flush counters
    #[must_use]
    pub fn stats(&self) -> FlushStatsSnapshot {
        self.stats.snapshot(self.failures.overflow())
    }

    /// Remove and return batches the flusher failed to write
    pub fn take_flush_failures(&self) -> Vec<FlushFailure> {
        self.failures.drain()
    }

    /// Block until no write is in flight
    pub fn wait_until_idle(&self) -> IndexerResult<()> {
        self.ensure_running()?;
        self.signal.wait_until_idle();
        Ok(())
    }

    /// Block until every batch added so far has been written (or failed)
    pub fn flush(&self) -> IndexerResult<()> {
        self.ensure_running()?;
        self.signal.wait_until_drained();
        Ok(())
    }

    /// Stop the flusher and close the store
    ///
    /// With `ShutdownMode::Discard` queued batches are dropped first; with
    /// `ShutdownMode::Drain` they are written before the flusher exits. A
    /// write already in progress always completes.
    pub fn close(&self) -> IndexerResult<()> {
        {
            // Waits out any `add` between its state check and its enqueue
            let _exclusive = self.lifecycle.write();
            self.state
                .compare_exchange(
                    IndexerState::Running as u8,
                    IndexerState::Closing as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .map_err(|_| IndexerError::Closed)?;
        }

        match self.shutdown_mode {
            ShutdownMode::Discard => {
                self.discard_queued();
                self.running.store(false, Ordering::Release);
            }
            ShutdownMode::Drain => {
                tracing::debug!(queued = self.queue.len(), "Draining queue before shutdown");
            }
        }
        self.queue.signal_shutdown();

        let worker = self.worker.lock().take();
        let join_result = match worker {
            Some(handle) => handle.join().map_err(|payload| {
                let message = panic_message(payload.as_ref());
                tracing::error!(error = %message, "Flusher thread panicked");
                IndexerError::WorkerPanicked(message)
            }),
            None => Ok(()),
        };

        // Discard mode leaves the queue behind when the flusher stops early
        self.discard_queued();

        let close_result = self.indexer.close();
        self.state
            .store(IndexerState::Closed as u8, Ordering::Release);

        let stats = self.stats();
        tracing::info!(
            flushed = stats.batches_flushed,
            failed = stats.batches_failed,
            discarded = stats.batches_discarded,
            "Closed write-behind indexer"
        );

        join_result?;
        close_result
    }

    fn discard_queued(&self) {
        let discarded = self.queue.clear();
        if discarded > 0 {
            self.stats
                .batches_discarded
                .fetch_add(discarded, Ordering::Relaxed);
            self.signal.batches_discarded(discarded);
            tracing::warn!(batches = discarded, "Discarded unflushed batches");
        }
    }
}

impl<K, D, E> AsyncIndexer<K, D, E>
where
    K: Serialize + 'static,
    D: Serialize + DeserializeOwned + 'static,
    E: StorageEngine,
{
    /// Queue `keys[i] -> documents[i]` as one batch and return immediately
    ///
    /// Length and encoding errors are reported here; storage errors happen
    /// later on the flusher and are surfaced through
    /// [`AsyncIndexer::take_flush_failures`] and [`AsyncIndexer::stats`].
    pub fn add(&self, keys: &[K], documents: &[D]) -> IndexerResult<()> {
        self.ensure_running()?;

        let batch = EncodedBatch::encode(keys, documents)?;
        if batch.is_empty() {
            return Ok(());
        }

        // Once `close` has moved past Running nothing more reaches the queue
        let _shared = self.lifecycle.read();
        self.ensure_running()?;
        self.signal.batch_enqueued();
        self.stats.batches_enqueued.fetch_add(1, Ordering::Relaxed);
        self.queue.enqueue(batch);
        Ok(())
    }

    /// Look up every key once no write is in flight
    ///
    /// Each result is the stored document or `None`. Batches still waiting in
    /// the queue are not reflected.
    pub fn query(&self, keys: &[K], top_k: usize) -> IndexerResult<Vec<Option<D>>> {
        self.ensure_running()?;
        self.signal.wait_until_idle();
        self.indexer.query(keys, top_k)
    }
}

impl<K, D, E: StorageEngine> Drop for AsyncIndexer<K, D, E> {
    fn drop(&mut self) {
        if self.state() != IndexerState::Running {
            return;
        }
        if let Err(e) = self.close() {
            tracing::error!(error = %e, "Failed to close write-behind indexer on drop");
        }
    }
}
