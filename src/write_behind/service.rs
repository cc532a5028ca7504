//! Background flusher thread
//!
//! Exactly one flusher exists per `AsyncIndexer`. It blocks on the queue,
//! writes each batch through the synchronous indexer with the busy flag
//! raised, and exits on a shutdown marker or once `running` is cleared.
//! A panic inside a write is caught and reported like any other failed
//! batch, so the worker keeps draining the queue.

use chrono::Utc;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Instant;

use super::queue::WriteBehindQueue;
use super::signal::FlushSignal;
use super::stats::{FailureLog, FlushFailure, FlushStats};
use super::types::FlushMessage;
use crate::errors::{IndexerError, IndexerResult, RetryPolicy};
use crate::indexer::{EncodedBatch, KvIndexer};
use crate::storage::StorageEngine;

/// Everything the flusher thread shares with its `AsyncIndexer`
pub(crate) struct Flusher<K, D, E> {
    pub indexer: Arc<KvIndexer<K, D, E>>,
    pub queue: Arc<WriteBehindQueue>,
    pub signal: Arc<FlushSignal>,
    pub stats: Arc<FlushStats>,
    pub failures: Arc<FailureLog>,
    pub running: Arc<AtomicBool>,
    pub retry: RetryPolicy,
}

impl<K, D, E> Flusher<K, D, E>
where
    K: 'static,
    D: 'static,
    E: StorageEngine,
{
    /// Start the worker on a named OS thread
    pub fn spawn(self, thread_name: &str) -> IndexerResult<JoinHandle<()>> {
        std::thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || self.run())
            .map_err(IndexerError::WorkerSpawn)
    }

    fn run(self) {
        tracing::debug!("Flusher started");

        while self.running.load(Ordering::Acquire) {
            match self.queue.dequeue() {
                Some(FlushMessage::Write(batch)) => self.flush_batch(&batch),
                Some(FlushMessage::Shutdown) | None => break,
            }
        }

        self.running.store(false, Ordering::Release);
        tracing::debug!("Flusher stopped");
    }

    /// Write one batch, retrying transient failures; never propagates errors
    fn flush_batch(&self, batch: &EncodedBatch) {
        let _busy = self.signal.begin_write();
        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.indexer.write_encoded(batch)));
            let result = match outcome {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    self.report_failure(batch, attempt + 1, format!("write panicked: {message}"));
                    return;
                }
            };

            match result {
                Ok(()) => {
                    self.stats.record_flush(batch.len());
                    tracing::debug!(
                        documents = batch.len(),
                        attempts = attempt + 1,
                        duration_ms = started.elapsed().as_millis(),
                        "Flushed batch"
                    );
                    return;
                }
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    attempt += 1;
                    self.stats.retries.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        attempt = attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Transient flush failure, retrying"
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => {
                    self.report_failure(batch, attempt + 1, e.to_string());
                    return;
                }
            }
        }
    }

    fn report_failure(&self, batch: &EncodedBatch, attempts: u32, error: String) {
        self.stats.batches_failed.fetch_add(1, Ordering::Relaxed);
        tracing::error!(
            documents = batch.len(),
            attempts,
            error = %error,
            "Failed to flush batch, dropping it"
        );
        self.failures.record(FlushFailure {
            documents: batch.len(),
            attempts,
            error,
            failed_at: Utc::now(),
        });
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
