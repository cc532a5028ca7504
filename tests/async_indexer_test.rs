//! Integration tests for the write-behind indexer
//!
//! These cover visibility after flush, the window where a queued batch is not
//! yet readable, concurrent producers, and both shutdown modes.

use kodegen_tools_kvindex::storage::{KvPair, StorageResult};
use kodegen_tools_kvindex::{
    AsyncIndexer, IndexerConfig, IndexerError, IndexerState, KvIndexer, MemoryEngine,
    ShutdownMode, StorageEngine,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

mod common;

#[test]
fn test_add_then_query_after_flush() {
    let (_dir, config) = common::temp_config(ShutdownMode::Discard);
    let indexer: AsyncIndexer<u32, String> = AsyncIndexer::open(&config).unwrap();

    indexer
        .add(&[1, 2], &["a".to_string(), "b".to_string()])
        .unwrap();

    // Before the flush the batch may or may not have been written yet
    let early = indexer.query(&[1], 1).unwrap();
    assert!(early == vec![Some("a".to_string())] || early == vec![None]);

    indexer.flush().unwrap();
    assert_eq!(
        indexer.query(&[1, 2], 1).unwrap(),
        vec![Some("a".to_string()), Some("b".to_string())]
    );
    indexer.close().unwrap();
}

#[test]
fn test_disjoint_batches_and_missing_keys() {
    let (_dir, config) = common::temp_config(ShutdownMode::Discard);
    let indexer: AsyncIndexer<u32, String> = AsyncIndexer::open(&config).unwrap();

    indexer.add(&[1, 2], &["a".to_string(), "b".to_string()]).unwrap();
    indexer.add(&[10, 20], &["x".to_string(), "y".to_string()]).unwrap();
    indexer.flush().unwrap();

    assert_eq!(
        indexer.query(&[20, 1, 99, 10, 2], 1).unwrap(),
        vec![
            Some("y".to_string()),
            Some("a".to_string()),
            None,
            Some("x".to_string()),
            Some("b".to_string()),
        ]
    );

    let stats = indexer.stats();
    assert_eq!(stats.batches_enqueued, 2);
    assert_eq!(stats.batches_flushed, 2);
    assert_eq!(stats.documents_written, 4);
    assert!(stats.last_flush.is_some());
}

#[test]
fn test_re_add_replaces_after_flush() {
    let (_dir, config) = common::temp_config(ShutdownMode::Discard);
    let indexer: AsyncIndexer<u32, String> = AsyncIndexer::open(&config).unwrap();

    indexer.add(&[5], &["first".to_string()]).unwrap();
    indexer.flush().unwrap();
    indexer.add(&[5], &["second".to_string()]).unwrap();
    indexer.flush().unwrap();

    assert_eq!(
        indexer.query(&[5], 1).unwrap(),
        vec![Some("second".to_string())]
    );
}

#[test]
fn test_concurrent_producers_all_become_visible() {
    let (_dir, config) = common::temp_config(ShutdownMode::Discard);
    let indexer: Arc<AsyncIndexer<u32, String>> = Arc::new(AsyncIndexer::open(&config).unwrap());

    const THREADS: u32 = 8;
    const BATCHES: u32 = 25;

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let indexer = indexer.clone();
            std::thread::spawn(move || {
                for b in 0..BATCHES {
                    let key = t * 1000 + b;
                    indexer
                        .add(&[key, key + 500], &[format!("{key}"), format!("{}", key + 500)])
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    indexer.flush().unwrap();

    let keys: Vec<u32> = (0..THREADS)
        .flat_map(|t| (0..BATCHES).flat_map(move |b| [t * 1000 + b, t * 1000 + b + 500]))
        .collect();
    let results = indexer.query(&keys, 1).unwrap();
    for (key, doc) in keys.iter().zip(results) {
        assert_eq!(doc, Some(key.to_string()));
    }

    let stats = indexer.stats();
    assert_eq!(stats.batches_flushed, (THREADS * BATCHES) as usize);
    assert_eq!(indexer.pending(), 0);
    indexer.close().unwrap();
}

#[test]
fn test_queries_during_writes_never_see_wrong_values() {
    let (_dir, config) = common::temp_config(ShutdownMode::Discard);
    let indexer: Arc<AsyncIndexer<u32, u32>> = Arc::new(AsyncIndexer::open(&config).unwrap());

    let reader = {
        let indexer = indexer.clone();
        std::thread::spawn(move || {
            for _ in 0..200 {
                for (key, doc) in (0..50u32).zip(indexer.query(&(0..50).collect::<Vec<_>>(), 1).unwrap()) {
                    if let Some(value) = doc {
                        assert_eq!(value, key * 2);
                    }
                }
            }
        })
    };

    for key in 0..50u32 {
        indexer.add(&[key], &[key * 2]).unwrap();
    }
    reader.join().unwrap();
    indexer.flush().unwrap();
    assert_eq!(indexer.query(&[49], 1).unwrap(), vec![Some(98)]);
}

#[test]
fn test_close_immediately_after_add_terminates_and_reopens() {
    let (_dir, config) = common::temp_config(ShutdownMode::Discard);
    let indexer: AsyncIndexer<u32, String> = AsyncIndexer::open(&config).unwrap();

    for key in 0..100u32 {
        indexer.add(&[key], &[format!("doc-{key}")]).unwrap();
    }
    indexer.close().unwrap();
    assert_eq!(indexer.state(), IndexerState::Closed);

    let stats = indexer.stats();
    assert_eq!(stats.batches_flushed + stats.batches_discarded, 100);

    // Whatever made it to disk must be intact
    let reopened: KvIndexer<u32, String> = KvIndexer::open(&config).unwrap();
    let results = reopened.query(&(0..100).collect::<Vec<_>>(), 1).unwrap();
    let stored = results.iter().filter(|doc| doc.is_some()).count();
    assert_eq!(stored, stats.batches_flushed);
    for (key, doc) in (0..100u32).zip(results) {
        if let Some(doc) = doc {
            assert_eq!(doc, format!("doc-{key}"));
        }
    }
}

#[test]
fn test_drain_mode_writes_every_queued_batch() {
    let (_dir, config) = common::temp_config(ShutdownMode::Drain);
    let indexer: AsyncIndexer<u32, String> = AsyncIndexer::open(&config).unwrap();

    for key in 0..100u32 {
        indexer.add(&[key], &[format!("doc-{key}")]).unwrap();
    }
    indexer.close().unwrap();
    assert_eq!(indexer.stats().batches_discarded, 0);

    let reopened: KvIndexer<u32, String> = KvIndexer::open(&config).unwrap();
    assert_eq!(reopened.len().unwrap(), 100);
}

#[test]
fn test_use_after_close_is_distinct_error() {
    let (_dir, config) = common::temp_config(ShutdownMode::Discard);
    let indexer: AsyncIndexer<u32, String> = AsyncIndexer::open(&config).unwrap();
    indexer.close().unwrap();

    assert!(matches!(
        indexer.add(&[1], &["a".to_string()]),
        Err(IndexerError::Closed)
    ));
    assert!(matches!(indexer.query(&[1], 1), Err(IndexerError::Closed)));
    assert!(matches!(indexer.flush(), Err(IndexerError::Closed)));
    assert!(matches!(indexer.close(), Err(IndexerError::Closed)));
}

#[test]
fn test_add_validates_before_enqueue() {
    let (_dir, config) = common::temp_config(ShutdownMode::Discard);
    let indexer: AsyncIndexer<u32, String> = AsyncIndexer::open(&config).unwrap();

    assert!(matches!(
        indexer.add(&[1, 2], &["a".to_string()]),
        Err(IndexerError::LengthMismatch { .. })
    ));
    indexer.add(&[], &[]).unwrap();

    assert_eq!(indexer.stats().batches_enqueued, 0);
    assert_eq!(indexer.pending(), 0);
}

#[test]
fn test_drop_closes_and_releases_store() {
    let (_dir, config) = common::temp_config(ShutdownMode::Drain);
    {
        let indexer: AsyncIndexer<u32, String> = AsyncIndexer::open(&config).unwrap();
        indexer.add(&[1], &["kept".to_string()]).unwrap();
    }

    let reopened: AsyncIndexer<u32, String> = AsyncIndexer::open(&config).unwrap();
    assert_eq!(
        reopened.query(&[1], 1).unwrap(),
        vec![Some("kept".to_string())]
    );
}

#[test]
fn test_memory_engine_flusher_becomes_idle() {
    common::init_tracing();
    let config = IndexerConfig::builder()
        .data_path("/tmp/kvindex-memory")
        .worker_thread_name("memory-flusher")
        .build()
        .unwrap();
    let indexer: AsyncIndexer<String, Vec<u8>, MemoryEngine> =
        AsyncIndexer::with_engine(MemoryEngine::new(), &config).unwrap();

    indexer
        .add(&["blob".to_string()], &[vec![1, 2, 3]])
        .unwrap();
    assert!(common::eventually(Duration::from_secs(5), || indexer.pending() == 0));

    indexer.wait_until_idle().unwrap();
    assert!(!indexer.is_busy());
    assert_eq!(
        indexer.query(&["blob".to_string()], 1).unwrap(),
        vec![Some(vec![1, 2, 3])]
    );
    assert!(indexer.take_flush_failures().is_empty());
}

#[test]
fn test_json_documents_read_back_after_flush() {
    let (_dir, config) = common::temp_config(ShutdownMode::Discard);
    let indexer: AsyncIndexer<u32, serde_json::Value> = AsyncIndexer::open(&config).unwrap();

    let doc = serde_json::json!({ "a": 1, "b": [true, "x"], "meta": null });
    indexer.add(&[1], &[doc.clone()]).unwrap();
    indexer.flush().unwrap();

    assert_eq!(indexer.query(&[1, 2], 1).unwrap(), vec![Some(doc), None]);
    assert!(indexer.take_flush_failures().is_empty());
}

#[test]
fn test_adds_racing_close_are_all_written_in_drain_mode() {
    let (_dir, config) = common::temp_config(ShutdownMode::Drain);
    let indexer: Arc<AsyncIndexer<u64, u64>> = Arc::new(AsyncIndexer::open(&config).unwrap());

    const PRODUCERS: u64 = 8;
    const MAX_PER_PRODUCER: u64 = 200;

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|t| {
            let indexer = indexer.clone();
            std::thread::spawn(move || {
                let mut accepted = 0u64;
                while accepted < MAX_PER_PRODUCER {
                    let key = t * 1_000_000 + accepted;
                    match indexer.add(&[key], &[key]) {
                        Ok(()) => accepted += 1,
                        Err(IndexerError::Closed) => break,
                        Err(e) => panic!("unexpected add error: {e}"),
                    }
                }
                accepted
            })
        })
        .collect();

    let flusher_waiter = {
        let indexer = indexer.clone();
        std::thread::spawn(move || {
            while indexer.flush().is_ok() {
                std::thread::yield_now();
            }
        })
    };

    std::thread::sleep(Duration::from_millis(10));
    indexer.close().unwrap();

    let accepted: u64 = producers.into_iter().map(|h| h.join().unwrap()).sum();
    flusher_waiter.join().unwrap();

    let stats = indexer.stats();
    assert_eq!(stats.batches_enqueued as u64, accepted);
    assert_eq!(
        (stats.batches_flushed + stats.batches_discarded + stats.batches_failed) as u64,
        accepted
    );
    assert_eq!(stats.batches_discarded, 0);
    assert_eq!(indexer.pending(), 0);

    let reopened: KvIndexer<u64, u64> = KvIndexer::open(&config).unwrap();
    assert_eq!(reopened.len().unwrap(), accepted);
}

/// Memory engine whose first `panics` writes panic
struct PanickingEngine {
    inner: MemoryEngine,
    panics: AtomicUsize,
}

impl PanickingEngine {
    fn new(panics: usize) -> Self {
        Self {
            inner: MemoryEngine::new(),
            panics: AtomicUsize::new(panics),
        }
    }
}

impl StorageEngine for PanickingEngine {
    fn write_batch(&self, pairs: &[KvPair]) -> StorageResult<()> {
        if self
            .panics
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            panic!("storage backend crashed");
        }
        self.inner.write_batch(pairs)
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn len(&self) -> StorageResult<u64> {
        self.inner.len()
    }

    fn close(self) -> StorageResult<()> {
        self.inner.close()
    }
}

fn memory_config(thread_name: &str, max_recorded_failures: usize) -> IndexerConfig {
    IndexerConfig::builder()
        .data_path("/tmp/kvindex-memory")
        .worker_thread_name(thread_name)
        .max_recorded_failures(max_recorded_failures)
        .build()
        .unwrap()
}

#[test]
fn test_flusher_survives_panicking_engine() {
    common::init_tracing();
    let config = memory_config("panicking-flusher", 16);
    let indexer: AsyncIndexer<u32, String, PanickingEngine> =
        AsyncIndexer::with_engine(PanickingEngine::new(1), &config).unwrap();

    indexer.add(&[1], &["lost".to_string()]).unwrap();
    indexer.add(&[2], &["kept".to_string()]).unwrap();
    indexer.flush().unwrap();

    assert_eq!(indexer.state(), IndexerState::Running);
    assert_eq!(
        indexer.query(&[1, 2], 1).unwrap(),
        vec![None, Some("kept".to_string())]
    );

    let stats = indexer.stats();
    assert_eq!(stats.batches_failed, 1);
    assert_eq!(stats.batches_flushed, 1);

    let failures = indexer.take_flush_failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].error.contains("storage backend crashed"));

    indexer.add(&[3], &["later".to_string()]).unwrap();
    indexer.flush().unwrap();
    assert_eq!(indexer.query(&[3], 1).unwrap(), vec![Some("later".to_string())]);
    indexer.close().unwrap();
}

#[test]
fn test_stats_count_failures_beyond_log_capacity() {
    common::init_tracing();
    let config = memory_config("overflow-flusher", 1);
    let indexer: AsyncIndexer<u32, String, PanickingEngine> =
        AsyncIndexer::with_engine(PanickingEngine::new(3), &config).unwrap();

    for key in 0..3u32 {
        indexer.add(&[key], &[key.to_string()]).unwrap();
    }
    indexer.flush().unwrap();

    let stats = indexer.stats();
    assert_eq!(stats.batches_failed, 3);
    assert_eq!(stats.failures_dropped, 2);
    assert_eq!(indexer.take_flush_failures().len(), 1);
}
