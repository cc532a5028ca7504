//! Write-behind indexing walkthrough
//!
//! Run with `RUST_LOG=debug` to watch the flusher:
//!
//! ```text
//! cargo run --example write_behind -- /tmp/kvindex-demo
//! ```

use anyhow::Result;
use kodegen_tools_kvindex::{AsyncIndexer, IndexerConfig, ShutdownMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Serialize, Deserialize)]
struct Note {
    title: String,
    words: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let data_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("kvindex-demo"));

    let config = IndexerConfig::builder()
        .data_path(data_path)
        .shutdown_mode(ShutdownMode::Drain)
        .build()?;
    config.persist()?;

    let indexer: AsyncIndexer<u64, Note> = AsyncIndexer::open(&config)?;

    for chunk in 0..10u64 {
        let keys: Vec<u64> = (chunk * 100..chunk * 100 + 100).collect();
        let notes: Vec<Note> = keys
            .iter()
            .map(|k| Note {
                title: format!("note {k}"),
                words: (*k as usize) * 3,
            })
            .collect();
        indexer.add(&keys, &notes)?;
    }

    // Reads never wait for the queue, only for an in-flight write
    let early = indexer.query(&[999], 1)?;
    tracing::info!(visible = early[0].is_some(), "Queried before flush");

    indexer.flush()?;
    for (key, note) in [0u64, 512, 4242].iter().zip(indexer.query(&[0, 512, 4242], 1)?) {
        match note {
            Some(note) => tracing::info!(key, title = %note.title, words = note.words, "Found"),
            None => tracing::info!(key, "Not found"),
        }
    }

    let stats = indexer.stats();
    tracing::info!(
        batches = stats.batches_flushed,
        documents = stats.documents_written,
        "Flush statistics"
    );

    indexer.close()?;

    let restored = IndexerConfig::restore(config.data_path())?;
    tracing::info!(path = %restored.database_path().display(), "Config snapshot restored");
    Ok(())
}
