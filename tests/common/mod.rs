//! Test utilities shared by the kvindex integration tests

use kodegen_tools_kvindex::{IndexerConfig, ShutdownMode};
use std::sync::Once;
use std::time::Duration;
use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Route library logs to the test output when `RUST_LOG` is set
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Config pointing at a fresh temporary data directory
#[allow(dead_code)]
pub fn temp_config(mode: ShutdownMode) -> (TempDir, IndexerConfig) {
    init_tracing();
    let dir = TempDir::new().expect("create temp dir");
    let config = IndexerConfig::builder()
        .data_path(dir.path().join("index"))
        .shutdown_mode(mode)
        .build()
        .expect("valid config");
    (dir, config)
}

/// Poll `condition` until it holds or `timeout` passes
#[allow(dead_code)]
pub fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
