//! Shared helpers for tests.

use std::sync::Once;

static TRACE_INIT: Once = Once::new();

/// Initialize tracing output for a test, once per process.
pub fn trace_init() {
    TRACE_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}
