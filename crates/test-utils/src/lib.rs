//! Shared helpers for docci's integration tests.

pub mod builders;
pub mod fake_executor;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Upper bound for one test. End-to-end tests spawn real shells and wait
/// out the teardown grace period, so this is generous.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(20);

static TRACING: Once = Once::new();

/// Install a test subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests
/// (or with `--nocapture`). `RUST_LOG=docci=debug` raises the level.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docci=info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `fut`, panicking after [`TEST_TIMEOUT`].
pub async fn with_timeout<F: Future>(fut: F) -> F::Output {
    match tokio::time::timeout(TEST_TIMEOUT, fut).await {
        Ok(output) => output,
        Err(_) => panic!("test did not finish within {TEST_TIMEOUT:?}"),
    }
}
