pub mod builders;
pub mod recording_backend;

use std::sync::{Arc, Once};

use systest::config::RunOptions;
use systest::context::RunContext;
use systest::fs::RealFileSystem;
use systest::report::DiffReport;
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// A context on the real filesystem plus the sender that interrupts it.
pub fn test_context(
    options: RunOptions,
    diff_report: Option<Arc<DiffReport>>,
) -> (RunContext, watch::Sender<bool>) {
    let (tx, rx) = watch::channel(false);
    let ctx = RunContext::new(Arc::new(options), Arc::new(RealFileSystem), diff_report, rx);
    (ctx, tx)
}

/// Run a future with a 10-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}
