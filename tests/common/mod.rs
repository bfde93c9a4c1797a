#![allow(dead_code)]

pub use systest_test_utils::builders::{synthetic_directory, testdesc_source, SuiteFixture};
pub use systest_test_utils::recording_backend::{Event, RecordingBackend};
pub use systest_test_utils::{init_tracing, test_context, with_timeout};

use std::time::Duration;

use systest::config::RunOptions;

/// Sequential options with a short watchdog, suitable for real processes.
pub fn quick_options() -> RunOptions {
    RunOptions {
        watchdog: Duration::from_secs(10),
        ..RunOptions::default()
    }
}
