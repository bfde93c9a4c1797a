// src/suite/mod.rs

//! Test suite discovery.
//!
//! - [`discover`] walks the test tree and turns metadata files into
//!   [`TestCase`]s.
//! - [`testdesc`] parses the legacy `.testdesc` metadata format.
//! - [`verification`] lists a case's input / expected-output pairs.
//!
//! Cases are grouped into [`TestDirectory`] values, which are the unit that
//! owns the `initialize` / `finalize` hooks.

pub mod discover;
pub mod testdesc;
pub mod verification;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::case::TestCase;

pub use discover::{collect_files, discover, load_selected};
pub use verification::{load_pairs, VerificationPair};

/// A directory of test cases sharing optional setup / teardown hooks.
#[derive(Debug, Clone)]
pub struct TestDirectory {
    pub path: PathBuf,
    /// Cases in discovery order.
    pub cases: Vec<Arc<TestCase>>,
}

impl TestDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cases: Vec::new(),
        }
    }

    pub fn with_case(mut self, case: TestCase) -> Self {
        self.cases.push(Arc::new(case));
        self
    }
}

/// Group cases by their owning directory.
///
/// Directories appear in order of their first case; cases keep their
/// relative order.
pub fn group_by_directory(cases: Vec<TestCase>) -> Vec<TestDirectory> {
    let mut dirs: Vec<TestDirectory> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    for case in cases {
        let slot = *index.entry(case.dir.clone()).or_insert_with(|| {
            dirs.push(TestDirectory::new(case.dir.clone()));
            dirs.len() - 1
        });
        dirs[slot].cases.push(Arc::new(case));
    }

    dirs
}
