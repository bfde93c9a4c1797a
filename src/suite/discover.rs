// src/suite/discover.rs

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::case::TestCase;
use crate::errors::{Result, SystestError};
use crate::fs::FileSystem;
use crate::suite::testdesc::{is_testdesc, parse_testdesc, Parsed};

/// All files below `root`, depth first, entries sorted by name.
pub fn collect_files(fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs.read_dir(root)? {
        if fs.is_dir(&entry) {
            found.extend(collect_files(fs, &entry)?);
        } else {
            found.push(entry);
        }
    }
    Ok(found)
}

/// Every valid test case below `root`, in discovery order.
pub fn discover(fs: &dyn FileSystem, root: &Path) -> Result<Vec<TestCase>> {
    let mut cases = Vec::new();
    for file in collect_files(fs, root)? {
        if !is_testdesc(&file) {
            continue;
        }
        match fs.read_to_string(&file) {
            Ok(contents) => cases.extend(accept(&file, &contents)),
            Err(e) => warn!(file = %file.display(), error = %e, "cannot read test file; skipping"),
        }
    }
    debug!(root = %root.display(), count = cases.len(), "discovered test cases");
    Ok(cases)
}

/// Test cases for explicitly named files.
///
/// An unreadable file aborts the run.
pub fn load_selected(fs: &dyn FileSystem, files: &[PathBuf]) -> Result<Vec<TestCase>> {
    let mut contents = Vec::with_capacity(files.len());
    for file in files {
        let text = fs
            .read_to_string(file)
            .map_err(|_| SystestError::UnreadableTestCase(file.clone()))?;
        contents.push(text);
    }

    Ok(files
        .iter()
        .zip(&contents)
        .filter_map(|(file, text)| accept(file, text))
        .collect())
}

fn accept(file: &Path, contents: &str) -> Option<TestCase> {
    match parse_testdesc(file, contents) {
        Parsed::Valid(case) => Some(case),
        Parsed::Invalid(reason) => {
            warn!(file = %file.display(), %reason, "Illegal test file");
            None
        }
        Parsed::NotTestDesc => None,
    }
}
