// src/report/diff_report.rs

//! The persisted diff report (`difference.txt` by default).
//!
//! Every failing comparison and every timeout appends a section. The file
//! is created when the run starts and removed again if the suite passes.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::Result;

#[derive(Debug)]
pub struct DiffReport {
    path: PathBuf,
    file: Mutex<File>,
}

impl DiffReport {
    /// Create (or truncate) the report file at `path`.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path)?;
        debug!(path = %path.display(), "diff report opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_timeout(&self, label: &str, watchdog: Duration) {
        self.append(&format!("FAIL (timeout {}s): {label}\n", watchdog.as_secs()));
    }

    pub fn record_mismatch(&self, label: &str, diff: &str) {
        let mut section = format!("FAIL: {label}\n{diff}");
        if !section.ends_with('\n') {
            section.push('\n');
        }
        self.append(&section);
    }

    /// Flush the report; delete it when the suite passed.
    ///
    /// Returns `true` if the file was kept.
    pub fn finish(&self, suite_passed: bool) -> io::Result<bool> {
        {
            let mut file = self.file.lock().unwrap_or_else(|p| p.into_inner());
            file.flush()?;
        }
        if suite_passed {
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
            return Ok(false);
        }
        Ok(true)
    }

    // Whole sections go out under one lock so concurrent cases never
    // interleave inside a section.
    fn append(&self, section: &str) {
        let mut file = self.file.lock().unwrap_or_else(|p| p.into_inner());
        if let Err(e) = file.write_all(section.as_bytes()) {
            warn!(path = %self.path.display(), error = %e, "writing diff report failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_are_appended_and_kept_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("difference.txt");
        let report = DiffReport::create(&path).unwrap();

        report.record_timeout("a.testdesc: slow", Duration::from_secs(3));
        report.record_mismatch("b.testdesc: wrong", "--- expected.stdout\n+++ produced.stdout\n");
        assert!(report.finish(false).unwrap());

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "FAIL (timeout 3s): a.testdesc: slow\n\
             FAIL: b.testdesc: wrong\n--- expected.stdout\n+++ produced.stdout\n"
        );
    }

    #[test]
    fn passing_suite_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("difference.txt");
        let report = DiffReport::create(&path).unwrap();

        assert!(!report.finish(true).unwrap());
        assert!(!path.exists());
    }
}
