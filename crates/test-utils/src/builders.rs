#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use systest::case::TestCase;
use systest::suite::TestDirectory;
use tempfile::TempDir;

/// `.testdesc` source for the given fields.
pub fn testdesc_source(description: &str, bin: &str, args: &str) -> String {
    format!(
        "<?php\n$test_description = \"{description}\";\n$test_bin = \"{bin}\";\n$bin_args = \"{args}\";\n?>\n"
    )
}

/// A throwaway test tree on the real filesystem.
///
/// Everything lives under a temporary directory that is removed when the
/// fixture is dropped.
pub struct SuiteFixture {
    dir: TempDir,
}

impl SuiteFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("creating fixture dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn file(&self, rel: impl AsRef<Path>, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("creating fixture parent");
        }
        fs::write(&path, contents).expect("writing fixture file");
        path
    }

    /// Write `<dir>/<name>.testdesc` and return the parsed case.
    pub fn case(&self, dir: &str, name: &str, description: &str, command: &str) -> TestCase {
        let (bin, args) = command.split_once(' ').unwrap_or((command, ""));
        let file = self.file(
            format!("{dir}/{name}.testdesc"),
            &testdesc_source(description, bin, args),
        );
        TestCase::new(file, description, bin, args)
    }

    /// Add one verification pair for case `name` in `dir`.
    pub fn pair(&self, dir: &str, name: &str, index: &str, input: Option<&str>, expected: &str) -> &Self {
        if let Some(input) = input {
            self.file(format!("{dir}/{name}/{index}input.txt"), input);
        }
        self.file(format!("{dir}/{name}/{index}output.txt"), expected);
        self
    }

    /// Write an executable shell script (e.g. an `initialize` hook).
    pub fn script(&self, rel: impl AsRef<Path>, body: &str) -> PathBuf {
        let path = self.file(rel, &format!("#!/bin/sh\n{body}\n"));
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("chmod fixture script");
        }
        path
    }

    pub fn read(&self, rel: impl AsRef<Path>) -> String {
        fs::read_to_string(self.path(rel)).unwrap_or_default()
    }
}

impl Default for SuiteFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory directory of `count` cases named `c1..=cN`; nothing on disk.
pub fn synthetic_directory(path: &str, count: usize) -> TestDirectory {
    (1..=count).fold(TestDirectory::new(path), |dir, i| {
        dir.with_case(TestCase::new(
            format!("{path}/c{i}.testdesc"),
            format!("case {i}"),
            "true",
            "",
        ))
    })
}
