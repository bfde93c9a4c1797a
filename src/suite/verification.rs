// src/suite/verification.rs

//! Verification data: pairs of optional stdin file and expected stdout file.
//!
//! Inside a case's verification directory every `<index>output.txt` file
//! (matching `*_output.txt`) is an expected-output file. Any other `.txt`
//! file starting with the same index is its input. `1_output.txt` pairs
//! with `1_input.txt`, for example.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use tracing::debug;

use crate::errors::{Result, SystestError};
use crate::fs::FileSystem;

const OUTPUT_PATTERN: &str = "*_output.txt";
const OUTPUT_SUFFIX: &str = "output.txt";

/// One (input, expected output) pair. Paths are full paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationPair {
    pub input: Option<PathBuf>,
    pub expected: PathBuf,
}

/// List the pairs in `dir`, ordered by output file name.
///
/// More than one input file for an index is a configuration error that
/// aborts the run. A missing directory yields no pairs.
pub fn load_pairs(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<VerificationPair>> {
    if !fs.is_dir(dir) {
        debug!(dir = %dir.display(), "no verification directory");
        return Ok(Vec::new());
    }

    let outputs = output_matcher()?;
    let entries = fs.read_dir(dir)?;

    let mut pairs = Vec::new();
    for expected in entries.iter().filter(|p| matches_name(&outputs, p)) {
        let Some(name) = file_name(expected) else {
            continue;
        };
        let index = &name[..name.len() - OUTPUT_SUFFIX.len()];

        let inputs: Vec<PathBuf> = entries
            .iter()
            .filter(|p| *p != expected)
            .filter(|p| {
                file_name(p).is_some_and(|n| n.starts_with(index) && n.ends_with(".txt"))
            })
            .cloned()
            .collect();

        if inputs.len() > 1 {
            return Err(SystestError::AmbiguousInput {
                output: expected.clone(),
                inputs,
            });
        }

        pairs.push(VerificationPair {
            input: inputs.into_iter().next(),
            expected: expected.clone(),
        });
    }

    pairs.sort_by(|a, b| a.expected.cmp(&b.expected));
    Ok(pairs)
}

fn output_matcher() -> Result<GlobMatcher> {
    Glob::new(OUTPUT_PATTERN)
        .map(|g| g.compile_matcher())
        .map_err(|e| SystestError::Other(anyhow::anyhow!("invalid output pattern: {e}")))
}

fn matches_name(matcher: &GlobMatcher, path: &Path) -> bool {
    path.file_name().is_some_and(|n| matcher.is_match(n))
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}
