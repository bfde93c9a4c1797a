// src/diff.rs

//! Line-oriented unified diffs of expected vs. produced output.

use similar::{DiffTag, TextDiff};

pub const EXPECTED_HEADER: &str = "expected.stdout";
pub const PRODUCED_HEADER: &str = "produced.stdout";

/// Unified diff of `expected` against `produced`, or `None` when the two
/// texts have identical lines.
pub fn unified_diff(expected: &str, produced: &str) -> Option<String> {
    let diff = TextDiff::from_lines(expected, produced);
    if diff.ops().iter().all(|op| op.tag() == DiffTag::Equal) {
        return None;
    }

    Some(
        diff.unified_diff()
            .context_radius(3)
            .header(EXPECTED_HEADER, PRODUCED_HEADER)
            .to_string(),
    )
}
