// src/suite/testdesc.rs

//! Legacy `.testdesc` metadata files.
//!
//! A test description is a PHP snippet assigning three strings:
//!
//! ```text
//! <?php
//! $test_description = "Adds two numbers.";
//! $test_bin = "../../bin/adder";
//! $bin_args = "--fast " .
//!             "--quiet";
//! ?>
//! ```

use std::path::Path;

use regex::Regex;

use crate::case::TestCase;

pub const TESTDESC_SUFFIX: &str = ".testdesc";

/// Result of offering a file to the metadata parser.
#[derive(Debug, Clone)]
pub enum Parsed {
    /// Not a metadata file at all; silently ignored.
    NotTestDesc,
    /// A metadata file missing mandatory fields.
    Invalid(String),
    Valid(TestCase),
}

pub fn is_testdesc(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(TESTDESC_SUFFIX))
}

/// Parse the contents of the metadata file at `path`.
pub fn parse_testdesc(path: &Path, contents: &str) -> Parsed {
    if !is_testdesc(path) {
        return Parsed::NotTestDesc;
    }

    let contents = contents.trim();
    if !contents.starts_with("<?php") {
        return Parsed::Invalid("missing <?php header".to_string());
    }

    let description = php_str_assignment(contents, "test_description");
    let bin = php_str_assignment(contents, "test_bin");
    let args = php_str_assignment(contents, "bin_args");

    if description.is_empty() || bin.is_empty() {
        return Parsed::Invalid("test_description and test_bin are mandatory".to_string());
    }

    Parsed::Valid(TestCase::new(path, description, bin, args))
}

/// Value of `$variable = "..." ;`, with string concatenations folded.
///
/// Missing assignments yield an empty string.
fn php_str_assignment(contents: &str, variable: &str) -> String {
    let pattern = format!(r#"(?s)\${}\s*=\s*(.*?)\s*"\s*;"#, regex::escape(variable));
    let Ok(re) = Regex::new(&pattern) else {
        return String::new();
    };
    let Some(value) = re.captures(contents).and_then(|c| c.get(1)) else {
        return String::new();
    };

    let mut clean = String::new();
    for line in value.as_str().lines() {
        let line = line.trim().replace("\\\"", "\"");
        let line = line.strip_prefix('"').unwrap_or(&line);
        let line = line.strip_suffix('.').unwrap_or(line).trim_end();
        let line = line.strip_suffix('"').unwrap_or(line);
        clean.push_str(line);
    }
    clean.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const ADDER: &str = r#"<?php
$test_description = "Adds two numbers";
$test_bin = "../../bin/adder";
$bin_args = "--fast " .
            "--quiet";
?>"#;

    #[test]
    fn parses_fields_and_concatenations() {
        let Parsed::Valid(case) = parse_testdesc(Path::new("tests/add/adder.testdesc"), ADDER) else {
            panic!("expected a valid test case");
        };

        assert_eq!(case.description, "Adds two numbers");
        assert_eq!(case.bin, "../../bin/adder");
        assert_eq!(case.args, "--fast --quiet");
        assert_eq!(case.dir, PathBuf::from("tests/add"));
        assert_eq!(case.verification_dir, PathBuf::from("adder"));
    }

    #[test]
    fn escaped_quotes_are_unescaped() {
        let src = r#"<?php $test_description = "a \"quoted\" word"; $test_bin = "echo"; ?>"#;
        let Parsed::Valid(case) = parse_testdesc(Path::new("q.testdesc"), src) else {
            panic!("expected a valid test case");
        };
        assert_eq!(case.description, r#"a "quoted" word"#);
        assert_eq!(case.args, "");
        assert_eq!(case.dir, PathBuf::from("."));
    }

    #[test]
    fn missing_bin_is_invalid() {
        let src = r#"<?php $test_description = "nothing to run"; ?>"#;
        assert!(matches!(
            parse_testdesc(Path::new("x.testdesc"), src),
            Parsed::Invalid(_)
        ));
    }

    #[test]
    fn non_php_is_invalid_and_other_files_are_ignored() {
        assert!(matches!(
            parse_testdesc(Path::new("x.testdesc"), "hello"),
            Parsed::Invalid(_)
        ));
        assert!(matches!(
            parse_testdesc(Path::new("README"), ADDER),
            Parsed::NotTestDesc
        ));
    }
}
