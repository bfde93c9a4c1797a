// src/case.rs

//! A single test case: run its command once per verification pair and
//! compare the produced stdout with the expected output.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::diff::unified_diff;
use crate::errors::Result;
use crate::exec::{run_with_timeout, RunRequest};
use crate::suite::testdesc::TESTDESC_SUFFIX;
use crate::suite::load_pairs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// The metadata file this case was read from.
    pub file: PathBuf,
    /// Owning test directory; the working directory of every run.
    pub dir: PathBuf,
    pub description: String,
    pub bin: String,
    pub args: String,
    /// Verification data directory, relative to `dir`.
    pub verification_dir: PathBuf,
}

impl TestCase {
    pub fn new(
        file: impl AsRef<Path>,
        description: impl Into<String>,
        bin: impl Into<String>,
        args: impl Into<String>,
    ) -> Self {
        let file = file.as_ref().to_path_buf();
        let dir = match file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let stem = file
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let verification_dir = PathBuf::from(stem.split(TESTDESC_SUFFIX).next().unwrap_or_default());

        Self {
            file,
            dir,
            description: description.into(),
            bin: bin.into(),
            args: args.into(),
            verification_dir,
        }
    }

    /// Shell command line run for every pair.
    pub fn command(&self) -> String {
        if self.args.is_empty() {
            self.bin.clone()
        } else {
            format!("{} {}", self.bin, self.args)
        }
    }

    /// `<file>: <description>`, used in progress lines and the diff report.
    pub fn label(&self) -> String {
        format!("{}: {}", self.file.display(), self.description)
    }

    /// Marker whose presence disables this case.
    pub fn disabled_marker(&self, suffix: &str) -> PathBuf {
        let name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.dir.join(format!("{name}{suffix}"))
    }

    /// Run every verification pair and judge the output.
    ///
    /// Returns the verdict; progress and result lines are appended to
    /// `trace`. Timeouts and mismatches are `Ok(false)`. `Err` is reserved
    /// for conditions that abort the whole run.
    pub async fn execute(&self, ctx: &RunContext, trace: &mut String) -> Result<bool> {
        let options = &ctx.options;

        // Checked on every call: an `initialize` hook may create it.
        if ctx.fs.exists(&self.disabled_marker(&options.disabled_suffix)) {
            debug!(case = %self.file.display(), "disabled; skipping");
            return Ok(true);
        }

        if options.print_successful {
            let _ = write!(trace, "{}...", self.label());
        }

        let started = Instant::now();
        let pairs = load_pairs(ctx.fs.as_ref(), &self.dir.join(&self.verification_dir))?;

        let mut all_ok = true;
        if pairs.is_empty() {
            warn!(case = %self.file.display(), "no verification data found");
            all_ok = false;
        }

        let mut interrupt = ctx.interrupt.clone();
        for pair in &pairs {
            if ctx.is_interrupted() {
                all_ok = false;
                break;
            }

            let mut req = RunRequest::new(self.command(), &self.dir, options.watchdog);
            if let Some(input) = &pair.input {
                match ctx.fs.read_to_string(input) {
                    Ok(text) => req = req.with_input(text.lines().map(str::to_string).collect()),
                    Err(e) => {
                        warn!(case = %self.file.display(), input = %input.display(), error = %e, "cannot read input");
                        all_ok = false;
                        continue;
                    }
                }
            }
            let outcome = run_with_timeout(&req, &mut interrupt).await?;

            if outcome.timed_out {
                info!(case = %self.file.display(), "timed out");
                if let Some(report) = &ctx.diff_report {
                    report.record_timeout(&self.label(), options.watchdog);
                }
                all_ok = false;
                continue;
            }

            if outcome.interrupted {
                all_ok = false;
                break;
            }

            let produced = String::from_utf8_lossy(&outcome.into_stdout()).into_owned();

            if options.dump_output {
                trace.push_str(&produced);
                continue;
            }

            let expected = match ctx.fs.read_to_string(&pair.expected) {
                Ok(text) => text,
                Err(e) => {
                    warn!(case = %self.file.display(), error = %e, "cannot read expected output");
                    all_ok = false;
                    continue;
                }
            };

            if let Some(diff) = unified_diff(&expected, &produced) {
                debug!(case = %self.file.display(), expected = %pair.expected.display(), "output differs");
                if let Some(report) = &ctx.diff_report {
                    report.record_mismatch(&self.label(), &diff);
                }
                all_ok = false;
            }

            if options.print_successful {
                trace.push('.');
            }
        }

        // Expected-output data is not kept past the comparison loop.
        drop(pairs);

        let elapsed = format_elapsed(started.elapsed());
        if !options.print_successful && !all_ok {
            let _ = write!(trace, "{}...", self.label());
        }
        if all_ok {
            if options.print_successful {
                let _ = writeln!(trace, "OK {elapsed}");
            }
        } else {
            let _ = writeln!(trace, "FAIL {elapsed}");
        }

        Ok(all_ok)
    }
}

/// `(XmY.YYYs)`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    format!("({}m{:.3}s)", elapsed.as_secs() / 60, secs % 60.0)
}
