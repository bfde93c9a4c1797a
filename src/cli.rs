// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueEnum};

/// Command-line arguments for `systest`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "systest",
    version,
    about = "Run integration test cases and compare their output against verification data.",
    long_about = None
)]
pub struct CliArgs {
    /// Root of the test directory tree.
    #[arg(value_name = "TESTS_ROOT_DIR", default_value = ".")]
    pub root: PathBuf,

    /// Print successful tests also.
    ///
    /// Default is to not print anything in case of an OK run.
    #[arg(short = 's', long = "print-successful")]
    pub print_successful: bool,

    /// Output the found differences to the diff report file.
    #[arg(short = 'o', long = "output-differences")]
    pub output_diff: bool,

    /// Execute the test case(s) and dump their stdout instead of comparing.
    ///
    /// Useful for creating the initial verification files.
    #[arg(short = 'd', long = "dump-output")]
    pub dump_output: bool,

    /// Seconds to wait before assuming a single test got stuck and killing it.
    ///
    /// Overrides `[run].watchdog_secs`; default is four hours. Must be at
    /// least 1.
    #[arg(
        short = 'w',
        long = "watchdog-time",
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub watchdog_secs: Option<u64>,

    /// Execute only the given test case files. Can be given multiple times.
    #[arg(short = 't', long = "test-case", value_name = "FILE")]
    pub test_cases: Vec<PathBuf>,

    /// Number of parallel workers. Use 1 to disable parallel execution.
    ///
    /// Defaults to the available parallelism of the host.
    #[arg(
        short = 'p',
        long = "parallel-processes",
        value_name = "N",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub parallel_processes: Option<usize>,

    /// Assume all tests can be run in parallel (after running all
    /// `initialize` hooks first).
    #[arg(short = 'a', long = "all-parallel")]
    pub all_parallel: bool,

    /// Path to a TOML config file.
    ///
    /// Default: `Systest.toml` in the test root, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SYSTEST_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
