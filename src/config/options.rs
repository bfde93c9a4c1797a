// src/config/options.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::types::Strategy;

/// Effective run options: the config file merged with CLI overrides.
///
/// Immutable once built; shared between workers through
/// [`crate::context::RunContext`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub watchdog: Duration,
    pub print_successful: bool,
    pub dump_output: bool,
    pub output_diff: bool,
    pub diff_file: PathBuf,
    pub disabled_suffix: String,
    pub jobs: usize,
    pub strategy: Strategy,
}

impl RunOptions {
    /// Merge CLI flags over the config file. CLI wins.
    ///
    /// Both sources are validated before this point: a zero watchdog or
    /// worker count is rejected by the CLI parser and by the config loader.
    pub fn resolve(args: &CliArgs, cfg: &ConfigFile) -> Self {
        let watchdog_secs = args.watchdog_secs.unwrap_or(cfg.run.watchdog_secs);
        let jobs = args
            .parallel_processes
            .or(cfg.run.parallel_processes)
            .unwrap_or_else(default_jobs);
        let all_parallel = args.all_parallel || cfg.run.all_parallel;

        Self {
            watchdog: Duration::from_secs(watchdog_secs),
            print_successful: args.print_successful,
            dump_output: args.dump_output,
            output_diff: args.output_diff,
            diff_file: PathBuf::from(&cfg.run.diff_file),
            disabled_suffix: cfg.run.disabled_suffix.clone(),
            jobs,
            strategy: Strategy::select(jobs, all_parallel),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        let cfg = ConfigFile::default();
        Self {
            watchdog: Duration::from_secs(cfg.run.watchdog_secs),
            print_successful: false,
            dump_output: false,
            output_diff: false,
            diff_file: PathBuf::from(&cfg.run.diff_file),
            disabled_suffix: cfg.run.disabled_suffix,
            jobs: 1,
            strategy: Strategy::Sequential,
        }
    }
}

/// Host parallelism, falling back to a single worker.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_overrides_config() {
        let mut cfg = ConfigFile::default();
        cfg.run.watchdog_secs = 10;
        cfg.run.parallel_processes = Some(8);

        let args = CliArgs::try_parse_from(["systest", "-w", "3", "-p", "2", "-a"]).unwrap();
        let opts = RunOptions::resolve(&args, &cfg);

        assert_eq!(opts.watchdog, Duration::from_secs(3));
        assert_eq!(opts.jobs, 2);
        assert_eq!(opts.strategy, Strategy::CaseParallel);
    }

    #[test]
    fn one_job_forces_sequential() {
        let args = CliArgs::try_parse_from(["systest", "-p", "1", "-a"]).unwrap();
        let opts = RunOptions::resolve(&args, &ConfigFile::default());
        assert_eq!(opts.strategy, Strategy::Sequential);
        assert_eq!(opts.watchdog, Duration::from_secs(4 * 60 * 60));
    }
}
