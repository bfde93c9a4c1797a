use std::fmt;

/// How test directories and test cases are spread over the worker pool.
///
/// - `Sequential`: one directory after another, cases in discovery order.
/// - `DirectoryParallel`: each directory (setup, cases, teardown) is one unit
///   of pool work; cases inside a directory stay sequential.
/// - `CaseParallel`: every setup runs first, then every case is an
///   independent unit, then every teardown. Unsafe for directories whose
///   cases share fixed-name files; callers opt in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sequential,
    DirectoryParallel,
    CaseParallel,
}

impl Strategy {
    /// Pick the strategy for a pool size and the "all parallel" switch.
    ///
    /// A pool of one worker is always sequential.
    pub fn select(jobs: usize, all_parallel: bool) -> Self {
        match (jobs, all_parallel) {
            (0 | 1, _) => Strategy::Sequential,
            (_, true) => Strategy::CaseParallel,
            (_, false) => Strategy::DirectoryParallel,
        }
    }

    pub fn is_parallel(self) -> bool {
        !matches!(self, Strategy::Sequential)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::Sequential => "sequential",
            Strategy::DirectoryParallel => "directory-parallel",
            Strategy::CaseParallel => "case-parallel",
        };
        f.write_str(s)
    }
}

/// Identity of a pool worker, used to tag interleaved output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker {}", self.0)
    }
}
