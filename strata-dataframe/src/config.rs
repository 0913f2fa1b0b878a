use std::fmt::{Display, Formatter};
use std::str::FromStr;

use strata_error::{StrataError, StrataResult, strata_bail};
pub use strata_graph::Scheduler;

/// Options for running a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputeOptions {
    scheduler: Scheduler,
}

impl ComputeOptions {
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Run every task on the calling thread.
    pub fn sync() -> Self {
        Self::default().with_scheduler(Scheduler::Sync)
    }

    /// Run on a dedicated pool of `num_threads` threads.
    pub fn threaded(num_threads: usize) -> Self {
        Self::default().with_scheduler(Scheduler::Threaded {
            num_threads: Some(num_threads),
        })
    }

    pub fn scheduler(&self) -> Scheduler {
        self.scheduler
    }
}

/// Options for `set_index` and `set_partition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetIndexOptions {
    npartitions: Option<usize>,
    compute: bool,
    sample_size: usize,
    seed: Option<u64>,
}

impl Default for SetIndexOptions {
    fn default() -> Self {
        Self {
            npartitions: None,
            compute: false,
            sample_size: 1000,
            seed: None,
        }
    }
}

impl SetIndexOptions {
    /// Number of output partitions; defaults to the input's.
    pub fn with_npartitions(mut self, npartitions: usize) -> Self {
        self.npartitions = Some(npartitions);
        self
    }

    /// Materialise the shuffle eagerly instead of leaving it in the graph.
    pub fn with_compute(mut self, compute: bool) -> Self {
        self.compute = compute;
        self
    }

    /// Rows sampled per partition when estimating divisions.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Seed for the per-partition samples; unseeded estimation draws a fresh seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn npartitions(&self) -> Option<usize> {
        self.npartitions
    }

    pub fn compute(&self) -> bool {
        self.compute
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// The axis a frame reduction runs along.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Reduce each column over its rows.
    #[default]
    Index,
    /// Reduce each row over its columns.
    Columns,
}

impl TryFrom<i64> for Axis {
    type Error = StrataError;

    fn try_from(value: i64) -> StrataResult<Self> {
        match value {
            0 => Ok(Axis::Index),
            1 => Ok(Axis::Columns),
            other => strata_bail!("No axis named {}", other),
        }
    }
}

impl FromStr for Axis {
    type Err = StrataError;

    fn from_str(s: &str) -> StrataResult<Self> {
        match s {
            "index" | "rows" | "0" => Ok(Axis::Index),
            "columns" | "1" => Ok(Axis::Columns),
            other => strata_bail!("No axis named {}", other),
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Index => write!(f, "index"),
            Axis::Columns => write!(f, "columns"),
        }
    }
}
