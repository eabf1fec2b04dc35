//! Measurement Data Model
//!
//! Technologies, parallelism units and the common `Measurement` shape every
//! per-technology schema is normalized into.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Implementation technology being benchmarked.
///
/// Declaration order is the canonical report order: every ordered output
/// (unified dataset, exports, chart legends) sorts by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Technology {
    /// Sequential reference implementation (speedup denominator)
    Baseline,
    /// Thread-based implementation, parameterized by thread count
    SharedMemory,
    /// Process-based implementation, parameterized by process count
    DistributedMemory,
    /// Massively parallel implementation without a per-level sweep
    Accelerator,
}

impl Technology {
    /// All technologies in declaration order
    pub const ALL: [Technology; 4] = [
        Technology::Baseline,
        Technology::SharedMemory,
        Technology::DistributedMemory,
        Technology::Accelerator,
    ];

    /// Stable identifier used for CLI arguments, config tables and file names
    pub fn slug(self) -> &'static str {
        match self {
            Technology::Baseline => "baseline",
            Technology::SharedMemory => "shared-memory",
            Technology::DistributedMemory => "distributed-memory",
            Technology::Accelerator => "accelerator",
        }
    }

    /// Default human-readable label
    pub fn default_label(self) -> &'static str {
        match self {
            Technology::Baseline => "Serial",
            Technology::SharedMemory => "Shared Memory",
            Technology::DistributedMemory => "Distributed Memory",
            Technology::Accelerator => "Accelerator",
        }
    }

    /// Whether this technology sweeps a real worker count (threads or processes)
    pub fn is_worker_scaled(self) -> bool {
        matches!(
            self,
            Technology::SharedMemory | Technology::DistributedMemory
        )
    }

    /// Default artifact file name, `<slug>_results.csv`
    pub fn default_artifact(self) -> String {
        format!("{}_results.csv", self.slug().replace('-', "_"))
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Technology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "baseline" | "serial" => Ok(Technology::Baseline),
            "shared-memory" | "openmp" | "omp" => Ok(Technology::SharedMemory),
            "distributed-memory" | "mpi" => Ok(Technology::DistributedMemory),
            "accelerator" | "gpu" | "cuda" => Ok(Technology::Accelerator),
            other => Err(format!("Unknown technology: {}", other)),
        }
    }
}

/// Position of a measurement on the parallelism axis.
///
/// `Placeholder` marks a synthetic axis position (the accelerator has no
/// comparable worker count). It is only ever produced by normalization and
/// never written to a record-set artifact as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum ParallelismUnit {
    /// Real worker count (threads, processes, or 1 for the baseline)
    Workers(u32),
    /// Synthetic axis position for a technology with no worker count
    Placeholder(u32),
}

impl ParallelismUnit {
    /// Axis position regardless of kind
    pub fn position(self) -> u32 {
        match self {
            ParallelismUnit::Workers(n) | ParallelismUnit::Placeholder(n) => n,
        }
    }

    /// Real worker count, `None` for placeholders
    pub fn workers(self) -> Option<u32> {
        match self {
            ParallelismUnit::Workers(n) => Some(n),
            ParallelismUnit::Placeholder(_) => None,
        }
    }

    /// Whether this is a synthetic position
    pub fn is_placeholder(self) -> bool {
        matches!(self, ParallelismUnit::Placeholder(_))
    }
}

/// One timed trial outcome in the common schema
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Technology that produced the timing
    pub technology: Technology,
    /// Position on the parallelism axis
    pub parallelism_unit: ParallelismUnit,
    /// Wall-clock time in seconds (finite, non-negative)
    pub elapsed_seconds: f64,
}

impl Measurement {
    /// Measurement at a real worker count
    pub fn workers(technology: Technology, workers: u32, elapsed_seconds: f64) -> Self {
        Self {
            technology,
            parallelism_unit: ParallelismUnit::Workers(workers),
            elapsed_seconds,
        }
    }
}

/// Whether an elapsed time can enter the unified dataset
pub fn is_valid_elapsed(seconds: f64) -> bool {
    seconds.is_finite() && seconds >= 0.0
}
