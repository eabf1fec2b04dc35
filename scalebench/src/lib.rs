#![warn(missing_docs)]
//! # ScaleBench
//!
//! Speedup comparison across parallel implementations of the same search
//! program.
//!
//! ScaleBench runs each implementation technology over its parallelism
//! levels, extracts the reported wall-clock time, and merges the results
//! into one comparison:
//! - **Extraction**: timing and "target not found" detection from captured output
//! - **Collection**: level sweeps that skip failed trials and persist the rest
//! - **Normalization**: four CSV schemas folded into one ordered dataset
//! - **Comparison**: speedup and efficiency against a single baseline time
//! - **Output**: PNG/SVG chart, human table, JSON report, unified CSV
//!
//! ## Quick Start
//!
//! ```ignore
//! use scalebench::prelude::*;
//!
//! let store = ArtifactStore::new("data");
//! let extractor = Extractor::default();
//! let mut runner = |level: u32| -> Result<TrialOutput, TrialError> {
//!     Ok(TrialOutput::success(format!("Execution Time: {}.0 seconds", 16 / level)))
//! };
//! Collector::new(Technology::SharedMemory, &extractor, &store)
//!     .run(&[1, 2, 4], &mut runner, &mut ())?;
//!
//! let normalized = Normalizer::default().normalize(&store)?;
//! let report = ComparisonReport::build(&normalized)?;
//! ```
//!
//! ## Command Line
//!
//! ```text
//! scalebench init
//! scalebench collect baseline
//! scalebench collect openmp --levels 1,2,4,8
//! scalebench collect mpi
//! scalebench collect gpu
//! scalebench report --format human
//! ```

// Re-export core types
pub use scalebench_core::{
    ArtifactStore, CollectError, Collection, Collector, ExtractError, Extractor, Measurement,
    ParallelismUnit, RecordSet, SkipReason, Sweep, SweepObserver, TargetPlan, Technology, Trial,
    TrialError, TrialOutput, TrialRunner, collect,
};

// Re-export report types
pub use scalebench_report::{
    ChartLayout, ComparisonReport, NormalizeConfig, NormalizeWarning, Normalized, Normalizer,
    Report, ReportError, UnifiedDataset, generate_csv_report, generate_json_report, render_chart,
};

// Re-export stats
pub use scalebench_stats::{TimingSummary, compute_summary, efficiency, speedup};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ArtifactStore, Collector, ComparisonReport, Extractor, Normalizer, Technology,
        TrialError, TrialOutput, TrialRunner,
    };
}

/// Run the ScaleBench command line.
///
/// ```ignore
/// fn main() {
///     scalebench::run().unwrap();
/// }
/// ```
pub use scalebench_cli::run;
