#![warn(missing_docs)]
//! ScaleBench Statistics
//!
//! Small numeric helpers shared by the collector and the reporter:
//! - Summary of repeated timings (mean, median, spread)
//! - Speedup against a baseline time
//! - Parallel efficiency per worker

mod speedup;
mod summary;

pub use speedup::{efficiency, speedup};
pub use summary::{TimingSummary, compute_summary, mean};
