#![warn(missing_docs)]
//! ScaleBench Core - Collection Runtime
//!
//! This crate provides everything needed to turn trial runs into persisted
//! record-sets:
//! - `Technology`, `ParallelismUnit` and the common `Measurement` shape
//! - `TrialRunner` capability for executing one parameterized trial
//! - `Extractor` for pulling an elapsed time out of trial output
//! - `RecordSet` per-technology CSV schemas and the `ArtifactStore`
//! - `collect` / `Collector` for sequential, fault-tolerant sweeps

mod collector;
mod extract;
mod model;
mod record;
mod store;
mod trial;

pub use collector::{
    Collection, CollectError, Collector, SkipReason, SkippedTrial, Sweep, SweepObserver,
    SweepSummary, Trial, collect,
};
pub use extract::{
    DEFAULT_NOT_FOUND_PATTERN, DEFAULT_TIMING_PATTERN, EXCERPT_CHARS, ExtractError, Extractor,
    PatternError, excerpt,
};
pub use model::{Measurement, ParallelismUnit, Technology, is_valid_elapsed};
pub use record::{ProcessRow, RecordSet, RejectedRow, RunRow, TargetRow, ThreadRow};
pub use store::{ArtifactStore, StoreError};
pub use trial::{TargetPlan, TrialError, TrialOutput, TrialRunner};
