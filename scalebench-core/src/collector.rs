//! Per-Technology Collector
//!
//! Sweeps one technology across an ordered list of parallelism levels:
//!
//! ```text
//! for level in levels:
//!     runner.run_trial(level) ──► extractor.extract() ──► Trial | SkippedTrial
//! ```
//!
//! A failing level never aborts the sweep. It is logged, recorded as a
//! skip, and the next level runs. Trials are strictly sequential.

use crate::extract::{ExtractError, Extractor};
use crate::model::Technology;
use crate::record::RecordSet;
use crate::store::{ArtifactStore, StoreError};
use crate::trial::{TargetPlan, TrialRunner};
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// A level that produced a timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    /// Parallelism level (worker count, run index or target index)
    pub level: u32,
    /// Extracted elapsed seconds
    pub elapsed_seconds: f64,
}

/// Why a level produced no timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Output had no timing line
    Unparseable {
        /// Leading stderr, if any
        excerpt: Option<String>,
    },
    /// The search target was not located
    TargetNotFound,
    /// The runner could not execute the trial (spawn failure, timeout)
    Launch {
        /// Runner error message
        message: String,
    },
}

impl From<ExtractError> for SkipReason {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::TargetNotFound => SkipReason::TargetNotFound,
            ExtractError::Unparseable { excerpt } => SkipReason::Unparseable { excerpt },
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unparseable { excerpt: Some(e) } => write!(f, "unparseable output: {}", e),
            SkipReason::Unparseable { excerpt: None } => write!(f, "unparseable output"),
            SkipReason::TargetNotFound => write!(f, "target not found"),
            SkipReason::Launch { message } => write!(f, "launch failed: {}", message),
        }
    }
}

/// A level that was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTrial {
    /// Parallelism level
    pub level: u32,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// Result of sweeping one technology
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    /// Technology swept
    pub technology: Technology,
    /// Successful trials, in level order
    pub trials: Vec<Trial>,
    /// Skipped levels, in level order
    pub skipped: Vec<SkippedTrial>,
}

/// Attempted/succeeded/skipped counts of a sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Levels attempted
    pub attempted: usize,
    /// Levels with a timing
    pub succeeded: usize,
    /// Skipped because output could not be parsed
    pub unparseable: usize,
    /// Skipped because the target was not found
    pub not_found: usize,
    /// Skipped because the trial could not run
    pub launch_failed: usize,
}

impl SweepSummary {
    /// Total skipped levels
    pub fn skipped(&self) -> usize {
        self.unparseable + self.not_found + self.launch_failed
    }
}

impl Sweep {
    /// Counts by outcome
    pub fn summary(&self) -> SweepSummary {
        let mut summary = SweepSummary {
            attempted: self.trials.len() + self.skipped.len(),
            succeeded: self.trials.len(),
            ..Default::default()
        };
        for skip in &self.skipped {
            match skip.reason {
                SkipReason::Unparseable { .. } => summary.unparseable += 1,
                SkipReason::TargetNotFound => summary.not_found += 1,
                SkipReason::Launch { .. } => summary.launch_failed += 1,
            }
        }
        summary
    }
}

/// Progress hooks for a sweep
pub trait SweepObserver {
    /// Called before a level runs
    fn on_trial_start(&mut self, _level: u32) {}
    /// Called after a level produced a timing
    fn on_trial_complete(&mut self, _trial: &Trial) {}
    /// Called after a level was skipped
    fn on_trial_skipped(&mut self, _skipped: &SkippedTrial) {}
}

impl SweepObserver for () {}

/// Collection failure
#[derive(Debug, Error)]
pub enum CollectError {
    /// The level plan is empty, contains zero or repeats a level
    #[error("Invalid level plan: {0}")]
    InvalidPlan(String),

    /// The record-set could not be written
    #[error("Failed to persist results: {0}")]
    Persist(#[from] StoreError),
}

fn validate_levels(levels: &[u32]) -> Result<(), CollectError> {
    if levels.is_empty() {
        return Err(CollectError::InvalidPlan("no levels to run".to_string()));
    }
    if levels.contains(&0) {
        return Err(CollectError::InvalidPlan(
            "levels must be positive".to_string(),
        ));
    }
    let mut seen = BTreeSet::new();
    if let Some(level) = levels.iter().find(|&&level| !seen.insert(level)) {
        return Err(CollectError::InvalidPlan(format!(
            "level {} listed more than once",
            level
        )));
    }
    Ok(())
}

/// Run every level in order and extract its timing
pub fn collect<R, O>(
    technology: Technology,
    levels: &[u32],
    runner: &mut R,
    extractor: &Extractor,
    observer: &mut O,
) -> Result<Sweep, CollectError>
where
    R: TrialRunner + ?Sized,
    O: SweepObserver + ?Sized,
{
    validate_levels(levels)?;

    let mut sweep = Sweep {
        technology,
        trials: Vec::with_capacity(levels.len()),
        skipped: Vec::new(),
    };

    for &level in levels {
        observer.on_trial_start(level);
        tracing::debug!("{} level {}: running", technology, level);

        let outcome = runner
            .run_trial(level)
            .map_err(|e| SkipReason::Launch {
                message: e.to_string(),
            })
            .and_then(|output| {
                if !output.exited_cleanly() {
                    tracing::debug!(
                        "{} level {}: exit code {:?}",
                        technology,
                        level,
                        output.exit_code
                    );
                }
                extractor.extract(&output).map_err(SkipReason::from)
            });

        match outcome {
            Ok(elapsed_seconds) => {
                let trial = Trial {
                    level,
                    elapsed_seconds,
                };
                tracing::debug!("{} level {}: {:.6}s", technology, level, elapsed_seconds);
                observer.on_trial_complete(&trial);
                sweep.trials.push(trial);
            }
            Err(reason) => {
                tracing::warn!("{} level {} skipped: {}", technology, level, reason);
                let skipped = SkippedTrial { level, reason };
                observer.on_trial_skipped(&skipped);
                sweep.skipped.push(skipped);
            }
        }
    }

    Ok(sweep)
}

/// Sweep plus the persisted artifact it produced
#[derive(Debug, Clone)]
pub struct Collection {
    /// Sweep outcome
    pub sweep: Sweep,
    /// Record-set as written
    pub records: RecordSet,
    /// Artifact path
    pub path: PathBuf,
}

/// Collects one technology and persists its record-set
#[derive(Debug)]
pub struct Collector<'a> {
    technology: Technology,
    extractor: &'a Extractor,
    store: &'a ArtifactStore,
    targets: TargetPlan,
    baseline_seconds: Option<f64>,
}

impl<'a> Collector<'a> {
    /// New collector writing into `store`
    pub fn new(technology: Technology, extractor: &'a Extractor, store: &'a ArtifactStore) -> Self {
        Self {
            technology,
            extractor,
            store,
            targets: TargetPlan::Fixed(String::new()),
            baseline_seconds: None,
        }
    }

    /// Target plan used to label accelerator rows
    pub fn targets(mut self, targets: TargetPlan) -> Self {
        self.targets = targets;
        self
    }

    /// Baseline time used for the stored speedup column
    pub fn baseline_seconds(mut self, seconds: Option<f64>) -> Self {
        self.baseline_seconds = seconds;
        self
    }

    /// Sweep `levels` and persist the result, even if partial or empty
    pub fn run<R, O>(
        &self,
        levels: &[u32],
        runner: &mut R,
        observer: &mut O,
    ) -> Result<Collection, CollectError>
    where
        R: TrialRunner + ?Sized,
        O: SweepObserver + ?Sized,
    {
        let sweep = collect(self.technology, levels, runner, self.extractor, observer)?;
        let records = RecordSet::from_trials(
            self.technology,
            &sweep.trials,
            self.baseline_seconds,
            &self.targets,
        );
        let path = self.store.write(&records)?;

        let summary = sweep.summary();
        tracing::info!(
            "{}: {}/{} levels succeeded ({} unparseable, {} not found, {} launch failures)",
            self.technology,
            summary.succeeded,
            summary.attempted,
            summary.unparseable,
            summary.not_found,
            summary.launch_failed
        );

        Ok(Collection {
            sweep,
            records,
            path,
        })
    }
}
