//! Schema Normalization
//!
//! Maps each technology's native record-set into the common `Measurement`
//! shape and merges them into one ordered dataset.
//!
//! ```text
//! baseline_results.csv ──────────► mean of runs ─► Workers(1)      (or fallback)
//! shared_memory_results.csv ─────► every row ────► Workers(threads)
//! distributed_memory_results.csv ► every row ────► Workers(processes)
//! accelerator_results.csv ───────► one row ──────► Placeholder(max + gap)
//! ```
//!
//! Missing sources are skipped with a warning, never fabricated. The only
//! substituted value is the baseline time. Its unit-1 row is still emitted
//! and its use is always reported.

use crate::dataset::UnifiedDataset;
use scalebench_core::{
    ArtifactStore, Measurement, ParallelismUnit, RecordSet, RejectedRow, StoreError, Technology,
};
use scalebench_stats::compute_summary;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default baseline time used when no baseline measurement exists
pub const DEFAULT_FALLBACK_BASELINE_SECONDS: f64 = 17.8;

/// Default target whose accelerator timing is preferred
pub const DEFAULT_HARDEST_TARGET: &str = "9999";

/// Default gap between the largest worker count and the accelerator position
pub const DEFAULT_ACCELERATOR_GAP: u32 = 2;

/// Default category label of the accelerator axis position
pub const DEFAULT_ACCELERATOR_LABEL: &str = "GPU";

/// Normalization settings
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    /// Baseline time when the baseline source is missing or has no valid rows
    pub fallback_baseline_seconds: f64,
    /// Accelerator target whose timing is preferred when present
    pub hardest_target: String,
    /// Accelerator position is `max workers + gap`
    pub accelerator_gap: u32,
    /// Category label shown at the accelerator position
    pub accelerator_label: String,
    /// Display label overrides per technology
    pub labels: BTreeMap<Technology, String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            fallback_baseline_seconds: DEFAULT_FALLBACK_BASELINE_SECONDS,
            hardest_target: DEFAULT_HARDEST_TARGET.to_string(),
            accelerator_gap: DEFAULT_ACCELERATOR_GAP,
            accelerator_label: DEFAULT_ACCELERATOR_LABEL.to_string(),
            labels: BTreeMap::new(),
        }
    }
}

impl NormalizeConfig {
    /// Display label for a technology
    pub fn label(&self, technology: Technology) -> String {
        self.labels
            .get(&technology)
            .cloned()
            .unwrap_or_else(|| technology.default_label().to_string())
    }
}

/// Where the baseline time came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaselineSource {
    /// Mean of the baseline record-set's valid runs
    Measured {
        /// Valid runs averaged
        runs: usize,
        /// Sample standard deviation of those runs
        std_dev: f64,
    },
    /// Configured fallback value
    Fallback,
}

/// The single baseline time every speedup is computed against
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaselineTime {
    /// Baseline elapsed seconds
    pub seconds: f64,
    /// Provenance
    pub source: BaselineSource,
}

impl BaselineTime {
    /// Whether the configured fallback was used
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, BaselineSource::Fallback)
    }
}

/// Recoverable condition found during normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizeWarning {
    /// No artifact exists for a technology
    SourceUnavailable {
        /// Technology skipped
        technology: Technology,
        /// Expected artifact location, when known
        path: Option<PathBuf>,
    },
    /// The baseline time is the configured fallback
    BaselineFallback {
        /// Fallback seconds used
        seconds: f64,
    },
    /// A row had no usable elapsed time and was dropped
    InvalidRow {
        /// Technology of the row
        technology: Technology,
        /// 0-based data row index
        row: usize,
        /// Raw value, `None` if empty or non-numeric
        value: Option<f64>,
    },
    /// A unit appears more than once within one technology
    DuplicateUnit {
        /// Technology with the duplicate
        technology: Technology,
        /// Repeated axis position
        position: u32,
    },
    /// An artifact exists but contributed no valid rows
    NoValidRows {
        /// Technology of the empty source
        technology: Technology,
    },
}

impl fmt::Display for NormalizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeWarning::SourceUnavailable {
                technology,
                path: Some(path),
            } => write!(f, "{}: no results at {}, skipped", technology, path.display()),
            NormalizeWarning::SourceUnavailable {
                technology,
                path: None,
            } => write!(f, "{}: no results, skipped", technology),
            NormalizeWarning::BaselineFallback { seconds } => {
                write!(f, "baseline: using fallback time {:.2}s", seconds)
            }
            NormalizeWarning::InvalidRow {
                technology,
                row,
                value: Some(v),
            } => write!(f, "{}: row {} dropped, invalid time {}", technology, row, v),
            NormalizeWarning::InvalidRow {
                technology,
                row,
                value: None,
            } => write!(f, "{}: row {} dropped, missing time", technology, row),
            NormalizeWarning::DuplicateUnit {
                technology,
                position,
            } => write!(f, "{}: unit {} appears more than once", technology, position),
            NormalizeWarning::NoValidRows { technology } => {
                write!(f, "{}: artifact has no valid rows", technology)
            }
        }
    }
}

/// Fatal normalization failure
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// An artifact exists but could not be decoded
    #[error("Unreadable {technology} results: {source}")]
    Decode {
        /// Technology of the artifact
        technology: Technology,
        /// Underlying store error (names the file)
        #[source]
        source: StoreError,
    },
}

/// Decoded record-sets keyed by technology
#[derive(Debug, Clone, Default)]
pub struct Sources {
    sets: BTreeMap<Technology, RecordSet>,
    locations: BTreeMap<Technology, PathBuf>,
}

impl Sources {
    /// Empty source collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record-set, keyed by its own technology
    pub fn insert(&mut self, set: RecordSet) {
        self.sets.insert(set.technology(), set);
    }

    /// Record where a technology's artifact lives (used in warnings)
    pub fn set_location(&mut self, technology: Technology, path: PathBuf) {
        self.locations.insert(technology, path);
    }

    /// Record-set for a technology, if present
    pub fn get(&self, technology: Technology) -> Option<&RecordSet> {
        self.sets.get(&technology)
    }
}

impl FromIterator<RecordSet> for Sources {
    fn from_iter<I: IntoIterator<Item = RecordSet>>(iter: I) -> Self {
        let mut sources = Sources::new();
        for set in iter {
            sources.insert(set);
        }
        sources
    }
}

/// Output of normalization
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Ordered measurements of every technology found
    pub dataset: UnifiedDataset,
    /// Baseline time for speedup computation
    pub baseline: BaselineTime,
    /// Recoverable conditions, in discovery order
    pub warnings: Vec<NormalizeWarning>,
    /// Display label per technology
    pub labels: BTreeMap<Technology, String>,
    /// Category label of the accelerator position
    pub accelerator_label: String,
    /// Accelerator target whose timing was used
    pub accelerator_target: Option<String>,
}

impl Normalized {
    /// Display label for a technology
    pub fn label(&self, technology: Technology) -> &str {
        self.labels
            .get(&technology)
            .map(String::as_str)
            .unwrap_or_else(|| technology.default_label())
    }
}

/// Converts record-sets into a unified dataset
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizeConfig,
}

impl Normalizer {
    /// New normalizer
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    /// Settings in use
    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Read every technology's artifact from `store` and normalize.
    ///
    /// A missing artifact is a warning; an unreadable one is an error.
    pub fn normalize(&self, store: &ArtifactStore) -> Result<Normalized, NormalizeError> {
        let mut sources = Sources::new();
        for technology in Technology::ALL {
            sources.set_location(technology, store.path(technology));
            match store.read(technology) {
                Ok(Some(set)) => sources.insert(set),
                Ok(None) => {}
                Err(source) => return Err(NormalizeError::Decode { technology, source }),
            }
        }
        Ok(self.normalize_sources(&sources))
    }

    /// Normalize already-decoded record-sets
    pub fn normalize_sources(&self, sources: &Sources) -> Normalized {
        let mut warnings = Vec::new();
        let mut measurements = Vec::new();

        let baseline = self.baseline_time(sources, &mut warnings, &mut measurements);

        for technology in [Technology::SharedMemory, Technology::DistributedMemory] {
            let Some(set) = available(sources, technology, &mut warnings) else {
                continue;
            };
            let (accepted, rejected) = set.worker_measurements();
            push_rejections(technology, &rejected, &mut warnings);
            if accepted.is_empty() {
                warnings.push(NormalizeWarning::NoValidRows { technology });
            }
            push_duplicates(technology, &accepted, &mut warnings);
            measurements.extend(accepted);
        }

        let max_workers = measurements
            .iter()
            .filter_map(|m| m.parallelism_unit.workers())
            .max()
            .unwrap_or(1);

        let mut accelerator_target = None;
        if let Some(set) = available(sources, Technology::Accelerator, &mut warnings) {
            let (timings, rejected) = set.target_timings();
            push_rejections(Technology::Accelerator, &rejected, &mut warnings);
            match self.select_accelerator(&timings) {
                Some((target, seconds)) => {
                    accelerator_target = Some(target.to_string());
                    measurements.push(Measurement {
                        technology: Technology::Accelerator,
                        parallelism_unit: ParallelismUnit::Placeholder(
                            max_workers.saturating_add(self.config.accelerator_gap),
                        ),
                        elapsed_seconds: seconds,
                    });
                }
                None => warnings.push(NormalizeWarning::NoValidRows {
                    technology: Technology::Accelerator,
                }),
            }
        }

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        let labels = Technology::ALL
            .into_iter()
            .map(|t| (t, self.config.label(t)))
            .collect();

        Normalized {
            dataset: UnifiedDataset::from_measurements(measurements),
            baseline,
            warnings,
            labels,
            accelerator_label: self.config.accelerator_label.clone(),
            accelerator_target,
        }
    }

    fn baseline_time(
        &self,
        sources: &Sources,
        warnings: &mut Vec<NormalizeWarning>,
        measurements: &mut Vec<Measurement>,
    ) -> BaselineTime {
        if let Some(set) = available(sources, Technology::Baseline, warnings) {
            let (accepted, rejected) = set.worker_measurements();
            push_rejections(Technology::Baseline, &rejected, warnings);

            let times: Vec<f64> = accepted.iter().map(|m| m.elapsed_seconds).collect();
            if let Some(summary) = compute_summary(&times) {
                measurements.push(Measurement::workers(Technology::Baseline, 1, summary.mean));
                return BaselineTime {
                    seconds: summary.mean,
                    source: BaselineSource::Measured {
                        runs: summary.count,
                        std_dev: summary.std_dev,
                    },
                };
            }
            warnings.push(NormalizeWarning::NoValidRows {
                technology: Technology::Baseline,
            });
        }

        let seconds = self.config.fallback_baseline_seconds;
        warnings.push(NormalizeWarning::BaselineFallback { seconds });
        measurements.push(Measurement::workers(Technology::Baseline, 1, seconds));
        BaselineTime {
            seconds,
            source: BaselineSource::Fallback,
        }
    }

    /// Minimum time among the hardest-target rows, or among all rows if the
    /// hardest target was never run
    fn select_accelerator<'a>(&self, timings: &[(&'a str, f64)]) -> Option<(&'a str, f64)> {
        let fastest = |hardest_only: bool| {
            timings
                .iter()
                .copied()
                .filter(|(target, _)| !hardest_only || *target == self.config.hardest_target)
                .min_by(|a, b| a.1.total_cmp(&b.1))
        };
        fastest(true).or_else(|| fastest(false))
    }
}

fn available<'s>(
    sources: &'s Sources,
    technology: Technology,
    warnings: &mut Vec<NormalizeWarning>,
) -> Option<&'s RecordSet> {
    let set = sources.get(technology);
    if set.is_none() {
        warnings.push(NormalizeWarning::SourceUnavailable {
            technology,
            path: sources.locations.get(&technology).cloned(),
        });
    }
    set
}

fn push_rejections(
    technology: Technology,
    rejected: &[RejectedRow],
    warnings: &mut Vec<NormalizeWarning>,
) {
    warnings.extend(rejected.iter().map(|r| NormalizeWarning::InvalidRow {
        technology,
        row: r.row,
        value: r.elapsed_seconds,
    }));
}

fn push_duplicates(
    technology: Technology,
    measurements: &[Measurement],
    warnings: &mut Vec<NormalizeWarning>,
) {
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    for m in measurements {
        let position = m.parallelism_unit.position();
        if !seen.insert(position) && reported.insert(position) {
            warnings.push(NormalizeWarning::DuplicateUnit {
                technology,
                position,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalebench_core::{ProcessRow, RunRow, TargetRow, ThreadRow};

    fn runs(times: &[f64]) -> RecordSet {
        RecordSet::Baseline(
            times
                .iter()
                .enumerate()
                .map(|(i, &t)| RunRow {
                    run_index: i as u32 + 1,
                    elapsed_seconds: Some(t),
                })
                .collect(),
        )
    }

    fn threads(rows: &[(u32, Option<f64>)]) -> RecordSet {
        RecordSet::SharedMemory(
            rows.iter()
                .map(|&(thread_count, elapsed_seconds)| ThreadRow {
                    thread_count,
                    elapsed_seconds,
                    speedup: None,
                })
                .collect(),
        )
    }

    fn processes(rows: &[(u32, f64)]) -> RecordSet {
        RecordSet::DistributedMemory(
            rows.iter()
                .map(|&(process_count, t)| ProcessRow {
                    process_count,
                    elapsed_seconds: Some(t),
                    speedup: Some(99.0),
                })
                .collect(),
        )
    }

    fn targets(rows: &[(&str, f64)]) -> RecordSet {
        RecordSet::Accelerator(
            rows.iter()
                .map(|&(target, t)| TargetRow {
                    target_value: target.to_string(),
                    elapsed_seconds: Some(t),
                })
                .collect(),
        )
    }

    #[test]
    fn test_baseline_mean() {
        let sources: Sources = [runs(&[12.0, 14.0, 13.0])].into_iter().collect();
        let normalized = Normalizer::default().normalize_sources(&sources);

        assert_eq!(
            normalized.dataset.as_slice(),
            &[Measurement::workers(Technology::Baseline, 1, 13.0)]
        );
        assert_eq!(normalized.baseline.seconds, 13.0);
        assert!(matches!(
            normalized.baseline.source,
            BaselineSource::Measured { runs: 3, .. }
        ));
    }

    #[test]
    fn test_missing_baseline_uses_fallback() {
        let sources: Sources = [threads(&[(1, Some(18.0))])].into_iter().collect();
        let normalized = Normalizer::default().normalize_sources(&sources);

        assert_eq!(normalized.baseline.seconds, DEFAULT_FALLBACK_BASELINE_SECONDS);
        assert!(normalized.baseline.is_fallback());
        assert!(
            normalized
                .warnings
                .contains(&NormalizeWarning::BaselineFallback { seconds: 17.8 })
        );
        let baseline: Vec<_> = normalized
            .dataset
            .for_technology(Technology::Baseline)
            .collect();
        assert_eq!(
            baseline,
            vec![&Measurement::workers(Technology::Baseline, 1, 17.8)]
        );
    }

    #[test]
    fn test_no_sources_still_yield_fallback_baseline_row() {
        let normalized = Normalizer::default().normalize_sources(&Sources::new());
        assert_eq!(
            normalized.dataset.as_slice(),
            &[Measurement::workers(Technology::Baseline, 1, 17.8)]
        );
        assert!(normalized.baseline.is_fallback());
    }

    #[test]
    fn test_accelerator_position_saturates() {
        let sources: Sources = [
            threads(&[(u32::MAX, Some(1.0))]),
            targets(&[("9999", 0.4)]),
        ]
        .into_iter()
        .collect();
        let normalized = Normalizer::default().normalize_sources(&sources);
        let accel = normalized
            .dataset
            .iter()
            .find(|m| m.technology == Technology::Accelerator)
            .unwrap();
        assert_eq!(accel.parallelism_unit, ParallelismUnit::Placeholder(u32::MAX));
    }

    #[test]
    fn test_baseline_without_valid_rows_falls_back() {
        let sources: Sources = [RecordSet::Baseline(vec![RunRow {
            run_index: 1,
            elapsed_seconds: None,
        }])]
        .into_iter()
        .collect();
        let normalized = Normalizer::default().normalize_sources(&sources);
        assert!(normalized.baseline.is_fallback());
        assert!(normalized.warnings.contains(&NormalizeWarning::NoValidRows {
            technology: Technology::Baseline
        }));
        assert_eq!(normalized.dataset.for_technology(Technology::Baseline).count(), 1);
    }

    #[test]
    fn test_accelerator_prefers_hardest_target() {
        let sources: Sources = [
            threads(&[(1, Some(16.0)), (16, Some(1.5))]),
            targets(&[("9999", 0.42), ("0001", 0.05)]),
        ]
        .into_iter()
        .collect();
        let normalized = Normalizer::default().normalize_sources(&sources);

        let accel = normalized
            .dataset
            .iter()
            .find(|m| m.technology == Technology::Accelerator)
            .unwrap();
        assert_eq!(accel.elapsed_seconds, 0.42);
        assert_eq!(accel.parallelism_unit, ParallelismUnit::Placeholder(18));
        assert_eq!(normalized.accelerator_target.as_deref(), Some("9999"));
    }

    #[test]
    fn test_accelerator_without_hardest_target_takes_minimum() {
        let sources: Sources = [targets(&[("0420", 0.3), ("0001", 0.05)])]
            .into_iter()
            .collect();
        let normalized = Normalizer::default().normalize_sources(&sources);

        let accel = normalized.dataset.as_slice()[1];
        assert_eq!(accel.technology, Technology::Accelerator);
        assert_eq!(accel.elapsed_seconds, 0.05);
        // Only the fallback baseline exists, so max workers is 1
        assert_eq!(accel.parallelism_unit, ParallelismUnit::Placeholder(3));
    }

    #[test]
    fn test_stored_speedup_is_ignored() {
        let sources: Sources = [processes(&[(2, 9.0)])].into_iter().collect();
        let normalized = Normalizer::default().normalize_sources(&sources);
        assert_eq!(
            normalized.dataset.as_slice(),
            &[
                Measurement::workers(Technology::Baseline, 1, 17.8),
                Measurement::workers(Technology::DistributedMemory, 2, 9.0)
            ]
        );
    }

    #[test]
    fn test_invalid_rows_are_dropped_with_warning() {
        let sources: Sources = [threads(&[
            (1, Some(10.0)),
            (2, None),
            (4, Some(f64::NAN)),
            (8, Some(-2.0)),
        ])]
        .into_iter()
        .collect();
        let normalized = Normalizer::default().normalize_sources(&sources);

        // fallback baseline plus the one valid thread row
        assert_eq!(normalized.dataset.len(), 2);
        let invalid = normalized
            .warnings
            .iter()
            .filter(|w| matches!(w, NormalizeWarning::InvalidRow { .. }))
            .count();
        assert_eq!(invalid, 3);
    }

    #[test]
    fn test_duplicate_units_are_reported_once() {
        let sources: Sources = [threads(&[
            (2, Some(9.0)),
            (2, Some(8.5)),
            (2, Some(8.7)),
        ])]
        .into_iter()
        .collect();
        let normalized = Normalizer::default().normalize_sources(&sources);

        assert_eq!(
            normalized
                .dataset
                .for_technology(Technology::SharedMemory)
                .count(),
            3
        );
        let duplicates: Vec<_> = normalized
            .warnings
            .iter()
            .filter(|w| matches!(w, NormalizeWarning::DuplicateUnit { .. }))
            .collect();
        assert_eq!(duplicates.len(), 1);
    }

    #[test]
    fn test_ordering_by_technology_then_position() {
        let sources: Sources = [
            targets(&[("9999", 0.4)]),
            processes(&[(8, 2.0), (1, 16.0), (4, 4.0)]),
            threads(&[(16, Some(1.1)), (2, Some(8.0))]),
            runs(&[17.0]),
        ]
        .into_iter()
        .collect();
        let normalized = Normalizer::default().normalize_sources(&sources);

        let order: Vec<(Technology, u32)> = normalized
            .dataset
            .iter()
            .map(|m| (m.technology, m.parallelism_unit.position()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Technology::Baseline, 1),
                (Technology::SharedMemory, 2),
                (Technology::SharedMemory, 16),
                (Technology::DistributedMemory, 1),
                (Technology::DistributedMemory, 4),
                (Technology::DistributedMemory, 8),
                (Technology::Accelerator, 18),
            ]
        );
    }

    #[test]
    fn test_missing_sources_are_warned_not_fabricated() {
        let normalized = Normalizer::default().normalize_sources(&Sources::new());
        assert!(
            normalized
                .dataset
                .iter()
                .all(|m| m.technology == Technology::Baseline)
        );
        let unavailable = normalized
            .warnings
            .iter()
            .filter(|w| matches!(w, NormalizeWarning::SourceUnavailable { .. }))
            .count();
        assert_eq!(unavailable, 4);
    }

    #[test]
    fn test_label_overrides() {
        let mut config = NormalizeConfig::default();
        config
            .labels
            .insert(Technology::SharedMemory, "OpenMP".to_string());
        let normalized = Normalizer::new(config).normalize_sources(&Sources::new());
        assert_eq!(normalized.label(Technology::SharedMemory), "OpenMP");
        assert_eq!(normalized.label(Technology::DistributedMemory), "Distributed Memory");
    }
}
