//! Comparative Report
//!
//! Derives speedup and parallel efficiency for every measurement against
//! the single baseline time.

use crate::normalize::{BaselineTime, NormalizeWarning, Normalized};
use scalebench_core::{ParallelismUnit, Technology};
use scalebench_stats::{efficiency, speedup};
use serde::Serialize;
use thiserror::Error;

/// Reporting failure
#[derive(Debug, Error)]
pub enum ReportError {
    /// No technology produced any measurement
    #[error("No measurements found: nothing to compare (run `scalebench collect` first)")]
    EmptyDataset,
}

/// One measurement with derived metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// Technology
    pub technology: Technology,
    /// Display label of the technology
    pub label: String,
    /// Axis position
    pub parallelism_unit: ParallelismUnit,
    /// Display text of the unit (worker count or category label)
    pub unit_label: String,
    /// Elapsed seconds
    pub elapsed_seconds: f64,
    /// `baseline / elapsed`; `None` for the baseline itself or zero elapsed
    pub speedup: Option<f64>,
    /// `speedup / workers`; real worker counts only
    pub efficiency: Option<f64>,
    /// Elapsed time is the configured fallback, not a measurement
    pub fallback: bool,
}

/// Speedup comparison across technologies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Baseline time all speedups use
    pub baseline: BaselineTime,
    /// Display label of the baseline technology
    pub baseline_label: String,
    /// Entries in unified dataset order
    pub entries: Vec<ReportEntry>,
    /// Category label of the accelerator position
    pub accelerator_label: String,
    /// Normalization warnings carried through
    pub warnings: Vec<NormalizeWarning>,
}

impl ComparisonReport {
    /// Build from a normalized dataset; fails if it is empty
    pub fn build(normalized: &Normalized) -> Result<Self, ReportError> {
        if normalized.dataset.is_empty() {
            return Err(ReportError::EmptyDataset);
        }

        let baseline_seconds = normalized.baseline.seconds;
        let entries = normalized
            .dataset
            .iter()
            .map(|m| {
                let speedup = if m.technology == Technology::Baseline {
                    None
                } else {
                    speedup(baseline_seconds, m.elapsed_seconds)
                };
                let efficiency = match (speedup, m.parallelism_unit) {
                    (Some(s), ParallelismUnit::Workers(n)) => efficiency(s, n),
                    _ => None,
                };
                let unit_label = match m.parallelism_unit {
                    ParallelismUnit::Workers(n) => n.to_string(),
                    ParallelismUnit::Placeholder(_) => normalized.accelerator_label.clone(),
                };
                ReportEntry {
                    technology: m.technology,
                    label: normalized.label(m.technology).to_string(),
                    parallelism_unit: m.parallelism_unit,
                    unit_label,
                    elapsed_seconds: m.elapsed_seconds,
                    speedup,
                    efficiency,
                    fallback: m.technology == Technology::Baseline
                        && normalized.baseline.is_fallback(),
                }
            })
            .collect();

        Ok(Self {
            baseline: normalized.baseline,
            baseline_label: normalized.label(Technology::Baseline).to_string(),
            entries,
            accelerator_label: normalized.accelerator_label.clone(),
            warnings: normalized.warnings.clone(),
        })
    }

    /// Entries of one technology
    pub fn entries_for(&self, technology: Technology) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(move |e| e.technology == technology)
    }

    /// Entry with the highest speedup
    pub fn best(&self) -> Option<&ReportEntry> {
        self.entries
            .iter()
            .filter(|e| e.speedup.is_some())
            .max_by(|a, b| a.speedup.unwrap_or(0.0).total_cmp(&b.speedup.unwrap_or(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::UnifiedDataset;
    use crate::normalize::{Normalizer, Sources};
    use scalebench_core::{RecordSet, RunRow, TargetRow, ThreadRow};

    fn normalized() -> Normalized {
        let sources: Sources = [
            RecordSet::Baseline(vec![RunRow {
                run_index: 1,
                elapsed_seconds: Some(16.0),
            }]),
            RecordSet::SharedMemory(vec![
                ThreadRow {
                    thread_count: 4,
                    elapsed_seconds: Some(4.0),
                    speedup: None,
                },
                ThreadRow {
                    thread_count: 8,
                    elapsed_seconds: Some(0.0),
                    speedup: None,
                },
            ]),
            RecordSet::Accelerator(vec![TargetRow {
                target_value: "9999".to_string(),
                elapsed_seconds: Some(0.5),
            }]),
        ]
        .into_iter()
        .collect();
        Normalizer::default().normalize_sources(&sources)
    }

    #[test]
    fn test_speedup_and_efficiency() {
        let report = ComparisonReport::build(&normalized()).unwrap();

        let baseline = &report.entries[0];
        assert_eq!(baseline.technology, Technology::Baseline);
        assert_eq!(baseline.speedup, None);
        assert!(!baseline.fallback);

        let four = &report.entries[1];
        assert_eq!(four.speedup, Some(4.0));
        assert_eq!(four.efficiency, Some(1.0));
    }

    #[test]
    fn test_zero_elapsed_has_undefined_speedup() {
        let report = ComparisonReport::build(&normalized()).unwrap();
        let eight = &report.entries[2];
        assert_eq!(eight.elapsed_seconds, 0.0);
        assert_eq!(eight.speedup, None);
        assert_eq!(eight.efficiency, None);
    }

    #[test]
    fn test_accelerator_entry_uses_category_label() {
        let report = ComparisonReport::build(&normalized()).unwrap();
        let gpu = report.entries_for(Technology::Accelerator).next().unwrap();
        assert_eq!(gpu.unit_label, "GPU");
        assert_eq!(gpu.speedup, Some(32.0));
        assert_eq!(gpu.efficiency, None);
        assert_eq!(report.best().map(|e| e.technology), Some(Technology::Accelerator));
    }

    #[test]
    fn test_empty_dataset_is_refused() {
        let mut empty = Normalizer::default().normalize_sources(&Sources::new());
        empty.dataset = UnifiedDataset::from_measurements(Vec::new());
        assert!(matches!(
            ComparisonReport::build(&empty),
            Err(ReportError::EmptyDataset)
        ));
    }

    #[test]
    fn test_report_without_artifacts_has_fallback_baseline_row() {
        let normalized = Normalizer::default().normalize_sources(&Sources::new());
        let report = ComparisonReport::build(&normalized).unwrap();

        assert_eq!(report.entries.len(), 1);
        let baseline = &report.entries[0];
        assert_eq!(baseline.technology, Technology::Baseline);
        assert_eq!(baseline.unit_label, "1");
        assert_eq!(baseline.elapsed_seconds, 17.8);
        assert!(baseline.fallback);
        assert!(report.baseline.is_fallback());
    }
}
