//! Report Data Structures

use crate::comparison::{ComparisonReport, ReportEntry};
use crate::normalize::{BaselineTime, NormalizeWarning};
use chrono::{DateTime, Utc};
use scalebench_core::Technology;
use serde::Serialize;

/// Current JSON report schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Complete comparison report
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub baseline: BaselineTime,
    pub entries: Vec<ReportEntry>,
    pub warnings: Vec<NormalizeWarning>,
    pub summary: ReportSummary,
}

/// Report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub schema_version: u32,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub git_commit: Option<String>,
    pub git_branch: Option<String>,
    pub system: SystemInfo,
}

/// System information
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpu: String,
    pub cpu_cores: u32,
    pub memory_gb: f64,
}

/// Headline numbers
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    /// Technologies with at least one measurement
    pub technologies: Vec<Technology>,
    /// Number of measurements
    pub measurements: usize,
    /// Technology and unit of the highest speedup
    pub best: Option<BestEntry>,
    /// Number of warnings raised
    pub warnings: usize,
}

/// Highest-speedup entry
#[derive(Debug, Clone, Serialize)]
pub struct BestEntry {
    pub technology: Technology,
    pub unit: String,
    pub speedup: f64,
}

impl Report {
    /// Combine a comparison with run metadata
    pub fn new(meta: ReportMeta, comparison: &ComparisonReport) -> Self {
        let mut technologies: Vec<Technology> =
            comparison.entries.iter().map(|e| e.technology).collect();
        technologies.dedup();

        let best = comparison.best().and_then(|e| {
            e.speedup.map(|speedup| BestEntry {
                technology: e.technology,
                unit: e.unit_label.clone(),
                speedup,
            })
        });

        Self {
            meta,
            baseline: comparison.baseline,
            entries: comparison.entries.clone(),
            warnings: comparison.warnings.clone(),
            summary: ReportSummary {
                technologies,
                measurements: comparison.entries.len(),
                best,
                warnings: comparison.warnings.len(),
            },
        }
    }
}
