#![warn(missing_docs)]
//! ScaleBench Report - Normalization, Comparison and Visualization
//!
//! Turns persisted record-sets into comparative output:
//! - Schema normalization into one ordered dataset
//! - Speedup and efficiency against a single baseline time
//! - Raster/vector comparison chart (plotters)
//! - JSON (machine-readable)
//! - CSV (unified dataset export)

mod chart;
mod comparison;
mod dataset;
mod export;
mod json;
mod normalize;
mod report;

pub use chart::{
    BarLayout, ChartError, ChartFormat, ChartLayout, DEFAULT_CHART_FILE, DEFAULT_CHART_SIZE,
    ReferenceLine, Rgb, ScalingChart, SeriesLayout, Tick, render_chart, render_scaling_chart,
    technology_color,
};
pub use comparison::{ComparisonReport, ReportEntry, ReportError};
pub use dataset::UnifiedDataset;
pub use export::{generate_csv_report, write_csv_export};
pub use json::generate_json_report;
pub use normalize::{
    BaselineSource, BaselineTime, DEFAULT_ACCELERATOR_GAP, DEFAULT_ACCELERATOR_LABEL,
    DEFAULT_FALLBACK_BASELINE_SECONDS, DEFAULT_HARDEST_TARGET, NormalizeConfig, NormalizeError,
    NormalizeWarning, Normalized, Normalizer, Sources,
};
pub use report::{
    BestEntry, Report, ReportMeta, ReportSummary, SCHEMA_VERSION, SystemInfo,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON with full schema
    Json,
    /// Unified CSV export
    Csv,
    /// Human-readable terminal output
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
