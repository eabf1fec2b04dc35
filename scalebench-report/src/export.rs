//! Unified CSV Export
//!
//! Unified dataset with derived speedup, one row per measurement:
//! `technology,parallelism_unit,elapsed_seconds,speedup`. The accelerator's
//! unit column holds its category label, never the synthetic position.

use crate::comparison::ComparisonReport;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ExportRow<'a> {
    technology: &'a str,
    parallelism_unit: &'a str,
    elapsed_seconds: f64,
    speedup: Option<f64>,
}

/// Write the unified CSV export
pub fn write_csv_export<W: Write>(report: &ComparisonReport, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for entry in &report.entries {
        wtr.serialize(ExportRow {
            technology: entry.technology.slug(),
            parallelism_unit: &entry.unit_label,
            elapsed_seconds: entry.elapsed_seconds,
            speedup: entry.speedup,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Unified CSV export as a string
pub fn generate_csv_report(report: &ComparisonReport) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_csv_export(report, &mut buf)?;
    // serde-driven CSV output is always UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
