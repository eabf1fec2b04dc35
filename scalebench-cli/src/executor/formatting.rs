//! Output Formatting
//!
//! Human-readable terminal rendering of a comparison report:
//! - Baseline time and its provenance
//! - Per-technology table of elapsed time, speedup and efficiency
//! - Best speedup
//! - Normalization warnings

use scalebench_report::{BaselineSource, Report, ReportEntry};

fn entry_label(entry: &ReportEntry) -> String {
    if entry.fallback {
        format!("{} (fallback)", entry.label)
    } else {
        entry.label.clone()
    }
}

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("ScaleBench Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    match report.baseline.source {
        BaselineSource::Measured { runs, std_dev } => output.push_str(&format!(
            "Baseline: {:.4}s (mean of {} runs, stddev {:.4}s)\n\n",
            report.baseline.seconds, runs, std_dev
        )),
        BaselineSource::Fallback => output.push_str(&format!(
            "Baseline: {:.4}s (fallback, no baseline runs available)\n\n",
            report.baseline.seconds
        )),
    }

    let label_width = report
        .entries
        .iter()
        .map(|e| entry_label(e).len())
        .max()
        .unwrap_or(10)
        .max("Technology".len());

    output.push_str(&format!(
        "  {:<width$}  {:>8}  {:>12}  {:>9}  {:>10}\n",
        "Technology",
        "Unit",
        "Elapsed (s)",
        "Speedup",
        "Efficiency",
        width = label_width
    ));
    output.push_str(&format!("  {}\n", "-".repeat(label_width + 49)));

    let mut previous = None;
    for entry in &report.entries {
        if previous.is_some() && previous != Some(entry.technology) {
            output.push('\n');
        }
        previous = Some(entry.technology);

        let speedup = entry
            .speedup
            .map(|s| format!("{:.2}x", s))
            .unwrap_or_else(|| "-".to_string());
        let efficiency = entry
            .efficiency
            .map(|e| format!("{:.1}%", e * 100.0))
            .unwrap_or_else(|| "-".to_string());

        output.push_str(&format!(
            "  {:<width$}  {:>8}  {:>12.4}  {:>9}  {:>10}\n",
            entry_label(entry),
            entry.unit_label,
            entry.elapsed_seconds,
            speedup,
            efficiency,
            width = label_width
        ));
    }

    if let Some(best) = &report.summary.best {
        output.push_str(&format!(
            "\nBest speedup: {:.2}x ({} at {})\n",
            best.speedup, best.technology, best.unit
        ));
    }

    if !report.warnings.is_empty() {
        output.push_str(&format!("\nWarnings ({})\n", report.warnings.len()));
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for warning in &report.warnings {
            output.push_str(&format!("  ! {}\n", warning));
        }
    }

    output.push_str(&format!(
        "\n{} measurements across {} technologies\n",
        report.summary.measurements,
        report.summary.technologies.len()
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::build_report_meta;
    use scalebench_core::{RecordSet, RunRow, TargetRow, ThreadRow};
    use scalebench_report::{ComparisonReport, Normalizer, Sources};

    fn report(with_baseline: bool) -> Report {
        let mut sets = vec![
            RecordSet::SharedMemory(vec![
                ThreadRow {
                    thread_count: 1,
                    elapsed_seconds: Some(13.0),
                    speedup: None,
                },
                ThreadRow {
                    thread_count: 4,
                    elapsed_seconds: Some(3.25),
                    speedup: None,
                },
            ]),
            RecordSet::Accelerator(vec![TargetRow {
                target_value: "9999".to_string(),
                elapsed_seconds: Some(0.42),
            }]),
        ];
        if with_baseline {
            sets.push(RecordSet::Baseline(vec![
                RunRow {
                    run_index: 1,
                    elapsed_seconds: Some(12.0),
                },
                RunRow {
                    run_index: 2,
                    elapsed_seconds: Some(14.0),
                },
            ]));
        }
        let sources: Sources = sets.into_iter().collect();
        let comparison =
            ComparisonReport::build(&Normalizer::default().normalize_sources(&sources)).unwrap();
        Report::new(build_report_meta(), &comparison)
    }

    #[test]
    fn test_table_rows() {
        let text = format_human_output(&report(true));
        assert!(text.contains("Baseline: 13.0000s (mean of 2 runs"));
        assert!(text.contains("4.00x"));
        assert!(text.contains("100.0%"));
        assert!(text.contains("GPU"));
        assert!(!text.contains("Warnings"));
    }

    #[test]
    fn test_fallback_and_warnings_shown() {
        let text = format_human_output(&report(false));
        assert!(text.contains("(fallback"));
        assert!(text.contains("Serial (fallback)"));
        assert!(text.contains("Warnings ("));
    }
}
