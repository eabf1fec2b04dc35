//! Simulated Sweep
//!
//! Collects all four technologies from in-process runners that follow
//! Amdahl's law, then prints the comparison and renders the chart.
//!
//! Run with:
//!   cargo run --example simulated_sweep                 # writes target/scalebench-demo
//!   cargo run --example simulated_sweep -- /tmp/demo    # custom data directory

use scalebench::prelude::*;
use scalebench::{ChartLayout, Report, TargetPlan, generate_json_report, render_chart};
use std::path::PathBuf;

/// Serial time of the simulated search
const SERIAL_SECONDS: f64 = 16.0;
/// Fraction of the search that parallelizes
const PARALLEL_FRACTION: f64 = 0.92;

fn amdahl(workers: u32) -> f64 {
    SERIAL_SECONDS * ((1.0 - PARALLEL_FRACTION) + PARALLEL_FRACTION / workers as f64)
}

fn output(seconds: f64) -> TrialOutput {
    TrialOutput::success(format!(
        "Password found: 9999\nExecution Time: {:.6} seconds\n",
        seconds
    ))
}

fn main() -> anyhow::Result<()> {
    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target/scalebench-demo"));
    let store = ArtifactStore::new(&data_dir);
    let extractor = Extractor::default();

    // Three baseline runs with a little jitter
    let mut serial = |run: u32| -> Result<TrialOutput, TrialError> {
        Ok(output(SERIAL_SECONDS + 0.1 * run as f64))
    };
    Collector::new(Technology::Baseline, &extractor, &store)
        .run(&[1, 2, 3], &mut serial, &mut ())?;

    // Threads share memory: close to the ideal curve
    let mut threads = |level: u32| -> Result<TrialOutput, TrialError> { Ok(output(amdahl(level))) };
    Collector::new(Technology::SharedMemory, &extractor, &store)
        .baseline_seconds(Some(SERIAL_SECONDS))
        .run(&[1, 2, 4, 8, 16], &mut threads, &mut ())?;

    // Processes pay a per-rank messaging cost; 16 ranks "crash"
    let mut processes = |level: u32| -> Result<TrialOutput, TrialError> {
        if level == 16 {
            return Ok(TrialOutput::success("mpirun noticed that process rank 3 exited"));
        }
        Ok(output(amdahl(level) + 0.05 * level as f64))
    };
    Collector::new(Technology::DistributedMemory, &extractor, &store)
        .baseline_seconds(Some(SERIAL_SECONDS))
        .run(&[1, 2, 4, 8, 16], &mut processes, &mut ())?;

    // Accelerator: easy and hard target
    let mut device = |level: u32| -> Result<TrialOutput, TrialError> {
        Ok(output(if level == 1 { 0.05 } else { 0.42 }))
    };
    Collector::new(Technology::Accelerator, &extractor, &store)
        .targets(TargetPlan::PerLevel(vec![
            "0001".to_string(),
            "9999".to_string(),
        ]))
        .run(&[1, 2], &mut device, &mut ())?;

    let normalized = Normalizer::default().normalize(&store)?;
    let comparison = ComparisonReport::build(&normalized)?;

    for entry in &comparison.entries {
        println!(
            "{:<20} {:>4}  {:>8.3}s  {}",
            entry.label,
            entry.unit_label,
            entry.elapsed_seconds,
            entry
                .speedup
                .map(|s| format!("{:.2}x", s))
                .unwrap_or_else(|| "-".to_string())
        );
    }

    let chart = data_dir.join("master_comparison_graph.svg");
    render_chart(
        &ChartLayout::from_report(&comparison, "Simulated Comparison"),
        &chart,
        (1200, 700),
    )?;
    println!("\nChart: {}", chart.display());

    let report = Report::new(scalebench_cli::build_report_meta(), &comparison);
    std::fs::write(data_dir.join("report.json"), generate_json_report(&report)?)?;
    println!("Report: {}", data_dir.join("report.json").display());

    Ok(())
}
