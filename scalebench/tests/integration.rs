//! Integration tests for ScaleBench
//!
//! Sweeps are driven by in-process runners that print what the real search
//! programs print, persisted to a temporary data directory, then normalized
//! and compared from the files on disk.

use scalebench::{
    ArtifactStore, Collector, ComparisonReport, Extractor, NormalizeWarning, Normalizer,
    ParallelismUnit, RecordSet, SkipReason, TargetPlan, Technology, TrialError, TrialOutput,
    generate_csv_report,
};
use scalebench_core::{ProcessRow, RunRow, TargetRow, ThreadRow};
use tempfile::TempDir;

fn timing(seconds: f64) -> TrialOutput {
    TrialOutput::success(format!(
        "Cracking hash...\nPassword found: 9999\nExecution Time: {} seconds\n",
        seconds
    ))
}

fn write_sample_data(store: &ArtifactStore) {
    store
        .write(&RecordSet::Baseline(vec![
            RunRow {
                run_index: 1,
                elapsed_seconds: Some(12.0),
            },
            RunRow {
                run_index: 2,
                elapsed_seconds: Some(14.0),
            },
            RunRow {
                run_index: 3,
                elapsed_seconds: Some(13.0),
            },
        ]))
        .unwrap();
    store
        .write(&RecordSet::SharedMemory(vec![
            ThreadRow {
                thread_count: 1,
                elapsed_seconds: Some(13.1),
                speedup: Some(0.99),
            },
            ThreadRow {
                thread_count: 4,
                elapsed_seconds: Some(3.5),
                speedup: Some(3.71),
            },
        ]))
        .unwrap();
    store
        .write(&RecordSet::DistributedMemory(vec![
            ProcessRow {
                process_count: 2,
                elapsed_seconds: Some(6.8),
                speedup: Some(1.91),
            },
            ProcessRow {
                process_count: 8,
                elapsed_seconds: Some(2.0),
                speedup: Some(6.5),
            },
        ]))
        .unwrap();
    store
        .write(&RecordSet::Accelerator(vec![
            TargetRow {
                target_value: "9999".to_string(),
                elapsed_seconds: Some(0.42),
            },
            TargetRow {
                target_value: "0001".to_string(),
                elapsed_seconds: Some(0.05),
            },
        ]))
        .unwrap();
}

#[test]
fn test_failed_level_is_skipped_and_rest_persisted() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    let extractor = Extractor::default();

    let mut runner = |level: u32| -> Result<TrialOutput, TrialError> {
        if level == 4 {
            Ok(TrialOutput::success("Segmentation fault"))
        } else {
            Ok(timing(16.0 / level as f64))
        }
    };

    let collection = Collector::new(Technology::SharedMemory, &extractor, &store)
        .baseline_seconds(Some(16.0))
        .run(&[1, 2, 4, 8, 16], &mut runner, &mut ())
        .unwrap();

    assert_eq!(collection.sweep.skipped.len(), 1);
    assert!(matches!(
        collection.sweep.skipped[0].reason,
        SkipReason::Unparseable { .. }
    ));

    let Some(RecordSet::SharedMemory(rows)) = store.read(Technology::SharedMemory).unwrap()
    else {
        panic!("shared-memory artifact missing");
    };
    let units: Vec<u32> = rows.iter().map(|r| r.thread_count).collect();
    assert_eq!(units, vec![1, 2, 8, 16]);
    assert_eq!(rows[3].speedup, Some(16.0));
}

#[test]
fn test_not_found_is_distinct_from_unparseable() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    let extractor = Extractor::default();

    let mut runner = |level: u32| -> Result<TrialOutput, TrialError> {
        match level {
            1 => Ok(TrialOutput::success(
                "Password not found.\nExecution Time: 30.0 seconds",
            )),
            2 => Err(TrialError::Timeout { seconds: 600.0 }),
            _ => Ok(timing(1.5)),
        }
    };

    let collection = Collector::new(Technology::Accelerator, &extractor, &store)
        .targets(TargetPlan::PerLevel(vec![
            "0001".to_string(),
            "5000".to_string(),
            "9999".to_string(),
        ]))
        .run(&[1, 2, 3], &mut runner, &mut ())
        .unwrap();

    let summary = collection.sweep.summary();
    assert_eq!(summary.not_found, 1);
    assert_eq!(summary.launch_failed, 1);
    assert_eq!(summary.succeeded, 1);

    let Some(RecordSet::Accelerator(rows)) = store.read(Technology::Accelerator).unwrap() else {
        panic!("accelerator artifact missing");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].target_value, "9999");
}

#[test]
fn test_baseline_mean_and_accelerator_selection() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    write_sample_data(&store);

    let normalized = Normalizer::default().normalize(&store).unwrap();
    assert!(!normalized.baseline.is_fallback());
    assert!((normalized.baseline.seconds - 13.0).abs() < 1e-9);

    let baseline: Vec<_> = normalized
        .dataset
        .for_technology(Technology::Baseline)
        .collect();
    assert_eq!(baseline.len(), 1);
    assert_eq!(baseline[0].parallelism_unit, ParallelismUnit::Workers(1));

    let accelerator: Vec<_> = normalized
        .dataset
        .for_technology(Technology::Accelerator)
        .collect();
    assert_eq!(accelerator.len(), 1);
    assert_eq!(accelerator[0].elapsed_seconds, 0.42);
    // max worker count 8 plus the default gap of 2
    assert_eq!(accelerator[0].parallelism_unit, ParallelismUnit::Placeholder(10));
    assert_eq!(normalized.accelerator_target.as_deref(), Some("9999"));
}

#[test]
fn test_missing_source_shrinks_dataset() {
    let full_dir = TempDir::new().unwrap();
    let full_store = ArtifactStore::new(full_dir.path());
    write_sample_data(&full_store);
    let full = Normalizer::default().normalize(&full_store).unwrap();

    let partial_dir = TempDir::new().unwrap();
    let partial_store = ArtifactStore::new(partial_dir.path());
    write_sample_data(&partial_store);
    std::fs::remove_file(partial_store.path(Technology::SharedMemory)).unwrap();
    let partial = Normalizer::default().normalize(&partial_store).unwrap();

    assert_eq!(partial.dataset.len(), full.dataset.len() - 2);
    assert!(partial.warnings.iter().any(|w| matches!(
        w,
        NormalizeWarning::SourceUnavailable {
            technology: Technology::SharedMemory,
            ..
        }
    )));
    // remaining technologies are untouched
    assert_eq!(
        partial
            .dataset
            .for_technology(Technology::DistributedMemory)
            .count(),
        2
    );
}

#[test]
fn test_fallback_baseline_when_missing() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    write_sample_data(&store);
    std::fs::remove_file(store.path(Technology::Baseline)).unwrap();

    let normalized = Normalizer::default().normalize(&store).unwrap();
    assert!(normalized.baseline.is_fallback());
    assert_eq!(normalized.baseline.seconds, 17.8);
    let baseline: Vec<_> = normalized
        .dataset
        .for_technology(Technology::Baseline)
        .collect();
    assert_eq!(baseline.len(), 1);
    assert_eq!(baseline[0].parallelism_unit, ParallelismUnit::Workers(1));
    assert_eq!(baseline[0].elapsed_seconds, 17.8);

    let report = ComparisonReport::build(&normalized).unwrap();
    assert!(report.entries_for(Technology::Baseline).all(|e| e.fallback));
    let csv = generate_csv_report(&report).unwrap();
    assert!(csv.contains("baseline,1,17.8,\n"));
    let eight = report
        .entries_for(Technology::DistributedMemory)
        .find(|e| e.unit_label == "8")
        .unwrap();
    assert!((eight.speedup.unwrap() - 8.9).abs() < 1e-9);
}

#[test]
fn test_normalization_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    write_sample_data(&store);

    let first = Normalizer::default().normalize(&store).unwrap();
    let second = Normalizer::default().normalize(&store).unwrap();
    assert_eq!(first.dataset, second.dataset);

    let csv_a = generate_csv_report(&ComparisonReport::build(&first).unwrap()).unwrap();
    let csv_b = generate_csv_report(&ComparisonReport::build(&second).unwrap()).unwrap();
    assert_eq!(csv_a, csv_b);
    assert!(csv_a.contains("accelerator,GPU,0.42,"));
}

#[test]
fn test_empty_data_dir_reports_fallback_baseline_only() {
    let dir = TempDir::new().unwrap();
    let normalized = Normalizer::default()
        .normalize(&ArtifactStore::new(dir.path()))
        .unwrap();
    assert_eq!(normalized.dataset.len(), 1);

    let report = ComparisonReport::build(&normalized).unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].technology, Technology::Baseline);
    assert!(report.entries[0].fallback);
    assert!(report.best().is_none());
    assert!(
        report
            .warnings
            .contains(&NormalizeWarning::BaselineFallback { seconds: 17.8 })
    );
}

#[test]
fn test_collect_then_report_end_to_end() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    let extractor = Extractor::default();

    let mut serial = |_run: u32| -> Result<TrialOutput, TrialError> { Ok(timing(16.0)) };
    Collector::new(Technology::Baseline, &extractor, &store)
        .run(&[1, 2, 3], &mut serial, &mut ())
        .unwrap();

    let mut threads =
        |level: u32| -> Result<TrialOutput, TrialError> { Ok(timing(16.0 / level as f64)) };
    Collector::new(Technology::SharedMemory, &extractor, &store)
        .baseline_seconds(Some(16.0))
        .run(&[1, 2, 4], &mut threads, &mut ())
        .unwrap();

    let report = ComparisonReport::build(&Normalizer::default().normalize(&store).unwrap())
        .unwrap();
    let best = report.best().unwrap();
    assert_eq!(best.technology, Technology::SharedMemory);
    assert_eq!(best.unit_label, "4");
    assert!((best.speedup.unwrap() - 4.0).abs() < 1e-9);
    assert!((best.efficiency.unwrap() - 1.0).abs() < 1e-9);
}
