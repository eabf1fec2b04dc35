//! Persisted Record-Set Schemas
//!
//! Each technology persists its trials with its own column set:
//!
//! | Technology | Columns |
//! |------------|---------|
//! | Baseline | `run_index, elapsed_seconds` |
//! | SharedMemory | `thread_count, elapsed_seconds, speedup` |
//! | DistributedMemory | `process_count, elapsed_seconds, speedup` |
//! | Accelerator | `target_value, elapsed_seconds` (other columns ignored) |
//!
//! Older collection scripts wrote capitalized headers (`Run`, `Time`,
//! `Threads`, `Processes`, `Password`, `Execution Time (s)`); those are
//! accepted as aliases on read. An empty or non-numeric `elapsed_seconds`
//! decodes to `None` and is left for the normalizer to reject.

use crate::collector::Trial;
use crate::model::{Measurement, Technology, is_valid_elapsed};
use crate::trial::TargetPlan;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Baseline row: one repeated run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRow {
    /// 1-based run number
    #[serde(alias = "Run")]
    pub run_index: u32,
    /// Elapsed seconds, absent if unreadable
    #[serde(alias = "Time", default, deserialize_with = "csv::invalid_option")]
    pub elapsed_seconds: Option<f64>,
}

/// Shared-memory row: one thread count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadRow {
    /// Worker threads used
    #[serde(alias = "Threads")]
    pub thread_count: u32,
    /// Elapsed seconds, absent if unreadable
    #[serde(alias = "Time", default, deserialize_with = "csv::invalid_option")]
    pub elapsed_seconds: Option<f64>,
    /// Speedup recorded at collection time (informational)
    #[serde(alias = "Speedup", default, deserialize_with = "csv::invalid_option")]
    pub speedup: Option<f64>,
}

/// Distributed-memory row: one process count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRow {
    /// Worker processes used
    #[serde(alias = "Processes")]
    pub process_count: u32,
    /// Elapsed seconds, absent if unreadable
    #[serde(alias = "Time", default, deserialize_with = "csv::invalid_option")]
    pub elapsed_seconds: Option<f64>,
    /// Speedup recorded at collection time (informational)
    #[serde(alias = "Speedup", default, deserialize_with = "csv::invalid_option")]
    pub speedup: Option<f64>,
}

/// Accelerator row: one search target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRow {
    /// Search target, kept verbatim (leading zeros matter)
    #[serde(alias = "Password")]
    pub target_value: String,
    /// Elapsed seconds, absent if unreadable
    #[serde(
        alias = "Execution Time (s)",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub elapsed_seconds: Option<f64>,
}

/// A row that could not become a measurement
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 0-based row index within the record-set (header excluded)
    pub row: usize,
    /// Raw elapsed value, `None` when the field was empty or unreadable
    pub elapsed_seconds: Option<f64>,
}

/// One technology's persisted trials, in that technology's native schema
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSet {
    /// Repeated sequential runs
    Baseline(Vec<RunRow>),
    /// Thread-count sweep
    SharedMemory(Vec<ThreadRow>),
    /// Process-count sweep
    DistributedMemory(Vec<ProcessRow>),
    /// Per-target accelerator trials
    Accelerator(Vec<TargetRow>),
}

impl RecordSet {
    /// Empty record-set for a technology
    pub fn empty(technology: Technology) -> Self {
        match technology {
            Technology::Baseline => RecordSet::Baseline(Vec::new()),
            Technology::SharedMemory => RecordSet::SharedMemory(Vec::new()),
            Technology::DistributedMemory => RecordSet::DistributedMemory(Vec::new()),
            Technology::Accelerator => RecordSet::Accelerator(Vec::new()),
        }
    }

    /// Build a record-set from successful sweep trials.
    ///
    /// `baseline_seconds` fills the `speedup` column of worker-scaled rows;
    /// `targets` supplies the accelerator's `target_value` per level.
    pub fn from_trials(
        technology: Technology,
        trials: &[Trial],
        baseline_seconds: Option<f64>,
        targets: &TargetPlan,
    ) -> Self {
        let speedup = |elapsed: f64| match baseline_seconds {
            Some(base) if elapsed > 0.0 => Some(base / elapsed),
            _ => None,
        };

        match technology {
            Technology::Baseline => RecordSet::Baseline(
                trials
                    .iter()
                    .map(|t| RunRow {
                        run_index: t.level,
                        elapsed_seconds: Some(t.elapsed_seconds),
                    })
                    .collect(),
            ),
            Technology::SharedMemory => RecordSet::SharedMemory(
                trials
                    .iter()
                    .map(|t| ThreadRow {
                        thread_count: t.level,
                        elapsed_seconds: Some(t.elapsed_seconds),
                        speedup: speedup(t.elapsed_seconds),
                    })
                    .collect(),
            ),
            Technology::DistributedMemory => RecordSet::DistributedMemory(
                trials
                    .iter()
                    .map(|t| ProcessRow {
                        process_count: t.level,
                        elapsed_seconds: Some(t.elapsed_seconds),
                        speedup: speedup(t.elapsed_seconds),
                    })
                    .collect(),
            ),
            Technology::Accelerator => RecordSet::Accelerator(
                trials
                    .iter()
                    .map(|t| TargetRow {
                        target_value: targets
                            .target_for(t.level)
                            .map(str::to_string)
                            .unwrap_or_else(|| t.level.to_string()),
                        elapsed_seconds: Some(t.elapsed_seconds),
                    })
                    .collect(),
            ),
        }
    }

    /// Technology this record-set belongs to
    pub fn technology(&self) -> Technology {
        match self {
            RecordSet::Baseline(_) => Technology::Baseline,
            RecordSet::SharedMemory(_) => Technology::SharedMemory,
            RecordSet::DistributedMemory(_) => Technology::DistributedMemory,
            RecordSet::Accelerator(_) => Technology::Accelerator,
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        match self {
            RecordSet::Baseline(rows) => rows.len(),
            RecordSet::SharedMemory(rows) => rows.len(),
            RecordSet::DistributedMemory(rows) => rows.len(),
            RecordSet::Accelerator(rows) => rows.len(),
        }
    }

    /// Whether the record-set has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column names written for this technology
    pub fn columns(technology: Technology) -> &'static [&'static str] {
        match technology {
            Technology::Baseline => &["run_index", "elapsed_seconds"],
            Technology::SharedMemory => &["thread_count", "elapsed_seconds", "speedup"],
            Technology::DistributedMemory => &["process_count", "elapsed_seconds", "speedup"],
            Technology::Accelerator => &["target_value", "elapsed_seconds"],
        }
    }

    /// Decode a record-set for `technology` from CSV with a header row
    pub fn read_csv<R: Read>(technology: Technology, reader: R) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Ok(match technology {
            Technology::Baseline => RecordSet::Baseline(decode_rows(&mut rdr)?),
            Technology::SharedMemory => RecordSet::SharedMemory(decode_rows(&mut rdr)?),
            Technology::DistributedMemory => RecordSet::DistributedMemory(decode_rows(&mut rdr)?),
            Technology::Accelerator => RecordSet::Accelerator(decode_rows(&mut rdr)?),
        })
    }

    /// Encode as CSV with this technology's header row.
    ///
    /// The header is written even when there are no rows, so an empty sweep
    /// still leaves a readable artifact.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        wtr.write_record(Self::columns(self.technology()))?;
        match self {
            RecordSet::Baseline(rows) => encode_rows(&mut wtr, rows)?,
            RecordSet::SharedMemory(rows) => encode_rows(&mut wtr, rows)?,
            RecordSet::DistributedMemory(rows) => encode_rows(&mut wtr, rows)?,
            RecordSet::Accelerator(rows) => encode_rows(&mut wtr, rows)?,
        }
        wtr.flush()?;
        Ok(())
    }

    /// Valid `(worker count, elapsed)` pairs of a worker-scaled or baseline
    /// record-set, in row order, plus the rows that had no usable time.
    ///
    /// Accelerator rows have no worker count and yield nothing here; see
    /// [`RecordSet::target_timings`].
    pub fn worker_measurements(&self) -> (Vec<Measurement>, Vec<RejectedRow>) {
        let technology = self.technology();
        let pairs: Vec<(u32, Option<f64>)> = match self {
            RecordSet::Baseline(rows) => rows.iter().map(|r| (1, r.elapsed_seconds)).collect(),
            RecordSet::SharedMemory(rows) => rows
                .iter()
                .map(|r| (r.thread_count, r.elapsed_seconds))
                .collect(),
            RecordSet::DistributedMemory(rows) => rows
                .iter()
                .map(|r| (r.process_count, r.elapsed_seconds))
                .collect(),
            RecordSet::Accelerator(_) => Vec::new(),
        };

        let mut accepted = Vec::with_capacity(pairs.len());
        let mut rejected = Vec::new();
        for (row, (workers, elapsed)) in pairs.into_iter().enumerate() {
            match elapsed {
                Some(seconds) if is_valid_elapsed(seconds) && workers > 0 => {
                    accepted.push(Measurement::workers(technology, workers, seconds));
                }
                _ => rejected.push(RejectedRow {
                    row,
                    elapsed_seconds: elapsed,
                }),
            }
        }
        (accepted, rejected)
    }

    /// Valid `(target, elapsed)` pairs of an accelerator record-set, plus the
    /// rows that had no usable time. Empty for other technologies.
    pub fn target_timings(&self) -> (Vec<(&str, f64)>, Vec<RejectedRow>) {
        let RecordSet::Accelerator(rows) = self else {
            return (Vec::new(), Vec::new());
        };
        let mut accepted = Vec::with_capacity(rows.len());
        let mut rejected = Vec::new();
        for (row, r) in rows.iter().enumerate() {
            match r.elapsed_seconds {
                Some(seconds) if is_valid_elapsed(seconds) => {
                    accepted.push((r.target_value.as_str(), seconds));
                }
                other => rejected.push(RejectedRow {
                    row,
                    elapsed_seconds: other,
                }),
            }
        }
        (accepted, rejected)
    }
}

fn decode_rows<R: Read, T: DeserializeOwned>(
    rdr: &mut csv::Reader<R>,
) -> Result<Vec<T>, csv::Error> {
    rdr.deserialize().collect()
}

fn encode_rows<W: Write, T: Serialize>(
    wtr: &mut csv::Writer<W>,
    rows: &[T],
) -> Result<(), csv::Error> {
    for row in rows {
        wtr.serialize(row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(level: u32, elapsed_seconds: f64) -> Trial {
        Trial {
            level,
            elapsed_seconds,
        }
    }

    fn to_string(set: &RecordSet) -> String {
        let mut buf = Vec::new();
        set.write_csv(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_shared_memory_columns_and_speedup() {
        let set = RecordSet::from_trials(
            Technology::SharedMemory,
            &[trial(1, 16.0), trial(2, 8.0)],
            Some(16.0),
            &TargetPlan::Fixed("9999".into()),
        );
        assert_eq!(
            to_string(&set),
            "thread_count,elapsed_seconds,speedup\n1,16.0,1.0\n2,8.0,2.0\n"
        );
    }

    #[test]
    fn test_speedup_left_empty_without_baseline() {
        let set = RecordSet::from_trials(
            Technology::DistributedMemory,
            &[trial(4, 2.5)],
            None,
            &TargetPlan::Fixed("9999".into()),
        );
        assert_eq!(
            to_string(&set),
            "process_count,elapsed_seconds,speedup\n4,2.5,\n"
        );
    }

    #[test]
    fn test_empty_set_still_has_header() {
        let set = RecordSet::empty(Technology::Baseline);
        assert_eq!(to_string(&set), "run_index,elapsed_seconds\n");
        let back = RecordSet::read_csv(Technology::Baseline, to_string(&set).as_bytes()).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn test_accelerator_targets_from_plan() {
        let plan = TargetPlan::PerLevel(vec!["0001".into(), "9999".into()]);
        let set = RecordSet::from_trials(
            Technology::Accelerator,
            &[trial(1, 0.05), trial(2, 0.42)],
            None,
            &plan,
        );
        let RecordSet::Accelerator(rows) = &set else {
            panic!("expected accelerator rows");
        };
        assert_eq!(rows[0].target_value, "0001");
        assert_eq!(rows[1].target_value, "9999");
    }

    #[test]
    fn test_legacy_headers_are_accepted() {
        let serial = "Run,Time\n1,17.5\n2,18.1\n";
        let set = RecordSet::read_csv(Technology::Baseline, serial.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);

        let omp = "Threads,Time,Speedup\n1,17.9,1.0\n2,9.0,1.98\n";
        let set = RecordSet::read_csv(Technology::SharedMemory, omp.as_bytes()).unwrap();
        let (measurements, rejected) = set.worker_measurements();
        assert!(rejected.is_empty());
        assert_eq!(measurements[1], Measurement::workers(Technology::SharedMemory, 2, 9.0));

        let cuda = "Password,Execution Time (s),Blocks\n9999,0.42,256\n0001,0.05,256\n";
        let set = RecordSet::read_csv(Technology::Accelerator, cuda.as_bytes()).unwrap();
        let (timings, _) = set.target_timings();
        assert_eq!(timings, vec![("9999", 0.42), ("0001", 0.05)]);
    }

    #[test]
    fn test_target_value_keeps_leading_zeros() {
        let csv = "target_value,elapsed_seconds\n0001,0.05\n";
        let set = RecordSet::read_csv(Technology::Accelerator, csv.as_bytes()).unwrap();
        let (timings, _) = set.target_timings();
        assert_eq!(timings[0].0, "0001");
    }

    #[test]
    fn test_unusable_elapsed_values_are_rejected() {
        let csv = "process_count,elapsed_seconds,speedup\n1,10.0,\n2,,\n4,oops,\n8,-1.0,\n16,1.0,\n";
        let set = RecordSet::read_csv(Technology::DistributedMemory, csv.as_bytes()).unwrap();
        let (accepted, rejected) = set.worker_measurements();
        assert_eq!(accepted.len(), 2);
        assert_eq!(
            rejected.iter().map(|r| r.row).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(rejected[2].elapsed_seconds, Some(-1.0));
    }

    #[test]
    fn test_baseline_rows_map_to_one_worker() {
        let csv = "run_index,elapsed_seconds\n1,12.0\n2,14.0\n3,13.0\n";
        let set = RecordSet::read_csv(Technology::Baseline, csv.as_bytes()).unwrap();
        let (accepted, _) = set.worker_measurements();
        assert!(
            accepted
                .iter()
                .all(|m| m.parallelism_unit.workers() == Some(1))
        );
    }

    #[test]
    fn test_missing_key_column_is_an_error() {
        let csv = "elapsed_seconds\n1.0\n";
        assert!(RecordSet::read_csv(Technology::SharedMemory, csv.as_bytes()).is_err());
    }
}
