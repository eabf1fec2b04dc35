//! Unified Dataset

use scalebench_core::{Measurement, Technology};
use serde::Serialize;

/// Measurements of every technology, ordered by technology declaration
/// order then axis position
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UnifiedDataset {
    measurements: Vec<Measurement>,
}

impl UnifiedDataset {
    /// Build from measurements in any order (stable sort)
    pub fn from_measurements(mut measurements: Vec<Measurement>) -> Self {
        measurements.sort_by_key(|m| (m.technology, m.parallelism_unit.position()));
        Self { measurements }
    }

    /// Number of measurements
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// Whether there are no measurements
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Measurements in order
    pub fn iter(&self) -> impl Iterator<Item = &Measurement> {
        self.measurements.iter()
    }

    /// Measurements as a slice
    pub fn as_slice(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Measurements of one technology, in order
    pub fn for_technology(&self, technology: Technology) -> impl Iterator<Item = &Measurement> {
        self.measurements
            .iter()
            .filter(move |m| m.technology == technology)
    }

    /// Technologies present, in declaration order
    pub fn technologies(&self) -> Vec<Technology> {
        let mut techs: Vec<Technology> = self.measurements.iter().map(|m| m.technology).collect();
        techs.dedup();
        techs
    }

    /// Largest real worker count present
    pub fn max_workers(&self) -> Option<u32> {
        self.measurements
            .iter()
            .filter_map(|m| m.parallelism_unit.workers())
            .max()
    }
}

impl<'a> IntoIterator for &'a UnifiedDataset {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.measurements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalebench_core::ParallelismUnit;

    #[test]
    fn test_sorted_on_construction() {
        let dataset = UnifiedDataset::from_measurements(vec![
            Measurement::workers(Technology::DistributedMemory, 4, 3.0),
            Measurement::workers(Technology::SharedMemory, 8, 2.0),
            Measurement::workers(Technology::SharedMemory, 2, 7.0),
            Measurement::workers(Technology::Baseline, 1, 13.0),
        ]);
        assert_eq!(
            dataset.technologies(),
            vec![
                Technology::Baseline,
                Technology::SharedMemory,
                Technology::DistributedMemory
            ]
        );
        let shared: Vec<u32> = dataset
            .for_technology(Technology::SharedMemory)
            .map(|m| m.parallelism_unit.position())
            .collect();
        assert_eq!(shared, vec![2, 8]);
    }

    #[test]
    fn test_max_workers_ignores_placeholder() {
        let dataset = UnifiedDataset::from_measurements(vec![
            Measurement::workers(Technology::SharedMemory, 16, 1.2),
            Measurement {
                technology: Technology::Accelerator,
                parallelism_unit: ParallelismUnit::Placeholder(18),
                elapsed_seconds: 0.4,
            },
        ]);
        assert_eq!(dataset.max_workers(), Some(16));
        assert_eq!(UnifiedDataset::default().max_workers(), None);
    }

    #[test]
    fn test_equal_keys_keep_input_order() {
        let dataset = UnifiedDataset::from_measurements(vec![
            Measurement::workers(Technology::SharedMemory, 2, 9.0),
            Measurement::workers(Technology::SharedMemory, 2, 8.0),
        ]);
        assert_eq!(dataset.as_slice()[0].elapsed_seconds, 9.0);
    }
}
