//! Artifact Store
//!
//! Where each technology's record-set lives on disk. One CSV file per
//! technology under a data directory, file names overridable.

use crate::model::Technology;
use crate::record::RecordSet;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure reading or writing a record-set artifact
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("{}: {source}", path.display())]
    Io {
        /// Artifact path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a valid record-set for its technology
    #[error("{}: {source}", path.display())]
    Csv {
        /// Artifact path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: csv::Error,
    },
}

impl StoreError {
    /// Path of the artifact involved
    pub fn path(&self) -> &Path {
        match self {
            StoreError::Io { path, .. } | StoreError::Csv { path, .. } => path,
        }
    }
}

/// Per-technology CSV artifacts under one directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    file_names: BTreeMap<Technology, String>,
}

impl ArtifactStore {
    /// Store rooted at `dir` using `<slug>_results.csv` file names
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file_names: BTreeMap::new(),
        }
    }

    /// Override the artifact file name for one technology
    pub fn with_file_name(mut self, technology: Technology, name: impl Into<String>) -> Self {
        self.file_names.insert(technology, name.into());
        self
    }

    /// Data directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full artifact path for a technology
    pub fn path(&self, technology: Technology) -> PathBuf {
        match self.file_names.get(&technology) {
            Some(name) => self.dir.join(name),
            None => self.dir.join(technology.default_artifact()),
        }
    }

    /// Read a technology's record-set; `Ok(None)` if no artifact exists
    pub fn read(&self, technology: Technology) -> Result<Option<RecordSet>, StoreError> {
        let path = self.path(technology);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        match RecordSet::read_csv(technology, BufReader::new(file)) {
            Ok(set) => {
                tracing::debug!("Read {} rows from {}", set.len(), path.display());
                Ok(Some(set))
            }
            Err(source) => Err(StoreError::Csv { path, source }),
        }
    }

    /// Persist a record-set, replacing any previous artifact.
    ///
    /// Creates the data directory if needed and returns the written path.
    pub fn write(&self, set: &RecordSet) -> Result<PathBuf, StoreError> {
        let path = self.path(set.technology());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = File::create(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        set.write_csv(BufWriter::new(file))
            .map_err(|source| StoreError::Csv {
                path: path.clone(),
                source,
            })?;

        tracing::info!("Wrote {} rows to {}", set.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ThreadRow;
    use tempfile::TempDir;

    #[test]
    fn test_missing_artifact_is_none() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(store.read(Technology::SharedMemory).unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("data"));
        let set = RecordSet::SharedMemory(vec![ThreadRow {
            thread_count: 4,
            elapsed_seconds: Some(4.5),
            speedup: None,
        }]);

        let path = store.write(&set).unwrap();
        assert_eq!(path, dir.path().join("data/shared_memory_results.csv"));
        assert_eq!(store.read(Technology::SharedMemory).unwrap(), Some(set));
    }

    #[test]
    fn test_file_name_override() {
        let dir = TempDir::new().unwrap();
        let store =
            ArtifactStore::new(dir.path()).with_file_name(Technology::Accelerator, "cuda_results.csv");
        assert_eq!(
            store.path(Technology::Accelerator),
            dir.path().join("cuda_results.csv")
        );
        assert_eq!(
            store.path(Technology::Baseline),
            dir.path().join("baseline_results.csv")
        );
    }

    #[test]
    fn test_malformed_artifact_names_the_file() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        std::fs::write(store.path(Technology::DistributedMemory), "nonsense\n1\n").unwrap();

        let err = store.read(Technology::DistributedMemory).unwrap_err();
        assert_eq!(err.path(), store.path(Technology::DistributedMemory));
        assert!(err.to_string().contains("distributed_memory_results.csv"));
    }
}
