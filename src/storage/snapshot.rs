//! Snapshot file handling
//!
//! Writes go to a temporary file next to the destination which is then
//! renamed over it, so a reader never sees a half-written snapshot.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::LinkStore;
use crate::errors::{DecaylinkError, Result};

const TEMP_PREFIX: &str = ".decaylink-snapshot-";

/// What [`SnapshotFile::load_into`] found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotLoad {
    /// No snapshot yet; the store was left alone.
    Absent,
    /// The store now holds this many records from the snapshot.
    Loaded(usize),
}

#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Import the snapshot into `store`.
    ///
    /// A missing file is not an error. A file that exists but cannot be read
    /// or parsed is, and leaves `store` untouched.
    pub fn load_into(&self, store: &LinkStore) -> Result<SnapshotLoad> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SnapshotLoad::Absent),
            Err(e) => {
                return Err(DecaylinkError::file_operation(format!(
                    "Failed to open snapshot {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let count = store.import(BufReader::new(file))?;
        Ok(SnapshotLoad::Loaded(count))
    }

    /// Dump `store` into a temporary sibling file and atomically move it into
    /// place. On failure the previous snapshot is left as it was.
    pub fn write_from(&self, store: &LinkStore) -> Result<()> {
        let destination = std::path::absolute(&self.path).map_err(|e| {
            DecaylinkError::file_operation(format!(
                "Failed to resolve snapshot path {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let dir = destination.parent().unwrap_or_else(|| Path::new("."));

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| {
                DecaylinkError::file_operation(format!(
                    "Failed to create temporary snapshot in {}: {}",
                    dir.display(),
                    e
                ))
            })?;

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            store.dump(&mut writer)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        // 未 persist 的临时文件在 drop 时自动删除
        temp.persist(&destination).map_err(|e| {
            DecaylinkError::file_operation(format!(
                "Failed to move snapshot into {}: {}",
                destination.display(),
                e.error
            ))
        })?;

        debug!("Snapshot written to {}", destination.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use url::Url;

    #[test]
    fn test_absent_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let snapshot = SnapshotFile::new(dir.path().join("missing.json"));
        let store = LinkStore::new();
        assert_eq!(snapshot.load_into(&store).unwrap(), SnapshotLoad::Absent);
    }

    #[test]
    fn test_write_leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let snapshot = SnapshotFile::new(dir.path().join("links.json"));
        let store = LinkStore::new();
        store
            .submit(Url::parse("https://example.com").unwrap(), 4, None, 0)
            .unwrap();

        snapshot.write_from(&store).unwrap();
        snapshot.write_from(&store).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["links.json".to_string()]);
    }

    #[test]
    fn test_directory_in_place_of_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let snapshot = SnapshotFile::new(dir.path());
        let store = LinkStore::new();
        assert!(snapshot.load_into(&store).is_err());
    }
}
