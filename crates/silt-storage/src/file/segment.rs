//! Per-segment backing files.
//!
//! Each segment is stored in one file named by the decimal representation
//! of its segment id, rooted at a configurable directory. Handles are
//! opened lazily on first use and cached for the lifetime of the manager.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use silt_common::types::SegmentId;

use super::error::{IoError, IoResult};
use super::options::OpenOptions;
use super::std_io::StandardFile;

/// Opens and caches one file handle per segment.
pub struct SegmentManager {
    /// Directory holding the segment files.
    directory: PathBuf,
    /// Open handles, keyed by segment id.
    files: RwLock<HashMap<SegmentId, Arc<StandardFile>>>,
}

impl SegmentManager {
    /// Creates a manager rooted at `directory`, creating the directory if
    /// it does not exist.
    pub fn new(directory: impl Into<PathBuf>) -> IoResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| IoError::from_io_with_path(e, &directory))?;

        Ok(Self {
            directory,
            files: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the root directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the path of a segment's backing file.
    pub fn segment_path(&self, segment: SegmentId) -> PathBuf {
        self.directory.join(segment.as_u16().to_string())
    }

    /// Returns the backing file for a segment, opening it read-write
    /// (and creating it) on first use.
    pub fn segment_file(&self, segment: SegmentId) -> IoResult<Arc<StandardFile>> {
        if let Some(file) = self.files.read().get(&segment) {
            return Ok(Arc::clone(file));
        }

        let mut files = self.files.write();
        // Another thread may have opened it while we waited for the lock.
        if let Some(file) = files.get(&segment) {
            return Ok(Arc::clone(file));
        }

        let path = self.segment_path(segment);
        let file = Arc::new(StandardFile::open(path, OpenOptions::for_segment())?);
        files.insert(segment, Arc::clone(&file));
        Ok(file)
    }
}

impl std::fmt::Debug for SegmentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentManager")
            .field("directory", &self.directory)
            .field("open_segments", &self.files.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileHandle;
    use tempfile::tempdir;

    #[test]
    fn test_creates_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("segments");

        let manager = SegmentManager::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(manager.directory(), root);
    }

    #[test]
    fn test_decimal_file_naming() {
        let dir = tempdir().unwrap();
        let manager = SegmentManager::new(dir.path()).unwrap();

        let file = manager.segment_file(SegmentId::new(42)).unwrap();
        assert_eq!(file.path(), dir.path().join("42"));
        assert!(dir.path().join("42").is_file());
    }

    #[test]
    fn test_handles_are_cached() {
        let dir = tempdir().unwrap();
        let manager = SegmentManager::new(dir.path()).unwrap();

        let first = manager.segment_file(SegmentId::new(1)).unwrap();
        let second = manager.segment_file(SegmentId::new(1)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_distinct_segments_distinct_files() {
        let dir = tempdir().unwrap();
        let manager = SegmentManager::new(dir.path()).unwrap();

        let a = manager.segment_file(SegmentId::new(1)).unwrap();
        let b = manager.segment_file(SegmentId::new(2)).unwrap();
        assert_ne!(a.path(), b.path());

        a.write_block(b"segment one", 0).unwrap();
        let mut buf = vec![0xFFu8; 4];
        b.read_block(&mut buf, 0).unwrap();
        assert!(buf.iter().all(|&byte| byte == 0));
    }
}
