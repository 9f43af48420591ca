//! Restart metadata for file-based readers.
//!
//! A [`ReadCursor`] marks how far a multi-file read got: which resource, and
//! how many physical lines of it were consumed. The step saves it after every
//! committed chunk and clears it once the step succeeds, so a failed or
//! stopped run can be resumed without inserting the committed rows again.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::BatchError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCursor {
    /// Index of the resource being read in the ordered resource list.
    pub file_index: usize,
    /// Number of physical lines of that resource already consumed.
    pub line_offset: usize,
}

impl ReadCursor {
    pub fn new(file_index: usize, line_offset: usize) -> Self {
        Self {
            file_index,
            line_offset,
        }
    }
}

/// Storage for the cursor of a single job.
pub trait CursorRepository {
    fn load(&self) -> Result<Option<ReadCursor>, BatchError>;
    fn save(&self, cursor: &ReadCursor) -> Result<(), BatchError>;
    fn clear(&self) -> Result<(), BatchError>;
}

/// Keeps the cursor as a small JSON document on disk.
///
/// Saves go through a sibling temporary file that is synced and then renamed
/// over the target, so a crash never leaves a half-written cursor behind.
pub struct JsonFileCursorRepository {
    path: PathBuf,
}

impl JsonFileCursorRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temporary_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CursorRepository for JsonFileCursorRepository {
    fn load(&self) -> Result<Option<ReadCursor>, BatchError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            BatchError::Restart(format!("unable to read {}: {}", self.path.display(), e))
        })?;

        let cursor: ReadCursor = serde_json::from_str(&content).map_err(|e| {
            BatchError::Restart(format!("invalid cursor in {}: {}", self.path.display(), e))
        })?;

        debug!("Loaded cursor {:?} from {}", cursor, self.path.display());
        Ok(Some(cursor))
    }

    fn save(&self, cursor: &ReadCursor) -> Result<(), BatchError> {
        let temporary = self.temporary_path();
        let to_restart_error = |e: std::io::Error| {
            BatchError::Restart(format!("unable to save {}: {}", self.path.display(), e))
        };

        let content = serde_json::to_vec(cursor)
            .map_err(|e| BatchError::Restart(format!("unable to encode cursor: {}", e)))?;

        let mut file = File::create(&temporary).map_err(to_restart_error)?;
        file.write_all(&content).map_err(to_restart_error)?;
        file.sync_all().map_err(to_restart_error)?;
        fs::rename(&temporary, &self.path).map_err(to_restart_error)?;

        Ok(())
    }

    fn clear(&self) -> Result<(), BatchError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BatchError::Restart(format!(
                "unable to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{CursorRepository, JsonFileCursorRepository, ReadCursor};
    use crate::BatchError;

    #[test]
    fn missing_file_means_no_cursor() {
        let dir = tempdir().unwrap();
        let repository = JsonFileCursorRepository::new(dir.path().join("cursor.json"));

        assert_eq!(repository.load().unwrap(), None);
    }

    #[test]
    fn saved_cursor_is_loaded_back() {
        let dir = tempdir().unwrap();
        let repository = JsonFileCursorRepository::new(dir.path().join("cursor.json"));

        repository.save(&ReadCursor::new(2, 17)).unwrap();
        repository.save(&ReadCursor::new(3, 1)).unwrap();

        assert_eq!(repository.load().unwrap(), Some(ReadCursor::new(3, 1)));
        assert!(!dir.path().join("cursor.json.tmp").exists());
    }

    #[test]
    fn clear_removes_cursor_and_tolerates_missing_file() {
        let dir = tempdir().unwrap();
        let repository = JsonFileCursorRepository::new(dir.path().join("cursor.json"));

        repository.save(&ReadCursor::new(0, 4)).unwrap();
        repository.clear().unwrap();
        repository.clear().unwrap();

        assert!(!repository.path().exists());
        assert_eq!(repository.load().unwrap(), None);
    }

    #[test]
    fn corrupted_cursor_is_a_restart_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cursor.json");
        fs::write(&path, "{ not json").unwrap();

        let result = JsonFileCursorRepository::new(&path).load();

        assert!(matches!(result, Err(BatchError::Restart(_))));
    }
}
