//! Persistence for [`ResultSet`]s.

use super::ResultSet;
use crate::error::StoreError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

/// Somewhere a result set can be loaded from and saved to
pub trait ResultsStore: Send + Sync {
    /// Read and validate the stored result set
    fn load(&self) -> Result<ResultSet, StoreError>;

    /// Replace the stored result set.
    ///
    /// Either the whole new value is stored or the previous one is kept.
    fn save(&self, results: &ResultSet) -> Result<(), StoreError>;
}

impl<T: ResultsStore + ?Sized> ResultsStore for std::sync::Arc<T> {
    fn load(&self) -> Result<ResultSet, StoreError> {
        (**self).load()
    }

    fn save(&self, results: &ResultSet) -> Result<(), StoreError> {
        (**self).save(results)
    }
}

/// Result set stored as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode of the file being replaced, or rw-r--r-- for a new one.
    /// The staging file is created owner-only.
    #[cfg(unix)]
    fn target_permissions(&self) -> fs::Permissions {
        use std::os::unix::fs::PermissionsExt;

        let mode = fs::metadata(&self.path)
            .map(|meta| meta.permissions().mode() & 0o777)
            .unwrap_or(0o644);
        fs::Permissions::from_mode(mode)
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResultsStore for JsonFileStore {
    fn load(&self) -> Result<ResultSet, StoreError> {
        let bytes = fs::read(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        let results: ResultSet =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        results.check().map_err(|reason| StoreError::Invalid {
            path: self.path.clone(),
            reason,
        })?;

        debug!(
            path = %self.path.display(),
            pairs = results.len(),
            cursor = results.start_index,
            "loaded results"
        );
        Ok(results)
    }

    fn save(&self, results: &ResultSet) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(results).map_err(StoreError::Serialize)?;

        // Write beside the target, then rename over it
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(|e| self.write_error(e))?;
        staged.write_all(&json).map_err(|e| self.write_error(e))?;
        #[cfg(unix)]
        staged
            .as_file()
            .set_permissions(self.target_permissions())
            .map_err(|e| self.write_error(e))?;
        staged.as_file().sync_all().map_err(|e| self.write_error(e))?;
        staged
            .persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        debug!(
            path = %self.path.display(),
            cursor = results.start_index,
            "saved results"
        );
        Ok(())
    }
}

/// Result set kept in memory, for tests and dry runs
#[derive(Debug, Default)]
pub struct InMemoryStore {
    results: Mutex<Option<ResultSet>>,
}

impl InMemoryStore {
    pub fn new(results: ResultSet) -> Self {
        Self {
            results: Mutex::new(Some(results)),
        }
    }

    /// Last saved value, if any
    pub fn snapshot(&self) -> Option<ResultSet> {
        self.results.lock().ok().and_then(|guard| guard.clone())
    }
}

impl ResultsStore for InMemoryStore {
    fn load(&self) -> Result<ResultSet, StoreError> {
        let guard = self.results.lock().map_err(|_| poisoned())?;
        let results = guard.clone().ok_or_else(|| StoreError::Read {
            path: PathBuf::from("<memory>"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "nothing saved yet"),
        })?;
        results.check().map_err(|reason| StoreError::Invalid {
            path: PathBuf::from("<memory>"),
            reason,
        })?;
        Ok(results)
    }

    fn save(&self, results: &ResultSet) -> Result<(), StoreError> {
        let mut guard = self.results.lock().map_err(|_| poisoned())?;
        *guard = Some(results.clone());
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Write {
        path: PathBuf::from("<memory>"),
        source: std::io::Error::new(std::io::ErrorKind::Other, "store lock poisoned"),
    }
}
